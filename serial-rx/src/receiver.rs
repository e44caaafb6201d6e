//! SerialRx: polls a byte source and feeds the configured protocol parser.

use crate::config::{Config, ConfigError, Protocol, DEFAULT_MESSAGE_TIMEOUT};
use crate::parser::Parser;
use rc_core::{
    ByteSource, Clock, Duration, Instant, ProtocolParser, RcMessage, SystemClock, TelemetryError,
};

/// A serial RC receiver.
///
/// Owns the byte source and the protocol parser once [`begin`](Self::begin)
/// succeeds. The application calls [`update`](Self::update) periodically to
/// drain pending bytes, then pulls decoded messages with
/// [`get_message`](Self::get_message).
///
/// # Idle-line resync
///
/// When an idle threshold is configured and the line has been silent for
/// longer than that, the parser is reset and the next byte must be the
/// protocol's frame start. A partial frame interrupted by a gap is therefore
/// never merged with the bytes of the next frame.
///
/// # Example
///
/// ```
/// use ibus_proto::IbusFrame;
/// use serial_rx::{ByteSource, Config, SerialRx};
/// use std::collections::VecDeque;
///
/// struct Loopback(VecDeque<u8>);
///
/// impl ByteSource for Loopback {
///     fn begin(&mut self, _baudrate: u32) {}
///     fn available(&mut self) -> usize { self.0.len() }
///     fn read(&mut self) -> Option<u8> { self.0.pop_front() }
///     fn write(&mut self, data: &[u8]) -> usize { data.len() }
/// }
///
/// let frame = IbusFrame::uniform(1500).encode();
/// let mut rx = SerialRx::new();
/// rx.begin(Config::ibus(Loopback(frame.into_iter().collect()))).unwrap();
/// rx.update();
///
/// let msg = rx.get_message().unwrap();
/// assert_eq!(msg.channels, [1500; 10]);
/// ```
pub struct SerialRx<S, C = SystemClock> {
    source: Option<S>,
    parser: Option<Parser>,
    clock: C,
    message_timeout: Duration,
    idle_threshold: Option<Duration>,
    last_message: Instant,
    last_byte: Instant,
    expect_frame_start: bool,
}

impl<S: ByteSource> SerialRx<S, SystemClock> {
    /// Create an idle receiver using the embassy time driver.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<S: ByteSource> Default for SerialRx<S, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ByteSource, C: Clock> SerialRx<S, C> {
    /// Create an idle receiver reading time from `clock`.
    pub fn with_clock(clock: C) -> Self {
        let now = clock.now();
        Self {
            source: None,
            parser: None,
            clock,
            message_timeout: DEFAULT_MESSAGE_TIMEOUT,
            idle_threshold: None,
            last_message: now,
            last_byte: now,
            expect_frame_start: false,
        }
    }

    /// Validate `config`, start the source and install the parser.
    ///
    /// On error the receiver is left exactly as it was. The source inside
    /// a rejected config is dropped with it. Calling `begin` on a running
    /// receiver replaces its source and parser.
    pub fn begin(&mut self, config: Config<S>) -> Result<(), ConfigError> {
        let Some(mut source) = config.source else {
            warn!("begin rejected: no byte source");
            return Err(ConfigError::MissingSource);
        };
        let Some(parser) = Parser::for_protocol(config.protocol) else {
            warn!("begin rejected: no protocol selected");
            return Err(ConfigError::NoProtocol);
        };

        source.begin(config.baudrate);

        let now = self.clock.now();
        self.source = Some(source);
        self.parser = Some(parser);
        self.message_timeout = config.message_timeout;
        self.idle_threshold = config.idle_threshold;
        self.last_message = now;
        self.last_byte = now;
        self.expect_frame_start = false;

        info!(
            "serial rx started: {:?} at {} baud",
            config.protocol, config.baudrate
        );
        Ok(())
    }

    /// Drain every byte the source currently has and feed it to the parser.
    ///
    /// Does nothing before a successful [`begin`](Self::begin).
    pub fn update(&mut self) {
        let (Some(source), Some(parser)) = (self.source.as_mut(), self.parser.as_mut()) else {
            return;
        };

        if let Some(threshold) = self.idle_threshold {
            let idle = self.clock.now().saturating_duration_since(self.last_byte);
            if idle > threshold && !self.expect_frame_start {
                parser.reset_parser();
                self.expect_frame_start = true;
                trace!("line idle for {} us, resyncing", idle.as_micros());
            }
        }

        while source.available() > 0 {
            let Some(byte) = source.read() else {
                break;
            };
            self.last_byte = self.clock.now();

            if self.expect_frame_start {
                self.expect_frame_start = false;
                if byte != parser.frame_start() {
                    trace!("discarding {:#x} after idle gap", byte);
                    continue;
                }
            }

            if parser.parse_byte(byte) {
                self.last_message = self.clock.now();
            }
        }
    }

    /// Whether at least one decoded message is queued.
    #[must_use]
    pub fn available(&self) -> bool {
        self.parser.as_ref().is_some_and(|p| p.has_message())
    }

    /// Take the oldest queued message.
    pub fn get_message(&mut self) -> Option<RcMessage> {
        self.parser.as_mut().and_then(|p| p.take_message())
    }

    /// Number of queued messages.
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.parser.as_ref().map_or(0, |p| p.message_count())
    }

    /// Whether more than `threshold` has passed since the last complete frame.
    #[must_use]
    pub fn timeout(&self, threshold: Duration) -> bool {
        self.time_since_last_message() > threshold
    }

    /// [`timeout`](Self::timeout) against the configured message timeout.
    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        self.timeout(self.message_timeout)
    }

    /// Time since the last complete frame, or since `begin` if none arrived yet.
    #[must_use]
    pub fn time_since_last_message(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.last_message)
    }

    /// Write raw bytes back through the source.
    ///
    /// Returns the number of bytes written.
    pub fn send_telemetry(&mut self, data: &[u8]) -> Result<usize, TelemetryError> {
        let source = self.source.as_mut().ok_or(TelemetryError::NotStarted)?;
        if data.is_empty() {
            return Err(TelemetryError::EmptyPayload);
        }

        let written = source.write(data);
        if written < data.len() {
            debug!("telemetry short write: {} of {}", written, data.len());
            return Err(TelemetryError::Incomplete(written));
        }
        debug!("telemetry sent: {} bytes", written);
        Ok(written)
    }

    /// Stop receiving and hand the source back.
    ///
    /// Queued messages are discarded with the parser.
    pub fn end(&mut self) -> Option<S> {
        self.parser = None;
        self.expect_frame_start = false;
        let source = self.source.take();
        if source.is_some() {
            info!("serial rx stopped");
        }
        source
    }

    /// Protocol selected by the last successful `begin`.
    #[must_use]
    pub fn protocol(&self) -> Protocol {
        self.parser.as_ref().map_or(Protocol::None, Parser::protocol)
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.source.is_some()
    }

    /// The active parser, for protocol-specific state such as the last
    /// full SBUS frame.
    #[must_use]
    pub fn parser(&self) -> Option<&Parser> {
        self.parser.as_ref()
    }

    /// Get a mutable reference to the byte source.
    pub fn source_mut(&mut self) -> Option<&mut S> {
        self.source.as_mut()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::Cell;
    use ibus_proto::IbusFrame;
    use rc_core::BufferedSource;
    use sbus_proto::SbusFrame;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::vec::Vec;

    #[derive(Default)]
    struct MockState {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
        baudrate: Option<u32>,
        write_limit: Option<usize>,
    }

    // Serial port mock; the test keeps a handle to the shared state
    #[derive(Clone, Default)]
    struct MockSource {
        state: Arc<Mutex<MockState>>,
    }

    impl MockSource {
        fn feed(&self, bytes: &[u8]) {
            self.state.lock().unwrap().rx.extend(bytes.iter().copied());
        }

        fn pending(&self) -> usize {
            self.state.lock().unwrap().rx.len()
        }
    }

    impl ByteSource for MockSource {
        fn begin(&mut self, baudrate: u32) {
            self.state.lock().unwrap().baudrate = Some(baudrate);
        }

        fn available(&mut self) -> usize {
            self.state.lock().unwrap().rx.len()
        }

        fn read(&mut self) -> Option<u8> {
            self.state.lock().unwrap().rx.pop_front()
        }

        fn write(&mut self, data: &[u8]) -> usize {
            let mut state = self.state.lock().unwrap();
            let n = state.write_limit.map_or(data.len(), |limit| limit.min(data.len()));
            state.tx.extend_from_slice(&data[..n]);
            n
        }
    }

    #[derive(Default)]
    struct ManualClock {
        micros: Cell<u64>,
    }

    impl ManualClock {
        fn advance_us(&self, us: u64) {
            self.micros.set(self.micros.get() + us);
        }

        fn advance_ms(&self, ms: u64) {
            self.advance_us(ms * 1000);
        }

        fn rewind_us(&self, us: u64) {
            self.micros.set(self.micros.get() - us);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            Instant::from_micros(self.micros.get())
        }
    }

    fn started(
        clock: &ManualClock,
        config: impl FnOnce(MockSource) -> Config<MockSource>,
    ) -> (SerialRx<MockSource, &ManualClock>, MockSource) {
        let source = MockSource::default();
        let mut rx = SerialRx::with_clock(clock);
        rx.begin(config(source.clone())).unwrap();
        (rx, source)
    }

    #[test]
    fn test_begin_requires_source() {
        let clock = ManualClock::default();
        let mut rx: SerialRx<MockSource, _> = SerialRx::with_clock(&clock);

        let config = Config {
            protocol: Protocol::Ibus,
            ..Config::default()
        };
        assert_eq!(rx.begin(config), Err(ConfigError::MissingSource));
        assert!(!rx.is_started());
        assert_eq!(rx.protocol(), Protocol::None);
    }

    #[test]
    fn test_begin_requires_protocol() {
        let clock = ManualClock::default();
        let source = MockSource::default();
        let mut rx = SerialRx::with_clock(&clock);

        let result = rx.begin(Config::new(source.clone(), Protocol::None));
        assert_eq!(result, Err(ConfigError::NoProtocol));
        assert!(!rx.is_started());
        // Source must not have been started
        assert_eq!(source.state.lock().unwrap().baudrate, None);

        // Failed begin leaves the receiver inert
        source.feed(&IbusFrame::uniform(1500).encode());
        rx.update();
        assert!(!rx.available());
        assert_eq!(source.pending(), 32);
    }

    #[test]
    fn test_begin_starts_source_at_baudrate() {
        let clock = ManualClock::default();
        let (rx, source) = started(&clock, Config::sbus);
        assert_eq!(source.state.lock().unwrap().baudrate, Some(100_000));
        assert!(rx.is_started());
        assert_eq!(rx.protocol(), Protocol::Sbus);

        let (_, source) = started(&clock, |s| Config::ibus(s).with_baudrate(57_600));
        assert_eq!(source.state.lock().unwrap().baudrate, Some(57_600));
    }

    #[test]
    fn test_update_before_begin_is_noop() {
        let clock = ManualClock::default();
        let mut rx: SerialRx<MockSource, _> = SerialRx::with_clock(&clock);
        rx.update();
        assert!(!rx.available());
        assert_eq!(rx.get_message(), None);
        assert_eq!(rx.message_count(), 0);
    }

    #[test]
    fn test_ibus_end_to_end() {
        let clock = ManualClock::default();
        let (mut rx, source) = started(&clock, Config::ibus);

        source.feed(&IbusFrame::uniform(1500).encode());
        rx.update();

        assert_eq!(source.pending(), 0);
        assert!(rx.available());
        let msg = rx.get_message().unwrap();
        assert_eq!(msg.channels, [1500; 10]);
        assert!(msg.error_flags.is_empty());
        assert!(!rx.available());
    }

    #[test]
    fn test_sbus_end_to_end() {
        let clock = ManualClock::default();
        let (mut rx, source) = started(&clock, Config::sbus);

        let mut frame = SbusFrame::default();
        frame.channels = core::array::from_fn(|i| 172 + i as u16 * 100);
        frame.failsafe = true;
        source.feed(&frame.encode());
        rx.update();

        let msg = rx.get_message().unwrap();
        assert_eq!(msg.channels[..], frame.channels[..10]);
        assert!(msg.is_failsafe());
        assert!(!msg.is_frame_lost());

        match rx.parser() {
            Some(Parser::Sbus(p)) => assert_eq!(p.last_frame(), Some(frame)),
            _ => panic!("expected SBUS parser"),
        }
    }

    #[test]
    fn test_bytes_split_across_updates() {
        let clock = ManualClock::default();
        let (mut rx, source) = started(&clock, Config::ibus);
        let frame = IbusFrame::uniform(1700).encode();

        source.feed(&frame[..13]);
        rx.update();
        assert!(!rx.available());

        source.feed(&frame[13..]);
        rx.update();
        assert_eq!(rx.get_message().unwrap().channels, [1700; 10]);
    }

    #[test]
    fn test_queue_overwrites_oldest() {
        let clock = ManualClock::default();
        let (mut rx, source) = started(&clock, Config::ibus);

        for value in 1000..1017 {
            source.feed(&IbusFrame::uniform(value).encode());
        }
        rx.update();

        assert_eq!(rx.message_count(), 16);
        // Frame with 1000 was dropped
        assert_eq!(rx.get_message().unwrap().channels[0], 1001);
    }

    #[test]
    fn test_timeout_tracks_last_frame() {
        let clock = ManualClock::default();
        let (mut rx, source) = started(&clock, Config::ibus);

        assert!(!rx.timeout(Duration::from_millis(100)));
        clock.advance_ms(150);
        assert!(rx.timeout(Duration::from_millis(100)));
        assert_eq!(rx.time_since_last_message(), Duration::from_millis(150));

        source.feed(&IbusFrame::uniform(1500).encode());
        rx.update();
        assert!(!rx.timeout(Duration::from_millis(100)));

        clock.advance_ms(100);
        // Strictly greater than
        assert!(!rx.timeout(Duration::from_millis(100)));
        clock.advance_us(1);
        assert!(rx.timeout(Duration::from_millis(100)));
    }

    #[test]
    fn test_corrupt_frame_does_not_refresh_timeout() {
        let clock = ManualClock::default();
        let (mut rx, source) = started(&clock, Config::ibus);

        clock.advance_ms(50);
        let mut frame = IbusFrame::uniform(1500).encode();
        frame[31] ^= 0xFF;
        source.feed(&frame);
        rx.update();

        assert!(!rx.available());
        assert_eq!(rx.time_since_last_message(), Duration::from_millis(50));
    }

    #[test]
    fn test_is_timed_out_uses_configured_timeout() {
        let clock = ManualClock::default();
        let (rx, _source) = started(&clock, |s| {
            Config::ibus(s).with_message_timeout(Duration::from_millis(20))
        });

        clock.advance_ms(20);
        assert!(!rx.is_timed_out());
        clock.advance_ms(1);
        assert!(rx.is_timed_out());
    }

    #[test]
    fn test_idle_gap_resyncs_partial_frame() {
        let clock = ManualClock::default();
        let (mut rx, source) = started(&clock, |s| Config::ibus(s).with_idle_threshold_us(500));
        let frame = IbusFrame::uniform(1500).encode();

        // Truncated frame, then the line goes quiet
        source.feed(&frame[..10]);
        rx.update();
        clock.advance_ms(1);

        source.feed(&frame);
        rx.update();

        let msg = rx.get_message().unwrap();
        assert_eq!(msg.channels, [1500; 10]);
        assert!(!rx.available());
    }

    #[test]
    fn test_without_idle_detection_partial_frame_corrupts_next() {
        let clock = ManualClock::default();
        let (mut rx, source) = started(&clock, Config::ibus);
        let frame = IbusFrame::uniform(1500).encode();

        source.feed(&frame[..10]);
        rx.update();
        clock.advance_ms(1);

        source.feed(&frame);
        rx.update();

        assert!(!rx.available());
    }

    #[test]
    fn test_non_header_byte_after_gap_is_discarded() {
        let clock = ManualClock::default();
        let (mut rx, source) = started(&clock, |s| Config::ibus(s).with_idle_threshold_us(500));

        clock.advance_ms(1);
        source.feed(&[0x40]);
        source.feed(&IbusFrame::uniform(1250).encode());
        rx.update();

        assert_eq!(rx.message_count(), 1);
        assert_eq!(rx.get_message().unwrap().channels, [1250; 10]);
    }

    #[test]
    fn test_sbus_idle_resync_uses_sbus_header() {
        let clock = ManualClock::default();
        let (mut rx, source) = started(&clock, |s| Config::sbus(s).with_idle_threshold_us(2_000));
        let frame = SbusFrame::default().encode();

        source.feed(&frame[..7]);
        rx.update();
        clock.advance_ms(5);

        source.feed(&frame);
        rx.update();

        assert_eq!(rx.message_count(), 1);
    }

    #[test]
    fn test_no_resync_within_threshold() {
        let clock = ManualClock::default();
        let (mut rx, source) = started(&clock, |s| Config::ibus(s).with_idle_threshold_us(500));
        let frame = IbusFrame::uniform(1500).encode();

        source.feed(&frame[..16]);
        rx.update();
        clock.advance_us(400);

        source.feed(&frame[16..]);
        rx.update();

        assert_eq!(rx.message_count(), 1);
    }

    #[test]
    fn test_clock_going_backwards_saturates() {
        let clock = ManualClock::default();
        clock.advance_ms(10);
        let (mut rx, source) = started(&clock, |s| Config::ibus(s).with_idle_threshold_us(500));
        let frame = IbusFrame::uniform(1600).encode();

        source.feed(&frame[..12]);
        rx.update();

        clock.rewind_us(5_000);
        assert_eq!(rx.time_since_last_message(), Duration::from_ticks(0));
        assert!(!rx.timeout(Duration::from_ticks(0)));
        assert!(!rx.is_timed_out());

        // No idle gap is seen, so the partial frame is completed
        source.feed(&frame[12..]);
        rx.update();
        assert_eq!(rx.message_count(), 1);
        assert_eq!(rx.get_message().unwrap().channels, [1600; 10]);
    }

    // Transmit half of a UART whose receive half is read asynchronously
    #[derive(Default)]
    struct MockTx {
        sent: Vec<u8>,
    }

    impl embedded_io::ErrorType for MockTx {
        type Error = core::convert::Infallible;
    }

    impl embedded_io::Write for MockTx {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.sent.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn test_buffered_source_chunks_reach_parser() {
        let clock = ManualClock::default();
        let mut rx = SerialRx::with_clock(&clock);
        let source: BufferedSource<MockTx, 32> = BufferedSource::new(MockTx::default());
        rx.begin(Config::sbus(source).with_idle_threshold_us(2_000)).unwrap();

        // Chunks as an async read loop would hand them over
        let frame = SbusFrame::default().encode();
        for chunk in frame.chunks(7) {
            let taken = rx.source_mut().unwrap().push(chunk);
            assert_eq!(taken, chunk.len());
            rx.update();
            clock.advance_us(100);
        }
        assert_eq!(rx.message_count(), 1);

        // Reception resumes after a gap with nothing read
        clock.advance_ms(50);
        rx.update();
        rx.source_mut().unwrap().push(&frame);
        rx.update();
        assert_eq!(rx.message_count(), 2);

        assert_eq!(rx.send_telemetry(&[0x55]), Ok(1));
        assert_eq!(rx.end().unwrap().into_inner().sent, [0x55]);
    }

    #[test]
    fn test_send_telemetry() {
        let clock = ManualClock::default();
        let mut rx: SerialRx<MockSource, _> = SerialRx::with_clock(&clock);
        assert_eq!(rx.send_telemetry(&[1, 2, 3]), Err(TelemetryError::NotStarted));

        let source = MockSource::default();
        rx.begin(Config::ibus(source.clone())).unwrap();

        assert_eq!(rx.send_telemetry(&[]), Err(TelemetryError::EmptyPayload));
        assert_eq!(rx.send_telemetry(&[0x04, 0x81, 0x7A, 0xFF]), Ok(4));
        assert_eq!(source.state.lock().unwrap().tx, [0x04, 0x81, 0x7A, 0xFF]);
    }

    #[test]
    fn test_send_telemetry_short_write() {
        let clock = ManualClock::default();
        let (mut rx, source) = started(&clock, Config::ibus);
        source.state.lock().unwrap().write_limit = Some(2);

        assert_eq!(
            rx.send_telemetry(&[1, 2, 3, 4]),
            Err(TelemetryError::Incomplete(2))
        );
        assert_eq!(source.state.lock().unwrap().tx, [1, 2]);
    }

    #[test]
    fn test_end_returns_source() {
        let clock = ManualClock::default();
        let (mut rx, source) = started(&clock, Config::ibus);

        source.feed(&IbusFrame::uniform(1500).encode());
        rx.update();
        assert!(rx.available());

        let returned = rx.end();
        assert!(returned.is_some());
        assert!(!rx.is_started());
        assert!(!rx.available());
        assert_eq!(rx.protocol(), Protocol::None);
        assert!(rx.end().is_none());
    }

    #[test]
    fn test_begin_again_switches_protocol() {
        let clock = ManualClock::default();
        let (mut rx, _old) = started(&clock, Config::ibus);

        let source = MockSource::default();
        rx.begin(Config::sbus(source.clone())).unwrap();
        assert_eq!(rx.protocol(), Protocol::Sbus);

        source.feed(&SbusFrame::default().encode());
        rx.update();
        assert_eq!(rx.message_count(), 1);
    }
}
