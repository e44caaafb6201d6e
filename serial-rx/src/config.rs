//! Receiver configuration.

use ibus_proto::IBUS_BAUDRATE;
use rc_core::Duration;
use sbus_proto::SBUS_BAUDRATE;

/// Baud rate used when no protocol-specific rate applies.
pub const DEFAULT_BAUDRATE: u32 = 115_200;

/// Default link-loss timeout.
pub const DEFAULT_MESSAGE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Supported RC protocols.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Protocol {
    /// Not configured; `begin` rejects it.
    #[default]
    None,
    /// FlySky IBus, 115200 baud.
    Ibus,
    /// Futaba/FrSky SBUS, 100000 baud 8E2 inverted.
    Sbus,
}

impl Protocol {
    /// Standard baud rate for this protocol.
    #[must_use]
    pub const fn default_baudrate(self) -> u32 {
        match self {
            Protocol::None => DEFAULT_BAUDRATE,
            Protocol::Ibus => IBUS_BAUDRATE,
            Protocol::Sbus => SBUS_BAUDRATE,
        }
    }
}

/// Configuration consumed by [`SerialRx::begin`](crate::SerialRx::begin).
///
/// ```
/// use serial_rx::{Config, Protocol};
/// # struct Uart;
///
/// let config = Config::ibus(Uart).with_idle_threshold_us(2_000);
/// assert_eq!(config.protocol, Protocol::Ibus);
/// assert_eq!(config.baudrate, 115_200);
/// ```
#[derive(Debug, Clone)]
pub struct Config<S> {
    /// Byte stream to read from; `begin` fails without one.
    pub source: Option<S>,
    pub protocol: Protocol,
    pub baudrate: u32,
    /// Used by [`SerialRx::is_timed_out`](crate::SerialRx::is_timed_out).
    pub message_timeout: Duration,
    /// Inter-frame gap that forces a resync; `None` disables idle detection.
    pub idle_threshold: Option<Duration>,
}

impl<S> Default for Config<S> {
    fn default() -> Self {
        Self {
            source: None,
            protocol: Protocol::None,
            baudrate: DEFAULT_BAUDRATE,
            message_timeout: DEFAULT_MESSAGE_TIMEOUT,
            idle_threshold: None,
        }
    }
}

impl<S> Config<S> {
    /// Configuration for `protocol` at its standard baud rate.
    #[must_use]
    pub fn new(source: S, protocol: Protocol) -> Self {
        Self {
            source: Some(source),
            protocol,
            baudrate: protocol.default_baudrate(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn ibus(source: S) -> Self {
        Self::new(source, Protocol::Ibus)
    }

    #[must_use]
    pub fn sbus(source: S) -> Self {
        Self::new(source, Protocol::Sbus)
    }

    #[must_use]
    pub fn with_baudrate(mut self, baudrate: u32) -> Self {
        self.baudrate = baudrate;
        self
    }

    #[must_use]
    pub fn with_message_timeout(mut self, timeout: Duration) -> Self {
        self.message_timeout = timeout;
        self
    }

    /// Set the idle-line threshold in microseconds; 0 disables detection.
    #[must_use]
    pub fn with_idle_threshold_us(mut self, micros: u32) -> Self {
        self.idle_threshold = (micros > 0).then(|| Duration::from_micros(micros as u64));
        self
    }
}

/// Error returned by [`SerialRx::begin`](crate::SerialRx::begin).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// No byte source was supplied.
    MissingSource,
    /// Protocol was [`Protocol::None`].
    NoProtocol,
}
