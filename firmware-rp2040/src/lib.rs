//! IBus/SBUS RC receiver firmware for RP2040.
//!
//! Reads an RC receiver's serial output on UART1, decodes it with
//! [`serial_rx::SerialRx`] and publishes the latest channel values to the
//! rest of the firmware.
//!
//! # Hardware Configuration
//!
//! | Function | GPIO | Description |
//! |----------|------|-------------|
//! | UART1 TX | 8    | Telemetry back-channel |
//! | UART1 RX | 9    | Receiver serial output |
//! | LED      | 25   | On-board LED (lit while the link is up) |
//!
//! # Architecture
//!
//! - **RX Task**: awaits UART data (or a 1 ms tick), hands it to the
//!   receiver, drains decoded messages and tracks link loss through
//!   [`LinkMonitor`](serial_rx::LinkMonitor)
//! - **Report Task**: waits for the latest message and logs it
//!
//! Messages travel through an embassy [`Signal`](embassy_sync::signal::Signal),
//! so a slow consumer only ever sees the newest frame.
//!
//! The UART receive half is read with async `fill_buf`, never polled for
//! readiness: embassy-rp reports parity and framing errors, and re-arms
//! reception after one, only from inside a read.
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`proto-ibus`** (default): FlySky IBus, 115200 baud 8N1
//! - **`proto-sbus`**: Futaba/FrSky SBUS, 100000 baud 8E2 with inverted RX

#![no_std]

#[cfg(all(feature = "proto-ibus", feature = "proto-sbus"))]
compile_error!("Cannot enable both `proto-ibus` and `proto-sbus` features - select one input protocol");

#[cfg(not(any(feature = "proto-ibus", feature = "proto-sbus")))]
compile_error!("Select an input protocol with the `proto-ibus` or `proto-sbus` feature");

use embassy_rp::uart::{BufferedUartTx, Config as UartConfig};
use serial_rx::{BufferedSource, Config, Duration, Protocol, SerialRx};

pub use serial_rx;

/// Protocol compiled into this firmware.
#[cfg(feature = "proto-ibus")]
pub const PROTOCOL: Protocol = Protocol::Ibus;
#[cfg(feature = "proto-sbus")]
pub const PROTOCOL: Protocol = Protocol::Sbus;

/// Silence after which the link is reported lost.
pub const LINK_TIMEOUT: Duration = Duration::from_millis(100);

/// Idle gap that forces a frame resync.
///
/// Bytes inside a frame arrive well under 1 ms apart; both protocols leave
/// several milliseconds between frames.
pub const IDLE_THRESHOLD_US: u32 = 2_000;

/// Bytes buffered between the UART and the parser, two frames of either
/// protocol.
pub const RX_CHUNK: usize = 64;

/// Byte source handed to the receiver: received bytes are pushed in by the
/// RX task, telemetry goes out on the UART's TX half.
pub type RcUart = BufferedSource<BufferedUartTx, RX_CHUNK>;

/// Receiver type driven by the RX task.
pub type Receiver = SerialRx<RcUart>;

/// UART line settings for [`PROTOCOL`].
#[must_use]
pub fn uart_config() -> UartConfig {
    let mut config = UartConfig::default();
    config.baudrate = PROTOCOL.default_baudrate();

    #[cfg(feature = "proto-sbus")]
    {
        use embassy_rp::uart::{Parity, StopBits};
        config.parity = Parity::ParityEven;
        config.stop_bits = StopBits::STOP2;
        config.invert_rx = true;
    }

    config
}

/// Receiver configuration for [`PROTOCOL`] transmitting on `tx`.
#[must_use]
pub fn receiver_config(tx: BufferedUartTx) -> Config<RcUart> {
    Config::new(BufferedSource::new(tx), PROTOCOL)
        .with_message_timeout(LINK_TIMEOUT)
        .with_idle_threshold_us(IDLE_THRESHOLD_US)
}
