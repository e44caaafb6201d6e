//! Serial RC receiver for FlySky IBus and Futaba/FrSky SBUS.
//!
//! [`SerialRx`] owns a [`ByteSource`] and one protocol parser chosen at
//! [`begin`](SerialRx::begin) time. Call [`update`](SerialRx::update) from
//! the main loop or a periodic task, then drain [`RcMessage`]s.
//!
//! # Modules
//!
//! - [`config`]: [`Protocol`] selection and receiver [`Config`]
//! - [`parser`]: the [`Parser`] variant installed by `begin`
//! - [`receiver`]: the [`SerialRx`] orchestrator
//! - [`link`]: failsafe tracking with [`LinkMonitor`]
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and logging
//! - **`log`**: Route internal logging to the `log` facade
//! - **`embedded-io`**: Re-export [`IoSource`] for `embedded-io` UARTs
//!
//! # Link Health
//!
//! ```no_run
//! # use serial_rx::{ByteSource, Duration, SerialRx};
//! # fn poll<S: ByteSource>(rx: &mut SerialRx<S>) {
//! rx.update();
//! while let Some(msg) = rx.get_message() {
//!     // forward msg.channels
//!     # let _ = msg;
//! }
//! if rx.timeout(Duration::from_millis(100)) {
//!     // no complete frame for 100 ms: fall back to safe outputs
//! }
//! # }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

mod fmt;

pub mod config;
pub mod link;
pub mod parser;
pub mod receiver;

pub use config::{Config, ConfigError, Protocol, DEFAULT_BAUDRATE, DEFAULT_MESSAGE_TIMEOUT};
pub use link::{LinkEvent, LinkMonitor};
pub use parser::Parser;
pub use receiver::SerialRx;

// Re-export the shared types so applications need a single dependency.
#[cfg(feature = "embedded-io")]
pub use rc_core::IoSource;
pub use rc_core::{
    BufferedSource, ByteSource, Clock, Duration, ErrorFlags, Instant, ProtocolParser, RcMessage, SystemClock,
    TelemetryError, RC_NUM_CHANNELS,
};
