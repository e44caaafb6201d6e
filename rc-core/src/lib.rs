//! Platform-agnostic building blocks for serial RC receivers.
//!
//! This crate holds everything the protocol crates and the receiver share,
//! without any chip-specific dependencies:
//!
//! - [`types`]: decoded message ([`RcMessage`]) and status bits ([`ErrorFlags`])
//! - [`queue`]: critical-section guarded overwrite FIFO ([`BoundedQueue`])
//! - [`parser`]: byte-at-a-time parser capability ([`ProtocolParser`])
//! - [`source`]: serial transport trait ([`ByteSource`]) and a push-fed buffer ([`BufferedSource`])
//! - [`clock`]: monotonic time ([`Clock`], [`SystemClock`])
//! - [`telemetry`]: back-channel error type ([`TelemetryError`])
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and logging
//! - **`log`**: Route internal logging to the `log` facade
//! - **`embedded-io`**: Enable [`IoSource`] for `embedded-io` peripherals
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.
//! Queue operations need a `critical-section` implementation at link time,
//! normally provided by the HAL.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

mod fmt;

pub mod clock;
pub mod parser;
pub mod queue;
pub mod source;
pub mod telemetry;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use parser::{MessageQueue, ProtocolParser, MESSAGE_QUEUE_DEPTH};
pub use queue::BoundedQueue;
#[cfg(feature = "embedded-io")]
pub use source::IoSource;
pub use source::{BufferedSource, ByteSource};
pub use telemetry::TelemetryError;
pub use types::{ErrorFlags, RcMessage, RC_NUM_CHANNELS};

// Timestamp types used across the receiver API.
pub use embassy_time::{Duration, Instant};
