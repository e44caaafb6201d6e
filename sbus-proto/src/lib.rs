//! Futaba/FrSky SBUS frame parsing and encoding.
//!
//! This crate provides a chip-agnostic SBUS parser implementing
//! [`rc_core::ProtocolParser`], plus [`SbusFrame`] for the full 16-channel
//! decode and for producing frames.
//!
//! # Example
//!
//! ```
//! use rc_core::ProtocolParser;
//! use sbus_proto::{SbusFrame, SbusParser};
//!
//! let frame = SbusFrame {
//!     channels: [992; 16],
//!     ..Default::default()
//! };
//!
//! let mut parser = SbusParser::new();
//! for byte in frame.encode() {
//!     parser.parse_byte(byte);
//! }
//! assert_eq!(parser.take_message().unwrap().channels, [992; 10]);
//! assert_eq!(parser.last_frame(), Some(frame));
//! ```
//!
//! # Frame Layout
//!
//! ```text
//! offset 0:     0x0F
//! offset 1..22: 16 x 11-bit channels, packed LSB first
//! offset 23:    flags: bit0=ch17, bit1=ch18, bit2=frame_lost, bit3=failsafe
//! offset 24:    0x00
//! ```
//!
//! # UART Configuration
//!
//! SBUS uses 100000 baud, 8E2, inverted line level. Inversion must be done by
//! the UART peripheral or an external inverter.

#![cfg_attr(not(feature = "std"), no_std)]

mod fmt;

pub mod frame;
pub mod parser;

pub use frame::{
    SbusFrame, SBUS_CHANNEL_DATA_LEN, SBUS_FLAG_CH17, SBUS_FLAG_CH18, SBUS_FLAG_FAILSAFE,
    SBUS_FLAG_FRAME_LOST, SBUS_FOOTER, SBUS_FRAME_LEN, SBUS_HEADER, SBUS_NUM_CHANNELS,
};
pub use parser::{ParserState, SbusParser};

/// SBUS baud rate.
pub const SBUS_BAUDRATE: u32 = 100_000;
