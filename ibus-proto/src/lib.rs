//! FlySky IBus frame parsing and encoding.
//!
//! This crate provides a chip-agnostic IBus parser implementing
//! [`rc_core::ProtocolParser`]. Feed it bytes from any UART and drain decoded
//! [`rc_core::RcMessage`]s from its queue.
//!
//! # Example
//!
//! ```
//! use ibus_proto::{IbusFrame, IbusParser};
//! use rc_core::ProtocolParser;
//!
//! let mut parser = IbusParser::new();
//! for byte in IbusFrame::uniform(1500).encode() {
//!     parser.parse_byte(byte);
//! }
//!
//! let msg = parser.take_message().unwrap();
//! assert_eq!(msg.channels, [1500; 10]);
//! ```
//!
//! # Frame Layout
//!
//! ```text
//! offset 0:      0x20
//! offset 1:      0x40
//! offset 2..29:  14 x u16 LE channel slots
//! offset 30..31: u16 LE checksum = 0xFFFF - sum(bytes[0..29])
//! ```
//!
//! # UART Configuration
//!
//! IBus uses 115200 baud, 8N1.

#![cfg_attr(not(feature = "std"), no_std)]

mod fmt;

pub mod frame;
pub mod parser;

pub use frame::{
    checksum_of, IbusFrame, IBUS_FRAME_LEN, IBUS_FRAME_LEN_MINUS_CHECKSUM, IBUS_HEADER_0,
    IBUS_HEADER_1, IBUS_NUM_CHANNELS,
};
pub use parser::{IbusParser, ParserState};

/// IBus baud rate.
pub const IBUS_BAUDRATE: u32 = 115_200;
