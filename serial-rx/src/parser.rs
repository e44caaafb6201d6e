//! Protocol parser chosen at `begin` time.

use crate::config::Protocol;
use ibus_proto::IbusParser;
use rc_core::{MessageQueue, ProtocolParser};
use sbus_proto::SbusParser;

/// The receiver's active parser.
pub enum Parser {
    Ibus(IbusParser),
    Sbus(SbusParser),
}

impl Parser {
    /// Fresh parser for `protocol`, `None` for [`Protocol::None`].
    #[must_use]
    pub fn for_protocol(protocol: Protocol) -> Option<Self> {
        match protocol {
            Protocol::None => None,
            Protocol::Ibus => Some(Parser::Ibus(IbusParser::new())),
            Protocol::Sbus => Some(Parser::Sbus(SbusParser::new())),
        }
    }

    #[must_use]
    pub fn protocol(&self) -> Protocol {
        match self {
            Parser::Ibus(_) => Protocol::Ibus,
            Parser::Sbus(_) => Protocol::Sbus,
        }
    }
}

impl ProtocolParser for Parser {
    #[inline]
    fn parse_byte(&mut self, byte: u8) -> bool {
        match self {
            Parser::Ibus(p) => p.parse_byte(byte),
            Parser::Sbus(p) => p.parse_byte(byte),
        }
    }

    #[inline]
    fn reset_parser(&mut self) {
        match self {
            Parser::Ibus(p) => p.reset_parser(),
            Parser::Sbus(p) => p.reset_parser(),
        }
    }

    #[inline]
    fn frame_start(&self) -> u8 {
        match self {
            Parser::Ibus(p) => p.frame_start(),
            Parser::Sbus(p) => p.frame_start(),
        }
    }

    #[inline]
    fn queue(&self) -> &MessageQueue {
        match self {
            Parser::Ibus(p) => p.queue(),
            Parser::Sbus(p) => p.queue(),
        }
    }
}
