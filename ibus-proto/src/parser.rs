//! IBus framing state machine.

use crate::frame::{IBUS_FRAME_LEN_MINUS_CHECKSUM, IBUS_HEADER_0, IBUS_HEADER_1};
use rc_core::{MessageQueue, ProtocolParser, RcMessage, RC_NUM_CHANNELS};

/// Position of the parser within an IBus frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParserState {
    /// Scanning for `0x20`.
    WaitingForHeader0,
    /// Got `0x20`, expecting `0x40`.
    HasHeader0,
    /// Both header bytes seen, accumulating channel data.
    HasHeader1,
    /// Channel data complete, expecting checksum low byte.
    HasFrame,
    /// Got checksum low byte, expecting high byte.
    HasChecksum0,
}

/// FlySky IBus parser.
///
/// Frames are `0x20 0x40`, 14 little-endian `u16` channel slots, then a
/// little-endian checksum equal to `0xFFFF` minus the sum of the 30 preceding
/// bytes. The first [`RC_NUM_CHANNELS`] slots land in the decoded message.
///
/// A wrong second header byte or a checksum mismatch silently drops the frame
/// and scanning restarts with the next byte. The rejected byte is not
/// re-tested as a new `0x20`.
pub struct IbusParser {
    state: ParserState,
    /// Bytes consumed in the current frame, headers included.
    byte_count: usize,
    running_checksum: u16,
    frame_checksum: u16,
    msg: RcMessage,
    queue: MessageQueue,
}

impl IbusParser {
    /// Create a parser waiting for a frame header.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ParserState::WaitingForHeader0,
            byte_count: 0,
            running_checksum: 0,
            frame_checksum: 0,
            msg: RcMessage::new(),
            queue: MessageQueue::new(),
        }
    }

    /// Current state machine position.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ParserState {
        self.state
    }

    fn store_channel_byte(&mut self, byte: u8) {
        let index = (self.byte_count - 3) / 2;
        if index >= RC_NUM_CHANNELS {
            return;
        }
        if self.byte_count % 2 == 1 {
            self.msg.channels[index] = byte as u16;
        } else {
            self.msg.channels[index] |= (byte as u16) << 8;
        }
    }
}

impl Default for IbusParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolParser for IbusParser {
    fn parse_byte(&mut self, byte: u8) -> bool {
        match self.state {
            ParserState::WaitingForHeader0 => {
                if byte == IBUS_HEADER_0 {
                    self.byte_count = 1;
                    self.running_checksum = 0xFFFF - byte as u16;
                    self.msg.error_flags = Default::default();
                    self.state = ParserState::HasHeader0;
                }
                false
            }
            ParserState::HasHeader0 => {
                if byte == IBUS_HEADER_1 {
                    self.byte_count = 2;
                    self.running_checksum = self.running_checksum.wrapping_sub(byte as u16);
                    self.state = ParserState::HasHeader1;
                } else {
                    self.reset_parser();
                }
                false
            }
            ParserState::HasHeader1 => {
                self.byte_count += 1;
                self.store_channel_byte(byte);
                self.running_checksum = self.running_checksum.wrapping_sub(byte as u16);
                if self.byte_count >= IBUS_FRAME_LEN_MINUS_CHECKSUM {
                    self.state = ParserState::HasFrame;
                }
                false
            }
            ParserState::HasFrame => {
                self.frame_checksum = byte as u16;
                self.state = ParserState::HasChecksum0;
                false
            }
            ParserState::HasChecksum0 => {
                self.frame_checksum |= (byte as u16) << 8;
                let valid = self.frame_checksum == self.running_checksum;
                if valid {
                    self.queue.push_overwrite(self.msg);
                } else {
                    trace!(
                        "ibus checksum mismatch: got {:#x}, expected {:#x}",
                        self.frame_checksum,
                        self.running_checksum
                    );
                }
                self.reset_parser();
                valid
            }
        }
    }

    fn reset_parser(&mut self) {
        self.state = ParserState::WaitingForHeader0;
        self.byte_count = 0;
        self.running_checksum = 0;
        self.frame_checksum = 0;
        self.msg.reset();
    }

    #[inline]
    fn frame_start(&self) -> u8 {
        IBUS_HEADER_0
    }

    #[inline]
    fn queue(&self) -> &MessageQueue {
        &self.queue
    }
}
