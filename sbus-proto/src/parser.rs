//! SBUS framing state machine.

use crate::frame::{SbusFrame, SBUS_CHANNEL_DATA_LEN, SBUS_FOOTER, SBUS_HEADER};
use rc_core::{ErrorFlags, MessageQueue, ProtocolParser, RcMessage};

/// Position of the parser within an SBUS frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParserState {
    /// Scanning for `0x0F`.
    WaitingForHeader,
    /// Collecting the 22 packed channel bytes.
    AccumulateChannels,
    /// Expecting the flag byte.
    ReadFlags,
    /// Expecting the `0x00` footer.
    ValidateFooter,
}

/// Futaba/FrSky SBUS parser.
///
/// SBUS carries no checksum: the footer sentinel is the only validation, so a
/// corrupted payload inside a well-delimited frame goes undetected. A wrong
/// footer drops the frame silently.
///
/// The queued [`RcMessage`] holds channels 1-10 plus the frame-lost and
/// failsafe bits. The full 16-channel decode of the most recent valid frame is
/// available from [`last_frame`](SbusParser::last_frame).
pub struct SbusParser {
    state: ParserState,
    byte_count: usize,
    /// Packed channel bytes followed by the flag byte.
    raw: [u8; SBUS_CHANNEL_DATA_LEN + 1],
    msg: RcMessage,
    queue: MessageQueue,
    last_frame: Option<SbusFrame>,
}

impl SbusParser {
    /// Create a parser waiting for a frame header.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ParserState::WaitingForHeader,
            byte_count: 0,
            raw: [0; SBUS_CHANNEL_DATA_LEN + 1],
            msg: RcMessage::new(),
            queue: MessageQueue::new(),
            last_frame: None,
        }
    }

    /// Current state machine position.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Full decode of the most recently validated frame.
    #[inline]
    #[must_use]
    pub fn last_frame(&self) -> Option<SbusFrame> {
        self.last_frame
    }
}

impl Default for SbusParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolParser for SbusParser {
    fn parse_byte(&mut self, byte: u8) -> bool {
        match self.state {
            ParserState::WaitingForHeader => {
                if byte == SBUS_HEADER {
                    self.byte_count = 0;
                    self.msg.error_flags = ErrorFlags::NONE;
                    self.state = ParserState::AccumulateChannels;
                }
                false
            }
            ParserState::AccumulateChannels => {
                self.raw[self.byte_count] = byte;
                self.byte_count += 1;
                if self.byte_count >= SBUS_CHANNEL_DATA_LEN {
                    self.state = ParserState::ReadFlags;
                }
                false
            }
            ParserState::ReadFlags => {
                self.raw[SBUS_CHANNEL_DATA_LEN] = byte;
                self.state = ParserState::ValidateFooter;
                false
            }
            ParserState::ValidateFooter => {
                let valid = byte == SBUS_FOOTER;
                if valid {
                    let frame = SbusFrame::from_payload(&self.raw);
                    self.msg = frame.to_message();
                    self.last_frame = Some(frame);
                    self.queue.push_overwrite(self.msg);
                } else {
                    trace!("sbus footer mismatch: {:#x}", byte);
                }
                self.reset_parser();
                valid
            }
        }
    }

    fn reset_parser(&mut self) {
        self.state = ParserState::WaitingForHeader;
        self.byte_count = 0;
        self.raw = [0; SBUS_CHANNEL_DATA_LEN + 1];
        self.msg.reset();
    }

    #[inline]
    fn frame_start(&self) -> u8 {
        SBUS_HEADER
    }

    #[inline]
    fn queue(&self) -> &MessageQueue {
        &self.queue
    }
}
