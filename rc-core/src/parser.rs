//! Byte-at-a-time protocol parser capability.

use crate::queue::BoundedQueue;
use crate::types::RcMessage;

/// Depth of every parser's message queue.
pub const MESSAGE_QUEUE_DEPTH: usize = 16;

/// Queue of decoded messages owned by a parser.
pub type MessageQueue = BoundedQueue<RcMessage, MESSAGE_QUEUE_DEPTH>;

/// A framing state machine for one RC protocol.
///
/// Implementations own a working [`RcMessage`] and a [`MessageQueue`]. A
/// successfully validated frame is copied into the queue with overwrite
/// semantics: if the application does not drain fast enough, the oldest
/// undrained frame is dropped.
///
/// # Example
///
/// ```ignore
/// for byte in uart_bytes {
///     if parser.parse_byte(byte) {
///         // a frame just completed
///     }
/// }
/// while let Some(msg) = parser.take_message() {
///     // use msg.channels
/// }
/// ```
pub trait ProtocolParser {
    /// Feed one byte.
    ///
    /// Returns `true` exactly when this byte completed a validated frame and
    /// that frame was queued. Never blocks.
    fn parse_byte(&mut self, byte: u8) -> bool;

    /// Return to the initial state, discarding any partial frame and zeroing
    /// the working message.
    fn reset_parser(&mut self);

    /// First byte of every frame of this protocol.
    fn frame_start(&self) -> u8;

    /// The parser's message queue.
    fn queue(&self) -> &MessageQueue;

    /// Check if at least one decoded message is waiting.
    #[inline]
    fn has_message(&self) -> bool {
        !self.queue().is_empty()
    }

    /// Pop the oldest decoded message.
    #[inline]
    fn take_message(&mut self) -> Option<RcMessage> {
        self.queue().pop()
    }

    /// Number of decoded messages waiting.
    #[inline]
    fn message_count(&self) -> usize {
        self.queue().count()
    }
}
