//! Link-loss tracking on top of [`SerialRx`](crate::SerialRx) polling.

use rc_core::{ErrorFlags, RcMessage};

/// Link state change reported by [`LinkMonitor::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// First frame after startup or after a loss.
    Acquired,
    /// The receiver timed out while the link was up.
    Lost,
}

/// Tracks link health across polls and remembers the last good channels.
///
/// ```
/// use serial_rx::{LinkEvent, LinkMonitor};
///
/// let mut monitor = LinkMonitor::new();
/// assert_eq!(monitor.poll(false, true), None);
/// assert_eq!(monitor.poll(true, false), Some(LinkEvent::Acquired));
/// assert_eq!(monitor.poll(false, true), Some(LinkEvent::Lost));
/// ```
#[derive(Debug, Default)]
pub struct LinkMonitor {
    up: bool,
    last: RcMessage,
}

impl LinkMonitor {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            up: false,
            last: RcMessage::new(),
        }
    }

    /// Record a decoded message.
    pub fn record(&mut self, msg: &RcMessage) {
        self.last = *msg;
    }

    /// Compare this poll with the previous one.
    ///
    /// `received` is whether any frame was decoded during the poll and
    /// `timed_out` is the receiver's timeout state afterwards.
    pub fn poll(&mut self, received: bool, timed_out: bool) -> Option<LinkEvent> {
        if !self.up && received {
            self.up = true;
            Some(LinkEvent::Acquired)
        } else if self.up && timed_out {
            self.up = false;
            Some(LinkEvent::Lost)
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_up(&self) -> bool {
        self.up
    }

    /// Last good channels flagged as failsafe, published on link loss.
    #[must_use]
    pub fn failsafe_message(&self) -> RcMessage {
        let mut msg = self.last;
        msg.error_flags |= ErrorFlags::FAILSAFE | ErrorFlags::FRAME_LOST;
        msg
    }
}
