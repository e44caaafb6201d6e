//! Decoded RC message and its error flags.

use core::ops::{BitOr, BitOrAssign};

/// Number of channels carried by an [`RcMessage`].
pub const RC_NUM_CHANNELS: usize = 10;

/// Error/status bitmask attached to every decoded message.
///
/// Protocols without status information (IBus) always leave this empty.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ErrorFlags(pub u32);

impl ErrorFlags {
    /// Receiver reported a lost frame (SBUS flag bit 2).
    pub const FRAME_LOST: Self = Self(1 << 0);
    /// Receiver is in failsafe (SBUS flag bit 3).
    pub const FAILSAFE: Self = Self(1 << 1);

    /// No flags set.
    pub const NONE: Self = Self(0);

    /// Check if all given flag(s) are set.
    #[inline]
    #[must_use]
    pub const fn contains(self, flags: ErrorFlags) -> bool {
        (self.0 & flags.0) == flags.0
    }

    /// Get the raw bitmask.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ErrorFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ErrorFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// One decoded RC channel snapshot.
///
/// Channel values are in protocol units: microseconds (typically 1000-2000)
/// for IBus, raw 11-bit counts (0-2047, center 992) for SBUS. Channels a
/// protocol does not populate stay at 0.
///
/// Parsers hand out copies; consumers never see parser-internal state.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RcMessage {
    pub channels: [u16; RC_NUM_CHANNELS],
    pub error_flags: ErrorFlags,
}

impl RcMessage {
    /// An all-zero message with no flags.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            channels: [0; RC_NUM_CHANNELS],
            error_flags: ErrorFlags::NONE,
        }
    }

    /// Zero all channels and clear the error flags.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Get a channel value by zero-based index.
    #[inline]
    #[must_use]
    pub fn channel(&self, index: usize) -> Option<u16> {
        self.channels.get(index).copied()
    }

    #[inline]
    #[must_use]
    pub const fn is_frame_lost(&self) -> bool {
        self.error_flags.contains(ErrorFlags::FRAME_LOST)
    }

    #[inline]
    #[must_use]
    pub const fn is_failsafe(&self) -> bool {
        self.error_flags.contains(ErrorFlags::FAILSAFE)
    }
}
