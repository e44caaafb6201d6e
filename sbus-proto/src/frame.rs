//! SBUS wire frame: 16 packed 11-bit channels plus a flag byte.

use rc_core::{ErrorFlags, RcMessage, RC_NUM_CHANNELS};

/// Total SBUS frame length on the wire.
pub const SBUS_FRAME_LEN: usize = 25;

/// Packed channel bytes between header and flags.
pub const SBUS_CHANNEL_DATA_LEN: usize = 22;

/// Channels carried by one frame.
pub const SBUS_NUM_CHANNELS: usize = 16;

pub const SBUS_HEADER: u8 = 0x0F;
pub const SBUS_FOOTER: u8 = 0x00;

/// Flag byte bits.
pub const SBUS_FLAG_CH17: u8 = 0x01;
pub const SBUS_FLAG_CH18: u8 = 0x02;
pub const SBUS_FLAG_FRAME_LOST: u8 = 0x04;
pub const SBUS_FLAG_FAILSAFE: u8 = 0x08;

const CHANNEL_MASK: u16 = 0x07FF;
const CHANNEL_BITS: usize = 11;

/// One fully decoded SBUS frame.
///
/// Channel values are raw 11-bit counts (0-2047, center 992).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SbusFrame {
    pub channels: [u16; SBUS_NUM_CHANNELS],
    /// Digital channel 17.
    pub channel_17: bool,
    /// Digital channel 18.
    pub channel_18: bool,
    pub frame_lost: bool,
    pub failsafe: bool,
}

impl SbusFrame {
    /// Decode the 22 packed channel bytes and the flag byte.
    ///
    /// `payload[..22]` is the channel data, `payload[22]` the flags.
    #[must_use]
    pub fn from_payload(payload: &[u8; SBUS_CHANNEL_DATA_LEN + 1]) -> Self {
        let b = |i: usize| payload[i] as u16;
        let mut ch = [0u16; SBUS_NUM_CHANNELS];

        ch[0] = b(0) | b(1) << 8;
        ch[1] = b(1) >> 3 | b(2) << 5;
        ch[2] = b(2) >> 6 | b(3) << 2 | b(4) << 10;
        ch[3] = b(4) >> 1 | b(5) << 7;
        ch[4] = b(5) >> 4 | b(6) << 4;
        ch[5] = b(6) >> 7 | b(7) << 1 | b(8) << 9;
        ch[6] = b(8) >> 2 | b(9) << 6;
        ch[7] = b(9) >> 5 | b(10) << 3;
        ch[8] = b(11) | b(12) << 8;
        ch[9] = b(12) >> 3 | b(13) << 5;
        ch[10] = b(13) >> 6 | b(14) << 2 | b(15) << 10;
        ch[11] = b(15) >> 1 | b(16) << 7;
        ch[12] = b(16) >> 4 | b(17) << 4;
        ch[13] = b(17) >> 7 | b(18) << 1 | b(19) << 9;
        ch[14] = b(19) >> 2 | b(20) << 6;
        ch[15] = b(20) >> 5 | b(21) << 3;

        for c in ch.iter_mut() {
            *c &= CHANNEL_MASK;
        }

        let flags = payload[SBUS_CHANNEL_DATA_LEN];
        Self {
            channels: ch,
            channel_17: flags & SBUS_FLAG_CH17 != 0,
            channel_18: flags & SBUS_FLAG_CH18 != 0,
            frame_lost: flags & SBUS_FLAG_FRAME_LOST != 0,
            failsafe: flags & SBUS_FLAG_FAILSAFE != 0,
        }
    }

    /// Status bits as carried by [`RcMessage::error_flags`].
    #[must_use]
    pub fn error_flags(&self) -> ErrorFlags {
        let mut flags = ErrorFlags::NONE;
        if self.frame_lost {
            flags |= ErrorFlags::FRAME_LOST;
        }
        if self.failsafe {
            flags |= ErrorFlags::FAILSAFE;
        }
        flags
    }

    /// Truncate to the first [`RC_NUM_CHANNELS`] channels.
    #[must_use]
    pub fn to_message(&self) -> RcMessage {
        let mut msg = RcMessage::new();
        msg.channels
            .copy_from_slice(&self.channels[..RC_NUM_CHANNELS]);
        msg.error_flags = self.error_flags();
        msg
    }

    /// Serialize to the 25-byte wire form.
    ///
    /// Channel values above 11 bits are masked.
    #[must_use]
    pub fn encode(&self) -> [u8; SBUS_FRAME_LEN] {
        let mut buf = [0u8; SBUS_FRAME_LEN];
        buf[0] = SBUS_HEADER;

        // LSB-first bit stream, 11 bits per channel.
        let mut acc: u32 = 0;
        let mut bits = 0;
        let mut out = 1;
        for &value in &self.channels {
            acc |= ((value & CHANNEL_MASK) as u32) << bits;
            bits += CHANNEL_BITS;
            while bits >= 8 {
                buf[out] = acc as u8;
                out += 1;
                acc >>= 8;
                bits -= 8;
            }
        }

        let mut flags = 0u8;
        if self.channel_17 {
            flags |= SBUS_FLAG_CH17;
        }
        if self.channel_18 {
            flags |= SBUS_FLAG_CH18;
        }
        if self.frame_lost {
            flags |= SBUS_FLAG_FRAME_LOST;
        }
        if self.failsafe {
            flags |= SBUS_FLAG_FAILSAFE;
        }
        buf[SBUS_FRAME_LEN - 2] = flags;
        buf[SBUS_FRAME_LEN - 1] = SBUS_FOOTER;
        buf
    }
}
