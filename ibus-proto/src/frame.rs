//! IBus wire frame and checksum.

/// Total IBus frame length on the wire.
pub const IBUS_FRAME_LEN: usize = 32;

/// Header and channel bytes, i.e. everything covered by the checksum.
pub const IBUS_FRAME_LEN_MINUS_CHECKSUM: usize = 30;

/// Channel slots carried by one frame.
pub const IBUS_NUM_CHANNELS: usize = 14;

/// First header byte (frame length, 0x20 = 32).
pub const IBUS_HEADER_0: u8 = 0x20;

/// Second header byte (command: servo data).
pub const IBUS_HEADER_1: u8 = 0x40;

/// IBus checksum of the given bytes: `0xFFFF - sum(bytes)`, wrapping.
#[inline]
#[must_use]
pub fn checksum_of(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0xFFFFu16, |acc, &b| acc.wrapping_sub(b as u16))
}

/// All 14 channel slots of one IBus servo frame.
///
/// Used to produce frames (simulators, loopback tests); the receiver side
/// only keeps the first ten slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IbusFrame {
    pub channels: [u16; IBUS_NUM_CHANNELS],
}

impl IbusFrame {
    /// Frame with every slot set to the same value.
    #[must_use]
    pub const fn uniform(value: u16) -> Self {
        Self {
            channels: [value; IBUS_NUM_CHANNELS],
        }
    }

    /// Serialize to the 32-byte wire form, checksum included.
    #[must_use]
    pub fn encode(&self) -> [u8; IBUS_FRAME_LEN] {
        let mut buf = [0u8; IBUS_FRAME_LEN];
        buf[0] = IBUS_HEADER_0;
        buf[1] = IBUS_HEADER_1;

        for (slot, value) in buf[2..IBUS_FRAME_LEN_MINUS_CHECKSUM]
            .chunks_exact_mut(2)
            .zip(self.channels.iter())
        {
            slot.copy_from_slice(&value.to_le_bytes());
        }

        let checksum = checksum_of(&buf[..IBUS_FRAME_LEN_MINUS_CHECKSUM]);
        buf[IBUS_FRAME_LEN_MINUS_CHECKSUM..].copy_from_slice(&checksum.to_le_bytes());
        buf
    }
}
