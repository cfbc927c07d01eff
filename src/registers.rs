//! DS1302 register map and command-byte encoding.
//!
//! Every transfer starts with one command byte: bit 7 is always set, bit 6
//! selects RAM over the clock registers, bits 5-1 carry the register number
//! and bit 0 selects read (1) or write (0). The two all-ones register
//! patterns are reserved for burst transfers covering the whole clock
//! register block or the whole RAM block in a single session.

/// Clock and control registers, in chip address order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    Seconds = 0,
    Minutes = 1,
    Hours = 2,
    Date = 3,
    Month = 4,
    Weekday = 5,
    Year = 6,
    WriteProtect = 7,
}

/// Trickle-charge control, outside the clock-burst block.
pub(crate) const TRICKLE_CHARGER_REG: u8 = 8;

/// The RAM register space follows the clock register space.
pub(crate) const RAM_REGISTER_OFFSET: u8 = 32;
/// 31 x 8 bits of battery-backed static RAM.
pub(crate) const RAM_SIZE: u8 = 31;

/// Clock burst, register pattern 0b11111.
pub(crate) const CLOCK_BURST_READ: u8 = 0xBF;
pub(crate) const CLOCK_BURST_WRITE: u8 = 0xBE;
/// RAM burst, register pattern 0b111111.
pub(crate) const RAM_BURST_READ: u8 = 0xFF;
pub(crate) const RAM_BURST_WRITE: u8 = 0xFE;

/// Bit 7 of the seconds register stops the oscillator.
pub(crate) const CLOCK_HALT: u8 = 0x80;
/// Bit 7 of the write-protect register gates all writes.
pub(crate) const WRITE_PROTECT: u8 = 0x80;

pub(crate) fn read_command(reg: u8) -> u8 {
    0x81 | (reg << 1)
}

pub(crate) fn write_command(reg: u8) -> u8 {
    0x80 | (reg << 1)
}

/// Diode drop selection for the trickle charger.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ds {
    /// One diode, 0.7 V drop.
    One = 0b01,
    /// Two diodes, 1.4 V drop.
    Two = 0b10,
}

/// Series resistor selection for the trickle charger.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rs {
    R2k = 0b01,
    R4k = 0b10,
    R8k = 0b11,
}

/// Trickle-charge register codec. The charger only runs while the top
/// nibble holds the 1010 enable pattern; the datasheet disable pattern
/// additionally forces invalid diode/resistor selects.
pub(crate) struct TrickleCharger(u8);

const TCS_ENABLE_PATTERN: u8 = 0xA0;
const TCS_DISABLE_PATTERN: u8 = 0x5C;

impl TrickleCharger {
    pub(crate) fn enable(ds: Ds, rs: Rs) -> u8 {
        TCS_ENABLE_PATTERN | ((ds as u8) << 2) | rs as u8
    }

    pub(crate) fn disable() -> u8 {
        TCS_DISABLE_PATTERN
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.0 & 0xF0 == TCS_ENABLE_PATTERN
    }

    /// Decode into (enabled, diode select, resistor select). The selects
    /// come back as `None` when the register holds a reserved pattern.
    pub(crate) fn get(&self) -> (bool, Option<Ds>, Option<Rs>) {
        let ds = match (self.0 >> 2) & 0b11 {
            0b01 => Some(Ds::One),
            0b10 => Some(Ds::Two),
            _ => None,
        };
        let rs = match self.0 & 0b11 {
            0b01 => Some(Rs::R2k),
            0b10 => Some(Rs::R4k),
            0b11 => Some(Rs::R8k),
            _ => None,
        };
        (self.is_enabled(), ds, rs)
    }
}

impl From<u8> for TrickleCharger {
    fn from(byte: u8) -> Self {
        TrickleCharger(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_bytes() {
        assert_eq!(read_command(Register::Seconds as u8), 0x81);
        assert_eq!(write_command(Register::Seconds as u8), 0x80);
        assert_eq!(read_command(Register::Year as u8), 0x8D);
        assert_eq!(write_command(Register::WriteProtect as u8), 0x8E);
    }

    #[test]
    fn ram_command_bytes() {
        assert_eq!(read_command(RAM_REGISTER_OFFSET), 0xC1);
        assert_eq!(write_command(RAM_REGISTER_OFFSET + 30), 0xFC);
    }

    #[test]
    fn burst_opcodes_are_reserved_patterns() {
        assert_eq!(read_command(0b11111), CLOCK_BURST_READ);
        assert_eq!(write_command(0b11111), CLOCK_BURST_WRITE);
        assert_eq!(read_command(0b111111), RAM_BURST_READ);
        assert_eq!(write_command(0b111111), RAM_BURST_WRITE);
    }

    #[test]
    fn trickle_charger_codec() {
        assert_eq!(TrickleCharger::enable(Ds::One, Rs::R2k), 0xA5);
        assert_eq!(TrickleCharger::enable(Ds::Two, Rs::R8k), 0xAB);
        assert!(!TrickleCharger::from(TrickleCharger::disable()).is_enabled());

        let (on, ds, rs) = TrickleCharger::from(0xA9).get();
        assert!(on);
        assert_eq!(ds, Some(Ds::Two));
        assert_eq!(rs, Some(Rs::R2k));

        let (on, ds, _) = TrickleCharger::from(0x5C).get();
        assert!(!on);
        assert_eq!(ds, None);
    }
}
