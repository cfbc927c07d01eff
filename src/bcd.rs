//! Binary-coded decimal helpers for the DS1302 register file.
//!
//! All timekeeping registers hold two packed decimal digits, one per nibble.
//! Control bits sharing a register (clock-halt, 12-hour mode, AM/PM) must be
//! masked off by the caller before decoding.

/// Swap format from bcd to decimal.
///
/// Nibbles above 9 decode to an out-of-range but well-defined value;
/// an uninitialized chip can return such bytes.
pub(crate) fn bcd_to_decimal(bcd: u8) -> u8 {
    ((bcd & 0xF0) >> 4) * 10 + (bcd & 0x0F)
}

/// Swap format from decimal to bcd. Inverse of [`bcd_to_decimal`] for 0..=99.
pub(crate) fn decimal_to_bcd(decimal: u8) -> u8 {
    ((decimal / 10) << 4) + (decimal % 10)
}

/// Decode the hour register into 0..=23.
///
/// The register is mode-overloaded: with bit 7 set the chip runs in 12-hour
/// format and bit 5 is the AM/PM flag, with bit 7 clear it runs in 24-hour
/// format and bits 5-4 are the BCD tens digit. Both interpretations share
/// the low nibble as the ones digit.
pub(crate) fn hour_from_register(value: u8) -> u8 {
    let adj = if value & 0x80 != 0 {
        // 12-hour mode, PM adds twelve
        12 * ((value & 0x20) >> 5)
    } else {
        // 24-hour mode, plain BCD tens digit
        10 * ((value & 0x30) >> 4)
    };
    (value & 0x0F) + adj
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcd_round_trip() {
        for v in 0..=99u8 {
            assert_eq!(bcd_to_decimal(decimal_to_bcd(v)), v);
        }
    }

    #[test]
    fn bcd_inverse_on_valid_nibbles() {
        for tens in 0..=9u8 {
            for ones in 0..=9u8 {
                let b = (tens << 4) | ones;
                assert_eq!(decimal_to_bcd(bcd_to_decimal(b)), b);
            }
        }
    }

    #[test]
    fn hour_register_24h() {
        assert_eq!(hour_from_register(0x00), 0);
        assert_eq!(hour_from_register(0x09), 9);
        assert_eq!(hour_from_register(0x12), 12);
        assert_eq!(hour_from_register(0x23), 23);
    }

    #[test]
    fn hour_register_12h() {
        // bit 7 selects 12-hour mode, bit 5 is the PM flag
        assert_eq!(hour_from_register(0x92), 2);
        assert_eq!(hour_from_register(0xB2), 14);
        assert_eq!(hour_from_register(0x8C), 12); // noise in the low nibble stays defined
    }
}
