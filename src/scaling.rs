//! Wire scaling for temperature registers.
//!
//! The heater transmits every temperature as a signed 16-bit integer in tenths
//! of a degree Celsius. Registers travel as `u16`, so the sign is recovered by
//! reinterpreting the raw word as `i16`.

/// Raw register units per degree Celsius.
pub const TENTHS_PER_DEGREE: f64 = 10.0;

/// Absorbs binary representation error before truncating, so that values
/// decoded by [`raw_to_celsius`] encode back to the same word.
const REPRESENTATION_SLACK: f64 = 1e-9;

/// Convert a raw register value into degrees Celsius.
#[inline]
pub fn raw_to_celsius(raw: u16) -> f64 {
    f64::from(raw as i16) / TENTHS_PER_DEGREE
}

/// Convert degrees Celsius into a raw register value.
///
/// Sub-tenth precision is truncated toward zero. Values beyond the `i16` range
/// saturate.
#[inline]
pub fn celsius_to_raw(celsius: f64) -> u16 {
    let tenths = celsius * TENTHS_PER_DEGREE;
    let tenths = tenths + tenths.signum() * REPRESENTATION_SLACK;
    tenths.trunc() as i16 as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_temperature() {
        assert_eq!(raw_to_celsius(215), 21.5);
        assert_eq!(celsius_to_raw(21.5), 215);
    }

    #[test]
    fn test_negative_temperature() {
        // -7.5°C is transmitted as the two's complement of -75.
        let raw = (-75i16) as u16;
        assert_eq!(raw, 0xFFB5);
        assert_eq!(raw_to_celsius(raw), -7.5);
        assert_eq!(celsius_to_raw(-7.5), raw);
    }

    #[test]
    fn test_truncates_sub_tenths() {
        assert_eq!(celsius_to_raw(22.57), 225);
        assert_eq!(celsius_to_raw(22.5), 225);
        assert_eq!(celsius_to_raw(-0.19), (-1i16) as u16);
        assert_eq!(celsius_to_raw(0.0), 0);
    }

    #[test]
    fn test_saturates_out_of_range() {
        assert_eq!(celsius_to_raw(5000.0), i16::MAX as u16);
        assert_eq!(celsius_to_raw(-5000.0), i16::MIN as u16);
    }

    #[test]
    fn test_every_raw_value_round_trips() {
        for raw in u16::MIN..=u16::MAX {
            assert_eq!(celsius_to_raw(raw_to_celsius(raw)), raw, "raw {raw}");
        }
    }
}
