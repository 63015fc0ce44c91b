//! Formatting and conversion helpers for frequencies.

/// Format a frequency in hertz as a human-readable MHz string.
///
/// # Example
///
/// ```
/// use sdrrig_core::format_freq_mhz;
///
/// assert_eq!(format_freq_mhz(14_074_000.0), "14.074000 MHz");
/// assert_eq!(format_freq_mhz(432_100_000.0), "432.100000 MHz");
/// ```
pub fn format_freq_mhz(freq_hz: f64) -> String {
    let mhz = freq_hz / 1_000_000.0;
    format!("{mhz:.6} MHz")
}

/// Convert a chain-reported frequency to the integer hertz sent on the wire.
///
/// Fractional hertz are truncated. Returns `None` for negative or
/// non-finite values, which no real chain should report.
///
/// # Example
///
/// ```
/// use sdrrig_core::hz_to_wire;
///
/// assert_eq!(hz_to_wire(7_074_000.9), Some(7_074_000));
/// assert_eq!(hz_to_wire(-1.0), None);
/// ```
pub fn hz_to_wire(freq_hz: f64) -> Option<u64> {
    if freq_hz.is_finite() && freq_hz >= 0.0 {
        Some(freq_hz.trunc() as u64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_freq_mhz_hf() {
        assert_eq!(format_freq_mhz(14_074_000.0), "14.074000 MHz");
        assert_eq!(format_freq_mhz(7_074_000.0), "7.074000 MHz");
    }

    #[test]
    fn format_freq_mhz_zero() {
        assert_eq!(format_freq_mhz(0.0), "0.000000 MHz");
    }

    #[test]
    fn hz_to_wire_truncates() {
        assert_eq!(hz_to_wire(14_074_000.0), Some(14_074_000));
        assert_eq!(hz_to_wire(0.999), Some(0));
    }

    #[test]
    fn hz_to_wire_rejects_bad_values() {
        assert_eq!(hz_to_wire(f64::NAN), None);
        assert_eq!(hz_to_wire(f64::INFINITY), None);
        assert_eq!(hz_to_wire(-0.5), None);
    }
}
