// ── Human-readable sizes ──────────────────────────────────────────────────────
//
// "0 Bytes", "1 Byte", "1.00 KiB", "12.34 MB".  All sizes are `u64` bytes;
// floating point is only used for the scaled value at the display boundary.

use serde::{Deserialize, Serialize};

/// Unit system for scaled sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Units {
    /// Powers of 1024, labelled `KiB`, `MiB`, …
    #[default]
    Binary,
    /// Powers of 1000, labelled `KB`, `MB`, …
    Decimal,
}

// Anything that is not "binary" selects decimal units.
impl From<String> for Units {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(Self::Decimal)
    }
}

impl std::str::FromStr for Units {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == "binary" {
            Self::Binary
        } else {
            Self::Decimal
        })
    }
}

impl Units {
    pub fn divisor(self) -> u64 {
        match self {
            Self::Binary => 1024,
            Self::Decimal => 1000,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::Binary => "iB",
            Self::Decimal => "B",
        }
    }
}

const PREFIXES: [char; 8] = ['K', 'M', 'G', 'T', 'P', 'E', 'Z', 'Y'];

/// Format an optional byte count; `None` stays `None`.
pub fn file_size_str(size: Option<u64>, units: Units) -> Option<String> {
    size.map(|s| format_size(s, units))
}

/// Format a byte count.
///
/// Below one divisor the exact count is shown.  Above it, the value is
/// divided until it drops below the divisor (or the prefixes run out) and
/// printed with two decimal places.
pub fn format_size(size: u64, units: Units) -> String {
    let divisor = units.divisor();
    if size < divisor {
        let noun = if size == 1 { "Byte" } else { "Bytes" };
        return format!("{size} {noun}");
    }

    let divisor = divisor as f64;
    let mut value = size as f64;
    let mut prefix = PREFIXES[0];
    for p in PREFIXES {
        value /= divisor;
        prefix = p;
        if value < divisor {
            break;
        }
    }
    format!("{value:.2} {prefix}{}", units.suffix())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn suffix(s: &str) -> &str {
        s.rsplit(' ').next().unwrap_or_default()
    }

    #[test]
    fn absent_stays_absent() {
        assert_eq!(file_size_str(None, Units::Binary), None);
    }

    #[test]
    fn plain_bytes() {
        assert_eq!(format_size(0, Units::Binary), "0 Bytes");
        assert_eq!(format_size(1, Units::Binary), "1 Byte");
        assert_eq!(format_size(2, Units::Decimal), "2 Bytes");
        assert_eq!(format_size(1023, Units::Binary), "1023 Bytes");
        assert_eq!(format_size(999, Units::Decimal), "999 Bytes");
    }

    #[test]
    fn first_scaled_unit() {
        assert_eq!(format_size(1024, Units::Binary), "1.00 KiB");
        assert_eq!(format_size(1000, Units::Decimal), "1.00 KB");
        assert_eq!(format_size(1000, Units::Binary), "1000 Bytes");
        assert_eq!(format_size(1536, Units::Binary), "1.50 KiB");
    }

    #[test]
    fn two_decimal_places_not_significant_figures() {
        assert_eq!(format_size(12_346, Units::Decimal), "12.35 KB");
        assert_eq!(format_size(999_999, Units::Decimal), "1000.00 KB");
        assert_eq!(format_size(123_456_789, Units::Decimal), "123.46 MB");
    }

    #[test]
    fn unit_advances_at_powers_of_the_divisor() {
        for units in [Units::Binary, Units::Decimal] {
            let d = units.divisor();
            let mut power = d;
            // Stop at P: beyond 2^53 `power - 1` is no longer exact as f64.
            for (i, p) in PREFIXES.iter().take(5).enumerate() {
                let at = format_size(power, units);
                assert_eq!(at, format!("1.00 {p}{}", units.suffix()));
                if i > 0 {
                    let below = format_size(power - 1, units);
                    assert_eq!(suffix(&below), format!("{}{}", PREFIXES[i - 1], units.suffix()));
                }
                power *= d;
            }
        }
    }

    #[test]
    fn largest_u64_is_exabytes() {
        assert_eq!(format_size(u64::MAX, Units::Binary), "16.00 EiB");
        assert_eq!(format_size(u64::MAX, Units::Decimal), "18.45 EB");
    }

    #[test]
    fn units_from_settings_strings() {
        assert_eq!(Units::from("binary".to_owned()), Units::Binary);
        assert_eq!(Units::from("decimal".to_owned()), Units::Decimal);
        assert_eq!(Units::from("metric".to_owned()), Units::Decimal);
        let u: Units = serde_json::from_str("\"binary\"").unwrap();
        assert_eq!(u, Units::Binary);
        assert_eq!(serde_json::to_string(&Units::Decimal).unwrap(), "\"decimal\"");
    }
}
