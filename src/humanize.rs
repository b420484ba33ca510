//! Human-readable duration formatting and parsing utilities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid duration format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),
}

/// Millisecond duration wrapper with human-readable parsing ("250ms", "30s", "2m")
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Millis(pub u64);

impl Millis {
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.0)
    }

    pub fn to_human_readable(&self) -> String {
        const UNITS: &[(&str, u64)] = &[
            ("ms", 1),
            ("s", 1000),
            ("m", 60 * 1000),
            ("h", 60 * 60 * 1000),
        ];

        for &(unit, divisor) in UNITS.iter().rev() {
            if self.0 >= divisor && self.0 % divisor == 0 {
                return format!("{}{}", self.0 / divisor, unit);
            }
        }

        format!("{}ms", self.0)
    }
}

impl From<Millis> for Duration {
    fn from(value: Millis) -> Self {
        value.as_duration()
    }
}

impl<'de> Deserialize<'de> for Millis {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct MillisVisitor;

        impl<'de> serde::de::Visitor<'de> for MillisVisitor {
            type Value = Millis;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str(
                    "a duration as string (e.g., \"30s\", \"250ms\") or integer milliseconds",
                )
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Millis(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(v)
                    .map(Millis)
                    .map_err(|_| serde::de::Error::custom("duration must be non-negative"))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse::<Millis>().map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_any(MillisVisitor)
    }
}

impl FromStr for Millis {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        // Try to parse as plain milliseconds first
        if let Ok(num) = s.parse::<u64>() {
            return Ok(Millis(num));
        }

        // Parse with unit suffix
        let (num_str, unit) = if let Some(pos) = s.find(|c: char| !c.is_ascii_digit()) {
            (&s[..pos], &s[pos..])
        } else {
            return Err(ParseError::InvalidFormat(s.to_string()));
        };

        let num: u64 = num_str.parse()?;

        let multiplier = match unit.trim() {
            "ms" => 1,
            "s" | "sec" => 1000,
            "m" | "min" => 60 * 1000,
            "h" => 60 * 60 * 1000,
            _ => return Err(ParseError::InvalidUnit(unit.to_string())),
        };

        Ok(Millis(num * multiplier))
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_human_readable())
    }
}

/// Compact elapsed/ETA formatting for the progress line ("42.3s", "3m:05s")
pub fn format_compact(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        return format!("{:.1}s", secs);
    }
    let mins = (secs / 60.0).floor() as u64;
    let rem = (secs % 60.0).floor() as u64;
    format!("{}m:{:02}s", mins, rem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_millis() {
        assert_eq!("250".parse::<Millis>().unwrap().as_u64(), 250);
        assert_eq!("250ms".parse::<Millis>().unwrap().as_u64(), 250);
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!("30s".parse::<Millis>().unwrap().as_u64(), 30_000);
        assert_eq!("30sec".parse::<Millis>().unwrap().as_u64(), 30_000);
    }

    #[test]
    fn test_parse_minutes_and_hours() {
        assert_eq!("2m".parse::<Millis>().unwrap().as_u64(), 120_000);
        assert_eq!("1h".parse::<Millis>().unwrap().as_u64(), 3_600_000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("30parsecs".parse::<Millis>().is_err());
        assert!("".parse::<Millis>().is_err());
    }

    #[test]
    fn test_to_human_readable() {
        assert_eq!(Millis(250).to_human_readable(), "250ms");
        assert_eq!(Millis(30_000).to_human_readable(), "30s");
        assert_eq!(Millis(120_000).to_human_readable(), "2m");
        assert_eq!(Millis(90_000).to_human_readable(), "90s");
    }

    #[test]
    fn test_deserialize_string() {
        let json = r#"{"timeout": "15s"}"#;
        #[derive(Deserialize)]
        struct TestStruct {
            timeout: Millis,
        }
        let parsed: TestStruct = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.timeout.as_u64(), 15_000);
    }

    #[test]
    fn test_deserialize_number() {
        let json = r#"{"timeout": 5000}"#;
        #[derive(Deserialize)]
        struct TestStruct {
            timeout: Millis,
        }
        let parsed: TestStruct = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.timeout.as_u64(), 5000);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Millis(5000)), "5s");
        assert_eq!(format!("{}", Millis(1500)), "1500ms");
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(Duration::from_secs_f64(42.31)), "42.3s");
        assert_eq!(format_compact(Duration::from_secs(185)), "3m:05s");
        assert_eq!(format_compact(Duration::ZERO), "0.0s");
    }
}
