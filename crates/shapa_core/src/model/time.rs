//! Stream-relative time stamps.
//!
//! # Invariants
//! - A `TimeStamp` is never negative.
//! - Text form is `HH:MM:SS:mmm`; hours may exceed two digits.

use super::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;

/// Millisecond offset from the start of the observed stream.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct TimeStamp(i64);

impl TimeStamp {
    pub const ZERO: TimeStamp = TimeStamp(0);

    /// Creates a time stamp from milliseconds.
    ///
    /// # Errors
    /// - `NegativeTimeStamp` when `millis < 0`.
    pub fn from_millis(millis: i64) -> Result<Self, ValidationError> {
        if millis < 0 {
            return Err(ValidationError::NegativeTimeStamp(millis));
        }
        Ok(Self(millis))
    }

    pub fn millis(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for TimeStamp {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_millis(value)
    }
}

impl From<TimeStamp> for i64 {
    fn from(value: TimeStamp) -> Self {
        value.0
    }
}

impl Display for TimeStamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let hours = self.0 / MS_PER_HOUR;
        let minutes = (self.0 % MS_PER_HOUR) / MS_PER_MINUTE;
        let seconds = (self.0 % MS_PER_MINUTE) / MS_PER_SECOND;
        let millis = self.0 % MS_PER_SECOND;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}:{millis:03}")
    }
}

impl FromStr for TimeStamp {
    type Err = ValidationError;

    /// Accepts `HH:MM:SS:mmm` or a bare millisecond count.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let invalid = || ValidationError::InvalidValue(format!("invalid time stamp `{trimmed}`"));

        if !trimmed.contains(':') {
            let millis = trimmed.parse::<i64>().map_err(|_| invalid())?;
            return Self::from_millis(millis);
        }

        let parts = trimmed.split(':').collect::<Vec<_>>();
        if parts.len() != 4 {
            return Err(invalid());
        }
        let mut fields = [0_i64; 4];
        for (slot, part) in fields.iter_mut().zip(parts.iter()) {
            if part.is_empty() || !part.chars().all(|ch| ch.is_ascii_digit()) {
                return Err(invalid());
            }
            *slot = part.parse::<i64>().map_err(|_| invalid())?;
        }
        let [hours, minutes, seconds, millis] = fields;
        if minutes >= 60 || seconds >= 60 || millis >= MS_PER_SECOND {
            return Err(invalid());
        }

        hours
            .checked_mul(MS_PER_HOUR)
            .and_then(|total| total.checked_add(minutes * MS_PER_MINUTE))
            .and_then(|total| total.checked_add(seconds * MS_PER_SECOND + millis))
            .ok_or_else(invalid)
            .and_then(Self::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::TimeStamp;

    #[test]
    fn display_uses_clock_layout() {
        let ts = TimeStamp::from_millis(3_723_004).unwrap();
        assert_eq!(ts.to_string(), "01:02:03:004");
        assert_eq!(TimeStamp::ZERO.to_string(), "00:00:00:000");
    }

    #[test]
    fn parse_accepts_clock_and_plain_millis() {
        assert_eq!(
            "01:02:03:004".parse::<TimeStamp>().unwrap().millis(),
            3_723_004
        );
        assert_eq!(" 1500 ".parse::<TimeStamp>().unwrap().millis(), 1_500);
    }

    #[test]
    fn parse_rejects_bad_fields_and_negative_values() {
        assert!("00:61:00:000".parse::<TimeStamp>().is_err());
        assert!("00:00:00".parse::<TimeStamp>().is_err());
        assert!("-5".parse::<TimeStamp>().is_err());
        assert!("00:-1:00:000".parse::<TimeStamp>().is_err());
    }

    #[test]
    fn negative_millis_are_rejected() {
        assert!(TimeStamp::from_millis(-1).is_err());
    }
}
