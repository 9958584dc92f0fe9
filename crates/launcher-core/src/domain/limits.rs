//! Wall-clock limits (`-l s_rt=...,h_rt=...`).
//!
//! These are declared metadata only. The scheduler enforces them; the
//! launcher never times anything out.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WallClockError {
    #[error("malformed wall-clock limit {0:?} (expected HH:MM:SS or seconds)")]
    Malformed(String),

    #[error("minutes and seconds must be below 60 in {0:?}")]
    OutOfRange(String),

    #[error("wall-clock limit {0:?} is too large")]
    TooLarge(String),

    #[error("soft wall-clock limit {soft} exceeds hard limit {hard}")]
    SoftExceedsHard { soft: WallClock, hard: WallClock },
}

/// A wall-clock duration in whole seconds, written `HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WallClock(u64);

impl WallClock {
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / 3600;
        let minutes = (self.0 % 3600) / 60;
        let seconds = self.0 % 60;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
    }
}

impl FromStr for WallClock {
    type Err = WallClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let malformed = || WallClockError::Malformed(s.to_string());

        let parts: Vec<&str> = raw.split(':').collect();
        let numbers = parts
            .iter()
            .map(|p| p.parse::<u64>().map_err(|_| malformed()))
            .collect::<Result<Vec<u64>, _>>()?;

        let secs = match numbers.as_slice() {
            [secs] => *secs,
            [hours, minutes, seconds] => {
                if *minutes >= 60 || *seconds >= 60 {
                    return Err(WallClockError::OutOfRange(s.to_string()));
                }
                hours
                    .checked_mul(3600)
                    .and_then(|secs| secs.checked_add(minutes * 60 + seconds))
                    .ok_or_else(|| WallClockError::TooLarge(s.to_string()))?
            }
            _ => return Err(malformed()),
        };
        Ok(Self(secs))
    }
}

impl TryFrom<String> for WallClock {
    type Error = WallClockError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WallClock> for String {
    fn from(value: WallClock) -> Self {
        value.to_string()
    }
}

/// Soft and hard run-time limits of every task in the array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallClockLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft: Option<WallClock>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hard: Option<WallClock>,
}

impl WallClockLimits {
    pub fn validate(&self) -> Result<(), WallClockError> {
        if let (Some(soft), Some(hard)) = (self.soft, self.hard)
            && soft > hard
        {
            return Err(WallClockError::SoftExceedsHard { soft, hard });
        }
        Ok(())
    }

    /// Resource request as written after `-l`, or `None` when no limit is set.
    pub fn resource_request(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(soft) = self.soft {
            parts.push(format!("s_rt={soft}"));
        }
        if let Some(hard) = self.hard {
            parts.push(format!("h_rt={hard}"));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("00:30:00", 1800)]
    #[case("02:00:00", 7200)]
    #[case("48:00:00", 172_800)]
    #[case("90", 90)]
    fn parses_limits(#[case] raw: &str, #[case] secs: u64) {
        let limit: WallClock = raw.parse().unwrap();
        assert_eq!(limit, WallClock::from_secs(secs));
    }

    #[test]
    fn renders_as_hh_mm_ss() {
        assert_eq!(WallClock::from_secs(3661).to_string(), "01:01:01");
        assert_eq!(WallClock::from_secs(172_800).to_string(), "48:00:00");
    }

    #[rstest]
    #[case("1:2")]
    #[case("aa:00:00")]
    #[case("")]
    fn rejects_malformed(#[case] raw: &str) {
        assert!(matches!(
            raw.parse::<WallClock>(),
            Err(WallClockError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_sixty_minutes() {
        assert!(matches!(
            "01:60:00".parse::<WallClock>(),
            Err(WallClockError::OutOfRange(_))
        ));
    }

    #[rstest]
    #[case("6000000000000000:00:00")]
    #[case("5124095576030431:59:59")]
    fn rejects_hours_past_the_counter(#[case] raw: &str) {
        assert_eq!(
            raw.parse::<WallClock>(),
            Err(WallClockError::TooLarge(raw.to_string()))
        );
    }

    #[test]
    fn largest_representable_limit_parses() {
        let limit: WallClock = "5124095576030431:00:15".parse().unwrap();
        assert_eq!(limit, WallClock::from_secs(u64::MAX));
    }

    #[test]
    fn soft_limit_must_not_exceed_hard_limit() {
        let limits = WallClockLimits {
            soft: Some(WallClock::from_secs(7200)),
            hard: Some(WallClock::from_secs(3600)),
        };
        assert!(matches!(
            limits.validate(),
            Err(WallClockError::SoftExceedsHard { .. })
        ));
    }

    #[test]
    fn resource_request_lists_present_limits() {
        let limits = WallClockLimits {
            soft: Some(WallClock::from_secs(6600)),
            hard: Some(WallClock::from_secs(7200)),
        };
        assert_eq!(
            limits.resource_request().as_deref(),
            Some("s_rt=01:50:00,h_rt=02:00:00")
        );

        let hard_only = WallClockLimits {
            soft: None,
            hard: Some(WallClock::from_secs(60)),
        };
        assert_eq!(hard_only.resource_request().as_deref(), Some("h_rt=00:01:00"));
        assert_eq!(WallClockLimits::default().resource_request(), None);
    }
}
