//! Task index: the per-instance integer handed out by the scheduler.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Value Grid Engine puts in `SGE_TASK_ID` when the job is not an array job.
const UNDEFINED_MARKER: &str = "undefined";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("task index variable {0} is not set")]
    Missing(String),

    #[error("task index is empty")]
    Empty,

    #[error("task index is undefined (job was not submitted as an array job)")]
    Undefined,

    #[error("task index must be >= 1")]
    Zero,

    #[error("task index is not a number: {0:?}")]
    Invalid(String),
}

/// One array task index (always >= 1).
///
/// The launcher never looks inside the value. It is parsed once, rendered in
/// decimal as the program's argument, and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TaskIndex(NonZeroU32);

impl TaskIndex {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Parse the raw value of the scheduler's task variable.
    pub fn parse(raw: &str) -> Result<Self, IndexError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(IndexError::Empty);
        }
        if raw.eq_ignore_ascii_case(UNDEFINED_MARKER) {
            return Err(IndexError::Undefined);
        }
        let value: u32 = raw
            .parse()
            .map_err(|_| IndexError::Invalid(raw.to_string()))?;
        Self::new(value).ok_or(IndexError::Zero)
    }
}

impl FromStr for TaskIndex {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<u32> for TaskIndex {
    type Error = IndexError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(IndexError::Zero)
    }
}

impl From<TaskIndex> for u32 {
    fn from(index: TaskIndex) -> Self {
        index.get()
    }
}

impl fmt::Display for TaskIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", 1)]
    #[case("576", 576)]
    #[case(" 42\n", 42)]
    fn parses_scheduler_values(#[case] raw: &str, #[case] expected: u32) {
        let index = TaskIndex::parse(raw).unwrap();
        assert_eq!(index.get(), expected);
        assert_eq!(index.to_string(), expected.to_string());
    }

    #[rstest]
    #[case::empty("", IndexError::Empty)]
    #[case::blank("   ", IndexError::Empty)]
    #[case::undefined("undefined", IndexError::Undefined)]
    #[case::zero("0", IndexError::Zero)]
    #[case::negative("-3", IndexError::Invalid("-3".to_string()))]
    #[case::text("abc", IndexError::Invalid("abc".to_string()))]
    fn rejects_bad_values(#[case] raw: &str, #[case] expected: IndexError) {
        assert_eq!(TaskIndex::parse(raw).unwrap_err(), expected);
    }

    #[test]
    fn zero_is_not_a_task_index() {
        assert!(TaskIndex::new(0).is_none());
        assert!(TaskIndex::try_from(0).is_err());
    }
}
