//! Array range: the `-t first-last:step` declaration of an array job.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::index::TaskIndex;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("array job must contain at least one task")]
    Empty,

    #[error("array range must start at 1 or later")]
    ZeroStart,

    #[error("array step must be >= 1")]
    ZeroStep,

    #[error("array range starts after it ends ({first} > {last})")]
    FirstAfterLast { first: u32, last: u32 },

    #[error("array job of {0} tasks does not fit a task index")]
    TooLarge(usize),

    #[error("malformed array range {0:?} (expected first-last[:step])")]
    Malformed(String),
}

/// Inclusive range of task indices with a step, as the scheduler sees it.
///
/// Invariant: `1 <= first <= last`, `step >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArrayRange {
    first: u32,
    last: u32,
    step: u32,
}

impl ArrayRange {
    pub fn new(first: u32, last: u32, step: u32) -> Result<Self, RangeError> {
        if first == 0 {
            return Err(RangeError::ZeroStart);
        }
        if step == 0 {
            return Err(RangeError::ZeroStep);
        }
        if first > last {
            return Err(RangeError::FirstAfterLast { first, last });
        }
        Ok(Self { first, last, step })
    }

    /// `1-count:1`, one task per input item.
    pub fn covering(count: usize) -> Result<Self, RangeError> {
        if count == 0 {
            return Err(RangeError::Empty);
        }
        let last = u32::try_from(count).map_err(|_| RangeError::TooLarge(count))?;
        Self::new(1, last, 1)
    }

    pub fn first(&self) -> u32 {
        self.first
    }

    pub fn last(&self) -> u32 {
        self.last
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn contains(&self, index: TaskIndex) -> bool {
        let i = index.get();
        i >= self.first && i <= self.last && (i - self.first) % self.step == 0
    }

    /// Number of tasks the scheduler will start.
    pub fn len(&self) -> usize {
        ((self.last - self.first) / self.step) as usize + 1
    }

    /// Never true; an empty range cannot be constructed.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = TaskIndex> + '_ {
        (self.first..=self.last)
            .step_by(self.step as usize)
            .filter_map(TaskIndex::new)
    }
}

impl fmt::Display for ArrayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}:{}", self.first, self.last, self.step)
    }
}

impl FromStr for ArrayRange {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || RangeError::Malformed(s.to_string());
        let number = |part: &str| part.trim().parse::<u32>().map_err(|_| malformed());

        let (span, step) = match s.split_once(':') {
            Some((span, step)) => (span, number(step)?),
            None => (s, 1),
        };
        let (first, last) = match span.split_once('-') {
            Some((first, last)) => (number(first)?, number(last)?),
            None => {
                let single = number(span)?;
                (single, single)
            }
        };
        Self::new(first, last, step)
    }
}

impl TryFrom<String> for ArrayRange {
    type Error = RangeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArrayRange> for String {
    fn from(range: ArrayRange) -> Self {
        range.to_string()
    }
}
