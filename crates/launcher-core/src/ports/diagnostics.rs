//! DiagnosticSink port - the launcher's own two log lines
//!
//! Separate from `tracing`: these lines are part of the job's output
//! contract (one before the program, one after), while tracing output is
//! operator-facing and filtered by `RUST_LOG`.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{LaunchError, TaskContext, TaskIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Started,
    Finished,
}

/// One diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub phase: Phase,
    pub job_id: String,
    pub job_name: String,
    pub task: TaskIndex,
    pub user: String,
    pub at: DateTime<Utc>,

    /// Only on `Finished`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl Diagnostic {
    pub fn started(ctx: &TaskContext, job_name: &str, at: DateTime<Utc>) -> Self {
        Self {
            phase: Phase::Started,
            job_id: ctx.job_id.clone(),
            job_name: job_name.to_string(),
            task: ctx.task,
            user: ctx.user.clone(),
            at,
            exit_code: None,
        }
    }

    pub fn finished(ctx: &TaskContext, job_name: &str, exit_code: i32, at: DateTime<Utc>) -> Self {
        Self {
            phase: Phase::Finished,
            exit_code: Some(exit_code),
            ..Self::started(ctx, job_name, at)
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = self.at.to_rfc3339_opts(SecondsFormat::Secs, true);
        match self.phase {
            Phase::Started => write!(
                f,
                "[{at}] started job {} ({}.{}) as {}",
                self.job_name, self.job_id, self.task, self.user
            ),
            Phase::Finished => write!(
                f,
                "[{at}] finished job {} ({}.{}) exit={}",
                self.job_name,
                self.job_id,
                self.task,
                self.exit_code.unwrap_or_default()
            ),
        }
    }
}

/// DiagnosticSink は Diagnostic を1行ずつ書き出す
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: &Diagnostic) -> Result<(), LaunchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ctx() -> TaskContext {
        TaskContext {
            job_id: "81234".to_string(),
            job_name: None,
            task: TaskIndex::new(17).unwrap(),
            user: "alice".to_string(),
            hostname: None,
        }
    }

    #[test]
    fn renders_started_line() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        let line = Diagnostic::started(&ctx(), "makam", at).to_string();
        assert_eq!(line, "[2026-10-18T09:00:00Z] started job makam (81234.17) as alice");
    }

    #[test]
    fn renders_finished_line_with_exit_code() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 5).unwrap();
        let line = Diagnostic::finished(&ctx(), "makam", 3, at).to_string();
        assert_eq!(line, "[2026-10-18T09:30:05Z] finished job makam (81234.17) exit=3");
    }
}
