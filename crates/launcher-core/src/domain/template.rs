//! Log-path templates for `-o` / `-e`.
//!
//! The template is handed to the scheduler verbatim; Grid Engine expands the
//! pseudo variables itself. `expand` reproduces that expansion so `plan` can
//! show where a task's logs will land.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::index::TaskIndex;

/// Pseudo variables Grid Engine understands in `-o` / `-e` paths.
pub const PSEUDO_VARIABLES: [&str; 5] = ["JOB_NAME", "JOB_ID", "TASK_ID", "USER", "HOSTNAME"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogPathTemplate(String);

/// Values substituted by `LogPathTemplate::expand`.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    pub job_name: String,
    pub job_id: String,
    /// `None` for a non-array job (Grid Engine writes `undefined`).
    pub task_id: Option<TaskIndex>,
    pub user: String,
    pub hostname: String,
}

impl TemplateVars {
    fn value_of(&self, name: &str) -> String {
        match name {
            "JOB_NAME" => self.job_name.clone(),
            "JOB_ID" => self.job_id.clone(),
            "TASK_ID" => self
                .task_id
                .map(|t| t.to_string())
                .unwrap_or_else(|| "undefined".to_string()),
            "USER" => self.user.clone(),
            "HOSTNAME" => self.hostname.clone(),
            _ => String::new(),
        }
    }
}

impl LogPathTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn default_stdout() -> Self {
        Self::new("logs/$JOB_NAME.$JOB_ID.$TASK_ID.out")
    }

    pub fn default_stderr() -> Self {
        Self::new("logs/$JOB_NAME.$JOB_ID.$TASK_ID.err")
    }

    /// Substitute `$NAME` and `${NAME}` for every known pseudo variable.
    /// Unknown `$` sequences are left untouched.
    pub fn expand(&self, vars: &TemplateVars) -> PathBuf {
        let mut out = self.0.clone();
        for name in PSEUDO_VARIABLES {
            let value = vars.value_of(name);
            out = out.replace(&format!("${{{name}}}"), &value);
            out = out.replace(&format!("${name}"), &value);
        }
        PathBuf::from(out)
    }
}

impl fmt::Display for LogPathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
