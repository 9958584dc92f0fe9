//! Per-task context read from the scheduler-provided environment.

use std::collections::HashMap;
use std::ffi::OsString;

use ulid::Ulid;

use super::index::{IndexError, TaskIndex};
use super::template::TemplateVars;

/// Scheduler variable holding the array task index.
pub const DEFAULT_TASK_ID_VAR: &str = "SGE_TASK_ID";

const JOB_ID_VAR: &str = "JOB_ID";
const JOB_NAME_VAR: &str = "JOB_NAME";
const HOSTNAME_VAR: &str = "HOSTNAME";

/// Who/what this launcher invocation is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskContext {
    /// `JOB_ID`, or `local-<ULID>` when started by hand.
    pub job_id: String,
    pub job_name: Option<String>,
    pub task: TaskIndex,
    pub user: String,
    pub hostname: Option<String>,
}

impl TaskContext {
    /// Build from `KEY=VALUE` pairs.
    ///
    /// `index_override` wins over the task variable, which lets a single
    /// task be rerun by hand outside the scheduler.
    pub fn from_vars<I>(
        vars: I,
        task_id_var: &str,
        index_override: Option<TaskIndex>,
    ) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let non_empty = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let task = match index_override {
            Some(index) => index,
            None => {
                let raw = vars
                    .get(task_id_var)
                    .ok_or_else(|| IndexError::Missing(task_id_var.to_string()))?;
                TaskIndex::parse(raw)?
            }
        };

        let job_id = non_empty(JOB_ID_VAR).unwrap_or_else(|| format!("local-{}", Ulid::new()));
        let user = non_empty("USER")
            .or_else(|| non_empty("LOGNAME"))
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Self {
            job_id,
            job_name: non_empty(JOB_NAME_VAR),
            task,
            user,
            hostname: non_empty(HOSTNAME_VAR),
        })
    }

    /// Build from raw `OsString` pairs. Entries that are not valid UTF-8
    /// are ignored; none of the scheduler variables read here can be one.
    pub fn from_os_vars<I>(
        vars: I,
        task_id_var: &str,
        index_override: Option<TaskIndex>,
    ) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let vars = vars
            .into_iter()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
        Self::from_vars(vars, task_id_var, index_override)
    }

    /// Build from the launcher's own process environment.
    pub fn from_env(task_id_var: &str, index_override: Option<TaskIndex>) -> Result<Self, IndexError> {
        Self::from_os_vars(std::env::vars_os(), task_id_var, index_override)
    }

    /// Job name as the scheduler knows it, falling back to the configured one.
    pub fn job_name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.job_name.as_deref().unwrap_or(fallback)
    }

    pub fn template_vars(&self, fallback_job_name: &str) -> TemplateVars {
        TemplateVars {
            job_name: self.job_name_or(fallback_job_name).to_string(),
            job_id: self.job_id.clone(),
            task_id: Some(self.task),
            user: self.user.clone(),
            hostname: self.hostname.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn reads_scheduler_variables() {
        let ctx = TaskContext::from_vars(
            vars(&[
                ("JOB_ID", "81234"),
                ("JOB_NAME", "makam"),
                ("SGE_TASK_ID", "17"),
                ("USER", "alice"),
                ("HOSTNAME", "node-3"),
            ]),
            DEFAULT_TASK_ID_VAR,
            None,
        )
        .unwrap();

        assert_eq!(ctx.job_id, "81234");
        assert_eq!(ctx.job_name.as_deref(), Some("makam"));
        assert_eq!(ctx.task.get(), 17);
        assert_eq!(ctx.user, "alice");
        assert_eq!(ctx.hostname.as_deref(), Some("node-3"));
    }

    #[test]
    fn missing_task_variable_is_an_error() {
        let err = TaskContext::from_vars(vars(&[("JOB_ID", "1")]), DEFAULT_TASK_ID_VAR, None)
            .unwrap_err();
        assert_eq!(err, IndexError::Missing("SGE_TASK_ID".to_string()));
    }

    #[test]
    fn non_array_job_is_rejected() {
        let err = TaskContext::from_vars(
            vars(&[("SGE_TASK_ID", "undefined")]),
            DEFAULT_TASK_ID_VAR,
            None,
        )
        .unwrap_err();
        assert_eq!(err, IndexError::Undefined);
    }

    #[test]
    fn override_wins_and_local_id_is_generated() {
        let ctx = TaskContext::from_vars(
            vars(&[("SGE_TASK_ID", "undefined"), ("LOGNAME", "bob")]),
            DEFAULT_TASK_ID_VAR,
            TaskIndex::new(3),
        )
        .unwrap();

        assert_eq!(ctx.task.get(), 3);
        assert!(ctx.job_id.starts_with("local-"));
        assert_eq!(ctx.user, "bob");
        assert_eq!(ctx.job_name_or("fallback"), "fallback");
    }

    #[test]
    fn template_vars_expand_log_paths() {
        let ctx = TaskContext::from_vars(
            vars(&[("JOB_ID", "81234"), ("SGE_TASK_ID", "2"), ("USER", "alice")]),
            DEFAULT_TASK_ID_VAR,
            None,
        )
        .unwrap();
        let path = crate::domain::LogPathTemplate::default_stdout().expand(&ctx.template_vars("makam"));
        assert_eq!(path, std::path::PathBuf::from("logs/makam.81234.2.out"));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_variables_are_ignored() {
        use std::os::unix::ffi::OsStringExt;

        let vars = vec![
            (OsString::from("SGE_TASK_ID"), OsString::from("3")),
            (OsString::from("JOB_ID"), OsString::from("81234")),
            (OsString::from("DATA_DIR"), OsString::from_vec(b"/srv/caf\xe9".to_vec())),
            (OsString::from_vec(b"LATIN1_\xe9".to_vec()), OsString::from("x")),
        ];
        let ctx = TaskContext::from_os_vars(vars, DEFAULT_TASK_ID_VAR, None).unwrap();
        assert_eq!(ctx.task.get(), 3);
        assert_eq!(ctx.job_id, "81234");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_task_variable_counts_as_missing() {
        use std::os::unix::ffi::OsStringExt;

        let vars = vec![(OsString::from("SGE_TASK_ID"), OsString::from_vec(vec![0xff]))];
        let err = TaskContext::from_os_vars(vars, DEFAULT_TASK_ID_VAR, None).unwrap_err();
        assert_eq!(err, IndexError::Missing("SGE_TASK_ID".to_string()));
    }

    #[test]
    fn custom_task_variable_name() {
        let ctx = TaskContext::from_vars(
            vars(&[("SLURM_ARRAY_TASK_ID", "9")]),
            "SLURM_ARRAY_TASK_ID",
            None,
        )
        .unwrap();
        assert_eq!(ctx.task.get(), 9);
        assert_eq!(ctx.user, "unknown");
    }
}
