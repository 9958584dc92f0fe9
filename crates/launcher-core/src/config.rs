//! Job configuration (TOML).
//!
//! One file describes the whole array job: submission directives, how the
//! array size is determined, which modules to load and what to run.
//!
//! ```toml
//! [job]
//! name = "makam-features"
//! queue = "short.q"
//! soft_wall_clock = "01:50:00"
//! hard_wall_clock = "02:00:00"
//!
//! [array.inputs]
//! dir = "data/audio"
//! extensions = ["mp3"]
//!
//! [runtime]
//! init_script = "/etc/profile.d/modules.sh"
//! modules = ["python/2.7.5", "essentia/2.0.1"]
//!
//! [program]
//! command = ["python", "estimate_mode_tonic.py"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app::{InputInventory, InventoryError, LaunchPlan, Submitter};
use crate::domain::context::DEFAULT_TASK_ID_VAR;
use crate::domain::directives::is_valid_job_name;
use crate::domain::{
    ArrayRange, JobDirectives, LocaleSetting, LogPathTemplate, Notification, RangeError,
    WallClock, WallClockError, WallClockLimits,
};
use crate::impls::ShellModuleActivator;
use crate::ports::ModuleSpec;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    WallClock(#[from] WallClockError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("array.count is {declared} but {dir} holds {found} inputs")]
    CountMismatch {
        declared: u32,
        found: usize,
        dir: PathBuf,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LauncherConfig {
    pub job: JobSection,
    pub array: ArraySection,
    #[serde(default)]
    pub runtime: RuntimeSection,
    pub program: ProgramSection,
    #[serde(default)]
    pub scheduler: SchedulerSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobSection {
    pub name: String,

    #[serde(default = "default_true")]
    pub cwd: bool,

    #[serde(default)]
    pub queue: Option<String>,

    #[serde(default)]
    pub soft_wall_clock: Option<WallClock>,

    #[serde(default)]
    pub hard_wall_clock: Option<WallClock>,

    #[serde(default = "LogPathTemplate::default_stdout")]
    pub stdout: LogPathTemplate,

    #[serde(default = "LogPathTemplate::default_stderr")]
    pub stderr: LogPathTemplate,

    #[serde(default)]
    pub notify: Notification,
}

/// How many tasks the array has: an explicit count, the number of inputs
/// found on disk, or both (which must then agree).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArraySection {
    #[serde(default)]
    pub count: Option<u32>,

    #[serde(default)]
    pub inputs: Option<InputsSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputsSection {
    pub dir: PathBuf,

    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
    #[serde(default = "default_shell")]
    pub shell: String,

    #[serde(default)]
    pub init_script: Option<PathBuf>,

    #[serde(default = "default_module_command")]
    pub module_command: String,

    #[serde(default)]
    pub modules: Vec<ModuleSpec>,

    #[serde(default)]
    pub locale: LocaleSetting,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            init_script: None,
            module_command: default_module_command(),
            modules: Vec::new(),
            locale: LocaleSetting::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgramSection {
    /// argv prefix; the task index is appended as the last argument.
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerSection {
    #[serde(default = "default_submit_command")]
    pub submit_command: Vec<String>,

    #[serde(default = "default_task_id_var")]
    pub task_id_var: String,

    /// Interpreter of the generated job script.
    #[serde(default = "default_script_shell")]
    pub script_shell: String,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            submit_command: default_submit_command(),
            task_id_var: default_task_id_var(),
            script_shell: default_script_shell(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_shell() -> String {
    "bash".to_string()
}

fn default_module_command() -> String {
    "module".to_string()
}

fn default_submit_command() -> Vec<String> {
    vec!["qsub".to_string()]
}

fn default_task_id_var() -> String {
    DEFAULT_TASK_ID_VAR.to_string()
}

fn default_script_shell() -> String {
    "/bin/bash".to_string()
}

impl LauncherConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), job = %config.job.name, "config loaded");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that do not touch the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_job_name(&self.job.name) {
            return Err(ConfigError::Invalid(format!(
                "job.name {:?} is not a valid scheduler job name",
                self.job.name
            )));
        }
        if self.program.command.is_empty() {
            return Err(ConfigError::Invalid("program.command must not be empty".to_string()));
        }
        if self.array.count.is_none() && self.array.inputs.is_none() {
            return Err(ConfigError::Invalid(
                "array needs `count`, `inputs`, or both".to_string(),
            ));
        }
        if let Some(count) = self.array.count {
            ArrayRange::covering(count as usize)?;
        }
        if !self.runtime.locale.is_utf8() {
            return Err(ConfigError::Invalid(format!(
                "runtime.locale {}={} is not a UTF-8 locale",
                self.runtime.locale.var, self.runtime.locale.value
            )));
        }
        if self.scheduler.submit_command.is_empty() {
            return Err(ConfigError::Invalid(
                "scheduler.submit_command must not be empty".to_string(),
            ));
        }
        self.limits().validate()?;
        Ok(())
    }

    pub fn limits(&self) -> WallClockLimits {
        WallClockLimits {
            soft: self.job.soft_wall_clock,
            hard: self.job.hard_wall_clock,
        }
    }

    pub fn inventory(&self) -> Option<InputInventory> {
        self.array
            .inputs
            .as_ref()
            .map(|inputs| InputInventory::new(&inputs.dir, &inputs.extensions))
    }

    /// Array range for submission. Scans the inputs directory when one is
    /// configured; with both `count` and `inputs`, they must agree.
    pub fn resolve_range(&self) -> Result<ArrayRange, ConfigError> {
        let found = match self.inventory() {
            Some(inventory) => Some((inventory.count()?, inventory.dir().to_path_buf())),
            None => None,
        };

        match (self.array.count, found) {
            (Some(declared), Some((found, dir))) if declared as usize != found => {
                Err(ConfigError::CountMismatch { declared, found, dir })
            }
            (Some(declared), _) => Ok(ArrayRange::covering(declared as usize)?),
            (None, Some((found, _))) => Ok(ArrayRange::covering(found)?),
            (None, None) => Err(ConfigError::Invalid(
                "array needs `count`, `inputs`, or both".to_string(),
            )),
        }
    }

    /// Range known without touching the filesystem (only from `count`).
    pub fn declared_range(&self) -> Option<ArrayRange> {
        self.array
            .count
            .and_then(|count| ArrayRange::covering(count as usize).ok())
    }

    pub fn directives(&self, array: ArrayRange) -> JobDirectives {
        JobDirectives {
            name: self.job.name.clone(),
            cwd: self.job.cwd,
            queue: self.job.queue.clone(),
            limits: self.limits(),
            array,
            stdout: self.job.stdout.clone(),
            stderr: self.job.stderr.clone(),
            notification: self.job.notify.clone(),
        }
    }

    pub fn launch_plan(&self) -> LaunchPlan {
        LaunchPlan {
            job_name: self.job.name.clone(),
            command: self.program.command.clone(),
            modules: self.runtime.modules.clone(),
            locale: self.runtime.locale.clone(),
            declared_range: self.declared_range(),
        }
    }

    pub fn activator(&self) -> ShellModuleActivator {
        let activator = ShellModuleActivator::new(self.runtime.shell.clone())
            .with_module_command(self.runtime.module_command.clone());
        match &self.runtime.init_script {
            Some(init) => activator.with_init_script(init.clone()),
            None => activator,
        }
    }

    pub fn submitter(&self) -> Submitter {
        Submitter::new(self.scheduler.submit_command.clone())
    }
}
