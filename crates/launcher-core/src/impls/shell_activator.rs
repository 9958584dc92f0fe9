//! Module activation through the cluster's shell-level module system.
//!
//! Environment modules (Tcl modules, Lmod) work by mutating the calling
//! shell's environment, so a Rust process cannot "load" one directly. We run
//! a shell that loads every module and then dumps its environment with
//! `env -0`; that dump becomes the program's environment.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::domain::{Environment, LaunchError};
use crate::ports::{ModuleActivator, ModuleSpec};
use crate::shell;

#[derive(Debug, Clone)]
pub struct ShellModuleActivator {
    shell: String,
    init_script: Option<PathBuf>,
    module_command: String,
}

impl ShellModuleActivator {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            init_script: None,
            module_command: "module".to_string(),
        }
    }

    /// Script sourced first to define the `module` function
    /// (e.g. `/etc/profile.d/modules.sh`).
    pub fn with_init_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.init_script = Some(path.into());
        self
    }

    pub fn with_module_command(mut self, command: impl Into<String>) -> Self {
        self.module_command = command.into();
        self
    }

    /// Shell text: `[. init >&2 &&] module load a >&2 && ... && env -0`.
    ///
    /// Everything before `env -0` writes to stderr; stdout carries the dump only.
    pub fn script(&self, modules: &[ModuleSpec]) -> String {
        let mut steps = Vec::with_capacity(modules.len() + 2);
        if let Some(init) = &self.init_script {
            steps.push(format!(". {} >&2", shell::quote(&init.to_string_lossy())));
        }
        for module in modules {
            steps.push(format!(
                "{} load {} >&2",
                self.module_command,
                shell::quote(module.as_str())
            ));
        }
        steps.push("env -0".to_string());
        steps.join(" && ")
    }
}

impl Default for ShellModuleActivator {
    fn default() -> Self {
        Self::new("bash")
    }
}

#[async_trait]
impl ModuleActivator for ShellModuleActivator {
    async fn activate(&self, modules: &[ModuleSpec]) -> Result<Environment, LaunchError> {
        let script = self.script(modules);
        tracing::debug!(shell = %self.shell, %script, "activating modules");

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(&script)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| LaunchError::ActivationShell {
                shell: self.shell.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(
                status = ?output.status.code(),
                stderr = %stderr,
                "module activation failed"
            );
            return Err(LaunchError::Activation {
                status: output.status.code(),
                stderr,
            });
        }

        let env = Environment::from_env_dump(&output.stdout);
        tracing::info!(
            modules = ?modules.iter().map(ModuleSpec::as_str).collect::<Vec<_>>(),
            vars = env.len(),
            "modules activated"
        );
        Ok(env)
    }
}

/// For jobs without modules: the program inherits the launcher's environment.
///
/// Asking it to load anything is an error rather than a silent no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct InheritActivator;

#[async_trait]
impl ModuleActivator for InheritActivator {
    async fn activate(&self, modules: &[ModuleSpec]) -> Result<Environment, LaunchError> {
        if !modules.is_empty() {
            return Err(LaunchError::Activation {
                status: None,
                stderr: format!(
                    "no module system configured, cannot load {}",
                    modules
                        .iter()
                        .map(ModuleSpec::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            });
        }
        Ok(Environment::current())
    }
}
