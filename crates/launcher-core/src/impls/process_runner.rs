//! ProcessRunner - tokio::process based ProgramRunner

use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use tokio::process::Command;

use crate::domain::LaunchError;
use crate::ports::{Invocation, ProgramRunner};

/// Shell convention for "killed by signal N".
const SIGNAL_EXIT_BASE: i32 = 128;

/// Runs the program with exactly the invocation's environment. stdout and
/// stderr are inherited so the scheduler's `-o` / `-e` files receive them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl ProgramRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<i32, LaunchError> {
        let status = Command::new(invocation.program())
            .args(invocation.args())
            .env_clear()
            .envs(invocation.env())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| LaunchError::Spawn {
                program: invocation.program().to_string(),
                source,
            })?;

        Ok(exit_code(status))
    }
}

/// Exit code as a shell would report it.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return SIGNAL_EXIT_BASE + signal;
        }
    }
    1
}
