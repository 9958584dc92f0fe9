//! ProgramRunner port - runs the external analysis program

use async_trait::async_trait;

use crate::domain::{Environment, LaunchError, TaskIndex};

/// One fully-resolved program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    argv: Vec<String>,
    env: Environment,
}

impl Invocation {
    /// `prefix` is the configured command (`["python", "estimate.py"]`);
    /// the task index is appended as the last argument.
    pub fn for_task(prefix: &[String], index: TaskIndex, env: Environment) -> Result<Self, LaunchError> {
        if prefix.is_empty() {
            return Err(LaunchError::EmptyCommand);
        }
        let mut argv = prefix.to_vec();
        argv.push(index.to_string());
        Ok(Self { argv, env })
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }
}

/// ProgramRunner は Invocation を実行して終了コードを返す
///
/// - 標準出力/標準エラーは scheduler のログにそのまま流す（capture しない）
/// - 戻り値はプログラムの終了コードそのもの（0 でなくてもエラーではない）
/// - 起動そのものに失敗した場合だけ `LaunchError::Spawn`
#[async_trait]
pub trait ProgramRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<i32, LaunchError>;
}
