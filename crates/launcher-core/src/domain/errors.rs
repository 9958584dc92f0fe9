//! Errors - 起動シーケンスのエラー型と分類
//!
//! The taxonomy is flat: nothing here is retried or translated. Every
//! variant ends the launch and turns into a non-zero exit status; the
//! scheduler decides what happens next.

use std::io;

use thiserror::Error;

/// ErrorKind は起動エラーの分類
///
/// - EnvironmentSetup: module activation failed, the program never ran
/// - Program: the program could not be started
/// - Io: the launcher's own log could not be written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    EnvironmentSetup,
    Program,
    Io,
}

impl ErrorKind {
    /// Stable label for the `kind` field of log records.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::EnvironmentSetup => "environment_setup",
            ErrorKind::Program => "program",
            ErrorKind::Io => "io",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("module activation failed (status {status:?}): {stderr}")]
    Activation { status: Option<i32>, stderr: String },

    #[error("failed to start activation shell `{shell}`: {source}")]
    ActivationShell {
        shell: String,
        #[source]
        source: io::Error,
    },

    #[error("command line is empty")]
    EmptyCommand,

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write diagnostic line: {0}")]
    Diagnostics(#[source] io::Error),
}

impl LaunchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LaunchError::Activation { .. } | LaunchError::ActivationShell { .. } => {
                ErrorKind::EnvironmentSetup
            }
            LaunchError::EmptyCommand | LaunchError::Spawn { .. } => ErrorKind::Program,
            LaunchError::Diagnostics(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_failures_are_environment_setup() {
        let err = LaunchError::Activation {
            status: Some(1),
            stderr: "ModuleCmd_Load.c(213):ERROR:105: Unable to locate a modulefile for 'essentia/2.0.1'".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::EnvironmentSetup);
        assert!(err.to_string().contains("essentia/2.0.1"));
    }

    #[test]
    fn spawn_failure_names_the_program() {
        let err = LaunchError::Spawn {
            program: "python".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.kind(), ErrorKind::Program);
        assert_eq!(err.kind().to_string(), "program");
        assert!(err.to_string().contains("`python`"));
    }
}
