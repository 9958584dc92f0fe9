//! Submitter - ジョブスクリプトを scheduler に投入
//!
//! `qsub` reads the script from stdin when no file is given, so nothing is
//! written to disk.

use std::process::Stdio;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("submit command is empty")]
    EmptyCommand,

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` rejected the job (status {status:?}): {stderr}")]
    Rejected {
        command: String,
        status: Option<i32>,
        stderr: String,
    },
}

/// What the scheduler said back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub stdout: String,
    /// Parsed from the reply, e.g. `Your job-array 81234.1-576:1 ("makam") has been submitted`.
    pub job_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Submitter {
    command: Vec<String>,
}

impl Submitter {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    pub async fn submit(&self, script: &str) -> Result<SubmitReceipt, SubmitError> {
        let (program, args) = self.command.split_first().ok_or(SubmitError::EmptyCommand)?;
        let command_line = self.command.join(" ");
        let spawn_err = |source| SubmitError::Spawn {
            command: command_line.clone(),
            source,
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(script.as_bytes()).await.map_err(spawn_err)?;
            // drop closes the pipe so the scheduler sees EOF
        }

        let output = child.wait_with_output().await.map_err(spawn_err)?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.status.success() {
            return Err(SubmitError::Rejected {
                command: command_line,
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let job_id = parse_job_id(&stdout);
        tracing::info!(job_id = ?job_id, "job submitted");
        Ok(SubmitReceipt { stdout, job_id })
    }
}

impl Default for Submitter {
    fn default() -> Self {
        Self::new(vec!["qsub".to_string()])
    }
}

/// Job id from a `qsub` reply: the numeric part of the token after
/// `job` / `job-array`.
pub fn parse_job_id(reply: &str) -> Option<String> {
    let mut words = reply.split_whitespace();
    while let Some(word) = words.next() {
        if word == "job" || word == "job-array" {
            let id: String = words
                .next()?
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if !id.is_empty() {
                return Some(id);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"Your job-array 81234.1-576:1 ("makam") has been submitted"#, Some("81234"))]
    #[case(r#"Your job 42 ("single") has been submitted"#, Some("42"))]
    #[case("Submitted batch job 17", None)]
    #[case("", None)]
    fn parses_qsub_reply(#[case] reply: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_job_id(reply).as_deref(), expected);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn script_is_piped_on_stdin() {
        let submitter = Submitter::new(vec!["cat".to_string()]);
        let receipt = submitter.submit("#!/bin/bash\n#$ -N makam\n").await.unwrap();
        assert_eq!(receipt.stdout, "#!/bin/bash\n#$ -N makam\n");
        assert_eq!(receipt.job_id, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_status_is_a_rejection() {
        let submitter = Submitter::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            "cat >/dev/null; echo 'Unable to run job: unknown queue' >&2; exit 1".to_string(),
        ]);
        let err = submitter.submit("#$ -q nope.q\n").await.unwrap_err();
        match err {
            SubmitError::Rejected { status, stderr, .. } => {
                assert_eq!(status, Some(1));
                assert!(stderr.contains("unknown queue"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let err = Submitter::new(Vec::new()).submit("").await.unwrap_err();
        assert!(matches!(err, SubmitError::EmptyCommand));
    }
}
