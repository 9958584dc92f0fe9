//! Job script rendering.
//!
//! The script is a thin shell wrapper: directives for the scheduler, then a
//! single `exec` of this launcher's `run` subcommand. All the per-task
//! logic lives in the launcher, not in shell.

use std::path::PathBuf;

use crate::domain::JobDirectives;
use crate::shell;

#[derive(Debug, Clone)]
pub struct JobScript {
    pub directives: JobDirectives,
    /// Interpreter for the script itself (`#!` line and `-S`).
    pub shell: String,
    pub launcher: PathBuf,
    pub config: PathBuf,
}

impl JobScript {
    pub fn render(&self) -> String {
        let mut out = format!("#!{}\n", self.shell);
        for line in self.directives.render_lines() {
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&format!("#$ -S {}\n", self.shell));
        out.push('\n');

        let launcher = self.launcher.to_string_lossy();
        let config = self.config.to_string_lossy();
        out.push_str(&format!(
            "exec {} run --config {}\n",
            shell::quote(&launcher),
            shell::quote(&config)
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArrayRange, LogPathTemplate, Notification, WallClockLimits};

    fn script() -> JobScript {
        JobScript {
            directives: JobDirectives {
                name: "makam".to_string(),
                cwd: true,
                queue: None,
                limits: WallClockLimits::default(),
                array: ArrayRange::covering(3).unwrap(),
                stdout: LogPathTemplate::default_stdout(),
                stderr: LogPathTemplate::default_stderr(),
                notification: Notification::default(),
            },
            shell: "/bin/bash".to_string(),
            launcher: PathBuf::from("/opt/launcher/bin/launcher"),
            config: PathBuf::from("/home/alice/jobs/launcher.toml"),
        }
    }

    #[test]
    fn renders_header_directives_and_exec() {
        let text = script().render();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "#!/bin/bash");
        assert_eq!(lines[1], "#$ -N makam");
        assert!(lines.contains(&"#$ -t 1-3:1"));
        assert!(lines.contains(&"#$ -S /bin/bash"));
        assert_eq!(
            lines.last().copied(),
            Some("exec /opt/launcher/bin/launcher run --config /home/alice/jobs/launcher.toml")
        );
    }

    #[test]
    fn paths_with_spaces_are_quoted() {
        let mut s = script();
        s.config = PathBuf::from("/home/alice/my jobs/launcher.toml");
        let text = s.render();
        assert!(text.ends_with("run --config '/home/alice/my jobs/launcher.toml'\n"));
    }
}
