//! Submission directives (`#$ ...` lines) read by the scheduler at `qsub` time.

use serde::{Deserialize, Serialize};

use super::limits::WallClockLimits;
use super::range::ArrayRange;
use super::template::LogPathTemplate;

/// Prefix Grid Engine scans for in a job script.
pub const DIRECTIVE_PREFIX: &str = "#$";

/// Mail events for `-m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailEvent {
    Begin,
    End,
    Abort,
    Suspend,
}

impl MailEvent {
    fn flag(self) -> char {
        match self {
            MailEvent::Begin => 'b',
            MailEvent::End => 'e',
            MailEvent::Abort => 'a',
            MailEvent::Suspend => 's',
        }
    }
}

/// Notification settings. No events means `-m n`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub events: Vec<MailEvent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Notification {
    fn mail_flags(&self) -> String {
        if self.events.is_empty() {
            return "n".to_string();
        }
        let mut flags = String::new();
        for event in &self.events {
            let flag = event.flag();
            if !flags.contains(flag) {
                flags.push(flag);
            }
        }
        flags
    }
}

/// Everything the scheduler needs to know about the array job before it
/// starts any task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDirectives {
    pub name: String,

    /// Run each task from the submission directory (`-cwd`).
    pub cwd: bool,

    pub queue: Option<String>,

    pub limits: WallClockLimits,

    pub array: ArrayRange,

    pub stdout: LogPathTemplate,

    pub stderr: LogPathTemplate,

    pub notification: Notification,
}

impl JobDirectives {
    /// Directive lines in the order they appear in the job script.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("{DIRECTIVE_PREFIX} -N {}", self.name)];
        if self.cwd {
            lines.push(format!("{DIRECTIVE_PREFIX} -cwd"));
        }
        if let Some(queue) = &self.queue {
            lines.push(format!("{DIRECTIVE_PREFIX} -q {queue}"));
        }
        if let Some(request) = self.limits.resource_request() {
            lines.push(format!("{DIRECTIVE_PREFIX} -l {request}"));
        }
        lines.push(format!("{DIRECTIVE_PREFIX} -t {}", self.array));
        lines.push(format!("{DIRECTIVE_PREFIX} -o {}", self.stdout));
        lines.push(format!("{DIRECTIVE_PREFIX} -e {}", self.stderr));
        lines.push(format!(
            "{DIRECTIVE_PREFIX} -m {}",
            self.notification.mail_flags()
        ));
        if let Some(address) = &self.notification.address {
            lines.push(format!("{DIRECTIVE_PREFIX} -M {address}"));
        }
        lines
    }
}

/// Grid Engine rejects job names containing whitespace or any of `/:@\*?`,
/// and names starting with a digit.
pub fn is_valid_job_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | ':' | '@' | '\\' | '*' | '?'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::limits::WallClock;

    fn directives() -> JobDirectives {
        JobDirectives {
            name: "makam-features".to_string(),
            cwd: true,
            queue: Some("short.q".to_string()),
            limits: WallClockLimits {
                soft: Some(WallClock::from_secs(6600)),
                hard: Some(WallClock::from_secs(7200)),
            },
            array: ArrayRange::covering(576).unwrap(),
            stdout: LogPathTemplate::new("logs/$JOB_NAME.o$JOB_ID.$TASK_ID"),
            stderr: LogPathTemplate::new("logs/$JOB_NAME.e$JOB_ID.$TASK_ID"),
            notification: Notification::default(),
        }
    }

    #[test]
    fn renders_full_directive_block() {
        let lines = directives().render_lines();
        assert_eq!(
            lines,
            vec![
                "#$ -N makam-features",
                "#$ -cwd",
                "#$ -q short.q",
                "#$ -l s_rt=01:50:00,h_rt=02:00:00",
                "#$ -t 1-576:1",
                "#$ -o logs/$JOB_NAME.o$JOB_ID.$TASK_ID",
                "#$ -e logs/$JOB_NAME.e$JOB_ID.$TASK_ID",
                "#$ -m n",
            ]
        );
    }

    #[test]
    fn optional_directives_are_omitted() {
        let mut d = directives();
        d.cwd = false;
        d.queue = None;
        d.limits = WallClockLimits::default();
        let lines = d.render_lines();
        assert!(!lines.iter().any(|l| l == "#$ -cwd"));
        assert!(!lines.iter().any(|l| l.starts_with("#$ -q")));
        assert!(!lines.iter().any(|l| l.starts_with("#$ -l")));
    }

    #[test]
    fn mail_flags_are_deduplicated() {
        let mut d = directives();
        d.notification = Notification {
            events: vec![MailEvent::Begin, MailEvent::End, MailEvent::End],
            address: Some("alice@example.org".to_string()),
        };
        let lines = d.render_lines();
        assert!(lines.contains(&"#$ -m be".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("#$ -M alice@example.org"));
    }

    #[test]
    fn job_name_rules() {
        assert!(is_valid_job_name("makam-features"));
        assert!(!is_valid_job_name(""));
        assert!(!is_valid_job_name("1st-run"));
        assert!(!is_valid_job_name("has space"));
        assert!(!is_valid_job_name("a/b"));
    }
}
