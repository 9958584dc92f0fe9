//! Domain model (task index, array range, limits, directives, ...).
//!
//! Scheduler-agnostic value types. Nothing here spawns processes or reads
//! files; the only environment access is `TaskContext::from_env`.

pub mod index;
pub mod range;
pub mod limits;
pub mod template;
pub mod directives;
pub mod context;
pub mod environment;
pub mod errors;

pub use self::index::{IndexError, TaskIndex};
pub use self::range::{ArrayRange, RangeError};
pub use self::limits::{WallClock, WallClockError, WallClockLimits};
pub use self::template::{LogPathTemplate, TemplateVars};
pub use self::directives::{JobDirectives, MailEvent, Notification};
pub use self::context::TaskContext;
pub use self::environment::{Environment, LocaleSetting};
pub use self::errors::{ErrorKind, LaunchError};
