//! Implementations of the ports.

pub mod shell_activator;
pub mod process_runner;
pub mod sinks;

pub use self::shell_activator::{InheritActivator, ShellModuleActivator};
pub use self::process_runner::{ProcessRunner, exit_code};
pub use self::sinks::{MemorySink, WriterSink};
