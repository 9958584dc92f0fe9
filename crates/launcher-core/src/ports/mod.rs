//! Ports - 抽象化レイヤー
//!
//! 外部とのやりとり（module system, 子プロセス, ログ, 時刻）を trait として定義します。
//! Launcher はここにある trait だけに依存し、実装は `impls` にあります。
//! テストでは各 port を fake に差し替えます。

pub mod activator;
pub mod runner;
pub mod diagnostics;
pub mod clock;

pub use self::activator::{ModuleActivator, ModuleSpec};
pub use self::runner::{Invocation, ProgramRunner};
pub use self::diagnostics::{Diagnostic, DiagnosticSink, Phase};
pub use self::clock::{Clock, FixedClock, SystemClock};
