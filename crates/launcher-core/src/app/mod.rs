//! App - ポートを組み合わせたアプリケーションロジック
//!
//! - launch: 1 タスク分の起動シーケンス（scheduler から呼ばれる）
//! - script: qsub に渡すジョブスクリプトの生成
//! - inventory: 入力ファイル数から array range を決める
//! - submit: ジョブスクリプトを scheduler に投入

pub mod launch;
pub mod script;
pub mod inventory;
pub mod submit;

pub use self::launch::{LaunchPlan, Launcher, LauncherBuilder};
pub use self::script::JobScript;
pub use self::inventory::{InputInventory, InventoryError};
pub use self::submit::{SubmitError, SubmitReceipt, Submitter};
