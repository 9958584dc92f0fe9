//! ModuleActivator port - runtime/library environment modules

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Environment, LaunchError};

/// A named, versioned module such as `python/2.7.5`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleSpec(String);

impl ModuleSpec {
    pub fn new(spec: impl Into<String>) -> Self {
        Self(spec.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ModuleActivator は modules を読み込んだ後の環境を返す
///
/// # 契約
/// - 成功: 全 module が読み込まれた環境（呼び出し側はこれで子プロセスを起動）
/// - 失敗: `LaunchError::Activation`。プログラムは起動されない
/// - 冪等: 同じ modules で何度呼んでも同じ環境になる
#[async_trait]
pub trait ModuleActivator: Send + Sync {
    async fn activate(&self, modules: &[ModuleSpec]) -> Result<Environment, LaunchError>;
}
