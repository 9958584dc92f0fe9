//! Process environment handed to the external program.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::ffi::{OsStr, OsString};

use serde::{Deserialize, Serialize};

/// Locale variables that take precedence over `LANG`, strongest first.
const LOCALE_OVERRIDES: [&str; 2] = ["LC_ALL", "LC_CTYPE"];

/// An owned, ordered set of environment variables.
///
/// The child process gets exactly this set (`env_clear` + `envs`), so what
/// module activation produced is what the program sees. Keys and values are
/// kept as `OsString`: paths on a cluster are not always UTF-8.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<OsString, OsString>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the launcher's own environment.
    pub fn current() -> Self {
        std::env::vars_os().collect()
    }

    /// Parse the output of `env -0` (`KEY=VALUE` records separated by NUL).
    ///
    /// Values may contain newlines (exported shell functions do), which is
    /// why the NUL-separated form is used. Bytes are kept as they are.
    pub fn from_env_dump(bytes: &[u8]) -> Self {
        bytes
            .split(|b| *b == 0)
            .filter(|record| !record.is_empty())
            .filter_map(|record| {
                let split = record.iter().position(|b| *b == b'=')?;
                let (key, value) = (&record[..split], &record[split + 1..]);
                if key.is_empty() {
                    return None;
                }
                Some((os_string(key)?, os_string(value)?))
            })
            .collect()
    }

    pub fn set(&mut self, key: impl Into<OsString>, value: impl Into<OsString>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: impl AsRef<OsStr>) -> Option<OsString> {
        self.vars.remove(key.as_ref())
    }

    /// Value as UTF-8; `None` when unset or not valid UTF-8.
    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&str> {
        self.get_os(key)?.to_str()
    }

    pub fn get_os(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.vars.get(key.as_ref()).map(OsString::as_os_str)
    }

    pub fn contains(&self, key: impl AsRef<OsStr>) -> bool {
        self.vars.contains_key(key.as_ref())
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, OsString, OsString> {
        self.vars.iter()
    }
}

#[cfg(unix)]
fn os_string(bytes: &[u8]) -> Option<OsString> {
    use std::os::unix::ffi::OsStrExt;
    Some(OsStr::from_bytes(bytes).to_os_string())
}

// Elsewhere there is no lossless byte form; undecodable records are dropped.
#[cfg(not(unix))]
fn os_string(bytes: &[u8]) -> Option<OsString> {
    std::str::from_utf8(bytes).ok().map(OsString::from)
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<OsString>,
    V: Into<OsString>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Environment {
    type Item = (&'a OsString, &'a OsString);
    type IntoIter = btree_map::Iter<'a, OsString, OsString>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.iter()
    }
}

/// The locale variable forced before the program starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleSetting {
    #[serde(default = "LocaleSetting::default_var")]
    pub var: String,

    #[serde(default = "LocaleSetting::default_value")]
    pub value: String,
}

impl LocaleSetting {
    fn default_var() -> String {
        "LANG".to_string()
    }

    fn default_value() -> String {
        "en_US.UTF-8".to_string()
    }

    /// Accepts the usual spellings (`UTF-8`, `utf8`, ...) of the codeset.
    pub fn is_utf8(&self) -> bool {
        let codeset = self
            .value
            .split_once('.')
            .map(|(_, codeset)| codeset)
            .unwrap_or_default();
        let codeset = codeset.split('@').next().unwrap_or_default();
        codeset.eq_ignore_ascii_case("utf-8") || codeset.eq_ignore_ascii_case("utf8")
    }

    /// Sets the variable and drops the ones that would override it
    /// (`LC_ALL` beats `LC_CTYPE` beats `LANG`).
    pub fn apply(&self, env: &mut Environment) {
        for stronger in LOCALE_OVERRIDES
            .iter()
            .take_while(|name| **name != self.var)
        {
            if let Some(previous) = env.remove(stronger) {
                tracing::debug!(
                    var = *stronger,
                    value = ?previous,
                    "dropping locale override"
                );
            }
        }
        env.set(&self.var, &self.value);
    }
}

impl Default for LocaleSetting {
    fn default() -> Self {
        Self {
            var: Self::default_var(),
            value: Self::default_value(),
        }
    }
}
