//! Input inventory: derive the array size from the inputs actually present.
//!
//! Task `i` is expected to process the `i`-th item of the sorted listing, so
//! the listing order is part of the contract with the analysis program.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("cannot read input directory {dir}: {source}")]
    Read {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputInventory {
    dir: PathBuf,
    /// Lower-case, without the leading dot. Empty means every file.
    extensions: Vec<String>,
}

impl InputInventory {
    pub fn new<I, S>(dir: impl Into<PathBuf>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            dir: dir.into(),
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn matches(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .is_some_and(|e| self.extensions.contains(&e))
    }

    /// Matching regular files directly under `dir`, sorted by path.
    pub fn scan(&self) -> Result<Vec<PathBuf>, InventoryError> {
        let read_err = |source| InventoryError::Read {
            dir: self.dir.clone(),
            source,
        };

        let mut items = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            let path = entry.path();
            if path.is_file() && self.matches(&path) {
                items.push(path);
            }
        }
        items.sort();

        tracing::debug!(dir = %self.dir.display(), count = items.len(), "scanned inputs");
        Ok(items)
    }

    pub fn count(&self) -> Result<usize, InventoryError> {
        Ok(self.scan()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    #[test]
    fn counts_matching_files_only() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "b.mp3");
        touch(tmp.path(), "a.MP3");
        touch(tmp.path(), "c.wav");
        touch(tmp.path(), "notes.txt");
        fs::create_dir(tmp.path().join("sub.mp3")).unwrap();

        let inventory = InputInventory::new(tmp.path(), [".mp3", "wav"]);
        let items = inventory.scan().unwrap();

        let names: Vec<_> = items
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.MP3", "b.mp3", "c.wav"]);
        assert_eq!(inventory.count().unwrap(), 3);
    }

    #[test]
    fn no_extensions_means_every_file() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "x.pitch");
        touch(tmp.path(), "y");

        let inventory = InputInventory::new(tmp.path(), Vec::<String>::new());
        assert_eq!(inventory.count().unwrap(), 2);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let inventory = InputInventory::new("/nonexistent/audio", ["mp3"]);
        assert!(matches!(inventory.scan(), Err(InventoryError::Read { .. })));
    }
}
