use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::foundation::error::{CutPasteError, CutPasteResult};

/// Dataset splits, in generation order.
pub const SPLITS: [&str; 3] = ["test", "train", "validation"];

/// On-disk split list: `{ "path"?: str, "<split>": [relative paths...] }`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SplitFile {
    /// Optional base directory for every entry.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Entries keyed by split name.
    #[serde(flatten)]
    pub splits: BTreeMap<String, Vec<String>>,
}

impl SplitFile {
    /// Parse a split file from disk.
    pub fn from_path(path: &Path) -> CutPasteResult<Self> {
        let f = File::open(path).map_err(|e| {
            CutPasteError::validation(format!("open split file '{}': {e}", path.display()))
        })?;
        serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            CutPasteError::validation(format!("parse split file '{}': {e}", path.display()))
        })
    }

    /// Resolve the entries of `split` against the base directory.
    ///
    /// The declared `path` is used when it exists on disk, otherwise entries are
    /// relative to `split_file_dir`. A split missing from the file yields no entries.
    pub fn entries(&self, split: &str, split_file_dir: &Path) -> Vec<PathBuf> {
        let base = match &self.path {
            Some(p) if p.exists() => p.clone(),
            _ => split_file_dir.to_path_buf(),
        };
        self.splits
            .get(split)
            .map(|names| names.iter().map(|n| base.join(n)).collect())
            .unwrap_or_default()
    }
}

/// Load and resolve the entries of `split` from the split file at `path`.
pub fn load_split_entries(path: &Path, split: &str) -> CutPasteResult<Vec<PathBuf>> {
    let file = SplitFile::from_path(path)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(file.entries(split, dir))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/splits.rs"]
mod tests;
