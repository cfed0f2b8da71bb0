use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Newline-separated list of the canonical titles that were written.
///
/// Each title is listed once; a later article overwriting the same file adds
/// no second line.
pub struct ArticleIndex {
    path: PathBuf,
    writer: BufWriter<File>,
    seen: FxHashSet<String>,
}

impl ArticleIndex {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .with_context(|| format!("Failed to create article index: {}", path.display()))?;

        Ok(Self {
            path,
            writer: BufWriter::with_capacity(128 * 1024, file),
            seen: FxHashSet::default(),
        })
    }

    /// Returns `false` when the title was already listed.
    pub fn record(&mut self, canonical_title: &str) -> Result<bool> {
        if self.seen.contains(canonical_title) {
            return Ok(false);
        }
        writeln!(self.writer, "{}", canonical_title)
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        self.seen.insert(canonical_title.to_string());
        Ok(true)
    }

    /// Flushes buffered entries and returns how many distinct titles were listed.
    pub fn finish(mut self) -> Result<u64> {
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush article index: {}", self.path.display()))?;
        Ok(self.seen.len() as u64)
    }
}
