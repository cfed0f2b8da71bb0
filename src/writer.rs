use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Writes article text to `<output_dir>/<canonical title>`.
///
/// A later article with the same canonical title overwrites the earlier file.
pub struct ArticleWriter {
    output_dir: PathBuf,
}

impl ArticleWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Writes `text` verbatim and flushes it before returning.
    ///
    /// Returns the path written. Callers decide whether a failure matters;
    /// the file handle is closed on every path.
    pub fn write(&self, canonical_title: &str, text: &str) -> Result<PathBuf> {
        if matches!(canonical_title, "" | "." | "..") {
            bail!("Not a valid file name: {:?}", canonical_title);
        }

        let path = self.output_dir.join(canonical_title);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create article file: {}", path.display()))?;

        let mut writer = BufWriter::new(file);
        writer
            .write_all(text.as_bytes())
            .with_context(|| format!("Failed to write article file: {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush article file: {}", path.display()))?;

        Ok(path)
    }
}
