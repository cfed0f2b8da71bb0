use std::path::PathBuf;

/// Dump read when no input path is given
pub const DEFAULT_INPUT_FILE: &str = "enwiki-latest-pages-articles.xml";

/// Article list written alongside the per-article files
pub const DEFAULT_INDEX_FILE: &str = "out/article_list.txt";

/// Directory receiving one file per accepted article
pub const DEFAULT_OUTPUT_DIR: &str = "out/docs";

/// Local name of the element wrapping one article record
pub const PAGE_TAG: &[u8] = b"page";

/// Title prefixes of non-article namespaces, matched against canonical titles
pub const DEFAULT_EXCLUDED_PREFIXES: &[&str] = &[
    "file:",
    "talk:",
    "special:",
    "wikipedia:",
    "wiktionary:",
    "user:",
    "user_talk:",
];

/// Progress update interval (tick every N pages)
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Buffer size for the dump reader (1 MiB)
pub const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Settings for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    /// `None` disables the article list
    pub index_path: Option<PathBuf>,
    /// Stop after this many pages have been examined
    pub limit: Option<u64>,
    /// Filter and count, but write nothing
    pub dry_run: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_FILE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            index_path: Some(PathBuf::from(DEFAULT_INDEX_FILE)),
            limit: None,
            dry_run: false,
        }
    }
}
