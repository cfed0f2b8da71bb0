//! Wikisplit: one file per Wikipedia article, straight from the XML dump
//!
//! The dump is far too large to load, so it is read as a forward-only stream of
//! XML events. Every `<page>` record is rebuilt on its own and handled before
//! the next one is read:
//!
//! 1. **Scan** -- Skip events until a `<page>` start tag
//! 2. **Extract** -- Consume that record up to its closing tag, collecting the
//!    title, the redirect marker and the revision text
//! 3. **Canonicalize** -- Lowercase, `_` for spaces, percent-encode
//! 4. **Filter** -- Drop redirects and non-article namespaces (`talk:`, `user:`, ...)
//! 5. **Write** -- Store the text in `<output dir>/<canonical title>`
//!
//! Broken records and unwritable files are counted and skipped; only an input
//! that cannot be opened stops the run.
//!
//! # Key Modules
//!
//! - [`parser`] -- Streaming XML reader and `<page>` record extraction (plain or BZ2)
//! - [`title`] -- Title canonicalization
//! - [`filter`] -- Namespace exclusion rules and redirect rejection
//! - [`writer`] -- Per-article output files
//! - [`index`] -- Article list of written titles
//! - [`extract`] -- Scan/extract state machine driving the pipeline
//! - [`stats`] -- Run summary counters
//! - [`models`] -- The `WikiPage` record
//! - [`config`] -- Defaults and run settings
//!
//! # Example Usage
//!
//! ```bash
//! wikisplit --infile enwiki-latest-pages-articles.xml.bz2 --output-dir out/docs -v
//! ```

pub mod config;
pub mod extract;
pub mod filter;
pub mod index;
pub mod models;
pub mod parser;
pub mod stats;
pub mod title;
pub mod writer;
