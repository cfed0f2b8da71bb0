use crate::config::{ExtractConfig, PROGRESS_INTERVAL};
use crate::filter::{ExclusionRules, Verdict};
use crate::index::ArticleIndex;
use crate::models::WikiPage;
use crate::parser::{Token, WikiReader};
use crate::stats::RunSummary;
use crate::title::canonicalize;
use crate::writer::ArticleWriter;
use anyhow::Result;
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Looking for the next `<page>` start tag
    Scanning,
    /// Reader sits inside a `<page>`; the record is consumed in one step
    Extracting,
    Done,
}

/// Per-page pipeline: canonicalize, filter, write, count.
pub struct Pipeline<'a> {
    rules: &'a ExclusionRules,
    writer: Option<ArticleWriter>,
    index: Option<ArticleIndex>,
    limit: Option<u64>,
    summary: RunSummary,
}

impl<'a> Pipeline<'a> {
    /// A pipeline without a writer only filters and counts.
    pub fn new(rules: &'a ExclusionRules) -> Self {
        Self {
            rules,
            writer: None,
            index: None,
            limit: None,
            summary: RunSummary::new(),
        }
    }

    pub fn with_writer(mut self, writer: ArticleWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn with_index(mut self, index: ArticleIndex) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    /// Drains the reader and returns the final counts.
    pub fn run(mut self, mut reader: WikiReader<'_>) -> RunSummary {
        let pb = ProgressBar::new_spinner();
        let mut state = State::Scanning;

        while state != State::Done {
            state = match state {
                State::Scanning => {
                    if self.limit_reached() {
                        info!(limit = ?self.limit, "Page limit reached");
                        State::Done
                    } else {
                        match reader.next_token() {
                            Ok(Token::PageStart) => State::Extracting,
                            Ok(Token::Other) => State::Scanning,
                            Ok(Token::Eof) => State::Done,
                            Err(e) => {
                                warn!(error = %e, "Stopping scan on unreadable XML");
                                State::Done
                            }
                        }
                    }
                }
                State::Extracting => {
                    self.summary.inc_pages();
                    match reader.read_page() {
                        Ok(page) => self.process(page),
                        Err(e) => {
                            debug!(error = %e, position = reader.position(), "Skipping page");
                            self.summary.inc_decode_failures();
                        }
                    }
                    if self.summary.pages_seen % PROGRESS_INTERVAL == 0 {
                        pb.set_message(format!("{} articles", self.summary.articles()));
                        pb.tick();
                    }
                    State::Scanning
                }
                State::Done => State::Done,
            };
        }

        pb.finish_and_clear();

        if let Some(index) = self.index.take() {
            match index.finish() {
                Ok(entries) => debug!(entries, "Article index flushed"),
                Err(e) => warn!(error = %e, "Failed to finish article index"),
            }
        }

        self.summary
    }

    fn limit_reached(&self) -> bool {
        self.limit
            .is_some_and(|limit| self.summary.pages_seen >= limit)
    }

    fn process(&mut self, page: WikiPage) {
        let title = canonicalize(&page.title);

        match self.rules.check(&title, page.is_redirect()) {
            Verdict::Accept => {}
            Verdict::Redirect => {
                self.summary.inc_redirects();
                return;
            }
            Verdict::Excluded => {
                self.summary.inc_excluded();
                return;
            }
        }

        if let Some(writer) = &self.writer {
            match writer.write(&title, &page.text) {
                Ok(_) => {
                    self.summary.inc_written();
                    if let Some(index) = self.index.as_mut() {
                        match index.record(&title) {
                            Ok(true) => {}
                            Ok(false) => debug!(title = %title, "Article overwritten"),
                            Err(e) => debug!(error = %e, title = %title, "Index entry dropped"),
                        }
                    }
                }
                Err(e) => {
                    debug!(error = %e, title = %title, "Article not written");
                    self.summary.inc_write_failures();
                }
            }
        }

        self.summary.inc_accepted();
    }
}

/// Runs a full extraction from `config.input_path`.
///
/// Only an unopenable input is an error; undecodable pages and unwritable
/// articles are counted and skipped.
pub fn run_extraction(config: &ExtractConfig, rules: &ExclusionRules) -> Result<RunSummary> {
    let reader = WikiReader::open(&config.input_path)?;

    info!(
        input = %config.input_path.display(),
        output = %config.output_dir.display(),
        dry_run = config.dry_run,
        "Extracting articles"
    );

    let mut pipeline = Pipeline::new(rules).with_limit(config.limit);

    if !config.dry_run {
        pipeline = pipeline.with_writer(ArticleWriter::new(&config.output_dir));

        if let Some(path) = &config.index_path {
            match ArticleIndex::create(path) {
                Ok(index) => pipeline = pipeline.with_index(index),
                Err(e) => warn!(error = %e, "Continuing without article index"),
            }
        }
    }

    let summary = pipeline.run(reader);

    info!(
        pages = summary.pages_seen,
        accepted = summary.accepted,
        written = summary.written(),
        redirects = summary.redirects_skipped,
        excluded = summary.excluded,
        decode_failures = summary.decode_failures,
        write_failures = summary.write_failures,
        "Extraction finished"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn run(xml: &str, dir: &TempDir) -> RunSummary {
        let rules = ExclusionRules::default();
        Pipeline::new(&rules)
            .with_writer(ArticleWriter::new(dir.path()))
            .run(WikiReader::from_reader(xml.as_bytes()))
    }

    fn page(title: &str, text: &str) -> String {
        format!(
            "<page><title>{}</title><revision><text>{}</text></revision></page>",
            title, text
        )
    }

    fn files(dir: &TempDir) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn writes_accepted_article() {
        let dir = TempDir::new().unwrap();
        let xml = format!("<mediawiki>{}</mediawiki>", page("Apollo 11", "mission details"));
        let summary = run(&xml, &dir);

        assert_eq!(summary.articles(), 1);
        assert_eq!(files(&dir), vec!["apollo_11"]);
        assert_eq!(
            fs::read_to_string(dir.path().join("apollo_11")).unwrap(),
            "mission details"
        );
    }

    #[test]
    fn skips_talk_page() {
        let dir = TempDir::new().unwrap();
        let xml = format!("<mediawiki>{}</mediawiki>", page("Talk:Apollo 11", "discussion"));
        let summary = run(&xml, &dir);

        assert_eq!(summary.articles(), 0);
        assert_eq!(summary.excluded, 1);
        assert!(files(&dir).is_empty());
    }

    #[test]
    fn skips_redirect() {
        let dir = TempDir::new().unwrap();
        let xml = "<mediawiki><page><title>Foo</title><redirect title=\"Bar\"/>\
                   <revision><text>#REDIRECT [[Bar]]</text></revision></page></mediawiki>";
        let summary = run(xml, &dir);

        assert_eq!(summary.articles(), 0);
        assert_eq!(summary.redirects_skipped, 1);
        assert!(files(&dir).is_empty());
    }

    #[test]
    fn malformed_page_does_not_stop_run() {
        let dir = TempDir::new().unwrap();
        let xml = format!(
            "<mediawiki><page><title>Broken</title><revision><text>x</revision></text></page>{}</mediawiki>",
            page("Gemini 4", "spacewalk")
        );
        let summary = run(&xml, &dir);

        assert_eq!(summary.decode_failures, 1);
        assert_eq!(summary.articles(), 1);
        assert_eq!(files(&dir), vec!["gemini_4"]);
    }

    #[test]
    fn write_failure_still_counts() {
        let dir = TempDir::new().unwrap();
        let rules = ExclusionRules::default();
        let xml = format!("<mediawiki>{}</mediawiki>", page("Apollo 11", "text"));
        let summary = Pipeline::new(&rules)
            .with_writer(ArticleWriter::new(dir.path().join("missing")))
            .run(WikiReader::from_reader(xml.as_bytes()));

        assert_eq!(summary.articles(), 1);
        assert_eq!(summary.write_failures, 1);
        assert_eq!(summary.written(), 0);
    }

    #[test]
    fn write_failure_does_not_affect_later_pages() {
        let dir = TempDir::new().unwrap();
        // Empty title canonicalizes to an empty file name.
        let xml = format!(
            "<mediawiki>{}{}</mediawiki>",
            page("", "orphan"),
            page("Apollo 11", "mission details")
        );
        let summary = run(&xml, &dir);

        assert_eq!(summary.articles(), 2);
        assert_eq!(summary.write_failures, 1);
        assert_eq!(files(&dir), vec!["apollo_11"]);
    }

    #[test]
    fn without_writer_only_counts() {
        let rules = ExclusionRules::default();
        let xml = format!("<mediawiki>{}{}</mediawiki>", page("A", "a"), page("B", "b"));
        let summary = Pipeline::new(&rules).run(WikiReader::from_reader(xml.as_bytes()));
        assert_eq!(summary.articles(), 2);
        assert_eq!(summary.written(), 0);
        assert_eq!(summary.write_failures, 0);
    }

    #[test]
    fn unclosed_element_does_not_swallow_later_pages() {
        let dir = TempDir::new().unwrap();
        let xml = format!(
            "<mediawiki><page><title>Bad</title><revision><text>x</text></page>{}{}</mediawiki>",
            page("Apollo 11", "a"),
            page("Gemini 4", "b")
        );
        let summary = run(&xml, &dir);

        assert_eq!(summary.pages_seen, 3);
        assert_eq!(summary.decode_failures, 1);
        assert_eq!(summary.articles(), 2);
        assert_eq!(files(&dir), vec!["apollo_11", "gemini_4"]);
    }

    #[test]
    fn syntax_error_skips_one_page() {
        let dir = TempDir::new().unwrap();
        let xml = format!(
            "<mediawiki><page><title>Bad</title><!x></page>{}</mediawiki>",
            page("Apollo 11", "a")
        );
        let summary = run(&xml, &dir);

        assert_eq!(summary.decode_failures, 1);
        assert_eq!(summary.articles(), 1);
        assert_eq!(files(&dir), vec!["apollo_11"]);
    }

    #[test]
    fn duplicate_titles_listed_once() {
        let dir = TempDir::new().unwrap();
        let docs = dir.path().join("docs");
        fs::create_dir(&docs).unwrap();
        let index_path = dir.path().join("article_list.txt");

        let rules = ExclusionRules::default();
        let xml = format!(
            "<mediawiki>{}{}</mediawiki>",
            page("Apollo 11", "first"),
            page("APOLLO 11", "second")
        );
        let summary = Pipeline::new(&rules)
            .with_writer(ArticleWriter::new(&docs))
            .with_index(ArticleIndex::create(&index_path).unwrap())
            .run(WikiReader::from_reader(xml.as_bytes()));

        assert_eq!(summary.articles(), 2);
        assert_eq!(summary.written(), 2);
        assert_eq!(fs::read_to_string(index_path).unwrap(), "apollo_11\n");
    }

    #[test]
    fn limit_stops_early() {
        let dir = TempDir::new().unwrap();
        let rules = ExclusionRules::default();
        let xml = format!(
            "<mediawiki>{}{}{}</mediawiki>",
            page("A", "a"),
            page("B", "b"),
            page("C", "c")
        );
        let summary = Pipeline::new(&rules)
            .with_writer(ArticleWriter::new(dir.path()))
            .with_limit(Some(2))
            .run(WikiReader::from_reader(xml.as_bytes()));

        assert_eq!(summary.pages_seen, 2);
        assert_eq!(files(&dir), vec!["a", "b"]);
    }

    #[test]
    fn index_lists_written_articles_only() {
        let dir = TempDir::new().unwrap();
        let docs = dir.path().join("docs");
        fs::create_dir(&docs).unwrap();
        let index_path = dir.path().join("article_list.txt");

        let rules = ExclusionRules::default();
        let xml = format!(
            "<mediawiki>{}{}{}</mediawiki>",
            page("Apollo 11", "a"),
            page("User:Someone", "b"),
            page("..", "c")
        );
        let summary = Pipeline::new(&rules)
            .with_writer(ArticleWriter::new(&docs))
            .with_index(ArticleIndex::create(&index_path).unwrap())
            .run(WikiReader::from_reader(xml.as_bytes()));

        assert_eq!(summary.articles(), 2);
        assert_eq!(fs::read_to_string(index_path).unwrap(), "apollo_11\n");
    }

    #[test]
    fn duplicate_titles_overwrite() {
        let dir = TempDir::new().unwrap();
        let xml = format!(
            "<mediawiki>{}{}</mediawiki>",
            page("Apollo 11", "first"),
            page("APOLLO 11", "second")
        );
        let summary = run(&xml, &dir);

        assert_eq!(summary.articles(), 2);
        assert_eq!(files(&dir), vec!["apollo_11"]);
        assert_eq!(
            fs::read_to_string(dir.path().join("apollo_11")).unwrap(),
            "second"
        );
    }

    #[test]
    fn unopenable_input_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = ExtractConfig {
            input_path: dir.path().join("missing.xml"),
            output_dir: dir.path().to_path_buf(),
            index_path: None,
            limit: None,
            dry_run: false,
        };
        assert!(run_extraction(&config, &ExclusionRules::default()).is_err());
    }
}
