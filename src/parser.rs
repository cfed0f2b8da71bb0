use crate::config::{PAGE_TAG, READ_BUFFER_SIZE};
use crate::models::WikiPage;
use anyhow::{bail, Context, Result};
use bzip2::read::BzDecoder;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// What the scan loop needs to know about one event outside a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Start of a `<page>` element; the reader sits right after its start tag
    PageStart,
    /// Anything else (other tags, text, comments, declarations)
    Other,
    Eof,
}

/// Children of `<page>` whose character data is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Text,
}

impl Field {
    /// `path` holds the open elements below `<page>`, outermost first.
    fn at(path: &[Vec<u8>]) -> Option<Self> {
        match path {
            [a] if a.as_slice() == b"title" => Some(Field::Title),
            [a, b] if a.as_slice() == b"revision" && b.as_slice() == b"text" => Some(Field::Text),
            _ => None,
        }
    }
}

/// Forward-only reader over a MediaWiki XML dump.
pub struct WikiReader<'a> {
    reader: Reader<Box<dyn BufRead + 'a>>,
    buf: Vec<u8>,
    /// Bytes consumed by readers discarded after a syntax error
    offset: usize,
    /// A `<page>` start tag was read while closing an unterminated record
    pending_page: bool,
}

impl WikiReader<'static> {
    /// Opens a dump on disk; `.bz2` files are decompressed on the fly.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("Failed to open dump: {}", path.display()))?;

        let is_bz2 = path.extension().is_some_and(|e| e == "bz2");
        let source: Box<dyn BufRead + 'static> = if is_bz2 {
            Box::new(BufReader::with_capacity(
                READ_BUFFER_SIZE,
                BzDecoder::new(file),
            ))
        } else {
            Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file))
        };

        Ok(Self::from_reader(source))
    }
}

impl<'a> WikiReader<'a> {
    pub fn from_reader(source: impl BufRead + 'a) -> Self {
        Self {
            reader: tokenizer(Box::new(source)),
            buf: Vec::with_capacity(8192),
            offset: 0,
            pending_page: false,
        }
    }

    /// Byte offset into the (decompressed) stream.
    ///
    /// Approximate once the tokenizer has been restarted after an error.
    pub fn position(&self) -> usize {
        self.offset + self.reader.buffer_position()
    }

    /// quick-xml stops for good after reporting an error, so a fresh
    /// tokenizer takes over the stream right where the old one gave up.
    fn restart(&mut self) {
        let stale = std::mem::replace(&mut self.reader, tokenizer(Box::new(io::empty())));
        self.offset += stale.buffer_position();
        self.reader = tokenizer(stale.into_inner());
    }

    /// Advances past one event outside any record.
    pub fn next_token(&mut self) -> Result<Token> {
        if std::mem::take(&mut self.pending_page) {
            return Ok(Token::PageStart);
        }

        self.buf.clear();
        let event = self
            .reader
            .read_event_into(&mut self.buf)
            .with_context(|| {
                format!("XML error at byte {}", self.offset + self.reader.buffer_position())
            })?;

        Ok(match event {
            Event::Start(ref e) if e.local_name().as_ref() == PAGE_TAG => Token::PageStart,
            Event::Eof => Token::Eof,
            _ => Token::Other,
        })
    }

    /// Consumes the rest of a record after [`Token::PageStart`], up to and
    /// including its closing tag.
    ///
    /// Nothing past the closing tag is read. On malformed nesting, bad
    /// character data or a syntax error the record is still consumed to its
    /// end before the error is returned, so scanning can resume cleanly.
    /// Pages never nest: `</page>` ends the record whatever is still open,
    /// and a `<page>` start tag ends it too and is handed to the next scan.
    pub fn read_page(&mut self) -> Result<WikiPage> {
        let mut page = WikiPage::default();
        let mut path: Vec<Vec<u8>> = Vec::new();
        let mut failure: Option<anyhow::Error> = None;
        // Set by an error, cleared by any event read after it.
        let mut errored = false;

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => {
                    errored = false;
                    event
                }
                Err(err) => {
                    let position = self.position();
                    let err =
                        anyhow::Error::new(err).context(format!("XML error at byte {}", position));
                    // Two errors in a row: the stream itself is broken.
                    if errored {
                        return Err(err);
                    }
                    errored = true;
                    failure.get_or_insert(err);
                    self.restart();
                    continue;
                }
            };
            let at = self.offset + self.reader.buffer_position();

            match event {
                Event::Start(ref e) => {
                    let name = e.local_name().as_ref().to_vec();
                    if name == PAGE_TAG {
                        self.pending_page = true;
                        failure.get_or_insert_with(|| {
                            anyhow::anyhow!(
                                "<page> opened at byte {} before the previous one was closed",
                                at
                            )
                        });
                        break;
                    }
                    if path.is_empty() && name == b"redirect" {
                        match e.try_get_attribute("title") {
                            Ok(Some(attr)) => match attr.unescape_value() {
                                Ok(target) => page.redirect = Some(target.into_owned()),
                                Err(err) => {
                                    page.redirect = Some(String::new());
                                    failure.get_or_insert(err.into());
                                }
                            },
                            Ok(None) => page.redirect = Some(String::new()),
                            Err(err) => {
                                page.redirect = Some(String::new());
                                failure.get_or_insert(err.into());
                            }
                        }
                    }
                    path.push(name);
                    // A repeated field replaces the earlier value.
                    match Field::at(&path) {
                        Some(Field::Title) => page.title.clear(),
                        Some(Field::Text) => page.text.clear(),
                        None => {}
                    }
                }
                Event::End(ref e) => {
                    let name = e.local_name();
                    if name.as_ref() == PAGE_TAG && !path.is_empty() {
                        let open = path.last().map(Vec::as_slice).unwrap_or_default();
                        failure.get_or_insert_with(|| mismatch(open, name.as_ref(), at));
                        break;
                    }
                    match path.pop() {
                        Some(open) => {
                            if open.as_slice() != name.as_ref() {
                                failure.get_or_insert_with(|| mismatch(&open, name.as_ref(), at));
                            }
                        }
                        None => {
                            if name.as_ref() != PAGE_TAG {
                                failure
                                    .get_or_insert_with(|| mismatch(PAGE_TAG, name.as_ref(), at));
                            }
                            break;
                        }
                    }
                }
                Event::Text(ref e) => {
                    if let Some(field) = Field::at(&path) {
                        match e.unescape() {
                            Ok(text) => push_field(&mut page, field, &text),
                            Err(err) => {
                                failure.get_or_insert(err.into());
                            }
                        }
                    }
                }
                Event::CData(ref e) => {
                    if let Some(field) = Field::at(&path) {
                        match std::str::from_utf8(e) {
                            Ok(text) => push_field(&mut page, field, text),
                            Err(err) => {
                                failure.get_or_insert(err.into());
                            }
                        }
                    }
                }
                Event::Eof => bail!("Dump ended inside <page> ({} open elements)", path.len()),
                _ => {}
            }
        }

        match failure {
            Some(err) => Err(err.context(format!("Undecodable page {:?}", page.title))),
            None => Ok(page),
        }
    }
}

fn tokenizer<'a>(source: Box<dyn BufRead + 'a>) -> Reader<Box<dyn BufRead + 'a>> {
    let mut reader = Reader::from_reader(source);
    // Nesting is checked per record in `read_page`, so a bad end tag
    // poisons one page instead of the reader's own tag stack.
    reader
        .trim_text(false)
        .expand_empty_elements(true)
        .check_end_names(false);
    reader
}

fn push_field(page: &mut WikiPage, field: Field, text: &str) {
    match field {
        Field::Title => page.title.push_str(text),
        Field::Text => page.text.push_str(text),
    }
}

fn mismatch(expected: &[u8], found: &[u8], position: usize) -> anyhow::Error {
    anyhow::anyhow!(
        "Expected </{}> but found </{}> at byte {}",
        String::from_utf8_lossy(expected),
        String::from_utf8_lossy(found),
        position
    )
}
