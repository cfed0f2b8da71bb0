/// Counters for one extraction run, owned by the driver.
///
/// `accepted` counts pages that passed the filter, whether or not their
/// file could be written.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub pages_seen: u64,
    pub accepted: u64,
    /// Article files actually created
    pub written: u64,
    pub redirects_skipped: u64,
    pub excluded: u64,
    pub decode_failures: u64,
    pub write_failures: u64,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_pages(&mut self) {
        self.pages_seen += 1;
    }

    pub fn inc_accepted(&mut self) {
        self.accepted += 1;
    }

    pub fn inc_written(&mut self) {
        self.written += 1;
    }

    pub fn inc_redirects(&mut self) {
        self.redirects_skipped += 1;
    }

    pub fn inc_excluded(&mut self) {
        self.excluded += 1;
    }

    pub fn inc_decode_failures(&mut self) {
        self.decode_failures += 1;
    }

    pub fn inc_write_failures(&mut self) {
        self.write_failures += 1;
    }

    pub fn articles(&self) -> u64 {
        self.accepted
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}
