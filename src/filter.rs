use crate::config::DEFAULT_EXCLUDED_PREFIXES;
use crate::title::canonicalize;
use anyhow::{Context, Result};
use regex::Regex;

/// Outcome of checking one page against the inclusion rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    /// Page carries a `<redirect>` marker
    Redirect,
    /// Canonical title starts with an excluded namespace prefix
    Excluded,
}

/// Compiled set of title prefixes that mark non-article namespaces.
///
/// Built once at startup and only read afterwards.
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    pattern: Regex,
}

impl ExclusionRules {
    /// Prefixes go through the title canonicalizer first, so `"User talk:"`
    /// and `"user_talk:"` are the same rule.
    pub fn new<S: AsRef<str>>(prefixes: &[S]) -> Result<Self> {
        let alternatives: Vec<String> = prefixes
            .iter()
            .map(|p| canonicalize(p.as_ref()))
            .filter(|p| !p.is_empty())
            .map(|p| regex::escape(&p))
            .collect();

        // An empty alternation would match everything.
        let source = if alternatives.is_empty() {
            r"[^\s\S]".to_string()
        } else {
            format!(r"(?i)^(?:{})", alternatives.join("|"))
        };

        let pattern = Regex::new(&source)
            .with_context(|| format!("Invalid exclusion pattern: {}", source))?;
        Ok(Self { pattern })
    }

    /// Default namespace prefixes plus any extra ones.
    pub fn with_extra<S: AsRef<str>>(extra: &[S]) -> Result<Self> {
        let mut prefixes: Vec<&str> = DEFAULT_EXCLUDED_PREFIXES.to_vec();
        prefixes.extend(extra.iter().map(|p| p.as_ref()));
        Self::new(prefixes.as_slice())
    }

    pub fn is_excluded(&self, canonical_title: &str) -> bool {
        self.pattern.is_match(canonical_title)
    }

    /// Redirects are rejected whatever their title.
    pub fn check(&self, canonical_title: &str, is_redirect: bool) -> Verdict {
        if is_redirect {
            Verdict::Redirect
        } else if self.is_excluded(canonical_title) {
            Verdict::Excluded
        } else {
            Verdict::Accept
        }
    }
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_PREFIXES).expect("default exclusion prefixes compile")
    }
}
