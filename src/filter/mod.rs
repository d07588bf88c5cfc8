//! The symbol filter: a reusable gate that decides whether a candidate
//! word is worth indexing.
//!
//! Configuration lives in the plain-text lists under `data/`, compiled
//! in at build time. The cascade mirrors the order the rules are
//! cheapest to apply in: length, all-digits, stopword/keyword lookup,
//! regex exclusions.

use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;

/// Words shorter than this are never indexed.
pub const MIN_SYMBOL_LEN: usize = 3;

static STOPWORDS: &str = include_str!("../../data/stopwords.txt");
static EXCLUDE_PATTERNS: &str = include_str!("../../data/exclude_patterns.txt");

/// Why a word was rejected, or `Valid` when it passed the cascade.
///
/// The query tool reuses this to explain zero-result patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict {
    TooShort,
    Numeric,
    Stopword,
    Keyword,
    Excluded,
    Valid,
}

impl FilterVerdict {
    pub fn describe(self) -> &'static str {
        match self {
            FilterVerdict::TooShort => "shorter than the minimum indexed length",
            FilterVerdict::Numeric => "purely numeric",
            FilterVerdict::Stopword => "a stopword",
            FilterVerdict::Keyword => "a language keyword",
            FilterVerdict::Excluded => "excluded by a noise pattern",
            FilterVerdict::Valid => "a valid symbol",
        }
    }
}

/// Pure indexability predicate over candidate words.
///
/// One filter is built per language (stopwords are shared, keywords are
/// per-language); the query tool builds one over the union of all
/// keyword lists for its diagnostics.
pub struct SymbolFilter {
    min_len: usize,
    stopwords: HashSet<String>,
    keywords: HashSet<String>,
    patterns: Vec<Regex>,
}

impl SymbolFilter {
    /// Build a filter from the embedded stopword/exclusion lists plus
    /// the given keyword file contents.
    pub fn new(keyword_lists: &[&str]) -> Result<SymbolFilter> {
        let stopwords = word_list(STOPWORDS).map(str::to_string).collect();

        let mut keywords = HashSet::new();
        for list in keyword_lists {
            keywords.extend(word_list(list).map(str::to_string));
        }

        let mut patterns = Vec::new();
        for line in word_list(EXCLUDE_PATTERNS) {
            let compiled = Regex::new(&format!("(?i){line}"))
                .with_context(|| format!("bad exclusion pattern '{line}'"))?;
            patterns.push(compiled);
        }

        Ok(SymbolFilter {
            min_len: MIN_SYMBOL_LEN,
            stopwords,
            keywords,
            patterns,
        })
    }

    /// Run the full cascade and report where the word landed.
    pub fn classify(&self, word: &str) -> FilterVerdict {
        if word.chars().count() < self.min_len {
            return FilterVerdict::TooShort;
        }

        if word.chars().all(|c| c.is_ascii_digit()) {
            return FilterVerdict::Numeric;
        }

        let lowered = word.to_lowercase();
        if self.stopwords.contains(&lowered) {
            return FilterVerdict::Stopword;
        }
        if self.keywords.contains(&lowered) {
            return FilterVerdict::Keyword;
        }

        if self.patterns.iter().any(|p| p.is_match(&lowered)) {
            return FilterVerdict::Excluded;
        }

        FilterVerdict::Valid
    }

    /// Whether `word` should be written to the index.
    pub fn should_index(&self, word: &str) -> bool {
        self.classify(word) == FilterVerdict::Valid
    }
}

/// Strip leading and trailing punctuation from a word pulled out of a
/// comment or string literal, preserving identifier characters and the
/// `$` sigil.
pub fn clean_string_symbol(raw: &str) -> &str {
    raw.trim_matches(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
}

fn word_list(data: &str) -> impl Iterator<Item = &str> {
    data.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> SymbolFilter {
        SymbolFilter::new(&["def\nclass\nlambda\n"]).expect("filter")
    }

    #[test]
    fn cascade_applies_rules_in_order() {
        let f = filter();
        assert_eq!(f.classify(""), FilterVerdict::TooShort);
        assert_eq!(f.classify("ab"), FilterVerdict::TooShort);
        assert_eq!(f.classify("12345"), FilterVerdict::Numeric);
        assert_eq!(f.classify("The"), FilterVerdict::Stopword);
        assert_eq!(f.classify("LAMBDA"), FilterVerdict::Keyword);
        assert_eq!(f.classify("validateUser"), FilterVerdict::Valid);
    }

    #[test]
    fn noise_patterns_reject_css_and_numeric_forms() {
        let f = filter();
        assert_eq!(f.classify("12px"), FilterVerdict::Excluded);
        assert_eq!(f.classify("#ff00aa"), FilterVerdict::Excluded);
        assert_eq!(f.classify("v1.2.3"), FilterVerdict::Excluded);
        assert_eq!(f.classify("1920x1080"), FilterVerdict::Excluded);
        assert_eq!(f.classify("3rd"), FilterVerdict::Excluded);
        assert_eq!(f.classify("100%"), FilterVerdict::Excluded);
        assert_eq!(f.classify("250ms"), FilterVerdict::Excluded);
        assert_eq!(f.classify("0xdeadbeef"), FilterVerdict::Excluded);
    }

    #[test]
    fn two_digit_numbers_fail_on_length_first() {
        assert_eq!(filter().classify("42"), FilterVerdict::TooShort);
    }

    #[test]
    fn clean_string_symbol_strips_edge_punctuation() {
        assert_eq!(clean_string_symbol("(foo),"), "foo");
        assert_eq!(clean_string_symbol("\"bar\""), "bar");
        assert_eq!(clean_string_symbol("$this->"), "$this");
        assert_eq!(clean_string_symbol("foo.bar"), "foo.bar");
        assert_eq!(clean_string_symbol("***"), "");
    }
}
