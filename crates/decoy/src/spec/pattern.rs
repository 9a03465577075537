//! Compiled value patterns shared by the host, path, header and query predicates.
//!
//! This module provides:
//! - `CachedValue` - the literal source with a pre-computed lowercase form
//! - `RegexMode` - whether a pattern searches within a value or must cover all of it
//! - `Pattern` - literal + regex pair evaluated as "either matches"
//! - `compile_regex` - process-wide regex cache keyed by pattern string

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

static REGEX_CACHE: Lazy<RwLock<HashMap<String, Arc<Regex>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Compile a regex once per distinct pattern string.
pub fn compile_regex(pattern: &str) -> Result<Arc<Regex>, regex::Error> {
    if let Some(regex) = REGEX_CACHE.read().get(pattern) {
        return Ok(Arc::clone(regex));
    }
    let regex = Arc::new(Regex::new(pattern)?);
    let mut cache = REGEX_CACHE.write();
    Ok(Arc::clone(
        cache.entry(pattern.to_string()).or_insert(regex),
    ))
}

#[cfg(test)]
pub(crate) fn is_cached(pattern: &str) -> bool {
    REGEX_CACHE.read().contains_key(pattern)
}

/// How a pattern is applied to an actual value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegexMode {
    /// The pattern may match anywhere in the value; explicit `^`/`$` still anchor.
    #[default]
    Search,
    /// The pattern must match the whole value.
    Full,
}

/// A string value with pre-computed lowercase for case-insensitive comparisons.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue {
    pub value: String,
    pub lower: String,
}

impl CachedValue {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let lower = value.to_lowercase();
        Self { value, lower }
    }

    #[inline]
    pub fn equals(&self, value: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            value == self.value
        } else {
            value.to_lowercase() == self.lower
        }
    }

    #[inline]
    pub fn contained_in(&self, value: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            value.contains(&self.value)
        } else {
            value.to_lowercase().contains(&self.lower)
        }
    }
}

/// A compiled value pattern.
///
/// A value matches when either the literal source matches it (substring in
/// `Search` mode, equality in `Full` mode) or the regex does. The literal arm
/// lets values with regex metacharacters, such as `Agent (version1.0)`, match
/// themselves.
#[derive(Debug, Clone)]
pub struct Pattern {
    literal: CachedValue,
    regex: Option<Arc<Regex>>,
    mode: RegexMode,
    case_sensitive: bool,
}

impl Pattern {
    /// Compile a pattern whose regex must be valid.
    pub fn compile(
        source: &str,
        mode: RegexMode,
        case_sensitive: bool,
    ) -> Result<Self, regex::Error> {
        let regex = compile_regex(&regex_source(source, mode, case_sensitive))?;
        Ok(Self {
            literal: CachedValue::new(source),
            regex: Some(regex),
            mode,
            case_sensitive,
        })
    }

    /// Compile a pattern that falls back to literal-only matching when the
    /// source is not a valid regex.
    pub fn lenient(source: &str, mode: RegexMode, case_sensitive: bool) -> Self {
        let regex = compile_regex(&regex_source(source, mode, case_sensitive)).ok();
        Self {
            literal: CachedValue::new(source),
            regex,
            mode,
            case_sensitive,
        }
    }

    /// Literal source of the pattern.
    pub fn as_str(&self) -> &str {
        &self.literal.value
    }

    pub fn mode(&self) -> RegexMode {
        self.mode
    }

    pub fn has_regex(&self) -> bool {
        self.regex.is_some()
    }

    /// Literal equality only, honoring case sensitivity.
    pub fn equals(&self, value: &str) -> bool {
        self.literal.equals(value, self.case_sensitive)
    }

    pub fn matches(&self, value: &str) -> bool {
        let literal = match self.mode {
            RegexMode::Search => self.literal.contained_in(value, self.case_sensitive),
            RegexMode::Full => self.literal.equals(value, self.case_sensitive),
        };
        literal || self.regex.as_ref().is_some_and(|re| re.is_match(value))
    }
}

fn regex_source(source: &str, mode: RegexMode, case_sensitive: bool) -> String {
    let flags = if case_sensitive { "" } else { "(?i)" };
    match mode {
        RegexMode::Search => format!("{flags}{source}"),
        RegexMode::Full => format!("{flags}^(?:{source})$"),
    }
}
