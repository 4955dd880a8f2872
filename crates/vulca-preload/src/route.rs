//! Route keys, prefix rules and path normalization
//!
//! Paths coming from links may be written for the hash router used on
//! static hosting (`/#/models`) or for the history router (`/models`).
//! Both forms normalize to the same route path before prefix matching.

use crate::{PreloadError, Result};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bytes escaped in a canonical path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Logical identifier for a group of URL paths sharing one preload target
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteKey(String);

impl RouteKey {
    /// Create a new route key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RouteKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for RouteKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Maps a route key to the path prefix it owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    /// Route key
    pub key: RouteKey,
    /// Normalized path prefix (always absolute, no trailing slash)
    pub prefix: String,
}

impl RouteRule {
    /// Create a new rule, normalizing the prefix
    pub fn new(key: impl Into<RouteKey>, prefix: &str) -> Result<Self> {
        let trimmed = prefix.trim();
        if !trimmed.starts_with('/') || trimmed.contains(|c: char| c == '?' || c == '#') {
            return Err(PreloadError::InvalidPrefix(prefix.to_string()));
        }

        Ok(Self {
            key: key.into(),
            prefix: normalize_path(trimmed),
        })
    }

    /// Check whether a normalized path falls under this rule.
    ///
    /// Matching happens on segment boundaries: `/models` owns `/models`
    /// and `/models/gpt-4` but not `/modelsx`. The root prefix owns only `/`.
    pub fn matches(&self, path: &str) -> bool {
        if self.prefix == "/" {
            return path == "/";
        }

        path == self.prefix
            || path
                .strip_prefix(self.prefix.as_str())
                .map_or(false, |rest| rest.starts_with('/'))
    }
}

/// Ordered set of prefix rules
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule. Keys and prefixes must both be unique.
    pub fn insert(&mut self, rule: RouteRule) -> Result<()> {
        if self.rules.iter().any(|r| r.key == rule.key) {
            return Err(PreloadError::DuplicateRoute(rule.key.to_string()));
        }
        if self.rules.iter().any(|r| r.prefix == rule.prefix) {
            return Err(PreloadError::DuplicateRoute(rule.prefix));
        }

        self.rules.push(rule);
        Ok(())
    }

    /// Resolve a raw path to its route key. First matching rule wins.
    pub fn normalize_route(&self, path: &str) -> Option<RouteKey> {
        let normalized = normalize_path(path);
        self.rules
            .iter()
            .find(|rule| rule.matches(&normalized))
            .map(|rule| rule.key.clone())
    }

    /// Prefix owned by a key
    pub fn prefix_for(&self, key: &RouteKey) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| &r.key == key)
            .map(|r| r.prefix.as_str())
    }

    /// Keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &RouteKey> {
        self.rules.iter().map(|r| &r.key)
    }

    /// All rules in registration order
    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the table has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Normalize a raw link path into a route path.
///
/// - a hash-router fragment (`#/x`) replaces whatever path precedes it
/// - query strings and plain fragments are dropped
/// - `/` and `\` separate segments; empty and `.` segments are dropped and
///   `..` removes the previous segment
/// - each segment is percent-decoded and re-encoded, so `/展览`,
///   `/%e5%b1%95%e8%a7%88` and the path `url` produces for a link to it are
///   the same route path
/// - an empty result is the root `/`
pub fn normalize_path(raw: &str) -> String {
    let raw = raw.trim();

    let route = match raw.find('#') {
        Some(idx) if raw[idx + 1..].starts_with('/') => &raw[idx + 1..],
        Some(idx) => &raw[..idx],
        None => raw,
    };
    let route = route.split(|c: char| c == '?' || c == '#').next().unwrap_or("");

    let mut segments: Vec<String> = Vec::new();
    for segment in route
        .split(|c: char| c == '/' || c == '\\')
        .filter(|s| !s.is_empty())
    {
        let decoded = percent_decode_str(segment).decode_utf8_lossy();
        match decoded.as_ref() {
            "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(utf8_percent_encode(&decoded, SEGMENT).to_string()),
        }
    }

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}
