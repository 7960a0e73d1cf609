//! Route pattern parsing and matching.
//!
//! # Responsibilities
//! - Parse pattern strings into segment lists
//! - Match request paths and capture named parameters
//! - Bind a trailing wildcard to a single "rest" parameter
//!
//! # Design Decisions
//! - Literal segments compare byte-for-byte (case-sensitive)
//! - Captured values are percent-decoded exactly once, after matching
//! - No regex to guarantee O(segments) matching

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

/// Parameters captured while matching a path against a pattern.
pub type Params = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Exact segment text.
    Literal(String),
    /// `:name` — captures one segment.
    Param(String),
    /// `*name` — captures the remaining path. Only valid in last position.
    Wildcard(String),
}

/// A parsed route pattern such as `/api/invoice/:id` or `/files/*rest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse a pattern string. A `*name` segment is only treated as a
    /// wildcard in the trailing position; anywhere else it is a literal.
    pub fn parse(pattern: &str) -> Self {
        let parts: Vec<&str> = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let last = parts.len().saturating_sub(1);

        let segments = parts
            .iter()
            .enumerate()
            .map(|(i, part)| {
                if let Some(name) = part.strip_prefix(':') {
                    Segment::Param(name.to_string())
                } else if i == last && part.starts_with('*') && part.len() > 1 {
                    Segment::Wildcard(part[1..].to_string())
                } else {
                    Segment::Literal((*part).to_string())
                }
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    /// The original pattern string, used for duplicate detection and logging.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a request path, returning captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let path_segments: Vec<&str> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        let mut params = Params::new();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(expected) => {
                    if path_segments.get(i) != Some(&expected.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = path_segments.get(i)?;
                    params.insert(name.clone(), decode_once(value));
                }
                Segment::Wildcard(name) => {
                    // Everything from here on, slashes preserved. An empty
                    // rest still matches.
                    let rest = path_segments.get(i..).unwrap_or(&[]).join("/");
                    params.insert(name.clone(), decode_once(&rest));
                    return Some(params);
                }
            }
        }

        if path_segments.len() == self.segments.len() {
            Some(params)
        } else {
            None
        }
    }
}

/// Percent-decode a captured value exactly once. Invalid UTF-8 is replaced
/// rather than rejected so the adapter layer never fails on hostile input.
fn decode_once(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_match() {
        let p = RoutePattern::parse("/api/invoice/all");
        assert!(p.matches("/api/invoice/all").is_some());
        assert!(p.matches("/api/invoice").is_none());
        assert!(p.matches("/api/invoice/all/more").is_none());
    }

    #[test]
    fn named_param_capture() {
        let p = RoutePattern::parse("/api/invoice/:id");
        let params = p.matches("/api/invoice/INV-1000").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("INV-1000"));
        assert!(p.matches("/api/invoice").is_none());
    }

    #[test]
    fn params_decoded_exactly_once() {
        let p = RoutePattern::parse("/api/invoice/:id");
        // %252e is a double-encoded dot; one decode pass must leave "%2e".
        let params = p.matches("/api/invoice/%252e").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("%2e"));
    }

    #[test]
    fn trailing_wildcard_binds_rest() {
        let p = RoutePattern::parse("/files/*rest");
        let params = p.matches("/files/a/b/c.txt").unwrap();
        assert_eq!(params.get("rest").map(String::as_str), Some("a/b/c.txt"));

        let empty = p.matches("/files").unwrap();
        assert_eq!(empty.get("rest").map(String::as_str), Some(""));
    }

    #[test]
    fn root_pattern_matches_root_only() {
        let p = RoutePattern::parse("/");
        assert!(p.matches("/").is_some());
        assert!(p.matches("/anything").is_none());
    }

    #[test]
    fn matching_is_case_sensitive() {
        let p = RoutePattern::parse("/api/Search");
        assert!(p.matches("/api/search").is_none());
    }
}
