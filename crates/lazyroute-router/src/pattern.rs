//! Path pattern parsing and matching.
//!
//! Pattern syntax:
//! - Segments are separated by `/`; leading and trailing slashes are ignored
//! - `:name` captures exactly one path segment under `name`
//! - `**` as the final segment captures the remaining tail (possibly empty)
//! - The empty pattern `""` matches only the root path
//!
//! Paths are normalized before matching: any `?query` or `#fragment` suffix is
//! dropped and empty segments are ignored, so `/users//42/` matches like
//! `users/42`.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{RouteError, RouteResult};

/// The wildcard segment, and the key its captured tail is stored under.
pub const WILDCARD: &str = "**";

/// One segment of a parsed pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
    Wildcard,
}

/// How specific a pattern is. Lower sorts first and wins ties between
/// matching patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Specificity {
    /// Only literal segments.
    Exact,
    /// At least one `:param`, no wildcard.
    Parametrized,
    /// Ends in `**`.
    Wildcard,
}

/// Parameters captured by a successful match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteParams(BTreeMap<String, String>);

impl RouteParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Tail captured by a trailing `**`, if the pattern has one.
    pub fn wildcard(&self) -> Option<&str> {
        self.get(WILDCARD)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A parsed, validated path pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathPattern {
    /// Normalized source text (no leading or trailing slash).
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse and validate a pattern.
    pub fn parse(pattern: &str) -> RouteResult<Self> {
        let raw = pattern.trim_matches('/').to_string();
        let invalid = |reason: String| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        // Paths lose everything from '?' or '#' on before matching.
        if let Some(ch) = raw.chars().find(|c| matches!(c, '?' | '#')) {
            return Err(invalid(format!("{ch:?} can never match a normalized path")));
        }

        let mut segments = Vec::new();
        if !raw.is_empty() {
            let parts: Vec<&str> = raw.split('/').collect();
            let last = parts.len() - 1;
            for (i, part) in parts.iter().enumerate() {
                let segment = if part.is_empty() {
                    return Err(invalid("empty path segment".into()));
                } else if *part == WILDCARD {
                    if i != last {
                        return Err(invalid("'**' must be the final segment".into()));
                    }
                    Segment::Wildcard
                } else if let Some(name) = part.strip_prefix(':') {
                    if name.is_empty() {
                        return Err(invalid("parameter name must not be empty".into()));
                    }
                    if segments.contains(&Segment::Param(name.to_string())) {
                        return Err(invalid(format!("repeated parameter ':{name}'")));
                    }
                    Segment::Param(name.to_string())
                } else if part.contains('*') {
                    return Err(invalid(format!(
                        "'*' is only valid as a whole '**' segment: {part:?}"
                    )));
                } else {
                    Segment::Literal(part.to_string())
                };
                segments.push(segment);
            }
        }

        Ok(Self { raw, segments })
    }

    /// Normalized pattern text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns `true` for the root pattern `""`.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn specificity(&self) -> Specificity {
        if self.segments.last() == Some(&Segment::Wildcard) {
            Specificity::Wildcard
        } else if self.segments.iter().any(|s| matches!(s, Segment::Param(_))) {
            Specificity::Parametrized
        } else {
            Specificity::Exact
        }
    }

    /// Match normalized path segments, capturing parameters.
    pub fn match_segments(&self, path: &[&str]) -> Option<RouteParams> {
        let mut params = BTreeMap::new();
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Wildcard => {
                    let tail = path.get(i..).unwrap_or_default().join("/");
                    params.insert(WILDCARD.to_string(), tail);
                    return Some(RouteParams(params));
                }
                Segment::Literal(literal) => {
                    if *path.get(i)? != literal.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), path.get(i)?.to_string());
                }
            }
        }
        (path.len() == self.segments.len()).then_some(RouteParams(params))
    }

    /// Match a raw path.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        self.match_segments(&split_path(path))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Normalize a path into its non-empty segments, dropping query and fragment.
pub fn split_path(path: &str) -> Vec<&str> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].split('/').filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literals_and_params() {
        let p = PathPattern::parse("/users/:id/posts/").unwrap();
        assert_eq!(p.as_str(), "users/:id/posts");
        assert_eq!(
            p.segments(),
            &[
                Segment::Literal("users".into()),
                Segment::Param("id".into()),
                Segment::Literal("posts".into()),
            ]
        );
        assert_eq!(p.specificity(), Specificity::Parametrized);
    }

    #[test]
    fn root_pattern_matches_only_root() {
        let p = PathPattern::parse("").unwrap();
        assert!(p.is_root());
        assert_eq!(p.specificity(), Specificity::Exact);
        assert!(p.matches("").is_some());
        assert!(p.matches("/").is_some());
        assert!(p.matches("dynamic").is_none());
    }

    #[test]
    fn exact_match() {
        let p = PathPattern::parse("dynamic").unwrap();
        assert!(p.matches("dynamic").is_some());
        assert!(p.matches("/dynamic/").is_some());
        assert!(p.matches("dynamic/extra").is_none());
        assert!(p.matches("").is_none());
    }

    #[test]
    fn param_capture() {
        let p = PathPattern::parse("users/:id").unwrap();
        let params = p.matches("users/42").unwrap();
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.len(), 1);
        assert!(p.matches("users").is_none());
    }

    #[test]
    fn wildcard_capture() {
        let p = PathPattern::parse("docs/**").unwrap();
        assert_eq!(p.specificity(), Specificity::Wildcard);
        assert_eq!(p.matches("docs/a/b/c").unwrap().wildcard(), Some("a/b/c"));
        assert_eq!(p.matches("docs").unwrap().wildcard(), Some(""));
        assert!(p.matches("other/a").is_none());
    }

    #[test]
    fn catch_all() {
        let p = PathPattern::parse("**").unwrap();
        assert!(p.matches("").is_some());
        assert_eq!(p.matches("any/thing").unwrap().wildcard(), Some("any/thing"));
    }

    #[test]
    fn query_and_fragment_ignored() {
        let p = PathPattern::parse("search").unwrap();
        assert!(p.matches("search?q=rust").is_some());
        assert!(p.matches("search#results").is_some());
        assert_eq!(split_path("/a//b/?x=1"), vec!["a", "b"]);
    }

    #[test]
    fn reject_invalid_patterns() {
        for bad in ["a//b", "**/tail", "a/:", "a/:id/:id", "a*b", "*", "a?b", "#top"] {
            assert!(
                PathPattern::parse(bad).is_err(),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn specificity_ordering() {
        assert!(Specificity::Exact < Specificity::Parametrized);
        assert!(Specificity::Parametrized < Specificity::Wildcard);
    }
}
