//! Path language used to address nodes in a configuration tree.
//!
//! Paths are written as member names joined by a separator (default `.`),
//! with list positions written through an [`IndexFormat`] (default `[%d]`):
//! `database.pools[1].host`. Flattened environment keys use the same
//! grammar with `_` and `_%d`: `DATABASE_POOLS_1_HOST`.

use std::fmt;

use crate::error::PathError;

mod index;

pub use index::IndexFormat;

/// One step of a path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A mapping key or record field.
    Member(String),
    /// A position inside a list.
    Index(usize),
}

impl PathSegment {
    /// Returns the member name, if this is a member segment.
    #[must_use]
    pub fn as_member(&self) -> Option<&str> {
        match self {
            Self::Member(name) => Some(name),
            Self::Index(_) => None,
        }
    }

    /// Compare two segments, ignoring ASCII case for member names.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Member(a), Self::Member(b)) => a.eq_ignore_ascii_case(b),
            (Self::Index(a), Self::Index(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member(name) => f.write_str(name),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Separator and index format that together define a path grammar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathSyntax {
    separator: String,
    index: IndexFormat,
}

impl Default for PathSyntax {
    fn default() -> Self {
        Self {
            separator: ".".to_owned(),
            index: IndexFormat::brackets(),
        }
    }
}

impl PathSyntax {
    /// Build a syntax from a separator and an index format.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::EmptySeparator`] when `separator` is empty.
    pub fn new(separator: impl Into<String>, index: IndexFormat) -> Result<Self, PathError> {
        let separator = separator.into();
        if separator.is_empty() {
            return Err(PathError::EmptySeparator);
        }
        Ok(Self { separator, index })
    }

    /// Environment-style syntax: `_` separator and `_%d` indices.
    #[must_use]
    pub fn env() -> Self {
        Self {
            separator: "_".to_owned(),
            index: IndexFormat::underscore(),
        }
    }

    /// The member separator.
    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// The index format.
    #[must_use]
    pub const fn index_format(&self) -> &IndexFormat {
        &self.index
    }

    /// Split `path` into segments.
    ///
    /// An index token only counts when it is complete and followed by the end
    /// of the path, the separator, or another index token; anything else
    /// (`a[x]`, `a[-1]`, `a[1]b`) stays member text.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::EmptySegment`] when a member between separators is
    /// empty, including leading and trailing separators.
    ///
    /// # Examples
    ///
    /// ```
    /// use confstore::{PathSegment, PathSyntax};
    /// let segments = PathSyntax::default().parse("pools[1].host").expect("valid path");
    /// assert_eq!(
    ///     segments,
    ///     vec![
    ///         PathSegment::Member("pools".into()),
    ///         PathSegment::Index(1),
    ///         PathSegment::Member("host".into()),
    ///     ]
    /// );
    /// ```
    pub fn parse(&self, path: &str) -> Result<Vec<PathSegment>, PathError> {
        let empty = || PathError::EmptySegment {
            path: path.to_owned(),
        };
        let mut segments = Vec::new();
        let mut rest = path;
        let mut after_separator = false;
        while !rest.is_empty() {
            if let Some((index, len)) = self.index_token(rest) {
                segments.push(PathSegment::Index(index));
                rest = rest.get(len..).unwrap_or_default();
                after_separator = false;
                continue;
            }
            if let Some(tail) = rest.strip_prefix(self.separator.as_str()) {
                if segments.is_empty() || after_separator || tail.is_empty() {
                    return Err(empty());
                }
                rest = tail;
                after_separator = true;
                continue;
            }
            let (member, tail) = rest.split_at_checked(self.member_end(rest)).ok_or_else(empty)?;
            segments.push(PathSegment::Member(member.to_owned()));
            rest = tail;
            after_separator = false;
        }
        Ok(segments)
    }

    /// Write `segments` back out in this syntax.
    ///
    /// Members are joined with the separator; index tokens attach directly to
    /// whatever precedes them.
    #[must_use]
    pub fn render(&self, segments: &[PathSegment]) -> String {
        let mut out = String::new();
        for segment in segments {
            match segment {
                PathSegment::Member(name) => {
                    if !out.is_empty() {
                        out.push_str(&self.separator);
                    }
                    out.push_str(name);
                }
                PathSegment::Index(index) => out.push_str(&self.index.render(*index)),
            }
        }
        out
    }

    fn index_token(&self, text: &str) -> Option<(usize, usize)> {
        let (index, len) = self.index.match_start(text)?;
        let after = text.get(len..)?;
        let bounded = after.is_empty()
            || after.starts_with(self.separator.as_str())
            || self.index.match_start(after).is_some();
        bounded.then_some((index, len))
    }

    fn member_end(&self, text: &str) -> usize {
        text.char_indices()
            .skip(1)
            .map(|(pos, _)| pos)
            .find(|&pos| {
                text.get(pos..).is_some_and(|tail| {
                    tail.starts_with(self.separator.as_str()) || self.index_token(tail).is_some()
                })
            })
            .unwrap_or(text.len())
    }
}

#[cfg(test)]
mod tests;
