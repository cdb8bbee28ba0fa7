#![forbid(unsafe_code)]

//! Hierarchical path keys.
//!
//! A [`PathKey`] is the sole identity of a control: the host names a slider
//! `"fx/bloom/strength"` every frame and the toolkit resolves that string to
//! the same node every time.
//!
//! # Invariants
//!
//! 1. Two keys are equal iff their segment sequences are equal (case-sensitive).
//! 2. A parsed key always has at least one segment; only [`PathKey::root`]
//!    has zero.
//! 3. No segment is empty. Leading and trailing separators are dropped during
//!    parsing; an empty segment between two separators is rejected.
//!
//! # Canonical form
//!
//! `Display` renders `/seg1/seg2`. The root renders as `/`. Parsing the
//! canonical form of a key yields the same key.

use std::fmt;
use std::str::FromStr;

/// Segment separator.
pub const SEPARATOR: char = '/';

/// Errors produced while parsing a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The text has no segments, or contains an empty segment between separators.
    Malformed {
        /// The offending input.
        input: String,
    },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::Malformed { input } => write!(f, "malformed path: {input:?}"),
        }
    }
}

impl std::error::Error for PathError {}

/// A normalized hierarchical identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PathKey {
    segments: Vec<String>,
}

impl PathKey {
    /// The root key (zero segments). Identifies the root folder.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parse a path from text.
    ///
    /// ```
    /// # use tweakui_core::path::PathKey;
    /// let key = PathKey::parse("/fx/bloom/").unwrap();
    /// assert_eq!(key.segments(), ["fx", "bloom"]);
    /// assert_eq!(key.to_string(), "/fx/bloom");
    /// assert!(PathKey::parse("fx//bloom").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, PathError> {
        let trimmed = text.trim_matches(SEPARATOR);
        if trimmed.trim().is_empty() {
            return Err(PathError::Malformed {
                input: text.to_owned(),
            });
        }
        let mut segments = Vec::new();
        for segment in trimmed.split(SEPARATOR) {
            if segment.is_empty() {
                return Err(PathError::Malformed {
                    input: text.to_owned(),
                });
            }
            segments.push(segment.to_owned());
        }
        Ok(Self { segments })
    }

    /// Whether this is the root key.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The segments, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The last segment, used as the display name. Empty for the root.
    #[must_use]
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    /// All segments but the last.
    ///
    /// Returns `None` for a root-level path (one segment) and for the root
    /// itself; the owner of a root-level path is the root folder.
    #[must_use]
    pub fn parent(&self) -> Option<PathKey> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Extend this key by one segment.
    ///
    /// Fails if the segment is empty or contains the separator.
    pub fn child(&self, segment: &str) -> Result<PathKey, PathError> {
        if segment.is_empty() || segment.contains(SEPARATOR) {
            return Err(PathError::Malformed {
                input: format!("{self}{SEPARATOR}{segment}"),
            });
        }
        let mut segments = self.segments.clone();
        segments.push(segment.to_owned());
        Ok(Self { segments })
    }

    /// Proper, non-root prefixes of this key, shortest first.
    ///
    /// For `/a/b/c` this yields `/a` then `/a/b`.
    pub fn ancestors(&self) -> impl Iterator<Item = PathKey> + '_ {
        (1..self.segments.len()).map(move |len| Self {
            segments: self.segments[..len].to_vec(),
        })
    }

    /// True iff `other`'s segments strictly start with this key's segments.
    ///
    /// The root is an ancestor of every non-root key.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &PathKey) -> bool {
        other.segments.len() > self.segments.len() && other.segments.starts_with(&self.segments)
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "{SEPARATOR}");
        }
        for segment in &self.segments {
            write!(f, "{SEPARATOR}{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for PathKey {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for PathKey {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}
