//! Domain types for watch entries.
//!
//! A label is the verbatim text of a locations line. It is never trimmed or
//! normalized: two lines that parse to the same offsets but differ in spacing
//! are two distinct entries, and consumers see the exact text.

use std::borrow::Borrow;
use std::fmt;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// The identifier of a watch entry, and its key on the wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(pub String);

impl Label {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl Borrow<str> for Label {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Watch entry
// ---------------------------------------------------------------------------

/// One configured pointer chain plus its textual identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEntry {
    pub label: Label,
    /// Offsets added successively to the running address, in line order.
    pub offsets: Vec<u32>,
}

impl WatchEntry {
    pub fn new(label: impl Into<Label>, offsets: Vec<u32>) -> Self {
        Self {
            label: label.into(),
            offsets,
        }
    }
}
