//! Watch-list loading.
//!
//! # Format
//!
//! ```text
//! 804d7420 14        <- read u32 at 0x804d7420, then at (result + 0x14)
//! 0x80453080         <- a `0x` prefix is accepted
//! 80453f10 10 zz 4   <- parsing stops at `zz`; the `4` is ignored
//! ```
//!
//! Every non-empty line is one entry. The whole line is the entry's label,
//! so a repeated line collapses into a single entry.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{io_err, WatchListError};
use crate::types::{Label, WatchEntry};

/// The ordered set of watch entries, keyed by label.
///
/// Iteration visits entries in ascending label order, which is also the
/// order records appear in a composed message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchList {
    entries: BTreeMap<Label, WatchEntry>,
}

impl WatchList {
    /// Load a watch list from `path`.
    ///
    /// Returns `WatchListError::Io` if the file cannot be opened or read and
    /// `WatchListError::Empty` if it contains no entries.
    pub fn load(path: &Path) -> Result<Self, WatchListError> {
        let file = File::open(path).map_err(|e| io_err(path, e))?;
        let list = Self::from_reader(BufReader::new(file)).map_err(|e| io_err(path, e))?;
        if list.is_empty() {
            return Err(WatchListError::Empty {
                path: path.to_path_buf(),
            });
        }
        tracing::debug!(path = %path.display(), entries = list.len(), "loaded watch list");
        Ok(list)
    }

    /// Read newline-delimited entries from any reader.
    ///
    /// Lines are raw bytes; anything that is not UTF-8 is kept lossily in the
    /// label. An empty result is not an error here; [`WatchList::load`]
    /// decides that.
    pub fn from_reader<R: BufRead>(mut reader: R) -> std::io::Result<Self> {
        let mut list = Self::default();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let mut line = buf.as_slice();
            if let Some(rest) = line.strip_suffix(b"\n") {
                line = rest;
            }
            if let Some(rest) = line.strip_suffix(b"\r") {
                line = rest;
            }
            list.insert_line(&String::from_utf8_lossy(line));
        }
        Ok(list)
    }

    /// Parse entries from in-memory text.
    pub fn parse(text: &str) -> Self {
        let mut list = Self::default();
        for line in text.lines() {
            list.insert_line(line);
        }
        list
    }

    fn insert_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        let entry = parse_line(line);
        self.entries.insert(entry.label.clone(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&WatchEntry> {
        self.entries.get(label)
    }

    /// Entries in ascending label order.
    pub fn iter(&self) -> impl Iterator<Item = &WatchEntry> {
        self.entries.values()
    }
}

impl<'a> IntoIterator for &'a WatchList {
    type Item = &'a WatchEntry;
    type IntoIter = std::collections::btree_map::Values<'a, Label, WatchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

/// Parse one locations line into an entry labelled with the line itself.
pub fn parse_line(line: &str) -> WatchEntry {
    let mut offsets = Vec::new();
    for token in line.split_whitespace() {
        match parse_hex_token(token) {
            HexToken::Whole(value) => offsets.push(value),
            HexToken::Prefix(value) => {
                offsets.push(value);
                break;
            }
            HexToken::Invalid => break,
        }
    }
    WatchEntry::new(line, offsets)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HexToken {
    /// The whole token was a hex number.
    Whole(u32),
    /// A hex number followed by trailing junk; parsing stops after it.
    Prefix(u32),
    Invalid,
}

fn parse_hex_token(token: &str) -> HexToken {
    let digits = match token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_hexdigit()) => rest,
        _ => token,
    };

    let end = digits
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(digits.len());
    if end == 0 {
        return HexToken::Invalid;
    }

    match u32::from_str_radix(&digits[..end], 16) {
        Ok(value) if end == digits.len() => HexToken::Whole(value),
        Ok(value) => HexToken::Prefix(value),
        Err(_) => HexToken::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1000 4", &[0x1000, 0x4])]
    #[case("2000 8 c", &[0x2000, 0x8, 0xc])]
    #[case("0x80453080", &[0x8045_3080])]
    #[case("0X10 0x20", &[0x10, 0x20])]
    #[case("804D7420\t14", &[0x804d_7420, 0x14])]
    #[case("  10   20  ", &[0x10, 0x20])]
    #[case("10 zz 4", &[0x10])]
    #[case("10 4zz 8", &[0x10, 0x4])]
    #[case("0x", &[0x0])]
    #[case("100000000 4", &[])]
    #[case("ffffffff", &[0xffff_ffff])]
    #[case("nothing here", &[])]
    #[case("   ", &[])]
    fn parse_line_offsets(#[case] line: &str, #[case] expected: &[u32]) {
        let entry = parse_line(line);
        assert_eq!(entry.offsets, expected);
        assert_eq!(entry.label.as_str(), line, "label must be the verbatim line");
    }

    #[test]
    fn duplicate_lines_collapse() {
        let list = WatchList::parse("1000 4\n1000 4\n2000\n");
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn differently_spaced_lines_stay_distinct() {
        let list = WatchList::parse("1000 4\n1000  4\n");
        assert_eq!(list.len(), 2);
        assert_eq!(
            list.get("1000 4").map(|e| e.offsets.clone()),
            list.get("1000  4").map(|e| e.offsets.clone())
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        let list = WatchList::parse("\n1000\n\n\n2000\n\n");
        assert_eq!(list.len(), 2);
        assert!(list.get("").is_none());
    }

    #[test]
    fn crlf_terminator_is_not_part_of_label() {
        let list = WatchList::parse("1000 4\r\n2000\r\n");
        assert!(list.get("1000 4").is_some());
        assert!(list.get("2000").is_some());
    }

    #[test]
    fn iteration_is_sorted_by_label() {
        let list = WatchList::parse("b 1\na 2\n10\n");
        let labels: Vec<&str> = list.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["10", "a 2", "b 1"]);
    }

    #[test]
    fn from_reader_matches_parse() {
        let text = "1000 4\r\n2000 8 c";
        let from_reader = WatchList::from_reader(text.as_bytes()).unwrap();
        assert_eq!(from_reader, WatchList::parse(text));
    }
}
