//! Change detection and the wire message format.
//!
//! A message is a run of two-line records, `<label>\n<value>\n`, where the
//! value is lowercase hex without padding or prefix. Only entries whose value
//! changed since the previous compose appear. An empty message means nothing
//! changed.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::chaser::chase;
use crate::memory::ReadU32;
use crate::types::Label;
use crate::watch_list::WatchList;

/// Last observed value per label.
pub type ValueStore = BTreeMap<Label, u32>;

/// Owns the value cache and turns fresh reads into delta messages.
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    values: ValueStore,
}

impl ChangeDetector {
    /// A detector with a zero slot for every entry in `list`.
    pub fn seeded(list: &WatchList) -> Self {
        let values = list.iter().map(|entry| (entry.label.clone(), 0)).collect();
        Self { values }
    }

    pub fn values(&self) -> &ValueStore {
        &self.values
    }

    /// Chase every entry, update the cache, and render the changed ones.
    ///
    /// Entries are visited in label order, so for fixed memory contents the
    /// output is deterministic. A second call with unchanged memory returns
    /// an empty string.
    pub fn compose<M: ReadU32 + ?Sized>(&mut self, list: &WatchList, memory: &M) -> String {
        let mut message = String::new();
        for entry in list {
            let new_value = chase(entry, memory);
            let current = self.values.entry(entry.label.clone()).or_insert(0);
            if new_value != *current {
                *current = new_value;
                // Writing to a String cannot fail.
                let _ = write!(message, "{}\n{:x}\n", entry.label, new_value);
            }
        }
        message
    }
}

// ---------------------------------------------------------------------------
// Decoding (consumer side)
// ---------------------------------------------------------------------------

/// One `label = value` pair decoded from a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub label: String,
    pub value: u32,
}

/// Split a received message back into records.
///
/// Trailing NUL bytes (datagram framing) are ignored. A record whose value
/// line is not hex is skipped; a dangling label without a value line is
/// dropped.
pub fn decode_records(message: &str) -> Vec<Record> {
    let body = message.trim_end_matches('\0');
    let mut lines = body.lines();
    let mut records = Vec::new();
    while let (Some(label), Some(value)) = (lines.next(), lines.next()) {
        match u32::from_str_radix(value, 16) {
            Ok(value) => records.push(Record {
                label: label.to_owned(),
                value,
            }),
            Err(_) => tracing::debug!(label, value, "skipping record with non-hex value"),
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeMemory(HashMap<u32, u32>);

    impl FakeMemory {
        fn new(words: &[(u32, u32)]) -> Self {
            Self(words.iter().copied().collect())
        }
    }

    impl ReadU32 for FakeMemory {
        fn read_u32(&self, address: u32) -> u32 {
            self.0.get(&address).copied().unwrap_or(0)
        }
    }

    #[test]
    fn only_changed_entries_are_reported() {
        let list = WatchList::parse("1000 4\n2000 8 c");
        let memory = FakeMemory::new(&[(0x1000, 0x3000), (0x3004, 0x7)]);
        let mut detector = ChangeDetector::seeded(&list);

        assert_eq!(detector.compose(&list, &memory), "1000 4\n7\n");
        assert_eq!(detector.values().get("1000 4"), Some(&7));
        assert_eq!(detector.values().get("2000 8 c"), Some(&0));
    }

    #[test]
    fn second_compose_with_same_memory_is_empty() {
        let list = WatchList::parse("1000\n2000\n");
        let memory = FakeMemory::new(&[(0x1000, 1), (0x2000, 2)]);
        let mut detector = ChangeDetector::seeded(&list);

        assert_eq!(detector.compose(&list, &memory), "1000\n1\n2000\n2\n");
        let after_first = detector.values().clone();
        assert_eq!(detector.compose(&list, &memory), "");
        assert_eq!(detector.values(), &after_first);
    }

    #[test]
    fn values_are_lowercase_unpadded_hex() {
        let list = WatchList::parse("10");
        let memory = FakeMemory::new(&[(0x10, 0x00ab_cdef)]);
        let mut detector = ChangeDetector::seeded(&list);

        assert_eq!(detector.compose(&list, &memory), "10\nabcdef\n");
    }

    #[test]
    fn change_back_to_zero_is_reported() {
        let list = WatchList::parse("10");
        let mut detector = ChangeDetector::seeded(&list);

        detector.compose(&list, &FakeMemory::new(&[(0x10, 5)]));
        assert_eq!(detector.compose(&list, &FakeMemory::new(&[])), "10\n0\n");
    }

    #[test]
    fn records_follow_label_order() {
        let list = WatchList::parse("b0\na0\n");
        let memory = FakeMemory::new(&[(0xa0, 1), (0xb0, 2)]);
        let mut detector = ChangeDetector::seeded(&list);

        assert_eq!(detector.compose(&list, &memory), "a0\n1\nb0\n2\n");
    }

    #[test]
    fn decode_strips_nul_and_pairs_lines() {
        let records = decode_records("1000 4\n7\n2000 8 c\nff\n\0");
        assert_eq!(
            records,
            vec![
                Record {
                    label: "1000 4".into(),
                    value: 7
                },
                Record {
                    label: "2000 8 c".into(),
                    value: 0xff
                },
            ]
        );
    }

    #[test]
    fn decode_skips_bad_values_and_dangling_labels() {
        let records = decode_records("a\nzz\nb\n1\nc\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "b");
        assert!(decode_records("").is_empty());
    }
}
