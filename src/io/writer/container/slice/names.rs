use std::collections::HashMap;

use bstr::BString;

use noodles_sam::alignment::record_buf::data::field::Value as ValueBuf;

use crate::{io::writer::Record, record::Flags};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum NameState {
    Counting { expected: u64, count: u64 },
    Mismatch,
}

/// Flags records whose read name can be elided.
///
/// A name may be dropped only when every read of its template is in this
/// slice: the occurrence count must equal the expected template count, and
/// every occurrence must agree on that expectation. Records that stay
/// detached keep their names regardless (the record writer stores names for
/// detached records in any mode).
pub(super) fn apply_lossy_names(records: &mut [Record]) {
    let mut states: HashMap<BString, NameState> = HashMap::new();

    for record in records.iter() {
        let Some(name) = &record.name else {
            continue;
        };

        let expected = expected_template_count(record);

        states
            .entry(name.clone())
            .and_modify(|state| {
                *state = match *state {
                    NameState::Counting {
                        expected: prev_expected,
                        count,
                    } if prev_expected == expected => NameState::Counting {
                        expected,
                        count: count + 1,
                    },
                    _ => NameState::Mismatch,
                };
            })
            .or_insert(NameState::Counting { expected, count: 1 });
    }

    for record in records.iter_mut() {
        let Some(name) = &record.name else {
            continue;
        };

        if let Some(NameState::Counting { expected, count }) = states.get(name)
            && count == expected
        {
            record.cram_flags.insert(Flags::DISCARD_NAME);
        }
    }
}

/// Returns the number of reads expected for a record's template.
///
/// The segmented flag implies two; a TC field can raise that; an SA field
/// makes the count unknowable, which forces the name to be kept.
fn expected_template_count(record: &Record) -> u64 {
    let mut expected: u64 = if record.bam_flags.is_segmented() { 2 } else { 1 };
    let mut has_tc = false;

    for (tag, value) in &record.data {
        if tag_bytes(tag) == *b"TC" {
            has_tc = true;

            if let Some(n) = value_as_count(value)
                && n > expected
            {
                expected = n;
            }
        }
    }

    if !has_tc
        && record
            .data
            .iter()
            .any(|(tag, _)| tag_bytes(tag) == *b"SA")
    {
        // Counting the SA segments of every read in the template is not
        // worth the bookkeeping; an unreachable expectation keeps the name.
        expected = u64::MAX;
    }

    expected
}

fn tag_bytes(tag: &noodles_sam::alignment::record::data::field::Tag) -> [u8; 2] {
    let buf: &[u8; 2] = tag.as_ref();
    *buf
}

fn value_as_count(value: &ValueBuf) -> Option<u64> {
    let n: i64 = match value {
        ValueBuf::Int8(n) => i64::from(*n),
        ValueBuf::UInt8(n) => i64::from(*n),
        ValueBuf::Int16(n) => i64::from(*n),
        ValueBuf::UInt16(n) => i64::from(*n),
        ValueBuf::Int32(n) => i64::from(*n),
        ValueBuf::UInt32(n) => i64::from(*n),
        _ => return None,
    };

    u64::try_from(n).ok()
}

#[cfg(test)]
mod tests {
    use noodles_core::Position;
    use noodles_sam::alignment::record::{Flags as BamFlags, data::field::Tag};

    use super::*;

    fn paired_record(name: &str) -> Record {
        Record {
            bam_flags: BamFlags::SEGMENTED,
            name: Some(name.into()),
            reference_sequence_id: Some(0),
            alignment_start: Position::new(8),
            ..Default::default()
        }
    }

    #[test]
    fn test_apply_lossy_names_with_complete_template() {
        let mut records = vec![paired_record("x"), paired_record("x")];

        apply_lossy_names(&mut records);

        assert!(records[0].cram_flags.name_is_discarded());
        assert!(records[1].cram_flags.name_is_discarded());
    }

    #[test]
    fn test_apply_lossy_names_with_incomplete_template() {
        // Only one read of the pair is in the slice.
        let mut records = vec![paired_record("x"), paired_record("y")];

        apply_lossy_names(&mut records);

        assert!(!records[0].cram_flags.name_is_discarded());
        assert!(!records[1].cram_flags.name_is_discarded());
    }

    #[test]
    fn test_apply_lossy_names_with_excess_occurrences() {
        let mut records = vec![
            paired_record("x"),
            paired_record("x"),
            paired_record("x"),
        ];

        apply_lossy_names(&mut records);

        assert!(records.iter().all(|r| !r.cram_flags.name_is_discarded()));
    }

    #[test]
    fn test_apply_lossy_names_with_template_count_field() {
        let tc = Tag::from([b'T', b'C']);

        let mut records = vec![
            paired_record("x"),
            paired_record("x"),
            paired_record("x"),
        ];

        for record in &mut records {
            record.data = vec![(tc, ValueBuf::UInt8(3))];
        }

        apply_lossy_names(&mut records);

        assert!(records.iter().all(|r| r.cram_flags.name_is_discarded()));
    }

    #[test]
    fn test_apply_lossy_names_with_other_alignments_field() {
        let mut records = vec![paired_record("x"), paired_record("x")];

        for record in &mut records {
            record.data = vec![(
                Tag::from([b'S', b'A']),
                ValueBuf::from("sq0,5,+,4M,30,0;"),
            )];
        }

        apply_lossy_names(&mut records);

        assert!(records.iter().all(|r| !r.cram_flags.name_is_discarded()));
    }
}
