use std::{
    cmp,
    collections::{HashMap, hash_map::Entry},
};

use bstr::BString;

use crate::{
    io::writer::{
        Record,
        container::stats::{ContainerStats, position_value, reference_sequence_id_value},
    },
    record::{Flags, MateFlags},
};

/// Resolves mate pairs within a slice.
///
/// Records are scanned in order with a pair table keyed on (name, secondary
/// flag). When a record's predecessor with the same key passes the
/// linkability checks, the predecessor is demoted from detached to
/// mate-downstream and its prematurely accumulated mate statistics are
/// withdrawn; otherwise the record is marked detached and its mate fields
/// are accumulated.
pub(super) fn resolve_mates(
    records: &mut [Record],
    stats: &mut ContainerStats,
    lossy_read_names: bool,
) {
    let mut indices: HashMap<(Option<BString>, bool), usize> = HashMap::new();

    for i in 0..records.len() {
        let flags = records[i].bam_flags;
        let mut mate = None;

        if flags.is_segmented() {
            let key = (records[i].name.clone(), flags.is_secondary());

            match indices.entry(key) {
                Entry::Occupied(mut entry) => {
                    let j = *entry.get();

                    if mates_are_linkable(records, j, i, lossy_read_names) {
                        entry.insert(i);
                        mate = Some(j);
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(i);
                }
            }
        }

        match mate {
            Some(j) => link_mates(records, j, i, stats),
            None => set_detached(&mut records[i], stats),
        }
    }
}

/// Returns whether the record at `cur` and its predecessor at `prev` form a
/// self-consistent pair whose mate fields can be reconstructed from the
/// records themselves.
fn mates_are_linkable(records: &[Record], prev: usize, cur: usize, lossy_read_names: bool) -> bool {
    let p = &records[prev];
    let c = &records[cur];

    if p.reference_sequence_id != c.reference_sequence_id {
        return false;
    }

    let c_start = position_value(c.alignment_start);
    let p_start = position_value(p.alignment_start);

    let template_start = cmp::min(c_start, p_start);
    let template_end = cmp::max(
        position_value(c.alignment_end()),
        position_value(p.alignment_end()),
    );

    let sign = if c_start < p_start {
        1
    } else if c_start > p_start {
        -1
    } else if c.bam_flags.is_first_segment() {
        1
    } else {
        -1
    };

    if c.template_length != sign * (template_end - template_start + 1) {
        return false;
    }

    if p.template_length != -c.template_length {
        return false;
    }

    if position_value(c.mate_alignment_start) != p_start
        || position_value(p.mate_alignment_start) != c_start
    {
        return false;
    }

    // Each record's description of its mate must match the counterpart.
    if c.bam_flags.is_mate_unmapped() != p.bam_flags.is_unmapped()
        || c.bam_flags.is_mate_reverse_complemented() != p.bam_flags.is_reverse_complemented()
        || p.bam_flags.is_mate_unmapped() != c.bam_flags.is_unmapped()
        || p.bam_flags.is_mate_reverse_complemented() != c.bam_flags.is_reverse_complemented()
    {
        return false;
    }

    if c.bam_flags.is_supplementary() || p.bam_flags.is_supplementary() {
        return false;
    }

    // In lossy-name mode a linked record has no stored name, so linking is
    // only allowed when neither record needs one.
    if lossy_read_names && !(c.cram_flags.name_is_discarded() && p.cram_flags.name_is_discarded())
    {
        return false;
    }

    true
}

/// Links the record at `prev` to its downstream mate at `cur`.
fn link_mates(records: &mut [Record], prev: usize, cur: usize, stats: &mut ContainerStats) {
    let prev_alignment_start = records[prev].alignment_start;
    let prev_flags = records[prev].bam_flags;

    {
        let c = &mut records[cur];

        // A later record of the same template may still link against this
        // one, so keep its mate fields coherent even though they are not
        // emitted.
        c.mate_alignment_start = prev_alignment_start;

        let mut mate_flags = MateFlags::default();

        if prev_flags.is_unmapped() {
            mate_flags.insert(MateFlags::IS_UNMAPPED);
        }

        if prev_flags.is_reverse_complemented() {
            mate_flags.insert(MateFlags::IS_ON_NEGATIVE_STRAND);
        }

        c.mate_flags = mate_flags;

        stats.cram_flags.add(i64::from(c.cram_flags.wire_bits()));
    }

    let p = &mut records[prev];

    // Withdraw the flags accumulated when this record was processed, and
    // the mate fields if they were accumulated with them.
    stats.cram_flags.remove(i64::from(p.cram_flags.wire_bits()));

    if p.cram_flags.contains(Flags::STATS_ADDED) {
        stats
            .mate_alignment_starts
            .remove(position_value(p.mate_alignment_start));
        stats.mate_flags.remove(i64::from(p.mate_flags.bits()));
        stats.template_lengths.remove(p.template_length);
        stats
            .mate_reference_sequence_ids
            .remove(reference_sequence_id_value(p.mate_reference_sequence_id));

        p.cram_flags.remove(Flags::STATS_ADDED);
    }

    p.cram_flags.remove(Flags::IS_DETACHED);
    p.cram_flags.insert(Flags::MATE_IS_DOWNSTREAM);
    stats.cram_flags.add(i64::from(p.cram_flags.wire_bits()));

    let mate_distance = cur - prev - 1;
    p.mate_distance = Some(mate_distance);
    stats.mate_distances.add(mate_distance as i64);
}

fn set_detached(record: &mut Record, stats: &mut ContainerStats) {
    let mut mate_flags = MateFlags::default();

    if record.bam_flags.is_mate_unmapped() {
        mate_flags.insert(MateFlags::IS_UNMAPPED);
    }

    if record.bam_flags.is_mate_reverse_complemented() {
        mate_flags.insert(MateFlags::IS_ON_NEGATIVE_STRAND);
    }

    record.mate_flags = mate_flags;

    stats.mate_flags.add(i64::from(mate_flags.bits()));
    stats
        .mate_alignment_starts
        .add(position_value(record.mate_alignment_start));
    stats.template_lengths.add(record.template_length);
    stats
        .mate_reference_sequence_ids
        .add(reference_sequence_id_value(record.mate_reference_sequence_id));

    record.cram_flags.insert(Flags::IS_DETACHED);
    stats
        .cram_flags
        .add(i64::from(record.cram_flags.wire_bits()));

    record.cram_flags.insert(Flags::STATS_ADDED);
}

#[cfg(test)]
mod tests {
    use noodles_core::Position;
    use noodles_sam::alignment::record::Flags as BamFlags;

    use super::*;

    fn paired_record(
        name: &str,
        start: usize,
        mate_start: usize,
        template_length: i64,
        first: bool,
    ) -> Record {
        let mut flags = BamFlags::SEGMENTED;

        flags.insert(if first {
            BamFlags::FIRST_SEGMENT
        } else {
            BamFlags::LAST_SEGMENT
        });

        Record {
            bam_flags: flags,
            name: Some(name.into()),
            reference_sequence_id: Some(0),
            read_length: 100,
            alignment_start: Position::new(start),
            mate_reference_sequence_id: Some(0),
            mate_alignment_start: Position::new(mate_start),
            template_length,
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_mates_with_linkable_pair() {
        let mut records = vec![
            paired_record("x", 100, 200, 200, true),
            paired_record("x", 200, 100, -200, false),
        ];

        let mut stats = ContainerStats::default();
        resolve_mates(&mut records, &mut stats, false);

        assert!(records[0].cram_flags.mate_is_downstream());
        assert!(!records[0].cram_flags.is_detached());
        assert_eq!(records[0].mate_distance, Some(0));

        assert!(!records[1].cram_flags.is_detached());
        assert!(!records[1].cram_flags.mate_is_downstream());

        // The withdrawn mate statistics leave no trace of the detached
        // interlude.
        assert!(stats.mate_flags.is_empty());
        assert!(stats.template_lengths.is_empty());
        assert!(stats.mate_alignment_starts.is_empty());
        assert!(stats.mate_reference_sequence_ids.is_empty());
        assert_eq!(stats.mate_distances.total(), 1);
        assert_eq!(stats.cram_flags.total(), 2);
    }

    #[test]
    fn test_resolve_mates_with_mismatched_template_length() {
        let mut records = vec![
            paired_record("x", 100, 200, 150, true),
            paired_record("x", 200, 100, -150, false),
        ];

        let mut stats = ContainerStats::default();
        resolve_mates(&mut records, &mut stats, false);

        // TLEN does not match the span, so both records stay detached.
        assert!(records[0].cram_flags.is_detached());
        assert!(records[1].cram_flags.is_detached());
        assert_eq!(stats.template_lengths.total(), 2);
    }

    #[test]
    fn test_resolve_mates_with_supplementary_record() {
        let mut records = vec![
            paired_record("x", 100, 200, 200, true),
            paired_record("x", 200, 100, -200, false),
        ];

        records[1].bam_flags.insert(BamFlags::SUPPLEMENTARY);

        let mut stats = ContainerStats::default();
        resolve_mates(&mut records, &mut stats, false);

        assert!(records[0].cram_flags.is_detached());
        assert!(records[1].cram_flags.is_detached());
    }

    #[test]
    fn test_resolve_mates_with_lossy_names_requires_discarded_names() {
        let mut records = vec![
            paired_record("x", 100, 200, 200, true),
            paired_record("x", 200, 100, -200, false),
        ];

        // Names were not discarded (template incomplete), so linking is
        // refused in lossy mode.
        let mut stats = ContainerStats::default();
        resolve_mates(&mut records, &mut stats, true);

        assert!(records[0].cram_flags.is_detached());
        assert!(records[1].cram_flags.is_detached());

        let mut records = vec![
            paired_record("x", 100, 200, 200, true),
            paired_record("x", 200, 100, -200, false),
        ];

        for record in &mut records {
            record.cram_flags.insert(Flags::DISCARD_NAME);
        }

        let mut stats = ContainerStats::default();
        resolve_mates(&mut records, &mut stats, true);

        assert!(records[0].cram_flags.mate_is_downstream());
        assert!(!records[1].cram_flags.is_detached());
    }

    #[test]
    fn test_resolve_mates_with_unpaired_record() {
        let mut records = vec![Record {
            bam_flags: BamFlags::empty(),
            name: Some("y".into()),
            reference_sequence_id: Some(0),
            alignment_start: Position::new(8),
            ..Default::default()
        }];

        let mut stats = ContainerStats::default();
        resolve_mates(&mut records, &mut stats, false);

        assert!(records[0].cram_flags.is_detached());
        assert!(records[0].cram_flags.contains(Flags::STATS_ADDED));
    }
}
