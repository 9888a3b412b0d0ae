//! Per-data-series value statistics.

use std::collections::HashMap;

use crate::{
    container::{
        ReferenceSequenceContext,
        compression_header::preservation_map::{SubstitutionMatrix, TagSets, tag_sets},
    },
    io::writer::{Feature, Record},
};

/// A value frequency histogram for one data series.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Frequencies(HashMap<i64, u64>);

impl Frequencies {
    pub fn add(&mut self, value: i64) {
        *self.0.entry(value).or_insert(0) += 1;
    }

    /// Removes one occurrence of `value`.
    ///
    /// The mate resolver uses this to withdraw statistics that were
    /// accumulated for a detached record before it was demoted to a
    /// downstream mate.
    pub fn remove(&mut self, value: i64) {
        if let Some(count) = self.0.get_mut(&value) {
            *count -= 1;

            if *count == 0 {
                self.0.remove(&value);
            }
        }
    }

    /// Returns the number of distinct values.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn min(&self) -> Option<i64> {
        self.0.keys().min().copied()
    }

    pub fn max(&self) -> Option<i64> {
        self.0.keys().max().copied()
    }

    /// Returns the total number of occurrences.
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// Returns the sum of all occurrences, for mean estimation.
    pub fn value_sum(&self) -> i128 {
        self.0
            .iter()
            .map(|(&value, &count)| i128::from(value) * i128::from(count))
            .sum()
    }

    /// Returns (value, count) pairs sorted by value.
    pub fn to_sorted_vec(&self) -> Vec<(i64, u64)> {
        let mut pairs: Vec<_> = self.0.iter().map(|(&v, &c)| (v, c)).collect();
        pairs.sort_unstable();
        pairs
    }
}

/// Frequency histograms for every stats-driven data series of a container.
///
/// The mate-linkage series (CF, MF, NS, NP, TS, NF) are filled by the mate
/// resolver as records are paired; the rest are filled by [`Self::collect`]
/// over the finished records.
#[derive(Clone, Debug, Default)]
pub(crate) struct ContainerStats {
    pub bam_flags: Frequencies,
    pub cram_flags: Frequencies,
    pub reference_sequence_ids: Frequencies,
    pub read_lengths: Frequencies,
    pub alignment_starts: Frequencies,
    pub read_group_ids: Frequencies,
    pub mate_flags: Frequencies,
    pub mate_reference_sequence_ids: Frequencies,
    pub mate_alignment_starts: Frequencies,
    pub template_lengths: Frequencies,
    pub mate_distances: Frequencies,
    pub tag_set_ids: Frequencies,
    pub feature_counts: Frequencies,
    pub feature_codes: Frequencies,
    pub feature_position_deltas: Frequencies,
    pub deletion_lengths: Frequencies,
    pub reference_skip_lengths: Frequencies,
    pub padding_lengths: Frequencies,
    pub hard_clip_lengths: Frequencies,
    pub base_substitution_codes: Frequencies,
    pub mapping_qualities: Frequencies,
    pub bases: Frequencies,
}

impl ContainerStats {
    /// Accumulates the non-mate series over all records, slice by slice.
    ///
    /// The values added here must be exactly the values the record writer
    /// will later drive through the codecs, in particular the alignment
    /// start deltas, which restart at each slice's reference start.
    pub fn collect(
        &mut self,
        records: &[Record],
        records_per_slice: usize,
        substitution_matrix: &SubstitutionMatrix,
        tag_sets: &TagSets,
        multi_reference: bool,
        alignment_starts_are_deltas: bool,
    ) {
        for chunk in records.chunks(records_per_slice) {
            let mut prev_alignment_start =
                slice_initial_alignment_start(chunk, multi_reference);

            for record in chunk {
                self.add_record(
                    record,
                    substitution_matrix,
                    tag_sets,
                    alignment_starts_are_deltas,
                    &mut prev_alignment_start,
                );
            }
        }
    }

    fn add_record(
        &mut self,
        record: &Record,
        substitution_matrix: &SubstitutionMatrix,
        tag_sets: &TagSets,
        alignment_starts_are_deltas: bool,
        prev_alignment_start: &mut i64,
    ) {
        self.bam_flags.add(i64::from(record.bam_flags.bits()));

        // RI is counted for every record so multi-reference containers can
        // be detected via the number of distinct values, even though the
        // series is only driven when the slice is multi-reference.
        self.reference_sequence_ids
            .add(reference_sequence_id_value(record.reference_sequence_id));

        self.read_lengths.add(record.read_length as i64);

        let alignment_start = position_value(record.alignment_start);

        if alignment_starts_are_deltas {
            self.alignment_starts
                .add(alignment_start - *prev_alignment_start);
            *prev_alignment_start = alignment_start;
        } else {
            self.alignment_starts.add(alignment_start);
        }

        self.read_group_ids.add(
            record
                .read_group_id
                .map(|id| id as i64)
                .unwrap_or(-1),
        );

        if let Some(i) = tag_sets::find(tag_sets, &record.data) {
            self.tag_set_ids.add(i as i64);
        }

        if !record.bam_flags.is_unmapped() {
            self.feature_counts.add(record.features.len() as i64);

            let mut prev_position = 0;

            for feature in &record.features {
                self.feature_codes.add(i64::from(feature.code()));

                let position = usize::from(feature.position()) as i64;
                self.feature_position_deltas.add(position - prev_position);
                prev_position = position;

                match feature {
                    Feature::Substitution {
                        reference_base,
                        read_base,
                        ..
                    } => {
                        if let Some(code) =
                            substitution_matrix.find(*reference_base, *read_base)
                        {
                            self.base_substitution_codes.add(i64::from(code));
                        }
                    }
                    Feature::Deletion { len, .. } => self.deletion_lengths.add(*len as i64),
                    Feature::ReferenceSkip { len, .. } => {
                        self.reference_skip_lengths.add(*len as i64)
                    }
                    Feature::Padding { len, .. } => self.padding_lengths.add(*len as i64),
                    Feature::HardClip { len, .. } => self.hard_clip_lengths.add(*len as i64),
                    Feature::InsertBase { base, .. } => self.bases.add(i64::from(*base)),
                    Feature::ReadBase { base, .. } => self.bases.add(i64::from(*base)),
                    _ => {}
                }
            }

            self.mapping_qualities
                .add(mapping_quality_value(record.mapping_quality));
        } else {
            for &base in &record.sequence {
                self.bases.add(i64::from(base));
            }
        }
    }
}

/// Returns the alignment start value the first record of a slice deltas
/// against: the slice's minimum alignment start, or 0 for unmapped and
/// multi-reference slices.
pub(crate) fn slice_initial_alignment_start(records: &[Record], multi_reference: bool) -> i64 {
    if multi_reference {
        return 0;
    }

    match slice_reference_sequence_context(records) {
        ReferenceSequenceContext::Some(context) => usize::from(context.alignment_start()) as i64,
        _ => 0,
    }
}

/// Computes the reference context covered by a run of records.
pub(crate) fn slice_reference_sequence_context(records: &[Record]) -> ReferenceSequenceContext {
    assert!(!records.is_empty());

    let record = &records[0];

    let mut reference_sequence_context = match (
        record.reference_sequence_id,
        record.alignment_start,
        record.alignment_end(),
    ) {
        (Some(id), Some(start), Some(end)) => ReferenceSequenceContext::some(id, start, end),
        _ => ReferenceSequenceContext::None,
    };

    for record in records.iter().skip(1) {
        reference_sequence_context.update(
            record.reference_sequence_id,
            record.alignment_start,
            record.alignment_end(),
        );
    }

    reference_sequence_context
}

pub(crate) fn reference_sequence_id_value(reference_sequence_id: Option<usize>) -> i64 {
    reference_sequence_id.map(|id| id as i64).unwrap_or(-1)
}

pub(crate) fn position_value(position: Option<noodles_core::Position>) -> i64 {
    position.map(|p| usize::from(p) as i64).unwrap_or(0)
}

pub(crate) fn mapping_quality_value(
    mapping_quality: Option<noodles_sam::alignment::record::MappingQuality>,
) -> i64 {
    mapping_quality.map(|mq| i64::from(u8::from(mq))).unwrap_or(0xff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove() {
        let mut frequencies = Frequencies::default();

        frequencies.add(5);
        frequencies.add(5);
        frequencies.add(8);

        assert_eq!(frequencies.len(), 2);
        assert_eq!(frequencies.total(), 3);
        assert_eq!(frequencies.min(), Some(5));
        assert_eq!(frequencies.max(), Some(8));

        frequencies.remove(5);
        assert_eq!(frequencies.total(), 2);
        assert_eq!(frequencies.len(), 2);

        frequencies.remove(8);
        assert_eq!(frequencies.len(), 1);
        assert_eq!(frequencies.max(), Some(5));

        // Removing an absent value is a no-op.
        frequencies.remove(13);
        assert_eq!(frequencies.total(), 1);
    }

    #[test]
    fn test_to_sorted_vec() {
        let mut frequencies = Frequencies::default();
        frequencies.add(3);
        frequencies.add(1);
        frequencies.add(3);

        assert_eq!(frequencies.to_sorted_vec(), [(1, 1), (3, 2)]);
    }
}
