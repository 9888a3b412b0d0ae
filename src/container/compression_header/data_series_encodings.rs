//! CRAM container compression header data series encodings.

pub(crate) mod data_series;

pub use self::data_series::DataSeries;

use std::collections::HashSet;

use super::{
    Encoding,
    encoding::codec::{Byte, ByteArray, Integer},
};
use crate::container::block;

/// The codec descriptor for each data series used by a container.
///
/// A series without an encoding is not present in any record of the
/// container.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct DataSeriesEncodings {
    pub(crate) bam_flags: Option<Encoding<Integer>>,
    pub(crate) cram_flags: Option<Encoding<Integer>>,
    pub(crate) reference_sequence_ids: Option<Encoding<Integer>>,
    pub(crate) read_lengths: Option<Encoding<Integer>>,
    pub(crate) alignment_starts: Option<Encoding<Integer>>,
    pub(crate) read_group_ids: Option<Encoding<Integer>>,
    pub(crate) names: Option<Encoding<ByteArray>>,
    pub(crate) mate_flags: Option<Encoding<Integer>>,
    pub(crate) mate_reference_sequence_ids: Option<Encoding<Integer>>,
    pub(crate) mate_alignment_starts: Option<Encoding<Integer>>,
    pub(crate) template_lengths: Option<Encoding<Integer>>,
    pub(crate) mate_distances: Option<Encoding<Integer>>,
    pub(crate) tag_set_ids: Option<Encoding<Integer>>,
    pub(crate) feature_counts: Option<Encoding<Integer>>,
    pub(crate) feature_codes: Option<Encoding<Byte>>,
    pub(crate) feature_position_deltas: Option<Encoding<Integer>>,
    pub(crate) deletion_lengths: Option<Encoding<Integer>>,
    pub(crate) stretches_of_bases: Option<Encoding<ByteArray>>,
    pub(crate) stretches_of_quality_scores: Option<Encoding<ByteArray>>,
    pub(crate) base_substitution_codes: Option<Encoding<Byte>>,
    pub(crate) insertion_bases: Option<Encoding<ByteArray>>,
    pub(crate) reference_skip_lengths: Option<Encoding<Integer>>,
    pub(crate) padding_lengths: Option<Encoding<Integer>>,
    pub(crate) hard_clip_lengths: Option<Encoding<Integer>>,
    pub(crate) soft_clip_bases: Option<Encoding<ByteArray>>,
    pub(crate) mapping_qualities: Option<Encoding<Integer>>,
    pub(crate) bases: Option<Encoding<Byte>>,
    pub(crate) quality_scores: Option<Encoding<Byte>>,
}

impl DataSeriesEncodings {
    pub fn bam_flags(&self) -> Option<&Encoding<Integer>> {
        self.bam_flags.as_ref()
    }

    pub fn cram_flags(&self) -> Option<&Encoding<Integer>> {
        self.cram_flags.as_ref()
    }

    pub fn reference_sequence_ids(&self) -> Option<&Encoding<Integer>> {
        self.reference_sequence_ids.as_ref()
    }

    pub fn read_lengths(&self) -> Option<&Encoding<Integer>> {
        self.read_lengths.as_ref()
    }

    pub fn alignment_starts(&self) -> Option<&Encoding<Integer>> {
        self.alignment_starts.as_ref()
    }

    pub fn read_group_ids(&self) -> Option<&Encoding<Integer>> {
        self.read_group_ids.as_ref()
    }

    pub fn names(&self) -> Option<&Encoding<ByteArray>> {
        self.names.as_ref()
    }

    pub fn mate_flags(&self) -> Option<&Encoding<Integer>> {
        self.mate_flags.as_ref()
    }

    pub fn mate_reference_sequence_ids(&self) -> Option<&Encoding<Integer>> {
        self.mate_reference_sequence_ids.as_ref()
    }

    pub fn mate_alignment_starts(&self) -> Option<&Encoding<Integer>> {
        self.mate_alignment_starts.as_ref()
    }

    pub fn template_lengths(&self) -> Option<&Encoding<Integer>> {
        self.template_lengths.as_ref()
    }

    pub fn mate_distances(&self) -> Option<&Encoding<Integer>> {
        self.mate_distances.as_ref()
    }

    pub fn tag_set_ids(&self) -> Option<&Encoding<Integer>> {
        self.tag_set_ids.as_ref()
    }

    pub fn feature_counts(&self) -> Option<&Encoding<Integer>> {
        self.feature_counts.as_ref()
    }

    pub fn feature_codes(&self) -> Option<&Encoding<Byte>> {
        self.feature_codes.as_ref()
    }

    pub fn feature_position_deltas(&self) -> Option<&Encoding<Integer>> {
        self.feature_position_deltas.as_ref()
    }

    pub fn deletion_lengths(&self) -> Option<&Encoding<Integer>> {
        self.deletion_lengths.as_ref()
    }

    pub fn stretches_of_bases(&self) -> Option<&Encoding<ByteArray>> {
        self.stretches_of_bases.as_ref()
    }

    pub fn stretches_of_quality_scores(&self) -> Option<&Encoding<ByteArray>> {
        self.stretches_of_quality_scores.as_ref()
    }

    pub fn base_substitution_codes(&self) -> Option<&Encoding<Byte>> {
        self.base_substitution_codes.as_ref()
    }

    pub fn insertion_bases(&self) -> Option<&Encoding<ByteArray>> {
        self.insertion_bases.as_ref()
    }

    pub fn reference_skip_lengths(&self) -> Option<&Encoding<Integer>> {
        self.reference_skip_lengths.as_ref()
    }

    pub fn padding_lengths(&self) -> Option<&Encoding<Integer>> {
        self.padding_lengths.as_ref()
    }

    pub fn hard_clip_lengths(&self) -> Option<&Encoding<Integer>> {
        self.hard_clip_lengths.as_ref()
    }

    pub fn soft_clip_bases(&self) -> Option<&Encoding<ByteArray>> {
        self.soft_clip_bases.as_ref()
    }

    pub fn mapping_qualities(&self) -> Option<&Encoding<Integer>> {
        self.mapping_qualities.as_ref()
    }

    pub fn bases(&self) -> Option<&Encoding<Byte>> {
        self.bases.as_ref()
    }

    pub fn quality_scores(&self) -> Option<&Encoding<Byte>> {
        self.quality_scores.as_ref()
    }

    /// Removes data series encodings whose external blocks ended up empty.
    ///
    /// Codecs that write to the core data block (Huffman, Beta, Gamma,
    /// Subexp) are always retained: they have no external block to test.
    pub fn retain_used_content_ids(&mut self, used: &HashSet<block::ContentId>) {
        fn is_core_integer(encoding: &Encoding<Integer>) -> bool {
            matches!(
                encoding.get(),
                Integer::Huffman { .. }
                    | Integer::Beta { .. }
                    | Integer::Gamma { .. }
                    | Integer::Subexp { .. }
            )
        }

        fn is_core_byte(encoding: &Encoding<Byte>) -> bool {
            matches!(encoding.get(), Byte::Huffman { .. })
        }

        macro_rules! clear_if_unused {
            ($field:ident, $series:expr, $is_core:expr) => {
                if let Some(encoding) = &self.$field
                    && !$is_core(encoding)
                    && !used.contains(&block::ContentId::from($series))
                {
                    self.$field = None;
                }
            };
        }

        macro_rules! clear_byte_array_if_unused {
            ($field:ident, $series:expr) => {
                if !used.contains(&block::ContentId::from($series)) {
                    self.$field = None;
                }
            };
        }

        clear_if_unused!(bam_flags, DataSeries::BamFlags, is_core_integer);
        clear_if_unused!(cram_flags, DataSeries::CramFlags, is_core_integer);
        clear_if_unused!(
            reference_sequence_ids,
            DataSeries::ReferenceSequenceIds,
            is_core_integer
        );
        clear_if_unused!(read_lengths, DataSeries::ReadLengths, is_core_integer);
        clear_if_unused!(alignment_starts, DataSeries::AlignmentStarts, is_core_integer);
        clear_if_unused!(read_group_ids, DataSeries::ReadGroupIds, is_core_integer);
        clear_byte_array_if_unused!(names, DataSeries::Names);
        clear_if_unused!(mate_flags, DataSeries::MateFlags, is_core_integer);
        clear_if_unused!(
            mate_reference_sequence_ids,
            DataSeries::MateReferenceSequenceIds,
            is_core_integer
        );
        clear_if_unused!(
            mate_alignment_starts,
            DataSeries::MateAlignmentStarts,
            is_core_integer
        );
        clear_if_unused!(template_lengths, DataSeries::TemplateLengths, is_core_integer);
        clear_if_unused!(mate_distances, DataSeries::MateDistances, is_core_integer);
        clear_if_unused!(tag_set_ids, DataSeries::TagSetIds, is_core_integer);
        clear_if_unused!(feature_counts, DataSeries::FeatureCounts, is_core_integer);
        clear_if_unused!(feature_codes, DataSeries::FeatureCodes, is_core_byte);
        clear_if_unused!(
            feature_position_deltas,
            DataSeries::FeaturePositionDeltas,
            is_core_integer
        );
        clear_if_unused!(deletion_lengths, DataSeries::DeletionLengths, is_core_integer);
        clear_byte_array_if_unused!(stretches_of_bases, DataSeries::StretchesOfBases);
        clear_byte_array_if_unused!(
            stretches_of_quality_scores,
            DataSeries::StretchesOfQualityScores
        );
        clear_if_unused!(
            base_substitution_codes,
            DataSeries::BaseSubstitutionCodes,
            is_core_byte
        );
        clear_byte_array_if_unused!(insertion_bases, DataSeries::InsertionBases);
        clear_if_unused!(
            reference_skip_lengths,
            DataSeries::ReferenceSkipLengths,
            is_core_integer
        );
        clear_if_unused!(padding_lengths, DataSeries::PaddingLengths, is_core_integer);
        clear_if_unused!(hard_clip_lengths, DataSeries::HardClipLengths, is_core_integer);
        clear_byte_array_if_unused!(soft_clip_bases, DataSeries::SoftClipBases);
        clear_if_unused!(mapping_qualities, DataSeries::MappingQualities, is_core_integer);
        clear_if_unused!(bases, DataSeries::Bases, is_core_byte);
        clear_if_unused!(quality_scores, DataSeries::QualityScores, is_core_byte);
    }
}
