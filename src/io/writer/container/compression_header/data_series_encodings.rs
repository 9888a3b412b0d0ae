use std::io::{self, Write};

use super::{write_byte_array_encoding, write_byte_encoding, write_integer_encoding};
use crate::{
    container::{
        block,
        compression_header::{
            DataSeriesEncodings, Encoding,
            data_series_encodings::DataSeries,
            encoding::codec::{Byte, ByteArray, Integer},
        },
    },
    file_definition::Version,
    huffman::generate_canonical_code_lengths,
    io::writer::{
        collections::write_array,
        container::stats::{ContainerStats, Frequencies},
        num::write_int,
    },
};

// Alphabets up to this size are Huffman-coded into the core bitstream;
// larger ones go to external blocks where the general-purpose compressors
// do better.
const MAX_HUFFMAN_ALPHABET_SIZE: usize = 8;

// A non-negative range at most this wide may use fixed-width beta coding.
const MAX_BETA_RANGE: i64 = 256;

/// Selects a codec for every data series from its value histogram.
///
/// The choice is deterministic given the histograms. Series with empty
/// histograms were never driven and get no encoding.
pub(super) fn build_data_series_encodings(
    stats: &ContainerStats,
    version: Version,
    multi_reference: bool,
    alignment_starts_are_deltas: bool,
) -> DataSeriesEncodings {
    DataSeriesEncodings {
        bam_flags: choose_integer_encoding(&stats.bam_flags, DataSeries::BamFlags, version),
        cram_flags: choose_integer_encoding(&stats.cram_flags, DataSeries::CramFlags, version),
        reference_sequence_ids: if multi_reference {
            choose_integer_encoding(
                &stats.reference_sequence_ids,
                DataSeries::ReferenceSequenceIds,
                version,
            )
        } else {
            None
        },
        read_lengths: choose_integer_encoding(&stats.read_lengths, DataSeries::ReadLengths, version),
        alignment_starts: if alignment_starts_are_deltas {
            choose_integer_encoding(
                &stats.alignment_starts,
                DataSeries::AlignmentStarts,
                version,
            )
        } else {
            // Unsorted input: absolute positions over [0, max] as fixed-width
            // beta.
            absolute_position_encoding(&stats.alignment_starts, version)
        },
        read_group_ids: choose_integer_encoding(
            &stats.read_group_ids,
            DataSeries::ReadGroupIds,
            version,
        ),
        names: Some(byte_array_stop(0x00, DataSeries::Names)),
        mate_flags: choose_integer_encoding(&stats.mate_flags, DataSeries::MateFlags, version),
        mate_reference_sequence_ids: choose_integer_encoding(
            &stats.mate_reference_sequence_ids,
            DataSeries::MateReferenceSequenceIds,
            version,
        ),
        mate_alignment_starts: choose_integer_encoding(
            &stats.mate_alignment_starts,
            DataSeries::MateAlignmentStarts,
            version,
        ),
        template_lengths: choose_integer_encoding(
            &stats.template_lengths,
            DataSeries::TemplateLengths,
            version,
        ),
        mate_distances: choose_integer_encoding(
            &stats.mate_distances,
            DataSeries::MateDistances,
            version,
        ),
        tag_set_ids: choose_integer_encoding(&stats.tag_set_ids, DataSeries::TagSetIds, version),
        feature_counts: choose_integer_encoding(
            &stats.feature_counts,
            DataSeries::FeatureCounts,
            version,
        ),
        feature_codes: choose_byte_encoding(&stats.feature_codes, DataSeries::FeatureCodes),
        feature_position_deltas: choose_integer_encoding(
            &stats.feature_position_deltas,
            DataSeries::FeaturePositionDeltas,
            version,
        ),
        deletion_lengths: choose_integer_encoding(
            &stats.deletion_lengths,
            DataSeries::DeletionLengths,
            version,
        ),
        stretches_of_bases: Some(byte_array_stop(0x00, DataSeries::StretchesOfBases)),
        stretches_of_quality_scores: None,
        base_substitution_codes: choose_byte_encoding(
            &stats.base_substitution_codes,
            DataSeries::BaseSubstitutionCodes,
        ),
        insertion_bases: Some(byte_array_stop(0x00, DataSeries::InsertionBases)),
        reference_skip_lengths: choose_integer_encoding(
            &stats.reference_skip_lengths,
            DataSeries::ReferenceSkipLengths,
            version,
        ),
        padding_lengths: choose_integer_encoding(
            &stats.padding_lengths,
            DataSeries::PaddingLengths,
            version,
        ),
        hard_clip_lengths: choose_integer_encoding(
            &stats.hard_clip_lengths,
            DataSeries::HardClipLengths,
            version,
        ),
        soft_clip_bases: Some(byte_array_stop(0x00, DataSeries::SoftClipBases)),
        mapping_qualities: choose_integer_encoding(
            &stats.mapping_qualities,
            DataSeries::MappingQualities,
            version,
        ),
        bases: choose_byte_encoding(&stats.bases, DataSeries::Bases),
        quality_scores: Some(Encoding::new(Byte::External {
            block_content_id: block::ContentId::from(DataSeries::QualityScores),
        })),
    }
}

fn byte_array_stop(stop_byte: u8, data_series: DataSeries) -> Encoding<ByteArray> {
    Encoding::new(ByteArray::ByteArrayStop {
        stop_byte,
        block_content_id: block::ContentId::from(data_series),
    })
}

/// Picks an integer codec from a histogram.
///
/// Tiny alphabets are canonically Huffman-coded into the core bitstream; a
/// dense non-negative range becomes fixed-width beta; strongly skewed
/// small-value distributions use gamma (strictly positive) or subexponential
/// (zero-based) codes; everything else is delegated to an external block.
fn choose_integer_encoding(
    frequencies: &Frequencies,
    data_series: DataSeries,
    version: Version,
) -> Option<Encoding<Integer>> {
    let block_content_id = block::ContentId::from(data_series);

    let min = frequencies.min()?;
    let max = frequencies.max()?;

    if version >= Version::V4_0 {
        // CRAM 4.0 stores integer series as external varints.
        let codec = if min < 0 {
            Integer::VarintSigned {
                block_content_id,
                offset: 0,
            }
        } else {
            Integer::VarintUnsigned {
                block_content_id,
                offset: 0,
            }
        };

        return Some(Encoding::new(codec));
    }

    if min < i64::from(i32::MIN) || max > i64::from(i32::MAX) {
        return Some(Encoding::new(Integer::External { block_content_id }));
    }

    let nvals = frequencies.len();

    if nvals <= MAX_HUFFMAN_ALPHABET_SIZE {
        let pairs: Vec<(i32, u64)> = frequencies
            .to_sorted_vec()
            .into_iter()
            .map(|(value, count)| (value as i32, count))
            .collect();

        let (alphabet, bit_lens) = generate_canonical_code_lengths(&pairs);

        return Some(Encoding::new(Integer::huffman(alphabet, bit_lens)));
    }

    let range = max - min + 1;

    if min >= 0 && range <= MAX_BETA_RANGE && (nvals as i64) * 4 >= range {
        return Some(Encoding::new(Integer::Beta {
            offset: -(min as i32),
            len: bits_needed(range - 1),
        }));
    }

    if min >= 0 && max >= 16 {
        let total = i128::from(frequencies.total());
        let mean = frequencies.value_sum() / total;

        if mean * 8 < i128::from(max) {
            let codec = if min >= 1 {
                Integer::Gamma { offset: 0 }
            } else {
                Integer::Subexp { offset: 0, k: 2 }
            };

            return Some(Encoding::new(codec));
        }
    }

    Some(Encoding::new(Integer::External { block_content_id }))
}

/// Picks a byte codec from a histogram: tiny alphabets are Huffman-coded,
/// the rest external.
fn choose_byte_encoding(
    frequencies: &Frequencies,
    data_series: DataSeries,
) -> Option<Encoding<Byte>> {
    if frequencies.is_empty() {
        return None;
    }

    let nvals = frequencies.len();

    if nvals <= 4 {
        let pairs: Vec<(i32, u64)> = frequencies
            .to_sorted_vec()
            .into_iter()
            .map(|(value, count)| (value as i32, count))
            .collect();

        let (alphabet, bit_lens) = generate_canonical_code_lengths(&pairs);

        return Some(Encoding::new(Byte::huffman(alphabet, bit_lens)));
    }

    Some(Encoding::new(Byte::External {
        block_content_id: block::ContentId::from(data_series),
    }))
}

fn absolute_position_encoding(
    frequencies: &Frequencies,
    version: Version,
) -> Option<Encoding<Integer>> {
    let max = frequencies.max()?;

    if version >= Version::V4_0 {
        return Some(Encoding::new(Integer::VarintUnsigned {
            block_content_id: block::ContentId::from(DataSeries::AlignmentStarts),
            offset: 0,
        }));
    }

    if max > i64::from(i32::MAX) {
        return Some(Encoding::new(Integer::External {
            block_content_id: block::ContentId::from(DataSeries::AlignmentStarts),
        }));
    }

    Some(Encoding::new(Integer::Beta {
        offset: 0,
        len: bits_needed(max),
    }))
}

fn bits_needed(n: i64) -> u32 {
    if n <= 0 { 1 } else { 64 - n.leading_zeros() }
}

pub(super) fn write_data_series_encodings<W>(
    writer: &mut W,
    data_series_encodings: &DataSeriesEncodings,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    let buf = encode(data_series_encodings, version)?;
    write_array(writer, version, &buf)
}

fn encode(data_series_encodings: &DataSeriesEncodings, version: Version) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_inner(&mut buf, data_series_encodings, version)?;
    Ok(buf)
}

fn encode_inner<W>(
    writer: &mut W,
    data_series_encodings: &DataSeriesEncodings,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    let len = data_series_encodings_len(data_series_encodings);
    let n = i32::try_from(len).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_int(writer, version, n)?;

    write_encodings(writer, data_series_encodings, version)?;

    Ok(())
}

fn data_series_encodings_len(encodings: &DataSeriesEncodings) -> usize {
    fn count(n: &mut usize, is_some: bool) {
        if is_some {
            *n += 1;
        }
    }

    let mut n = 0;

    count(&mut n, encodings.bam_flags().is_some());
    count(&mut n, encodings.cram_flags().is_some());
    count(&mut n, encodings.reference_sequence_ids().is_some());
    count(&mut n, encodings.read_lengths().is_some());
    count(&mut n, encodings.alignment_starts().is_some());
    count(&mut n, encodings.read_group_ids().is_some());
    count(&mut n, encodings.names().is_some());
    count(&mut n, encodings.mate_flags().is_some());
    count(&mut n, encodings.mate_reference_sequence_ids().is_some());
    count(&mut n, encodings.mate_alignment_starts().is_some());
    count(&mut n, encodings.template_lengths().is_some());
    count(&mut n, encodings.mate_distances().is_some());
    count(&mut n, encodings.tag_set_ids().is_some());
    count(&mut n, encodings.feature_counts().is_some());
    count(&mut n, encodings.feature_codes().is_some());
    count(&mut n, encodings.feature_position_deltas().is_some());
    count(&mut n, encodings.deletion_lengths().is_some());
    count(&mut n, encodings.stretches_of_bases().is_some());
    count(&mut n, encodings.stretches_of_quality_scores().is_some());
    count(&mut n, encodings.base_substitution_codes().is_some());
    count(&mut n, encodings.insertion_bases().is_some());
    count(&mut n, encodings.reference_skip_lengths().is_some());
    count(&mut n, encodings.padding_lengths().is_some());
    count(&mut n, encodings.hard_clip_lengths().is_some());
    count(&mut n, encodings.soft_clip_bases().is_some());
    count(&mut n, encodings.mapping_qualities().is_some());
    count(&mut n, encodings.bases().is_some());
    count(&mut n, encodings.quality_scores().is_some());

    n
}

fn write_key<W>(writer: &mut W, key: DataSeries) -> io::Result<()>
where
    W: Write,
{
    let data = <[u8; 2]>::from(key);
    writer.write_all(&data)
}

#[rustfmt::skip]
fn write_encodings<W>(writer: &mut W, encodings: &DataSeriesEncodings, version: Version) -> io::Result<()>
where
    W: Write,
{
    maybe_write_integer_encoding(writer, DataSeries::BamFlags, encodings.bam_flags(), version)?;
    maybe_write_integer_encoding(writer, DataSeries::CramFlags, encodings.cram_flags(), version)?;
    maybe_write_integer_encoding(writer, DataSeries::ReferenceSequenceIds, encodings.reference_sequence_ids(), version)?;
    maybe_write_integer_encoding(writer, DataSeries::ReadLengths, encodings.read_lengths(), version)?;
    maybe_write_integer_encoding(writer, DataSeries::AlignmentStarts, encodings.alignment_starts(), version)?;
    maybe_write_integer_encoding(writer, DataSeries::ReadGroupIds, encodings.read_group_ids(), version)?;
    maybe_write_byte_array_encoding(writer, DataSeries::Names, encodings.names(), version)?;
    maybe_write_integer_encoding(writer, DataSeries::MateFlags, encodings.mate_flags(), version)?;
    maybe_write_integer_encoding(writer, DataSeries::MateReferenceSequenceIds, encodings.mate_reference_sequence_ids(), version)?;
    maybe_write_integer_encoding(writer, DataSeries::MateAlignmentStarts, encodings.mate_alignment_starts(), version)?;
    maybe_write_integer_encoding(writer, DataSeries::TemplateLengths, encodings.template_lengths(), version)?;
    maybe_write_integer_encoding(writer, DataSeries::MateDistances, encodings.mate_distances(), version)?;
    maybe_write_integer_encoding(writer, DataSeries::TagSetIds, encodings.tag_set_ids(), version)?;
    maybe_write_integer_encoding(writer, DataSeries::FeatureCounts, encodings.feature_counts(), version)?;
    maybe_write_byte_encoding(writer, DataSeries::FeatureCodes, encodings.feature_codes(), version)?;
    maybe_write_integer_encoding(writer, DataSeries::FeaturePositionDeltas, encodings.feature_position_deltas(), version)?;
    maybe_write_integer_encoding(writer, DataSeries::DeletionLengths, encodings.deletion_lengths(), version)?;
    maybe_write_byte_array_encoding(writer, DataSeries::StretchesOfBases, encodings.stretches_of_bases(), version)?;
    maybe_write_byte_array_encoding(writer, DataSeries::StretchesOfQualityScores, encodings.stretches_of_quality_scores(), version)?;
    maybe_write_byte_encoding(writer, DataSeries::BaseSubstitutionCodes, encodings.base_substitution_codes(), version)?;
    maybe_write_byte_array_encoding(writer, DataSeries::InsertionBases, encodings.insertion_bases(), version)?;
    maybe_write_integer_encoding(writer, DataSeries::ReferenceSkipLengths, encodings.reference_skip_lengths(), version)?;
    maybe_write_integer_encoding(writer, DataSeries::PaddingLengths, encodings.padding_lengths(), version)?;
    maybe_write_integer_encoding(writer, DataSeries::HardClipLengths, encodings.hard_clip_lengths(), version)?;
    maybe_write_byte_array_encoding(writer, DataSeries::SoftClipBases, encodings.soft_clip_bases(), version)?;
    maybe_write_integer_encoding(writer, DataSeries::MappingQualities, encodings.mapping_qualities(), version)?;
    maybe_write_byte_encoding(writer, DataSeries::Bases, encodings.bases(), version)?;
    maybe_write_byte_encoding(writer, DataSeries::QualityScores, encodings.quality_scores(), version)?;

    Ok(())
}

fn maybe_write_byte_encoding<W>(
    writer: &mut W,
    key: DataSeries,
    encoding: Option<&Encoding<Byte>>,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    if let Some(encoding) = encoding {
        write_key(writer, key)?;
        write_byte_encoding(writer, encoding, version)?;
    }

    Ok(())
}

fn maybe_write_integer_encoding<W>(
    writer: &mut W,
    key: DataSeries,
    encoding: Option<&Encoding<Integer>>,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    if let Some(encoding) = encoding {
        write_key(writer, key)?;
        write_integer_encoding(writer, encoding, version)?;
    }

    Ok(())
}

fn maybe_write_byte_array_encoding<W>(
    writer: &mut W,
    key: DataSeries,
    encoding: Option<&Encoding<ByteArray>>,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    if let Some(encoding) = encoding {
        write_key(writer, key)?;
        write_byte_array_encoding(writer, encoding, version)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frequencies_of(values: &[i64]) -> Frequencies {
        let mut frequencies = Frequencies::default();
        for &value in values {
            frequencies.add(value);
        }
        frequencies
    }

    #[test]
    fn test_choose_integer_encoding_with_empty_histogram() {
        let frequencies = Frequencies::default();
        assert!(
            choose_integer_encoding(&frequencies, DataSeries::BamFlags, Version::default())
                .is_none()
        );
    }

    #[test]
    fn test_choose_integer_encoding_with_single_value() {
        let frequencies = frequencies_of(&[8]);

        let encoding =
            choose_integer_encoding(&frequencies, DataSeries::ReadLengths, Version::default())
                .expect("missing encoding");

        assert_eq!(
            encoding,
            Encoding::new(Integer::huffman(vec![8], vec![0]))
        );
    }

    #[test]
    fn test_choose_integer_encoding_with_small_alphabet() {
        let frequencies = frequencies_of(&[0, 0, 0, 16, 99]);

        let encoding =
            choose_integer_encoding(&frequencies, DataSeries::BamFlags, Version::default())
                .expect("missing encoding");

        assert!(matches!(encoding.get(), Integer::Huffman { .. }));
    }

    #[test]
    fn test_choose_integer_encoding_with_dense_range() {
        // 64 distinct values in [0, 64): dense enough for beta.
        let values: Vec<i64> = (0..64).collect();
        let frequencies = frequencies_of(&values);

        let encoding = choose_integer_encoding(
            &frequencies,
            DataSeries::MappingQualities,
            Version::default(),
        )
        .expect("missing encoding");

        assert_eq!(encoding, Encoding::new(Integer::Beta { offset: 0, len: 6 }));
    }

    #[test]
    fn test_choose_integer_encoding_with_skewed_positive_values() {
        // Mostly small, strictly positive values with a long tail.
        let mut values = vec![1; 64];
        values.extend((1..=16).map(|i| i * 61));
        let values: Vec<i64> = values.into_iter().map(|v| v as i64).collect();
        let frequencies = frequencies_of(&values);

        let encoding = choose_integer_encoding(
            &frequencies,
            DataSeries::FeaturePositionDeltas,
            Version::default(),
        )
        .expect("missing encoding");

        assert_eq!(encoding, Encoding::new(Integer::Gamma { offset: 0 }));
    }

    #[test]
    fn test_choose_integer_encoding_with_skewed_zero_based_values() {
        let mut values = vec![0; 64];
        values.extend((1..=16).map(|i| i * 61));
        let frequencies = frequencies_of(&values);

        let encoding = choose_integer_encoding(
            &frequencies,
            DataSeries::MateAlignmentStarts,
            Version::default(),
        )
        .expect("missing encoding");

        assert_eq!(encoding, Encoding::new(Integer::Subexp { offset: 0, k: 2 }));
    }

    #[test]
    fn test_choose_integer_encoding_falls_back_to_external() {
        // Wide, non-skewed alphabet.
        let values: Vec<i64> = (0..32).map(|i| i * 1000).collect();
        let frequencies = frequencies_of(&values);

        let encoding = choose_integer_encoding(
            &frequencies,
            DataSeries::TemplateLengths,
            Version::default(),
        )
        .expect("missing encoding");

        assert_eq!(
            encoding,
            Encoding::new(Integer::External {
                block_content_id: block::ContentId::from(DataSeries::TemplateLengths),
            })
        );
    }

    #[test]
    fn test_choose_integer_encoding_for_cram_4() {
        let frequencies = frequencies_of(&[1, 2, 3]);
        let encoding =
            choose_integer_encoding(&frequencies, DataSeries::ReadLengths, Version::V4_0)
                .expect("missing encoding");
        assert!(matches!(encoding.get(), Integer::VarintUnsigned { .. }));

        let frequencies = frequencies_of(&[-1, 2, 3]);
        let encoding =
            choose_integer_encoding(&frequencies, DataSeries::TemplateLengths, Version::V4_0)
                .expect("missing encoding");
        assert!(matches!(encoding.get(), Integer::VarintSigned { .. }));
    }

    #[test]
    fn test_absolute_position_encoding() {
        let frequencies = frequencies_of(&[100, 5, 250]);

        let encoding = absolute_position_encoding(&frequencies, Version::default())
            .expect("missing encoding");

        assert_eq!(encoding, Encoding::new(Integer::Beta { offset: 0, len: 8 }));
    }

    #[test]
    fn test_bits_needed() {
        assert_eq!(bits_needed(0), 1);
        assert_eq!(bits_needed(1), 1);
        assert_eq!(bits_needed(2), 2);
        assert_eq!(bits_needed(255), 8);
        assert_eq!(bits_needed(256), 9);
    }
}
