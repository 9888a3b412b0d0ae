use std::io;

use bstr::BStr;
use noodles_core::Position;
use noodles_sam::{
    self as sam,
    alignment::{
        record::data::field::{Tag, Value},
        record_buf::data::field::Value as ValueBuf,
    },
};

use super::{Feature, Record};
use crate::{
    container::compression_header::preservation_map::substitution_matrix::Base,
    file_definition::Version,
    io::writer::{Options, options::Binning},
    record::{Flags, MateFlags},
};

const MISSING_QUALITY_SCORE: u8 = 0xff;

impl Record {
    /// Converts an alignment record.
    ///
    /// `reference_sequence` is the full reference contig the record maps to,
    /// or `None` for unmapped records and referenceless encoding. With a
    /// reference, aligned bases are diffed against it and only the edits are
    /// kept as features; without one, bases are carried verbatim.
    pub fn try_from_alignment_record_with_options(
        header: &sam::Header,
        record: &dyn sam::alignment::Record,
        reference_sequence: Option<&[u8]>,
        options: &Options,
    ) -> io::Result<Self> {
        let bam_flags = record.flags()?;
        let mut cram_flags = Flags::default();

        let sequence: Vec<u8> = record.sequence().iter().collect();
        let read_length = sequence.len();

        if sequence.is_empty() {
            cram_flags.insert(Flags::SEQUENCE_IS_MISSING);
        }

        let quality_scores = if record.quality_scores().is_empty() {
            Vec::new()
        } else {
            cram_flags.insert(Flags::QUALITY_SCORES_ARE_STORED_AS_ARRAY);

            let mut quality_scores: Vec<u8> =
                record.quality_scores().iter().collect::<io::Result<_>>()?;

            if quality_scores.len() != read_length {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "sequence and quality scores lengths mismatch",
                ));
            }

            if options.binning == Binning::Illumina {
                for score in &mut quality_scores {
                    *score = illumina_bin(*score);
                }
            }

            // CRAM 4.0 with QO=0 stores quality scores in sequencing
            // orientation.
            if options.version >= Version::V4_0
                && !options.qs_seq_orient
                && bam_flags.is_reverse_complemented()
            {
                quality_scores.reverse();
            }

            quality_scores
        };

        let alignment_start = record.alignment_start().transpose()?;

        let features = if !bam_flags.is_unmapped() && !sequence.is_empty() {
            let Some(alignment_start) = alignment_start else {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "mapped record is missing an alignment start",
                ));
            };

            cigar_to_features(
                record.cigar().as_ref(),
                &sequence,
                &quality_scores,
                reference_sequence,
                alignment_start,
                options.version,
            )?
        } else {
            Vec::new()
        };

        let strip_md_nm = !options.preserve_aux_order
            && options.reference_required
            && !bam_flags.is_unmapped()
            && !sequence.is_empty();

        let data = record.data();
        let (data, read_group_name) = get_filtered_data(data.as_ref(), strip_md_nm, options)?;

        let read_group_id = read_group_name
            .map(|name| get_read_group_id(header, name))
            .transpose()?;

        Ok(Self {
            bam_flags,
            cram_flags,
            reference_sequence_id: record.reference_sequence_id(header).transpose()?,
            read_length,
            alignment_start,
            read_group_id,
            name: record.name().map(|name| name.into()),
            mate_flags: MateFlags::default(),
            mate_reference_sequence_id: record.mate_reference_sequence_id(header).transpose()?,
            mate_alignment_start: record.mate_alignment_start().transpose()?,
            template_length: i64::from(record.template_length()?),
            mate_distance: None,
            data,
            features,
            mapping_quality: record.mapping_quality().transpose()?,
            sequence,
            quality_scores,
        })
    }
}

fn cigar_to_features(
    cigar: &dyn sam::alignment::record::Cigar,
    sequence: &[u8],
    quality_scores: &[u8],
    reference_sequence: Option<&[u8]>,
    alignment_start: Position,
    version: Version,
) -> io::Result<Vec<Feature>> {
    use noodles_sam::alignment::record::cigar::op::Kind;

    let mut features = Vec::new();

    let mut read_position = Position::MIN;
    // 0-based index of the next reference base.
    let mut reference_position = usize::from(alignment_start) - 1;

    for result in cigar.iter() {
        let op = result?;

        match op.kind() {
            Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => {
                let bases = read_bases(sequence, read_position, op.len())?;

                match reference_sequence {
                    Some(reference_sequence) => {
                        for (i, &base) in bases.iter().enumerate() {
                            // Beyond the end of the contig, compare against N
                            // so the bases are still representable.
                            let reference_base = reference_sequence
                                .get(reference_position + i)
                                .copied()
                                .unwrap_or(b'N');

                            if base.eq_ignore_ascii_case(&reference_base) {
                                continue;
                            }

                            let position = advance(read_position, i)?;

                            match (Base::try_from(reference_base), Base::try_from(base)) {
                                (Ok(reference_base), Ok(read_base))
                                    if reference_base != read_base =>
                                {
                                    features.push(Feature::Substitution {
                                        position,
                                        reference_base,
                                        read_base,
                                    });
                                }
                                (Ok(_), Ok(_)) => {}
                                // A non-ACGTN base on either side is carried
                                // verbatim.
                                _ => {
                                    let quality_score = quality_score_at(
                                        quality_scores,
                                        usize::from(position) - 1,
                                    );

                                    features.push(Feature::ReadBase {
                                        position,
                                        base,
                                        quality_score,
                                    });
                                }
                            }
                        }
                    }
                    None => {
                        if version >= Version::V3_0 {
                            features.push(Feature::Bases {
                                position: read_position,
                                bases: bases.to_vec(),
                            });
                        } else {
                            for (i, &base) in bases.iter().enumerate() {
                                let position = advance(read_position, i)?;
                                let quality_score =
                                    quality_score_at(quality_scores, usize::from(position) - 1);

                                features.push(Feature::ReadBase {
                                    position,
                                    base,
                                    quality_score,
                                });
                            }
                        }
                    }
                }

                read_position = advance(read_position, op.len())?;
                reference_position += op.len();
            }
            Kind::Insertion => {
                let bases = read_bases(sequence, read_position, op.len())?;

                if op.len() == 1 {
                    features.push(Feature::InsertBase {
                        position: read_position,
                        base: bases[0],
                    });
                } else {
                    features.push(Feature::Insertion {
                        position: read_position,
                        bases: bases.to_vec(),
                    });
                }

                read_position = advance(read_position, op.len())?;
            }
            Kind::Deletion => {
                features.push(Feature::Deletion {
                    position: read_position,
                    len: op.len(),
                });

                reference_position += op.len();
            }
            Kind::Skip => {
                features.push(Feature::ReferenceSkip {
                    position: read_position,
                    len: op.len(),
                });

                reference_position += op.len();
            }
            Kind::SoftClip => {
                let bases = read_bases(sequence, read_position, op.len())?;

                features.push(Feature::SoftClip {
                    position: read_position,
                    bases: bases.to_vec(),
                });

                read_position = advance(read_position, op.len())?;
            }
            Kind::HardClip => {
                features.push(Feature::HardClip {
                    position: read_position,
                    len: op.len(),
                });
            }
            Kind::Pad => {
                features.push(Feature::Padding {
                    position: read_position,
                    len: op.len(),
                });
            }
        }
    }

    let read_bases_consumed = usize::from(read_position) - 1;

    if read_bases_consumed != sequence.len() {
        return Err(cigar_length_mismatch());
    }

    Ok(features)
}

fn read_bases(sequence: &[u8], position: Position, len: usize) -> io::Result<&[u8]> {
    let start = usize::from(position) - 1;
    let end = start + len;
    sequence.get(start..end).ok_or_else(cigar_length_mismatch)
}

fn advance(position: Position, n: usize) -> io::Result<Position> {
    position
        .checked_add(n)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "read position overflow"))
}

fn quality_score_at(quality_scores: &[u8], i: usize) -> u8 {
    quality_scores
        .get(i)
        .copied()
        .unwrap_or(MISSING_QUALITY_SCORE)
}

fn cigar_length_mismatch() -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        "CIGAR and sequence lengths mismatch",
    )
}

// Maps a quality score to its Illumina bin representative.
fn illumina_bin(score: u8) -> u8 {
    match score {
        0..=1 => score,
        2..=9 => 6,
        10..=19 => 15,
        20..=24 => 22,
        25..=29 => 27,
        30..=34 => 33,
        35..=39 => 37,
        _ => 40,
    }
}

#[allow(clippy::type_complexity)]
fn get_filtered_data<'d>(
    data: &'d dyn sam::alignment::record::Data,
    strip_md_nm: bool,
    options: &Options,
) -> io::Result<(Vec<(Tag, ValueBuf)>, Option<&'d BStr>)> {
    let mut data_buf = Vec::new();
    let mut read_group_name = None;

    for result in data.iter() {
        let (tag, value) = result?;

        if !options.preserve_aux_order && tag == Tag::READ_GROUP {
            let Value::String(s) = value else {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "invalid read group field value",
                ));
            };

            read_group_name = Some(s);
            continue;
        }

        if strip_md_nm && (tag == Tag::MISMATCHED_POSITIONS || tag == Tag::EDIT_DISTANCE) {
            continue;
        }

        let mut value_buf: ValueBuf = value.try_into()?;

        if !options.preserve_aux_size {
            value_buf = shrink_value(value_buf);
        }

        data_buf.push((tag, value_buf));
    }

    Ok((data_buf, read_group_name))
}

/// Narrows an integer value to the smallest SAM type that preserves it.
fn shrink_value(value: ValueBuf) -> ValueBuf {
    match value {
        ValueBuf::Int16(n) => match n {
            0..=255 => ValueBuf::UInt8(n as u8),
            -128..=-1 => ValueBuf::Int8(n as i8),
            _ => ValueBuf::Int16(n),
        },
        ValueBuf::UInt16(n) => {
            if n <= 0xff {
                ValueBuf::UInt8(n as u8)
            } else {
                ValueBuf::UInt16(n)
            }
        }
        ValueBuf::Int32(n) => match n {
            0..=255 => ValueBuf::UInt8(n as u8),
            -128..=-1 => ValueBuf::Int8(n as i8),
            256..=65535 => ValueBuf::UInt16(n as u16),
            -32768..=-129 => ValueBuf::Int16(n as i16),
            _ => ValueBuf::Int32(n),
        },
        ValueBuf::UInt32(n) => {
            if n <= 0xff {
                ValueBuf::UInt8(n as u8)
            } else if n <= 0xffff {
                ValueBuf::UInt16(n as u16)
            } else {
                ValueBuf::UInt32(n)
            }
        }
        v => v,
    }
}

fn get_read_group_id(header: &sam::Header, read_group_name: &BStr) -> io::Result<usize> {
    header
        .read_groups()
        .get_index_of(read_group_name)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid read group name"))
}

#[cfg(test)]
mod tests {
    use noodles_sam::alignment::{
        record::cigar::{Op, op::Kind},
        record_buf::Cigar,
    };

    use super::*;

    fn position(n: usize) -> Position {
        Position::new(n).expect("invalid position")
    }

    #[test]
    fn test_cigar_to_features_with_perfect_match() -> io::Result<()> {
        let cigar: Cigar = [Op::new(Kind::Match, 8)].into_iter().collect();

        let features = cigar_to_features(
            &cigar,
            b"ACGTACGT",
            &[45; 8],
            Some(b"ACGTACGT"),
            position(1),
            Version::default(),
        )?;

        assert!(features.is_empty());

        Ok(())
    }

    #[test]
    fn test_cigar_to_features_with_substitution() -> io::Result<()> {
        let cigar: Cigar = [Op::new(Kind::Match, 8)].into_iter().collect();

        let features = cigar_to_features(
            &cigar,
            b"ACGTACCT",
            &[45; 8],
            Some(b"ACGTACGT"),
            position(1),
            Version::default(),
        )?;

        assert_eq!(
            features,
            [Feature::Substitution {
                position: position(7),
                reference_base: Base::G,
                read_base: Base::C,
            }]
        );

        Ok(())
    }

    #[test]
    fn test_cigar_to_features_with_lowercase_reference() -> io::Result<()> {
        let cigar: Cigar = [Op::new(Kind::Match, 4)].into_iter().collect();

        let features = cigar_to_features(
            &cigar,
            b"ACGT",
            &[45; 4],
            Some(b"acgt"),
            position(1),
            Version::default(),
        )?;

        assert!(features.is_empty());

        Ok(())
    }

    #[test]
    fn test_cigar_to_features_with_soft_clip() -> io::Result<()> {
        let cigar: Cigar = [Op::new(Kind::SoftClip, 4), Op::new(Kind::Match, 4)]
            .into_iter()
            .collect();

        let features = cigar_to_features(
            &cigar,
            b"ACGTNNGT",
            &[45; 8],
            Some(b"ACGT"),
            position(1),
            Version::default(),
        )?;

        assert_eq!(
            features,
            [
                Feature::SoftClip {
                    position: position(1),
                    bases: b"ACGT".to_vec(),
                },
                Feature::Substitution {
                    position: position(5),
                    reference_base: Base::A,
                    read_base: Base::N,
                },
                Feature::Substitution {
                    position: position(6),
                    reference_base: Base::C,
                    read_base: Base::N,
                },
            ]
        );

        Ok(())
    }

    #[test]
    fn test_cigar_to_features_with_insertion() -> io::Result<()> {
        let cigar: Cigar = [
            Op::new(Kind::Match, 2),
            Op::new(Kind::Insertion, 2),
            Op::new(Kind::Match, 2),
        ]
        .into_iter()
        .collect();

        let features = cigar_to_features(
            &cigar,
            b"ACNNGT",
            &[45; 6],
            Some(b"ACGT"),
            position(1),
            Version::default(),
        )?;

        assert_eq!(
            features,
            [Feature::Insertion {
                position: position(3),
                bases: b"NN".to_vec(),
            }]
        );

        Ok(())
    }

    #[test]
    fn test_cigar_to_features_with_single_base_insertion() -> io::Result<()> {
        let cigar: Cigar = [Op::new(Kind::Insertion, 1), Op::new(Kind::Match, 4)]
            .into_iter()
            .collect();

        let features = cigar_to_features(
            &cigar,
            b"NACGT",
            &[45; 5],
            Some(b"ACGT"),
            position(1),
            Version::default(),
        )?;

        assert_eq!(
            features,
            [Feature::InsertBase {
                position: position(1),
                base: b'N',
            }]
        );

        Ok(())
    }

    #[test]
    fn test_cigar_to_features_with_deletion() -> io::Result<()> {
        let cigar: Cigar = [
            Op::new(Kind::Match, 2),
            Op::new(Kind::Deletion, 2),
            Op::new(Kind::Match, 2),
        ]
        .into_iter()
        .collect();

        // read = AC + GT, reference = AC GG GT
        let features = cigar_to_features(
            &cigar,
            b"ACGT",
            &[45; 4],
            Some(b"ACGGGT"),
            position(1),
            Version::default(),
        )?;

        assert_eq!(
            features,
            [Feature::Deletion {
                position: position(3),
                len: 2,
            }]
        );

        Ok(())
    }

    #[test]
    fn test_cigar_to_features_without_reference() -> io::Result<()> {
        let cigar: Cigar = [Op::new(Kind::Match, 4)].into_iter().collect();

        // CRAM 3.0 carries the run as a `b` feature.
        let features = cigar_to_features(
            &cigar,
            b"ACGT",
            &[40, 41, 42, 43],
            None,
            position(1),
            Version::default(),
        )?;

        assert_eq!(
            features,
            [Feature::Bases {
                position: position(1),
                bases: b"ACGT".to_vec(),
            }]
        );

        // CRAM 2.1 predates `b` and falls back to per-base features.
        let features = cigar_to_features(
            &cigar,
            b"ACGT",
            &[40, 41, 42, 43],
            None,
            position(1),
            Version::V2_1,
        )?;

        assert_eq!(
            features,
            [
                Feature::ReadBase {
                    position: position(1),
                    base: b'A',
                    quality_score: 40,
                },
                Feature::ReadBase {
                    position: position(2),
                    base: b'C',
                    quality_score: 41,
                },
                Feature::ReadBase {
                    position: position(3),
                    base: b'G',
                    quality_score: 42,
                },
                Feature::ReadBase {
                    position: position(4),
                    base: b'T',
                    quality_score: 43,
                },
            ]
        );

        Ok(())
    }

    #[test]
    fn test_cigar_to_features_with_length_mismatch() {
        let cigar: Cigar = [Op::new(Kind::Match, 8)].into_iter().collect();

        assert!(
            cigar_to_features(
                &cigar,
                b"ACGT",
                &[45; 4],
                Some(b"ACGTACGT"),
                position(1),
                Version::default(),
            )
            .is_err()
        );
    }

    #[test]
    fn test_get_filtered_data() -> io::Result<()> {
        use noodles_sam::alignment::record_buf::{RecordBuf, data::field::Value as V};

        let record = RecordBuf::builder()
            .set_data(
                [
                    (Tag::READ_GROUP, V::from("rg0")),
                    (Tag::EDIT_DISTANCE, V::from(1i32)),
                    (Tag::ALIGNMENT_SCORE, V::from(5i32)),
                ]
                .into_iter()
                .collect(),
            )
            .build();

        let data = sam::alignment::Record::data(&record);

        // RG is captured and stripped, NM is regenerable, and AS narrows to
        // a single byte.
        let options = Options::default();
        let (fields, read_group_name) = get_filtered_data(data.as_ref(), true, &options)?;

        assert_eq!(read_group_name.map(|name| name.to_vec()), Some(b"rg0".to_vec()));
        assert_eq!(fields, [(Tag::ALIGNMENT_SCORE, ValueBuf::UInt8(5))]);

        // Preserving aux order and size keeps all three fields verbatim.
        let options = Options {
            preserve_aux_order: true,
            preserve_aux_size: true,
            ..Default::default()
        };

        let (fields, read_group_name) = get_filtered_data(data.as_ref(), false, &options)?;

        assert!(read_group_name.is_none());
        assert_eq!(
            fields,
            [
                (Tag::READ_GROUP, ValueBuf::from("rg0")),
                (Tag::EDIT_DISTANCE, ValueBuf::Int32(1)),
                (Tag::ALIGNMENT_SCORE, ValueBuf::Int32(5)),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_shrink_value() {
        assert_eq!(shrink_value(ValueBuf::Int32(5)), ValueBuf::UInt8(5));
        assert_eq!(shrink_value(ValueBuf::Int32(-7)), ValueBuf::Int8(-7));
        assert_eq!(shrink_value(ValueBuf::Int32(300)), ValueBuf::UInt16(300));
        assert_eq!(
            shrink_value(ValueBuf::Int32(-300)),
            ValueBuf::Int16(-300)
        );
        assert_eq!(
            shrink_value(ValueBuf::Int32(70000)),
            ValueBuf::Int32(70000)
        );
        assert_eq!(shrink_value(ValueBuf::UInt32(65535)), ValueBuf::UInt16(65535));
        assert_eq!(shrink_value(ValueBuf::UInt16(0)), ValueBuf::UInt8(0));
        assert_eq!(shrink_value(ValueBuf::Int16(-1)), ValueBuf::Int8(-1));
        assert_eq!(
            shrink_value(ValueBuf::Float(1.0)),
            ValueBuf::Float(1.0)
        );
    }

    #[test]
    fn test_illumina_bin() {
        assert_eq!(illumina_bin(0), 0);
        assert_eq!(illumina_bin(1), 1);
        assert_eq!(illumina_bin(2), 6);
        assert_eq!(illumina_bin(12), 15);
        assert_eq!(illumina_bin(22), 22);
        assert_eq!(illumina_bin(28), 27);
        assert_eq!(illumina_bin(31), 33);
        assert_eq!(illumina_bin(38), 37);
        assert_eq!(illumina_bin(41), 40);
    }
}
