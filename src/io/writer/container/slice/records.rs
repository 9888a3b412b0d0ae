use std::io;

use indexmap::IndexMap;
use noodles_sam::alignment::record_buf::data::field::Value as ValueBuf;

use crate::{
    container::{
        ReferenceSequenceContext, block,
        compression_header::{
            CompressionHeader,
            preservation_map::tag_sets::{self, Key},
        },
    },
    io::{
        BitWriter,
        writer::{
            Feature, Record,
            container::stats::{
                mapping_quality_value, position_value, reference_sequence_id_value,
            },
        },
    },
};

/// External block buffers, keyed by content ID.
///
/// Insertion order determines block order in the slice, so an `IndexMap`
/// keeps the output deterministic.
pub(crate) type ExternalDataWriters = IndexMap<block::ContentId, Vec<u8>>;

/// Drives a slice's records through the container's codecs, in the fixed
/// field order the format prescribes.
pub struct Writer<'a> {
    compression_header: &'a CompressionHeader,
    core_data_writer: &'a mut BitWriter,
    external_data_writers: &'a mut ExternalDataWriters,
    reference_sequence_context: ReferenceSequenceContext,
    prev_alignment_start: i64,
}

impl<'a> Writer<'a> {
    pub fn new(
        compression_header: &'a CompressionHeader,
        core_data_writer: &'a mut BitWriter,
        external_data_writers: &'a mut ExternalDataWriters,
        reference_sequence_context: ReferenceSequenceContext,
    ) -> Self {
        let prev_alignment_start = match reference_sequence_context {
            ReferenceSequenceContext::Some(context) => {
                usize::from(context.alignment_start()) as i64
            }
            _ => 0,
        };

        Self {
            compression_header,
            core_data_writer,
            external_data_writers,
            reference_sequence_context,
            prev_alignment_start,
        }
    }

    pub fn write_record(&mut self, record: &Record) -> io::Result<()> {
        self.write_bam_flags(record)?;
        self.write_cram_flags(record)?;
        self.write_positional_data(record)?;
        self.write_name(record)?;
        self.write_mate_data(record)?;
        self.write_tag_data(record)?;

        if !record.bam_flags.is_unmapped() {
            self.write_mapped_read_data(record)?;
        } else {
            self.write_unmapped_read_data(record)?;
        }

        Ok(())
    }

    fn write_bam_flags(&mut self, record: &Record) -> io::Result<()> {
        let encoding = self
            .compression_header
            .data_series_encodings
            .bam_flags()
            .ok_or_else(|| missing_encoding("BF"))?;

        encoding.encode(
            self.core_data_writer,
            self.external_data_writers,
            i64::from(record.bam_flags.bits()),
        )
    }

    fn write_cram_flags(&mut self, record: &Record) -> io::Result<()> {
        let encoding = self
            .compression_header
            .data_series_encodings
            .cram_flags()
            .ok_or_else(|| missing_encoding("CF"))?;

        encoding.encode(
            self.core_data_writer,
            self.external_data_writers,
            i64::from(record.cram_flags.wire_bits()),
        )
    }

    fn write_positional_data(&mut self, record: &Record) -> io::Result<()> {
        if self.reference_sequence_context == ReferenceSequenceContext::Many {
            let encoding = self
                .compression_header
                .data_series_encodings
                .reference_sequence_ids()
                .ok_or_else(|| missing_encoding("RI"))?;

            encoding.encode(
                self.core_data_writer,
                self.external_data_writers,
                reference_sequence_id_value(record.reference_sequence_id),
            )?;
        }

        self.write_read_length(record)?;
        self.write_alignment_start(record)?;
        self.write_read_group_id(record)?;

        Ok(())
    }

    fn write_read_length(&mut self, record: &Record) -> io::Result<()> {
        let encoding = self
            .compression_header
            .data_series_encodings
            .read_lengths()
            .ok_or_else(|| missing_encoding("RL"))?;

        encoding.encode(
            self.core_data_writer,
            self.external_data_writers,
            record.read_length as i64,
        )
    }

    fn write_alignment_start(&mut self, record: &Record) -> io::Result<()> {
        let encoding = self
            .compression_header
            .data_series_encodings
            .alignment_starts()
            .ok_or_else(|| missing_encoding("AP"))?;

        let alignment_start = position_value(record.alignment_start);

        let value = if self
            .compression_header
            .preservation_map
            .alignment_starts_are_deltas()
        {
            let delta = alignment_start - self.prev_alignment_start;
            self.prev_alignment_start = alignment_start;
            delta
        } else {
            alignment_start
        };

        encoding.encode(self.core_data_writer, self.external_data_writers, value)
    }

    fn write_read_group_id(&mut self, record: &Record) -> io::Result<()> {
        let encoding = self
            .compression_header
            .data_series_encodings
            .read_group_ids()
            .ok_or_else(|| missing_encoding("RG"))?;

        let value = record.read_group_id.map(|id| id as i64).unwrap_or(-1);

        encoding.encode(self.core_data_writer, self.external_data_writers, value)
    }

    fn write_name(&mut self, record: &Record) -> io::Result<()> {
        let preservation_map = &self.compression_header.preservation_map;

        // With RN=0, readers still expect a name for every detached record.
        if !(preservation_map.records_have_names() || record.cram_flags.is_detached()) {
            return Ok(());
        }

        let encoding = self
            .compression_header
            .data_series_encodings
            .names()
            .ok_or_else(|| missing_encoding("RN"))?;

        let name: &[u8] = record
            .name
            .as_ref()
            .map(|name| name.as_ref())
            .unwrap_or_default();

        encoding.encode(self.core_data_writer, self.external_data_writers, name)
    }

    fn write_mate_data(&mut self, record: &Record) -> io::Result<()> {
        if record.cram_flags.is_detached() {
            self.write_mate_flags(record)?;
            self.write_mate_reference_sequence_id(record)?;
            self.write_mate_alignment_start(record)?;
            self.write_template_length(record)?;
        } else if record.cram_flags.mate_is_downstream() {
            self.write_mate_distance(record)?;
        }

        Ok(())
    }

    fn write_mate_flags(&mut self, record: &Record) -> io::Result<()> {
        let encoding = self
            .compression_header
            .data_series_encodings
            .mate_flags()
            .ok_or_else(|| missing_encoding("MF"))?;

        encoding.encode(
            self.core_data_writer,
            self.external_data_writers,
            i64::from(record.mate_flags.bits()),
        )
    }

    fn write_mate_reference_sequence_id(&mut self, record: &Record) -> io::Result<()> {
        let encoding = self
            .compression_header
            .data_series_encodings
            .mate_reference_sequence_ids()
            .ok_or_else(|| missing_encoding("NS"))?;

        encoding.encode(
            self.core_data_writer,
            self.external_data_writers,
            reference_sequence_id_value(record.mate_reference_sequence_id),
        )
    }

    fn write_mate_alignment_start(&mut self, record: &Record) -> io::Result<()> {
        let encoding = self
            .compression_header
            .data_series_encodings
            .mate_alignment_starts()
            .ok_or_else(|| missing_encoding("NP"))?;

        encoding.encode(
            self.core_data_writer,
            self.external_data_writers,
            position_value(record.mate_alignment_start),
        )
    }

    fn write_template_length(&mut self, record: &Record) -> io::Result<()> {
        let encoding = self
            .compression_header
            .data_series_encodings
            .template_lengths()
            .ok_or_else(|| missing_encoding("TS"))?;

        encoding.encode(
            self.core_data_writer,
            self.external_data_writers,
            record.template_length,
        )
    }

    fn write_mate_distance(&mut self, record: &Record) -> io::Result<()> {
        let encoding = self
            .compression_header
            .data_series_encodings
            .mate_distances()
            .ok_or_else(|| missing_encoding("NF"))?;

        let mate_distance = record.mate_distance.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "downstream mate record is missing its mate distance",
            )
        })?;

        encoding.encode(
            self.core_data_writer,
            self.external_data_writers,
            mate_distance as i64,
        )
    }

    fn write_tag_data(&mut self, record: &Record) -> io::Result<()> {
        let tag_sets = self.compression_header.preservation_map.tag_sets();

        let tag_set_id = tag_sets::find(tag_sets, &record.data).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "record tag set is not in the tag dictionary",
            )
        })?;

        let encoding = self
            .compression_header
            .data_series_encodings
            .tag_set_ids()
            .ok_or_else(|| missing_encoding("TL"))?;

        encoding.encode(
            self.core_data_writer,
            self.external_data_writers,
            tag_set_id as i64,
        )?;

        for (tag, value) in &record.data {
            let key = Key::new(*tag, value.ty());
            let block_content_id = block::ContentId::from(key);

            let encoding = self
                .compression_header
                .tag_encodings
                .get(&block_content_id)
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("missing tag encoding: {block_content_id}"),
                    )
                })?;

            let buf = encode_value(value)?;

            encoding.encode(self.core_data_writer, self.external_data_writers, &buf)?;
        }

        Ok(())
    }

    fn write_mapped_read_data(&mut self, record: &Record) -> io::Result<()> {
        self.write_feature_count(record)?;

        let mut prev_position = 0;

        for feature in &record.features {
            self.write_feature_code(feature)?;

            let position = usize::from(feature.position()) as i64;
            self.write_feature_position_delta(position - prev_position)?;
            prev_position = position;

            self.write_feature_payload(feature)?;
        }

        self.write_mapping_quality(record)?;

        if record.cram_flags.quality_scores_are_stored_as_array() {
            self.write_quality_scores(&record.quality_scores)?;
        }

        Ok(())
    }

    fn write_feature_count(&mut self, record: &Record) -> io::Result<()> {
        let encoding = self
            .compression_header
            .data_series_encodings
            .feature_counts()
            .ok_or_else(|| missing_encoding("FN"))?;

        encoding.encode(
            self.core_data_writer,
            self.external_data_writers,
            record.features.len() as i64,
        )
    }

    fn write_feature_code(&mut self, feature: &Feature) -> io::Result<()> {
        let encoding = self
            .compression_header
            .data_series_encodings
            .feature_codes()
            .ok_or_else(|| missing_encoding("FC"))?;

        encoding.encode(
            self.core_data_writer,
            self.external_data_writers,
            feature.code(),
        )
    }

    fn write_feature_position_delta(&mut self, delta: i64) -> io::Result<()> {
        let encoding = self
            .compression_header
            .data_series_encodings
            .feature_position_deltas()
            .ok_or_else(|| missing_encoding("FP"))?;

        encoding.encode(self.core_data_writer, self.external_data_writers, delta)
    }

    fn write_feature_payload(&mut self, feature: &Feature) -> io::Result<()> {
        let encodings = &self.compression_header.data_series_encodings;

        match feature {
            Feature::Substitution {
                reference_base,
                read_base,
                ..
            } => {
                let substitution_matrix = self
                    .compression_header
                    .preservation_map
                    .substitution_matrix();

                let code = substitution_matrix
                    .find(*reference_base, *read_base)
                    .ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::InvalidInput,
                            "substitution read base equals the reference base",
                        )
                    })?;

                let encoding = encodings
                    .base_substitution_codes()
                    .ok_or_else(|| missing_encoding("BS"))?;

                encoding.encode(self.core_data_writer, self.external_data_writers, code)
            }
            Feature::Insertion { bases, .. } => {
                let encoding = encodings
                    .insertion_bases()
                    .ok_or_else(|| missing_encoding("IN"))?;

                encoding.encode(self.core_data_writer, self.external_data_writers, bases)
            }
            Feature::InsertBase { base, .. } => {
                let encoding = encodings.bases().ok_or_else(|| missing_encoding("BA"))?;

                encoding.encode(self.core_data_writer, self.external_data_writers, *base)
            }
            Feature::Deletion { len, .. } => {
                let encoding = encodings
                    .deletion_lengths()
                    .ok_or_else(|| missing_encoding("DL"))?;

                encoding.encode(
                    self.core_data_writer,
                    self.external_data_writers,
                    *len as i64,
                )
            }
            Feature::SoftClip { bases, .. } => {
                let encoding = encodings
                    .soft_clip_bases()
                    .ok_or_else(|| missing_encoding("SC"))?;

                encoding.encode(self.core_data_writer, self.external_data_writers, bases)
            }
            Feature::HardClip { len, .. } => {
                let encoding = encodings
                    .hard_clip_lengths()
                    .ok_or_else(|| missing_encoding("HC"))?;

                encoding.encode(
                    self.core_data_writer,
                    self.external_data_writers,
                    *len as i64,
                )
            }
            Feature::ReferenceSkip { len, .. } => {
                let encoding = encodings
                    .reference_skip_lengths()
                    .ok_or_else(|| missing_encoding("RS"))?;

                encoding.encode(
                    self.core_data_writer,
                    self.external_data_writers,
                    *len as i64,
                )
            }
            Feature::Padding { len, .. } => {
                let encoding = encodings
                    .padding_lengths()
                    .ok_or_else(|| missing_encoding("PD"))?;

                encoding.encode(
                    self.core_data_writer,
                    self.external_data_writers,
                    *len as i64,
                )
            }
            Feature::ReadBase {
                base,
                quality_score,
                ..
            } => {
                let encoding = encodings.bases().ok_or_else(|| missing_encoding("BA"))?;
                encoding.encode(self.core_data_writer, self.external_data_writers, *base)?;

                let encoding = encodings
                    .quality_scores()
                    .ok_or_else(|| missing_encoding("QS"))?;

                encoding.encode(
                    self.core_data_writer,
                    self.external_data_writers,
                    *quality_score,
                )
            }
            Feature::Bases { bases, .. } => {
                let encoding = encodings
                    .stretches_of_bases()
                    .ok_or_else(|| missing_encoding("BB"))?;

                encoding.encode(self.core_data_writer, self.external_data_writers, bases)
            }
            Feature::QualityScore { quality_score, .. } => {
                let encoding = encodings
                    .quality_scores()
                    .ok_or_else(|| missing_encoding("QS"))?;

                encoding.encode(
                    self.core_data_writer,
                    self.external_data_writers,
                    *quality_score,
                )
            }
        }
    }

    fn write_mapping_quality(&mut self, record: &Record) -> io::Result<()> {
        let encoding = self
            .compression_header
            .data_series_encodings
            .mapping_qualities()
            .ok_or_else(|| missing_encoding("MQ"))?;

        encoding.encode(
            self.core_data_writer,
            self.external_data_writers,
            mapping_quality_value(record.mapping_quality),
        )
    }

    fn write_unmapped_read_data(&mut self, record: &Record) -> io::Result<()> {
        if !record.sequence.is_empty() {
            let encoding = self
                .compression_header
                .data_series_encodings
                .bases()
                .ok_or_else(|| missing_encoding("BA"))?;

            for &base in &record.sequence {
                encoding.encode(self.core_data_writer, self.external_data_writers, base)?;
            }
        }

        if record.cram_flags.quality_scores_are_stored_as_array() {
            self.write_quality_scores(&record.quality_scores)?;
        }

        Ok(())
    }

    fn write_quality_scores(&mut self, quality_scores: &[u8]) -> io::Result<()> {
        let encoding = self
            .compression_header
            .data_series_encodings
            .quality_scores()
            .ok_or_else(|| missing_encoding("QS"))?;

        for &score in quality_scores {
            encoding.encode(self.core_data_writer, self.external_data_writers, score)?;
        }

        Ok(())
    }
}

/// Serializes a tag value into the payload bytes its codec carries.
///
/// Strings omit their terminator (the byte-array-stop codec appends it);
/// arrays are prefixed with the subtype and element count, matching the BAM
/// layout.
fn encode_value(value: &ValueBuf) -> io::Result<Vec<u8>> {
    use noodles_sam::alignment::record_buf::data::field::value::Array;

    let buf = match value {
        ValueBuf::Character(c) => vec![*c],
        ValueBuf::Int8(n) => vec![*n as u8],
        ValueBuf::UInt8(n) => vec![*n],
        ValueBuf::Int16(n) => n.to_le_bytes().to_vec(),
        ValueBuf::UInt16(n) => n.to_le_bytes().to_vec(),
        ValueBuf::Int32(n) => n.to_le_bytes().to_vec(),
        ValueBuf::UInt32(n) => n.to_le_bytes().to_vec(),
        ValueBuf::Float(n) => n.to_le_bytes().to_vec(),
        ValueBuf::String(s) | ValueBuf::Hex(s) => s.to_vec(),
        ValueBuf::Array(array) => {
            let mut buf = Vec::new();

            match array {
                Array::Int8(values) => {
                    put_array_header(&mut buf, b'c', values.len())?;
                    buf.extend(values.iter().map(|&n| n as u8));
                }
                Array::UInt8(values) => {
                    put_array_header(&mut buf, b'C', values.len())?;
                    buf.extend_from_slice(values);
                }
                Array::Int16(values) => {
                    put_array_header(&mut buf, b's', values.len())?;
                    for n in values {
                        buf.extend_from_slice(&n.to_le_bytes());
                    }
                }
                Array::UInt16(values) => {
                    put_array_header(&mut buf, b'S', values.len())?;
                    for n in values {
                        buf.extend_from_slice(&n.to_le_bytes());
                    }
                }
                Array::Int32(values) => {
                    put_array_header(&mut buf, b'i', values.len())?;
                    for n in values {
                        buf.extend_from_slice(&n.to_le_bytes());
                    }
                }
                Array::UInt32(values) => {
                    put_array_header(&mut buf, b'I', values.len())?;
                    for n in values {
                        buf.extend_from_slice(&n.to_le_bytes());
                    }
                }
                Array::Float(values) => {
                    put_array_header(&mut buf, b'f', values.len())?;
                    for n in values {
                        buf.extend_from_slice(&n.to_le_bytes());
                    }
                }
            }

            buf
        }
    };

    Ok(buf)
}

fn put_array_header(buf: &mut Vec<u8>, subtype: u8, len: usize) -> io::Result<()> {
    let n = u32::try_from(len).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    buf.push(subtype);
    buf.extend_from_slice(&n.to_le_bytes());
    Ok(())
}

fn missing_encoding(name: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("missing data series encoding: {name}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_value() -> io::Result<()> {
        assert_eq!(encode_value(&ValueBuf::Character(b'Q'))?, [b'Q']);
        assert_eq!(encode_value(&ValueBuf::Int8(-2))?, [0xfe]);
        assert_eq!(encode_value(&ValueBuf::UInt8(5))?, [0x05]);
        assert_eq!(encode_value(&ValueBuf::Int16(-2))?, [0xfe, 0xff]);
        assert_eq!(encode_value(&ValueBuf::UInt16(513))?, [0x01, 0x02]);
        assert_eq!(
            encode_value(&ValueBuf::Int32(5))?,
            [0x05, 0x00, 0x00, 0x00]
        );
        assert_eq!(encode_value(&ValueBuf::from("ndl"))?, b"ndl".to_vec());

        Ok(())
    }

    #[test]
    fn test_encode_value_with_array() -> io::Result<()> {
        use noodles_sam::alignment::record_buf::data::field::value::Array;

        let value = ValueBuf::Array(Array::UInt16(vec![256, 512]));

        assert_eq!(
            encode_value(&value)?,
            [
                b'S', // subtype
                0x02, 0x00, 0x00, 0x00, // count = 2
                0x00, 0x01, // 256
                0x00, 0x02, // 512
            ]
        );

        Ok(())
    }
}
