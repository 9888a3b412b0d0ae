mod header;
mod mates;
mod names;
pub(crate) mod records;

use std::io;

use flate2::{Compression, Crc};
use noodles_fasta as fasta;
use noodles_sam as sam;

pub(super) use self::header::write_header;
use self::records::ExternalDataWriters;
use super::stats::{ContainerStats, slice_reference_sequence_context};
use crate::{
    calculate_normalized_sequence_digest,
    codecs::Encoder,
    container::{
        CompressionHeader, ReferenceSequenceContext,
        block::{self, ContentType},
        compression_header::data_series_encodings::DataSeries,
        slice::Header,
    },
    io::{
        BitWriter,
        writer::{Options, Record, container::block::Block},
    },
};

pub(super) struct Slice {
    pub header: Header,
    pub core_data_block: Block,
    pub external_data_blocks: Vec<Block>,
}

const CORE_DATA_BLOCK_CONTENT_ID: block::ContentId = 0;

/// Block content ID used for embedded reference sequences.
///
/// This must not collide with any data series (1-28) or tag encoding content IDs.
const EMBEDDED_REFERENCE_CONTENT_ID: block::ContentId = i32::MAX;

/// Applies per-slice record preparation: lossy name elimination followed by
/// mate resolution.
///
/// This runs before codec selection so the statistics the mate resolver
/// accumulates (and withdraws on demotion) are final by the time the
/// compression header is built.
pub(super) fn prepare_records(
    options: &Options,
    records: &mut [Record],
    stats: &mut ContainerStats,
) {
    if options.lossy_read_names {
        names::apply_lossy_names(records);
    }

    mates::resolve_mates(records, stats, options.lossy_read_names);
}

pub(super) fn build_slice(
    reference_sequence_repository: &fasta::Repository,
    options: &Options,
    header: &sam::Header,
    record_counter: u64,
    compression_header: &CompressionHeader,
    multi_reference: bool,
    records: &[Record],
) -> io::Result<Slice> {
    let reference_sequence_context = if multi_reference {
        ReferenceSequenceContext::Many
    } else {
        slice_reference_sequence_context(records)
    };

    let (core_data_buf, external_data_bufs) =
        write_records(compression_header, reference_sequence_context, records)?;

    let (core_data_block, mut external_data_blocks) =
        build_blocks(options, core_data_buf, external_data_bufs)?;

    let mut block_content_ids = vec![core_data_block.content_id];
    block_content_ids.extend(external_data_blocks.iter().map(|block| block.content_id));

    let mut embedded_reference_bases_block_content_id = None;

    let reference_md5 = if options.embed_reference_sequences {
        if let ReferenceSequenceContext::Some(context) = reference_sequence_context {
            let reference_bases =
                get_reference_subsequence(reference_sequence_repository, header, context)?;

            let embedded_reference_block = Block::encode(
                ContentType::ExternalData,
                EMBEDDED_REFERENCE_CONTENT_ID,
                None,
                &reference_bases,
            )?;

            embedded_reference_bases_block_content_id = Some(EMBEDDED_REFERENCE_CONTENT_ID);
            block_content_ids.push(EMBEDDED_REFERENCE_CONTENT_ID);
            external_data_blocks.push(embedded_reference_block);

            // An embedded reference needs no digest: it is the reference.
            None
        } else {
            None
        }
    } else {
        calculate_reference_sequence_md5(
            reference_sequence_repository,
            header,
            reference_sequence_context,
            options.reference_required,
        )?
    };

    let optional_tags = if options.version.has_crc32() && !options.ignore_checksums {
        build_checksum_tags(records)
    } else {
        Vec::new()
    };

    let header = Header {
        reference_sequence_context,
        record_count: records.len(),
        record_counter,
        block_count: block_content_ids.len(),
        block_content_ids,
        embedded_reference_bases_block_content_id,
        reference_md5,
        optional_tags,
    };

    Ok(Slice {
        header,
        core_data_block,
        external_data_blocks,
    })
}

#[allow(clippy::type_complexity)]
fn write_records(
    compression_header: &CompressionHeader,
    reference_sequence_context: ReferenceSequenceContext,
    records: &[Record],
) -> io::Result<(Vec<u8>, Vec<(block::ContentId, Vec<u8>)>)> {
    use crate::container::compression_header::data_series_encodings::data_series::STANDARD_DATA_SERIES;

    let mut core_data_writer = BitWriter::default();
    let mut external_data_writers = ExternalDataWriters::default();

    for data_series in STANDARD_DATA_SERIES {
        let block_content_id = block::ContentId::from(*data_series);
        external_data_writers.insert(block_content_id, Vec::new());
    }

    for block_content_id in compression_header.tag_encodings.keys() {
        external_data_writers.insert(*block_content_id, Vec::new());
    }

    let mut writer = records::Writer::new(
        compression_header,
        &mut core_data_writer,
        &mut external_data_writers,
        reference_sequence_context,
    );

    for record in records {
        writer.write_record(record)?;
    }

    Ok((
        core_data_writer.finish()?,
        external_data_writers.into_iter().collect(),
    ))
}

fn build_blocks(
    options: &Options,
    core_data_buf: Vec<u8>,
    external_data_bufs: Vec<(block::ContentId, Vec<u8>)>,
) -> io::Result<(Block, Vec<Block>)> {
    let encoder_map = &options.block_content_encoder_map;

    let core_data_block = match encoder_map.core_data_encoder() {
        Some(encoder) => Block::encode(
            ContentType::CoreData,
            CORE_DATA_BLOCK_CONTENT_ID,
            encoder,
            &core_data_buf,
        )?,
        None => Block::encode_best(
            ContentType::CoreData,
            CORE_DATA_BLOCK_CONTENT_ID,
            &core_data_method_set(&core_data_buf, options),
            &core_data_buf,
        )?,
    };

    let external_data_blocks = external_data_bufs
        .into_iter()
        .filter(|(_, buf)| !buf.is_empty())
        .map(|(block_content_id, buf)| {
            let encoder = encoder_map
                .get_data_series_encoder(block_content_id)
                .or_else(|| encoder_map.get_tag_values_encoder(block_content_id));

            match encoder {
                Some(encoder) => {
                    Block::encode(ContentType::ExternalData, block_content_id, encoder, &buf)
                }
                None => Block::encode_best(
                    ContentType::ExternalData,
                    block_content_id,
                    &external_data_method_set(block_content_id, options),
                    &buf,
                ),
            }
        })
        .collect::<io::Result<_>>()?;

    Ok((core_data_block, external_data_blocks))
}

/// The core bitstream is already dense; only large payloads at high
/// compression levels are worth a fast gzip pass.
fn core_data_method_set(src: &[u8], options: &Options) -> Vec<Encoder> {
    const MIN_LEN: usize = 500;

    if src.len() > MIN_LEN && options.compression_level > 5 {
        vec![Encoder::Gzip(Compression::new(1))]
    } else {
        Vec::new()
    }
}

/// Candidate compressors for an external block, by series.
fn external_data_method_set(
    block_content_id: block::ContentId,
    options: &Options,
) -> Vec<Encoder> {
    let level = options.compression_level;

    let mut candidates = vec![
        Encoder::Gzip(Compression::fast()),
        Encoder::Gzip(Compression::new(level)),
    ];

    let bzip2_level = if block_content_id == block::ContentId::from(DataSeries::QualityScores) {
        // Quality scores are the bulk of the payload; try harder earlier.
        3
    } else {
        5
    };

    if options.use_bzip2 && level >= bzip2_level {
        candidates.push(Encoder::Bzip2(bzip2::Compression::new(level.min(9))));
    }

    candidates
}

fn build_checksum_tags(records: &[Record]) -> Vec<u8> {
    let mut base_crc = Crc::new();
    let mut quality_score_crc = Crc::new();

    for record in records {
        base_crc.update(&record.sequence);
        quality_score_crc.update(&record.quality_scores);
    }

    let mut buf = Vec::new();
    put_checksum_tag(&mut buf, [b'B', b'D'], base_crc.sum());
    put_checksum_tag(&mut buf, [b'S', b'D'], quality_score_crc.sum());
    buf
}

// <tag> 'B' 'c' <count = 4 LE> <4 bytes CRC LE>
fn put_checksum_tag(buf: &mut Vec<u8>, tag: [u8; 2], checksum: u32) {
    buf.extend_from_slice(&tag);
    buf.push(b'B');
    buf.push(b'c');
    buf.extend_from_slice(&4u32.to_le_bytes());
    buf.extend_from_slice(&checksum.to_le_bytes());
}

fn calculate_reference_sequence_md5(
    reference_sequence_repository: &fasta::Repository,
    header: &sam::Header,
    reference_sequence_context: ReferenceSequenceContext,
    reference_required: bool,
) -> io::Result<Option<[u8; 16]>> {
    let ReferenceSequenceContext::Some(context) = reference_sequence_context else {
        return Ok(None);
    };

    let reference_sequence_name = header
        .reference_sequences()
        .get_index(context.reference_sequence_id())
        .map(|(name, _)| name);

    let reference_sequence_name = match reference_sequence_name {
        Some(name) => name,
        None if !reference_required => return Ok(Some([0; 16])),
        None => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid reference sequence ID",
            ));
        }
    };

    match reference_sequence_repository.get(reference_sequence_name) {
        Some(result) => {
            let reference_sequence = result?;
            let interval = context.alignment_start()..=context.alignment_end();
            let sequence = &reference_sequence[interval];
            Ok(Some(calculate_normalized_sequence_digest(sequence)))
        }
        None if !reference_required => Ok(Some([0; 16])),
        None => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("missing reference sequence: {reference_sequence_name}"),
        )),
    }
}

fn get_reference_subsequence(
    reference_sequence_repository: &fasta::Repository,
    header: &sam::Header,
    context: crate::container::ReferenceSequenceContextInner,
) -> io::Result<Vec<u8>> {
    let reference_sequence_name = header
        .reference_sequences()
        .get_index(context.reference_sequence_id())
        .map(|(name, _)| name)
        .ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "invalid reference sequence ID")
        })?;

    let reference_sequence = reference_sequence_repository
        .get(reference_sequence_name)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("missing reference sequence: {reference_sequence_name}"),
            )
        })??;

    let interval = context.alignment_start()..=context.alignment_end();
    let sequence = &reference_sequence[interval];

    Ok(sequence.to_vec())
}
