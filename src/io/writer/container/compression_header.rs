mod data_series_encodings;
mod encoding;
mod preservation_map;
mod tag_encodings;

use std::io::{self, Write};

use self::{
    data_series_encodings::{build_data_series_encodings, write_data_series_encodings},
    preservation_map::{build_preservation_map, write_preservation_map},
    tag_encodings::{build_tag_encodings, write_tag_encodings},
};
pub(super) use self::encoding::{write_byte_array_encoding, write_byte_encoding, write_integer_encoding};
use super::stats::ContainerStats;
use crate::{
    container::CompressionHeader,
    file_definition::Version,
    io::writer::{Options, Record},
};

/// Builds the compression header for a container's records.
///
/// The mate-linkage statistics in `stats` must already be final: codec
/// selection reads the histograms, so any later change would desynchronize
/// the declared codecs from the driven values.
pub(super) fn build_compression_header(
    options: &Options,
    records: &[Record],
    stats: &mut ContainerStats,
    multi_reference: bool,
    alignment_starts_are_deltas: bool,
) -> CompressionHeader {
    let preservation_map = build_preservation_map(options, records, alignment_starts_are_deltas);

    stats.collect(
        records,
        options.records_per_slice,
        preservation_map.substitution_matrix(),
        preservation_map.tag_sets(),
        multi_reference,
        alignment_starts_are_deltas,
    );

    let data_series_encodings = build_data_series_encodings(
        stats,
        options.version,
        multi_reference,
        alignment_starts_are_deltas,
    );

    let tag_encodings = build_tag_encodings(records, options.version);

    CompressionHeader::new(preservation_map, data_series_encodings, tag_encodings)
}

pub(super) fn write_compression_header<W>(
    writer: &mut W,
    compression_header: &CompressionHeader,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    write_preservation_map(writer, &compression_header.preservation_map, version)?;
    write_data_series_encodings(writer, &compression_header.data_series_encodings, version)?;
    write_tag_encodings(writer, &compression_header.tag_encodings, version)?;
    Ok(())
}
