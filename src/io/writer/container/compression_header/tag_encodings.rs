use std::io::{self, Write};

use noodles_sam::alignment::record::data::field::Type;

use super::write_byte_array_encoding;
use crate::{
    container::{
        block,
        compression_header::{
            Encoding, TagEncodings,
            encoding::codec::{Byte, ByteArray, Integer},
            preservation_map::tag_sets::Key,
        },
    },
    file_definition::Version,
    io::writer::{Record, collections::write_array, num::write_int},
};

// Aux strings cannot contain a tab, so it doubles as the terminator.
const STRING_STOP_BYTE: u8 = b'\t';

/// Builds one codec per distinct tag key.
///
/// Every tag owns a private external block whose content ID is the 24-bit
/// `(tag[0], tag[1], type)` triple. The value layout depends on the SAM
/// type: strings terminate with a stop byte, fixed-width scalars carry an
/// implied length (a zero-bit Huffman code), and arrays carry their length
/// in-band.
pub(super) fn build_tag_encodings(records: &[Record], version: Version) -> TagEncodings {
    let mut tag_encodings = TagEncodings::default();

    for record in records {
        for (tag, value) in &record.data {
            let key = Key::new(*tag, value.ty());
            let block_content_id = block::ContentId::from(key);

            if tag_encodings.contains_key(&block_content_id) {
                continue;
            }

            let encoding = match key.ty() {
                Type::String | Type::Hex => Encoding::new(ByteArray::ByteArrayStop {
                    stop_byte: STRING_STOP_BYTE,
                    block_content_id,
                }),
                Type::Character | Type::Int8 | Type::UInt8 => {
                    fixed_width_encoding(block_content_id, 1)
                }
                Type::Int16 | Type::UInt16 => fixed_width_encoding(block_content_id, 2),
                Type::Int32 | Type::UInt32 | Type::Float => {
                    fixed_width_encoding(block_content_id, 4)
                }
                Type::Array => Encoding::new(ByteArray::ByteArrayLength {
                    len_encoding: integer_encoding_for_version(block_content_id, version),
                    value_encoding: Encoding::new(Byte::External { block_content_id }),
                }),
            };

            tag_encodings.insert(block_content_id, encoding);
        }
    }

    tag_encodings
}

fn fixed_width_encoding(block_content_id: block::ContentId, len: i32) -> Encoding<ByteArray> {
    Encoding::new(ByteArray::ByteArrayLength {
        len_encoding: Encoding::new(Integer::huffman(vec![len], vec![0])),
        value_encoding: Encoding::new(Byte::External { block_content_id }),
    })
}

fn integer_encoding_for_version(
    block_content_id: block::ContentId,
    version: Version,
) -> Encoding<Integer> {
    if version >= Version::V4_0 {
        Encoding::new(Integer::VarintUnsigned {
            block_content_id,
            offset: 0,
        })
    } else {
        Encoding::new(Integer::External { block_content_id })
    }
}

pub(super) fn write_tag_encodings<W>(
    writer: &mut W,
    tag_encodings: &TagEncodings,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    let buf = encode(tag_encodings, version)?;
    write_array(writer, version, &buf)
}

fn encode(tag_encodings: &TagEncodings, version: Version) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_inner(&mut buf, tag_encodings, version)?;
    Ok(buf)
}

fn encode_inner<W>(writer: &mut W, tag_encodings: &TagEncodings, version: Version) -> io::Result<()>
where
    W: Write,
{
    let len = i32::try_from(tag_encodings.len())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_int(writer, version, len)?;

    for (&block_content_id, encoding) in tag_encodings.iter() {
        write_int(writer, version, block_content_id)?;
        write_byte_array_encoding(writer, encoding, version)?;
    }

    Ok(())
}
