use std::io::{self, Write};

use crate::{
    container::{
        block,
        compression_header::{
            Encoding,
            encoding::{
                Kind,
                codec::{Byte, ByteArray, Integer},
            },
        },
    },
    file_definition::Version,
    io::writer::num::{write_int, write_signed_int, write_u8},
};

pub fn write_byte_encoding<W>(
    writer: &mut W,
    encoding: &Encoding<Byte>,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    match encoding.get() {
        Byte::External { block_content_id } => {
            write_external_codec(writer, *block_content_id, version)
        }
        Byte::Huffman {
            alphabet, bit_lens, ..
        } => write_huffman_codec(writer, alphabet, bit_lens, version),
    }
}

pub fn write_integer_encoding<W>(
    writer: &mut W,
    encoding: &Encoding<Integer>,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    match encoding.get() {
        Integer::External { block_content_id } => {
            write_external_codec(writer, *block_content_id, version)
        }
        Integer::Huffman {
            alphabet, bit_lens, ..
        } => write_huffman_codec(writer, alphabet, bit_lens, version),
        Integer::Beta { offset, len } => write_beta_codec(writer, *offset, *len, version),
        Integer::Subexp { offset, k } => write_subexp_codec(writer, *offset, *k, version),
        Integer::Gamma { offset } => write_gamma_codec(writer, *offset, version),
        Integer::VarintUnsigned {
            block_content_id,
            offset,
        } => write_varint_unsigned_codec(writer, *block_content_id, *offset, version),
        Integer::VarintSigned {
            block_content_id,
            offset,
        } => write_varint_signed_codec(writer, *block_content_id, *offset, version),
    }
}

pub fn write_byte_array_encoding<W>(
    writer: &mut W,
    encoding: &Encoding<ByteArray>,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    match encoding.get() {
        ByteArray::ByteArrayLength {
            len_encoding,
            value_encoding,
        } => write_byte_array_length_codec(writer, len_encoding, value_encoding, version),
        ByteArray::ByteArrayStop {
            stop_byte,
            block_content_id,
        } => write_byte_array_stop_codec(writer, *stop_byte, *block_content_id, version),
    }
}

fn write_kind<W>(writer: &mut W, kind: Kind, version: Version) -> io::Result<()>
where
    W: Write,
{
    // Kinds 41-42 are CRAM 4.0+ only.
    debug_assert!(
        !matches!(kind, Kind::VarintUnsigned | Kind::VarintSigned) || version >= Version::V4_0,
        "CRAM 4.0+ codec kind {kind:?} used with version {version:?}"
    );

    let n = match kind {
        Kind::External => 1,
        Kind::Huffman => 3,
        Kind::ByteArrayLength => 4,
        Kind::ByteArrayStop => 5,
        Kind::Beta => 6,
        Kind::Subexp => 7,
        Kind::Gamma => 9,
        Kind::VarintUnsigned => 41,
        Kind::VarintSigned => 42,
    };

    write_int(writer, version, n)
}

fn write_args<W>(writer: &mut W, buf: &[u8], version: Version) -> io::Result<()>
where
    W: Write,
{
    let len =
        i32::try_from(buf.len()).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_int(writer, version, len)?;
    writer.write_all(buf)
}

/// Writes unsigned codec args (block content IDs, array lengths, bit lengths).
fn write_unsigned_arg<W>(buf: &mut W, version: Version, value: i32) -> io::Result<()>
where
    W: Write,
{
    write_int(buf, version, value)
}

/// Writes signed codec args (offsets, alphabet symbols, codec parameters).
fn write_signed_arg<W>(buf: &mut W, version: Version, value: i32) -> io::Result<()>
where
    W: Write,
{
    write_signed_int(buf, version, value)
}

fn write_external_codec<W>(
    writer: &mut W,
    block_content_id: block::ContentId,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    let mut args = Vec::new();

    write_unsigned_arg(&mut args, version, block_content_id)?;

    write_kind(writer, Kind::External, version)?;
    write_args(writer, &args, version)?;

    Ok(())
}

fn write_huffman_codec<W>(
    writer: &mut W,
    alphabet: &[i32],
    bit_lens: &[u32],
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    let mut args = Vec::new();

    let alphabet_len = i32::try_from(alphabet.len())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_unsigned_arg(&mut args, version, alphabet_len)?;

    for &symbol in alphabet {
        write_signed_arg(&mut args, version, symbol)?;
    }

    let bit_lens_len = i32::try_from(bit_lens.len())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_unsigned_arg(&mut args, version, bit_lens_len)?;

    for &len in bit_lens {
        let len = i32::try_from(len).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        write_unsigned_arg(&mut args, version, len)?;
    }

    write_kind(writer, Kind::Huffman, version)?;
    write_args(writer, &args, version)?;

    Ok(())
}

fn write_byte_array_length_codec<W>(
    writer: &mut W,
    len_encoding: &Encoding<Integer>,
    value_encoding: &Encoding<Byte>,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    let mut args = Vec::new();

    write_integer_encoding(&mut args, len_encoding, version)?;
    write_byte_encoding(&mut args, value_encoding, version)?;

    write_kind(writer, Kind::ByteArrayLength, version)?;
    write_args(writer, &args, version)?;

    Ok(())
}

fn write_byte_array_stop_codec<W>(
    writer: &mut W,
    stop_byte: u8,
    block_content_id: block::ContentId,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    let mut args = Vec::new();
    write_u8(&mut args, stop_byte)?;

    write_unsigned_arg(&mut args, version, block_content_id)?;

    write_kind(writer, Kind::ByteArrayStop, version)?;
    write_args(writer, &args, version)?;

    Ok(())
}

fn write_beta_codec<W>(writer: &mut W, offset: i32, len: u32, version: Version) -> io::Result<()>
where
    W: Write,
{
    let mut args = Vec::new();
    write_signed_arg(&mut args, version, offset)?;

    let len = i32::try_from(len).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_unsigned_arg(&mut args, version, len)?;

    write_kind(writer, Kind::Beta, version)?;
    write_args(writer, &args, version)?;

    Ok(())
}

fn write_subexp_codec<W>(writer: &mut W, offset: i32, k: i32, version: Version) -> io::Result<()>
where
    W: Write,
{
    let mut args = Vec::new();
    write_signed_arg(&mut args, version, offset)?;
    write_signed_arg(&mut args, version, k)?;

    write_kind(writer, Kind::Subexp, version)?;
    write_args(writer, &args, version)?;

    Ok(())
}

fn write_gamma_codec<W>(writer: &mut W, offset: i32, version: Version) -> io::Result<()>
where
    W: Write,
{
    let mut args = Vec::new();
    write_signed_arg(&mut args, version, offset)?;

    write_kind(writer, Kind::Gamma, version)?;
    write_args(writer, &args, version)?;

    Ok(())
}

fn write_varint_unsigned_codec<W>(
    writer: &mut W,
    block_content_id: block::ContentId,
    offset: i64,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    use crate::io::writer::num::write_sint7_64;

    let mut args = Vec::new();
    write_unsigned_arg(&mut args, version, block_content_id)?;
    write_sint7_64(&mut args, offset)?;

    write_kind(writer, Kind::VarintUnsigned, version)?;
    write_args(writer, &args, version)?;

    Ok(())
}

fn write_varint_signed_codec<W>(
    writer: &mut W,
    block_content_id: block::ContentId,
    offset: i64,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    use crate::io::writer::num::write_sint7_64;

    let mut args = Vec::new();
    write_unsigned_arg(&mut args, version, block_content_id)?;
    write_sint7_64(&mut args, offset)?;

    write_kind(writer, Kind::VarintSigned, version)?;
    write_args(writer, &args, version)?;

    Ok(())
}
