mod compression_method;
mod content_type;

use std::{
    io::{self, Write},
    mem,
};

use flate2::CrcWriter;

use self::{compression_method::write_compression_method, content_type::write_content_type};
use crate::{
    codecs::{Encoder, bzip2, gzip},
    container::block::{CompressionMethod, ContentId, ContentType},
    file_definition::Version,
    io::writer::num::{int_size_of, write_int, write_u32_le},
};

pub struct Block {
    pub(crate) compression_method: CompressionMethod,
    pub(crate) content_type: ContentType,
    pub(crate) content_id: ContentId,
    pub(crate) uncompressed_size: usize,
    pub(crate) src: Vec<u8>,
}

impl Block {
    /// Compresses `src` with the given encoder, or stores it raw when
    /// `encoder` is `None`.
    pub fn encode(
        content_type: ContentType,
        content_id: ContentId,
        encoder: Option<&Encoder>,
        src: &[u8],
    ) -> io::Result<Self> {
        let (compression_method, buf) = match encoder {
            None => (CompressionMethod::None, src.to_vec()),
            Some(Encoder::Gzip(compression_level)) => (
                CompressionMethod::Gzip,
                gzip::encode(*compression_level, src)?,
            ),
            Some(Encoder::Bzip2(compression_level)) => (
                CompressionMethod::Bzip2,
                bzip2::encode(*compression_level, src)?,
            ),
        };

        Ok(Self {
            compression_method,
            content_type,
            content_id,
            uncompressed_size: src.len(),
            src: buf,
        })
    }

    /// Tries every candidate encoder and keeps the smallest result.
    ///
    /// A candidate that fails is skipped as long as another succeeds; if no
    /// candidate beats the uncompressed size, the block is stored raw.
    pub fn encode_best(
        content_type: ContentType,
        content_id: ContentId,
        candidates: &[Encoder],
        src: &[u8],
    ) -> io::Result<Self> {
        let mut best: Option<Block> = None;

        for encoder in candidates {
            let Ok(block) = Self::encode(content_type, content_id, Some(encoder), src) else {
                continue;
            };

            if best
                .as_ref()
                .is_none_or(|b| block.src.len() < b.src.len())
            {
                best = Some(block);
            }
        }

        match best {
            Some(block) if block.src.len() < src.len() => Ok(block),
            _ => Self::encode(content_type, content_id, None, src),
        }
    }

    pub fn size(&self, version: Version) -> io::Result<usize> {
        let compressed_size = i32::try_from(self.src.len())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let uncompressed_size = i32::try_from(self.uncompressed_size)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let mut size = mem::size_of::<u8>() // method
            + mem::size_of::<u8>() // block content type ID
            + int_size_of(version, self.content_id)
            + int_size_of(version, compressed_size)
            + int_size_of(version, uncompressed_size)
            + self.src.len();

        if version.has_crc32() {
            size += mem::size_of::<u32>();
        }

        Ok(size)
    }
}

pub fn write_block<W>(writer: &mut W, block: &Block, version: Version) -> io::Result<()>
where
    W: Write,
{
    if version.has_crc32() {
        let mut crc_writer = CrcWriter::new(writer);
        write_block_body(&mut crc_writer, block, version)?;
        let crc32 = crc_writer.crc().sum();
        write_u32_le(crc_writer.get_mut(), crc32)?;
        Ok(())
    } else {
        write_block_body(writer, block, version)
    }
}

fn write_block_body<W>(writer: &mut W, block: &Block, version: Version) -> io::Result<()>
where
    W: Write,
{
    write_compression_method(writer, block.compression_method)?;

    write_content_type(writer, block.content_type)?;
    write_int(writer, version, block.content_id)?;

    write_size(writer, block.src.len(), version)?; // compressed size
    write_size(writer, block.uncompressed_size, version)?;

    writer.write_all(&block.src)?;

    Ok(())
}

fn write_size<W>(writer: &mut W, size: usize, version: Version) -> io::Result<()>
where
    W: Write,
{
    let n = i32::try_from(size).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    write_int(writer, version, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_block() -> io::Result<()> {
        let block = Block {
            compression_method: CompressionMethod::None,
            content_type: ContentType::ExternalData,
            content_id: 1,
            uncompressed_size: 4,
            src: b"ACGT".to_vec(),
        };

        let mut buf = Vec::new();
        write_block(&mut buf, &block, Version::V2_1)?;

        let expected = [
            0x00, // compression method = none
            0x04, // content type = external data
            0x01, // content ID = 1
            0x04, // compressed size = 4
            0x04, // uncompressed size = 4
            b'A', b'C', b'G', b'T',
        ];

        assert_eq!(buf, expected);

        // CRAM 3.0 appends a CRC32.
        let mut buf = Vec::new();
        write_block(&mut buf, &block, Version::V3_0)?;
        assert_eq!(buf.len(), expected.len() + 4);
        assert_eq!(&buf[..expected.len()], expected);

        Ok(())
    }

    #[test]
    fn test_encode_best_prefers_smallest() -> io::Result<()> {
        use flate2::Compression;

        // Highly repetitive data compresses; the best candidate must win
        // over raw.
        let src = vec![b'A'; 1024];

        let block = Block::encode_best(
            ContentType::ExternalData,
            1,
            &[Encoder::Gzip(Compression::fast())],
            &src,
        )?;

        assert_eq!(block.compression_method, CompressionMethod::Gzip);
        assert!(block.src.len() < src.len());
        assert_eq!(block.uncompressed_size, src.len());

        Ok(())
    }

    #[test]
    fn test_encode_best_falls_back_to_raw() -> io::Result<()> {
        use flate2::Compression;

        // A tiny payload gains nothing from gzip framing.
        let src = b"AC".to_vec();

        let block = Block::encode_best(
            ContentType::ExternalData,
            1,
            &[Encoder::Gzip(Compression::fast())],
            &src,
        )?;

        assert_eq!(block.compression_method, CompressionMethod::None);
        assert_eq!(block.src, src);

        Ok(())
    }
}
