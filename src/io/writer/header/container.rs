use std::io::{self, Write};

use noodles_sam as sam;

use crate::{
    container::{Header, ReferenceSequenceContext, block::ContentType},
    file_definition::Version,
    io::writer::container::{Block, write_block, write_header},
};

/// Writes the SAM header container: one file-header block holding the
/// length-prefixed SAM header text.
pub(super) fn write_container<W>(
    writer: &mut W,
    header: &sam::Header,
    version: Version,
) -> io::Result<()>
where
    W: Write,
{
    let block = build_block(header)?;
    let container_size = block.size(version)?;

    let container_header = Header {
        reference_sequence_context: ReferenceSequenceContext::None,
        record_count: 0,
        record_counter: 0,
        base_count: 0,
        block_count: 1,
        landmarks: vec![0],
    };

    write_header(writer, &container_header, container_size, version)?;
    write_block(writer, &block, version)?;

    Ok(())
}

fn build_block(header: &sam::Header) -> io::Result<Block> {
    let mut text = Vec::new();
    sam::io::Writer::new(&mut text).write_header(header)?;

    let len =
        i32::try_from(text.len()).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let mut src = Vec::with_capacity(text.len() + 4);
    src.extend_from_slice(&len.to_le_bytes());
    src.extend_from_slice(&text);

    Block::encode(ContentType::FileHeader, 0, None, &src)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_block() -> io::Result<()> {
        let header = sam::Header::default();
        let block = build_block(&header)?;

        // The block data is the header text prefixed with its i32 LE
        // length; an empty header serializes to no text.
        assert_eq!(block.src, [0x00, 0x00, 0x00, 0x00]);

        Ok(())
    }
}
