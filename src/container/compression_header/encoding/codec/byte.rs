use std::io;

use crate::{
    container::{block, compression_header::encoding::Encode},
    huffman::CanonicalHuffmanEncoder,
    io::{BitWriter, writer::container::slice::records::ExternalDataWriters},
};

#[derive(Clone, Debug)]
pub(crate) enum Byte {
    External {
        block_content_id: block::ContentId,
    },
    Huffman {
        alphabet: Vec<i32>,
        bit_lens: Vec<u32>,
        encoder: CanonicalHuffmanEncoder,
    },
}

impl Byte {
    pub fn huffman(alphabet: Vec<i32>, bit_lens: Vec<u32>) -> Self {
        let encoder = CanonicalHuffmanEncoder::new(&alphabet, &bit_lens);
        Self::Huffman {
            alphabet,
            bit_lens,
            encoder,
        }
    }
}

impl PartialEq for Byte {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::External {
                    block_content_id: a,
                },
                Self::External {
                    block_content_id: b,
                },
            ) => a == b,
            (
                Self::Huffman {
                    alphabet: a1,
                    bit_lens: a2,
                    ..
                },
                Self::Huffman {
                    alphabet: b1,
                    bit_lens: b2,
                    ..
                },
            ) => a1 == b1 && a2 == b2,
            _ => false,
        }
    }
}

impl Eq for Byte {}

impl Encode<'_> for Byte {
    type Value = u8;

    fn encode(
        &self,
        core_data_writer: &mut BitWriter,
        external_data_writers: &mut ExternalDataWriters,
        value: Self::Value,
    ) -> io::Result<()> {
        match self {
            Self::External { block_content_id } => {
                let dst = external_data_writers
                    .get_mut(block_content_id)
                    .ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("missing external block: {block_content_id}"),
                        )
                    })?;

                dst.push(value);

                Ok(())
            }
            Self::Huffman {
                alphabet, encoder, ..
            } => {
                if alphabet.len() == 1 {
                    Ok(())
                } else {
                    encoder.encode(core_data_writer, i32::from(value))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::compression_header::Encoding;

    #[test]
    fn test_encode() -> io::Result<()> {
        let mut core_data_writer = BitWriter::default();
        let mut external_data_writers: ExternalDataWriters =
            [(1, Vec::new())].into_iter().collect();

        let encoding = Encoding::new(Byte::External {
            block_content_id: 1,
        });
        encoding.encode(&mut core_data_writer, &mut external_data_writers, b'n')?;

        assert!(core_data_writer.finish()?.is_empty());
        assert_eq!(external_data_writers[&1], b"n");

        Ok(())
    }

    #[test]
    fn test_encode_huffman_single_symbol() -> io::Result<()> {
        let mut core_data_writer = BitWriter::default();
        let mut external_data_writers = ExternalDataWriters::default();

        let encoding = Encoding::new(Byte::huffman(vec![i32::from(b'X')], vec![0]));
        encoding.encode(&mut core_data_writer, &mut external_data_writers, b'X')?;

        assert!(core_data_writer.finish()?.is_empty());

        Ok(())
    }
}
