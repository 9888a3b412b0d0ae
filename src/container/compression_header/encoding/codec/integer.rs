use std::io;

use crate::{
    container::{block, compression_header::encoding::Encode},
    huffman::CanonicalHuffmanEncoder,
    io::{
        BitWriter,
        writer::{
            container::slice::records::ExternalDataWriters,
            num::{write_itf8, write_sint7_64, write_uint7_64},
        },
    },
};

#[derive(Clone, Debug)]
pub(crate) enum Integer {
    External {
        block_content_id: block::ContentId,
    },
    Huffman {
        alphabet: Vec<i32>,
        bit_lens: Vec<u32>,
        encoder: CanonicalHuffmanEncoder,
    },
    Beta {
        offset: i32,
        len: u32,
    },
    Subexp {
        offset: i32,
        k: i32,
    },
    Gamma {
        offset: i32,
    },
    // CRAM 4.0 codecs
    VarintUnsigned {
        block_content_id: block::ContentId,
        offset: i64,
    },
    VarintSigned {
        block_content_id: block::ContentId,
        offset: i64,
    },
}

impl Integer {
    pub fn huffman(alphabet: Vec<i32>, bit_lens: Vec<u32>) -> Self {
        let encoder = CanonicalHuffmanEncoder::new(&alphabet, &bit_lens);
        Self::Huffman {
            alphabet,
            bit_lens,
            encoder,
        }
    }
}

impl PartialEq for Integer {
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
            (
                Self::Beta {
                    offset: a1,
                    len: a2,
                },
                Self::Beta {
                    offset: b1,
                    len: b2,
                },
            ) => a1 == b1 && a2 == b2,
            (Self::Subexp { offset: a1, k: a2 }, Self::Subexp { offset: b1, k: b2 }) => {
                a1 == b1 && a2 == b2
            }
            (Self::Gamma { offset: a }, Self::Gamma { offset: b }) => a == b,
            (
                Self::VarintUnsigned {
                    block_content_id: a1,
                    offset: a2,
                },
                Self::VarintUnsigned {
                    block_content_id: b1,
                    offset: b2,
                },
            ) => a1 == b1 && a2 == b2,
            (
                Self::VarintSigned {
                    block_content_id: a1,
                    offset: a2,
                },
                Self::VarintSigned {
                    block_content_id: b1,
                    offset: b2,
                },
            ) => a1 == b1 && a2 == b2,
            _ => false,
        }
    }
}

impl Eq for Integer {}

impl Encode<'_> for Integer {
    type Value = i64;

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
                    .ok_or_else(|| missing_block(*block_content_id))?;

                let value = i32::try_from(value)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

                write_itf8(dst, value)
            }
            Self::Huffman {
                alphabet, encoder, ..
            } => {
                if alphabet.len() == 1 {
                    Ok(())
                } else {
                    let value = i32::try_from(value)
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

                    encoder.encode(core_data_writer, value)
                }
            }
            Self::Beta { offset, len } => {
                let value = i32::try_from(value)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                core_data_writer.write_u32((value + offset) as u32, *len as usize)
            }
            Self::Gamma { offset } => {
                let value = i32::try_from(value)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                let x = value + offset;

                if x < 1 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("gamma encoding requires x >= 1, got {x}"),
                    ));
                }

                let n = 31 - (x as u32).leading_zeros();
                for _ in 0..n {
                    core_data_writer.write_u32(0, 1)?;
                }
                core_data_writer.write_u32(1, 1)?;

                let m = (x as u32) - (1 << n);
                core_data_writer.write_u32(m, n as usize)
            }
            Self::Subexp { offset, k } => {
                if *k < 0 || *k >= 32 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("invalid subexp parameter: k={k}"),
                    ));
                }

                let value = i32::try_from(value)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                let n = value + offset;

                if n < 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("subexp encoding requires a non-negative value, got {n}"),
                    ));
                }

                let k = *k as u32;
                let n = n as u32;

                if n < 1 << k {
                    core_data_writer.write_u32(0, 1)?;
                    core_data_writer.write_u32(n, k as usize)
                } else {
                    let b = 31 - n.leading_zeros();
                    let prefix = b - k + 1;

                    for _ in 0..prefix {
                        core_data_writer.write_u32(1, 1)?;
                    }
                    core_data_writer.write_u32(0, 1)?;

                    core_data_writer.write_u32(n - (1 << b), b as usize)
                }
            }
            Self::VarintUnsigned {
                block_content_id,
                offset,
            } => {
                let dst = external_data_writers
                    .get_mut(block_content_id)
                    .ok_or_else(|| missing_block(*block_content_id))?;

                let adjusted = value - offset;
                let n = u64::try_from(adjusted)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                write_uint7_64(dst, n)
            }
            Self::VarintSigned {
                block_content_id,
                offset,
            } => {
                let dst = external_data_writers
                    .get_mut(block_content_id)
                    .ok_or_else(|| missing_block(*block_content_id))?;

                write_sint7_64(dst, value - offset)
            }
        }
    }
}

fn missing_block(block_content_id: block::ContentId) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("missing external block: {block_content_id}"),
    )
}
