use std::io;

use super::{Byte, Integer};
use crate::{
    container::{
        block,
        compression_header::{Encoding, encoding::Encode},
    },
    io::{BitWriter, writer::container::slice::records::ExternalDataWriters},
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum ByteArray {
    ByteArrayLength {
        len_encoding: Encoding<Integer>,
        value_encoding: Encoding<Byte>,
    },
    ByteArrayStop {
        stop_byte: u8,
        block_content_id: block::ContentId,
    },
}

impl<'en> Encode<'en> for ByteArray {
    type Value = &'en [u8];

    fn encode(
        &self,
        core_data_writer: &mut BitWriter,
        external_data_writers: &mut ExternalDataWriters,
        value: Self::Value,
    ) -> io::Result<()> {
        match self {
            Self::ByteArrayLength {
                len_encoding,
                value_encoding,
            } => {
                let len = i64::try_from(value.len())
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

                len_encoding.encode(core_data_writer, external_data_writers, len)?;

                for &b in value {
                    value_encoding.encode(core_data_writer, external_data_writers, b)?;
                }

                Ok(())
            }
            Self::ByteArrayStop {
                stop_byte,
                block_content_id,
            } => {
                let dst = external_data_writers
                    .get_mut(block_content_id)
                    .ok_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("missing external block: {block_content_id}"),
                        )
                    })?;

                dst.extend_from_slice(value);
                dst.push(*stop_byte);

                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_byte_array_stop() -> io::Result<()> {
        let mut core_data_writer = BitWriter::default();
        let mut external_data_writers: ExternalDataWriters =
            [(7, Vec::new())].into_iter().collect();

        let encoding = Encoding::new(ByteArray::ByteArrayStop {
            stop_byte: 0x00,
            block_content_id: 7,
        });

        encoding.encode(&mut core_data_writer, &mut external_data_writers, b"ndls")?;

        assert_eq!(external_data_writers[&7], b"ndls\x00");

        Ok(())
    }

    #[test]
    fn test_encode_byte_array_length() -> io::Result<()> {
        let mut core_data_writer = BitWriter::default();
        let mut external_data_writers: ExternalDataWriters =
            [(21, Vec::new())].into_iter().collect();

        let encoding = Encoding::new(ByteArray::ByteArrayLength {
            len_encoding: Encoding::new(Integer::External {
                block_content_id: 21,
            }),
            value_encoding: Encoding::new(Byte::External {
                block_content_id: 21,
            }),
        });

        encoding.encode(&mut core_data_writer, &mut external_data_writers, &[0x05])?;

        // ITF8 length (1) followed by the value.
        assert_eq!(external_data_writers[&21], [0x01, 0x05]);

        Ok(())
    }
}
