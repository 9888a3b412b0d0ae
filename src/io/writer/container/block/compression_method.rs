use std::io::{self, Write};

use crate::container::block::CompressionMethod;

pub(super) fn write_compression_method<W>(
    writer: &mut W,
    compression_method: CompressionMethod,
) -> io::Result<()>
where
    W: Write,
{
    let n: u8 = match compression_method {
        CompressionMethod::None => 0,
        CompressionMethod::Gzip => 1,
        CompressionMethod::Bzip2 => 2,
        CompressionMethod::Lzma => 3,
        CompressionMethod::Rans4x8 => 4,
        CompressionMethod::RansNx16 => 5,
        CompressionMethod::AdaptiveArithmeticCoding => 6,
        CompressionMethod::Fqzcomp => 7,
        CompressionMethod::NameTokenizer => 8,
    };

    writer.write_all(&[n])
}
