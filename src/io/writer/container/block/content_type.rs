use std::io::{self, Write};

use crate::container::block::ContentType;

pub(super) fn write_content_type<W>(writer: &mut W, content_type: ContentType) -> io::Result<()>
where
    W: Write,
{
    let n: u8 = match content_type {
        ContentType::FileHeader => 0,
        ContentType::CompressionHeader => 1,
        ContentType::SliceHeader => 2,
        ContentType::ExternalData => 4,
        ContentType::CoreData => 5,
    };

    writer.write_all(&[n])
}
