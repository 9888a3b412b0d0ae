use std::io::{self, Write};

pub(super) fn write_file_id<W>(writer: &mut W, file_id: &[u8; 20]) -> io::Result<()>
where
    W: Write,
{
    writer.write_all(file_id)
}
