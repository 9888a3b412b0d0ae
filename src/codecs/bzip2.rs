use std::io::{self, Write};

use bzip2::{Compression, write::BzEncoder};

pub fn encode(compression_level: Compression, src: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = BzEncoder::new(Vec::new(), compression_level);
    encoder.write_all(src)?;
    encoder.finish()
}
