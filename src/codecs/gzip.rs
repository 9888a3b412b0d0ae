use std::io::{self, Write};

use flate2::{Compression, write::GzEncoder};

pub fn encode(compression_level: Compression, src: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), compression_level);
    encoder.write_all(src)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() -> io::Result<()> {
        let data = b"ACGTACGTACGT";
        let buf = encode(Compression::default(), data)?;
        // gzip magic
        assert_eq!(&buf[..2], &[0x1f, 0x8b]);
        Ok(())
    }
}
