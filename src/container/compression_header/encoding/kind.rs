/// The wire identity of a codec.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    External,
    Huffman,
    ByteArrayLength,
    ByteArrayStop,
    Beta,
    Subexp,
    Gamma,
    // CRAM 4.0 codecs
    VarintUnsigned,
    VarintSigned,
}
