/// A block compression method.
///
/// This is the registry of methods defined by the CRAM format. The writer
/// currently emits `None`, `Gzip`, and `Bzip2`; the remaining IDs are kept
/// for completeness of the wire model.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CompressionMethod {
    /// Uncompressed.
    #[default]
    None,
    /// gzip.
    Gzip,
    /// bzip2.
    Bzip2,
    /// LZMA.
    Lzma,
    /// rANS (4x8).
    Rans4x8,
    /// rANS (Nx16) (CRAM 3.1).
    RansNx16,
    /// Adaptive arithmetic coding (CRAM 3.1).
    AdaptiveArithmeticCoding,
    /// fqzcomp (CRAM 3.1).
    Fqzcomp,
    /// Name tokenizer (CRAM 3.1).
    NameTokenizer,
}
