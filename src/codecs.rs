//! Block compressors.

pub(crate) mod bzip2;
pub(crate) mod gzip;

/// A general-purpose block compressor.
///
/// This names a concrete method and level for one block. Method *selection*
/// (trying several candidates and keeping the smallest output) happens at
/// slice assembly; see [`crate::container::BlockContentEncoderMap`] for
/// per-block overrides.
#[derive(Clone, Debug)]
pub enum Encoder {
    /// gzip at the given compression level.
    Gzip(flate2::Compression),
    /// bzip2 at the given compression level.
    Bzip2(::bzip2::Compression),
}
