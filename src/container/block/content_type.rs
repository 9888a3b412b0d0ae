/// A block content type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    /// SAM header.
    FileHeader,
    /// Compression header.
    CompressionHeader,
    /// Slice header.
    SliceHeader,
    /// External data.
    ExternalData,
    /// Core data.
    CoreData,
}
