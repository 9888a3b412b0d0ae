//! CRAM container block.

mod compression_method;
mod content_type;

pub use self::{compression_method::CompressionMethod, content_type::ContentType};

/// A block content ID.
///
/// External data blocks are identified by a content ID: data series use IDs
/// 1 through 28, and auxiliary tags use the 24-bit key
/// `(tag[0] << 16) | (tag[1] << 8) | type`.
pub type ContentId = i32;
