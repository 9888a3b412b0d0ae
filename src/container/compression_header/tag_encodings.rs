use indexmap::IndexMap;

use super::{Encoding, encoding::codec::ByteArray};
use crate::container::block;

/// Tag encodings, keyed by 24-bit tag block content ID.
///
/// Insertion order is preserved so serialization and block layout are
/// deterministic.
pub(crate) type TagEncodings = IndexMap<block::ContentId, Encoding<ByteArray>>;
