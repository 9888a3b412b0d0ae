//! CRAM container slice.

use super::{ReferenceSequenceContext, block};

/// A slice header.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Header {
    pub(crate) reference_sequence_context: ReferenceSequenceContext,
    pub(crate) record_count: usize,
    pub(crate) record_counter: u64,
    pub(crate) block_count: usize,
    pub(crate) block_content_ids: Vec<block::ContentId>,
    pub(crate) embedded_reference_bases_block_content_id: Option<block::ContentId>,
    pub(crate) reference_md5: Option<[u8; 16]>,
    pub(crate) optional_tags: Vec<u8>,
}

impl Header {
    /// Returns the reference context of the slice.
    pub fn reference_sequence_context(&self) -> ReferenceSequenceContext {
        self.reference_sequence_context
    }

    /// Returns the number of records in the slice.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Returns the cumulative record count at the start of this slice.
    pub fn record_counter(&self) -> u64 {
        self.record_counter
    }

    /// Returns the number of blocks in the slice, including the core data
    /// block.
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Returns the content IDs of the slice's blocks.
    pub fn block_content_ids(&self) -> &[block::ContentId] {
        &self.block_content_ids
    }

    /// Returns the content ID of the embedded reference bases block, if any.
    pub fn embedded_reference_bases_block_content_id(&self) -> Option<block::ContentId> {
        self.embedded_reference_bases_block_content_id
    }

    /// Returns the MD5 digest of the reference span covered by the slice.
    pub fn reference_md5(&self) -> Option<&[u8; 16]> {
        self.reference_md5.as_ref()
    }

    /// Returns the serialized optional tags (e.g. BD/SD checksums).
    pub fn optional_tags(&self) -> &[u8] {
        &self.optional_tags
    }
}
