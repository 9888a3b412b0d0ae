use crate::{container::BlockContentEncoderMap, file_definition::Version};

pub(crate) const DEFAULT_RECORDS_PER_SLICE: usize = 10240;
pub(crate) const DEFAULT_SLICES_PER_CONTAINER: usize = 1;
pub(crate) const DEFAULT_BASES_PER_SLICE: u64 = 5_000_000;

/// Quality score binning applied during record conversion.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Binning {
    /// Quality scores are kept as-is.
    #[default]
    None,
    /// Quality scores are mapped through the Illumina 8-bin table.
    Illumina,
}

#[derive(Clone, Debug)]
pub struct Options {
    pub preserve_read_names: bool,
    pub lossy_read_names: bool,
    pub encode_alignment_start_positions_as_deltas: bool,
    pub version: Version,
    pub block_content_encoder_map: BlockContentEncoderMap,
    pub records_per_slice: usize,
    pub slices_per_container: usize,
    pub bases_per_slice: u64,
    pub embed_reference_sequences: bool,
    pub preserve_aux_order: bool,
    pub preserve_aux_size: bool,
    pub reference_required: bool,
    pub binning: Binning,
    pub use_bzip2: bool,
    pub compression_level: u32,
    pub ignore_checksums: bool,
    /// CRAM 4.0 quality score orientation: `true` = alignment orientation
    /// (QO=1), `false` = original/sequencing orientation (QO=0, quality
    /// scores of reverse-strand reads are stored reversed). Ignored for
    /// CRAM 2.x/3.x.
    pub qs_seq_orient: bool,
}

impl Options {
    /// The RN preservation flag: whether every record keeps its name.
    pub(crate) fn records_have_names(&self) -> bool {
        self.preserve_read_names && !self.lossy_read_names
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            preserve_read_names: true,
            lossy_read_names: false,
            encode_alignment_start_positions_as_deltas: true,
            version: Version::default(),
            block_content_encoder_map: BlockContentEncoderMap::default(),
            records_per_slice: DEFAULT_RECORDS_PER_SLICE,
            slices_per_container: DEFAULT_SLICES_PER_CONTAINER,
            bases_per_slice: DEFAULT_BASES_PER_SLICE,
            embed_reference_sequences: false,
            preserve_aux_order: false,
            preserve_aux_size: false,
            reference_required: true,
            binning: Binning::default(),
            use_bzip2: false,
            compression_level: 6,
            ignore_checksums: false,
            qs_seq_orient: true,
        }
    }
}
