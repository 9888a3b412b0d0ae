use std::{
    fs::File,
    io::{self, Write},
    path::Path,
};

use noodles_fasta as fasta;

use super::{Binning, Options, Writer};
use crate::{container::BlockContentEncoderMap, file_definition::Version};

/// A CRAM writer builder.
#[derive(Default)]
pub struct Builder {
    reference_sequence_repository: fasta::Repository,
    options: Options,
}

impl Builder {
    /// Sets the reference sequence repository.
    ///
    /// # Examples
    ///
    /// ```
    /// use crampack::io::writer::Builder;
    /// use noodles_fasta as fasta;
    ///
    /// let repository = fasta::Repository::default();
    /// let builder = Builder::default().set_reference_sequence_repository(repository);
    /// ```
    pub fn set_reference_sequence_repository(
        mut self,
        reference_sequence_repository: fasta::Repository,
    ) -> Self {
        self.reference_sequence_repository = reference_sequence_repository;
        self
    }

    /// Sets the CRAM version for the output file.
    ///
    /// The default is 3.0.
    ///
    /// # Examples
    ///
    /// ```
    /// use crampack::{file_definition::Version, io::writer::Builder};
    /// let builder = Builder::default().set_version(Version::new(4, 0));
    /// ```
    pub fn set_version(mut self, version: Version) -> Self {
        self.options.version = version;
        self
    }

    /// Sets whether to preserve read names.
    ///
    /// If `false`, all read names are discarded and readers generate them.
    ///
    /// The default is `true`.
    pub fn preserve_read_names(mut self, value: bool) -> Self {
        self.options.preserve_read_names = value;
        self
    }

    /// Sets whether to drop read names of templates that are complete
    /// within a slice.
    ///
    /// Names of incomplete templates and detached records are kept.
    ///
    /// The default is `false`.
    pub fn lossy_read_names(mut self, value: bool) -> Self {
        self.options.lossy_read_names = value;
        self
    }

    /// Sets whether to encode alignment start positions as deltas.
    ///
    /// If `false`, or when the input turns out to be position-unsorted,
    /// alignment starts are written with their actual values.
    ///
    /// The default is `true`.
    pub fn encode_alignment_start_positions_as_deltas(mut self, value: bool) -> Self {
        self.options.encode_alignment_start_positions_as_deltas = value;
        self
    }

    /// Sets the block content-encoder map.
    ///
    /// # Examples
    ///
    /// ```
    /// use crampack::{container::BlockContentEncoderMap, io::writer::Builder};
    ///
    /// let block_content_encoder_map = BlockContentEncoderMap::default();
    /// let builder = Builder::default().set_block_content_encoder_map(block_content_encoder_map);
    /// ```
    pub fn set_block_content_encoder_map(mut self, map: BlockContentEncoderMap) -> Self {
        self.options.block_content_encoder_map = map;
        self
    }

    /// Sets the number of records per slice.
    ///
    /// The default is 10240.
    ///
    /// # Panics
    ///
    /// Panics if `records_per_slice` is 0.
    pub fn set_records_per_slice(mut self, records_per_slice: usize) -> Self {
        assert!(records_per_slice > 0, "records_per_slice must be > 0");
        self.options.records_per_slice = records_per_slice;
        self
    }

    /// Sets the number of slices per container.
    ///
    /// The default is 1.
    ///
    /// # Panics
    ///
    /// Panics if `slices_per_container` is 0.
    pub fn set_slices_per_container(mut self, slices_per_container: usize) -> Self {
        assert!(slices_per_container > 0, "slices_per_container must be > 0");
        self.options.slices_per_container = slices_per_container;
        self
    }

    /// Sets the maximum number of read bases per slice.
    ///
    /// A container is flushed early when its buffered bases reach this
    /// threshold, keeping slices of long reads bounded.
    pub fn set_bases_per_slice(mut self, bases_per_slice: u64) -> Self {
        self.options.bases_per_slice = bases_per_slice;
        self
    }

    /// Sets whether to embed reference sequences in slices.
    ///
    /// When enabled, reference subsequences are stored directly in the CRAM
    /// file, removing the need for an external reference during decoding.
    ///
    /// The default is `false`.
    pub fn embed_reference_sequences(mut self, value: bool) -> Self {
        self.options.embed_reference_sequences = value;
        self
    }

    /// Sets whether RG, MD, and NM fields are kept verbatim.
    ///
    /// By default RG is re-derived from the read group index and MD/NM are
    /// regenerable from the reference, so all three are omitted from the
    /// tag data.
    pub fn preserve_aux_order(mut self, value: bool) -> Self {
        self.options.preserve_aux_order = value;
        self
    }

    /// Sets whether integer field values keep their declared width.
    ///
    /// By default integers are narrowed to the smallest type that preserves
    /// the value.
    pub fn preserve_aux_size(mut self, value: bool) -> Self {
        self.options.preserve_aux_size = value;
        self
    }

    /// Sets whether an external reference sequence is required.
    ///
    /// When `false`, aligned bases are stored verbatim instead of as
    /// reference differences, and reference digests are skipped.
    ///
    /// The default is `true`.
    pub fn set_reference_required(mut self, reference_required: bool) -> Self {
        self.options.reference_required = reference_required;
        self
    }

    /// Sets the quality score binning mode.
    ///
    /// The default is [`Binning::None`].
    pub fn set_binning(mut self, binning: Binning) -> Self {
        self.options.binning = binning;
        self
    }

    /// Enables bzip2 as a candidate block compression method.
    ///
    /// The default is `false`.
    pub fn use_bzip2(mut self, value: bool) -> Self {
        self.options.use_bzip2 = value;
        self
    }

    /// Sets the compression level (0-9).
    ///
    /// Higher levels widen the per-block method sets and raise the gzip
    /// level. The default is 6.
    pub fn set_compression_level(mut self, compression_level: u32) -> Self {
        self.options.compression_level = compression_level.min(9);
        self
    }

    /// Sets whether to skip the BD/SD slice checksums.
    ///
    /// The default is `false`.
    pub fn ignore_checksums(mut self, value: bool) -> Self {
        self.options.ignore_checksums = value;
        self
    }

    /// Sets the CRAM 4.0 quality score orientation flag.
    ///
    /// When `true` (the default), quality scores are stored in alignment
    /// orientation. When `false`, quality scores are stored in original
    /// sequencing orientation, and the reader reverses them for
    /// reverse-strand reads.
    ///
    /// This option is ignored for CRAM versions before 4.0.
    pub fn set_qs_seq_orient(mut self, qs_seq_orient: bool) -> Self {
        self.options.qs_seq_orient = qs_seq_orient;
        self
    }

    /// Builds a CRAM writer from a path.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use crampack::io::writer::Builder;
    /// let writer = Builder::default().build_from_path("out.cram")?;
    /// # Ok::<_, std::io::Error>(())
    /// ```
    pub fn build_from_path<P>(self, dst: P) -> io::Result<Writer<File>>
    where
        P: AsRef<Path>,
    {
        File::create(dst).map(|file| self.build_from_writer(file))
    }

    /// Builds a CRAM writer from a writer.
    ///
    /// # Examples
    ///
    /// ```
    /// use crampack::io::writer::Builder;
    /// let writer = Builder::default().build_from_writer(Vec::new());
    /// ```
    pub fn build_from_writer<W>(self, writer: W) -> Writer<W>
    where
        W: Write,
    {
        let records_per_container = self
            .options
            .records_per_slice
            .checked_mul(self.options.slices_per_container)
            .expect("records_per_container overflow");

        Writer {
            inner: writer,
            reference_sequence_repository: self.reference_sequence_repository,
            options: self.options,
            records: Vec::with_capacity(records_per_container),
            record_counter: 0,
            buffered_base_count: 0,
        }
    }
}
