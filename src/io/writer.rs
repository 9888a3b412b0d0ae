//! CRAM writer.

mod builder;
mod collections;
pub(crate) mod container;
mod header;
pub(crate) mod num;
mod options;
mod record;

pub use self::{builder::Builder, options::Binning};
pub(crate) use self::{
    options::Options,
    record::{Feature, Record},
};

use std::{
    io::{self, Write},
    mem,
};

use noodles_fasta as fasta;
use noodles_sam as sam;

use self::container::write_container;
use crate::FileDefinition;

/// A CRAM writer.
///
/// Records are buffered and encoded a container at a time: a container is
/// flushed when it reaches its record capacity or base-count threshold, and
/// a final EOF container is written by [`Self::try_finish`].
///
/// # Examples
///
/// ```
/// use crampack as cram;
/// use noodles_sam as sam;
///
/// let mut writer = cram::io::Writer::new(Vec::new());
///
/// let header = sam::Header::default();
/// writer.write_header(&header)?;
///
/// let record = sam::Record::default();
/// writer.write_alignment_record(&header, &record)?;
///
/// writer.try_finish(&header)?;
/// # Ok::<_, std::io::Error>(())
/// ```
pub struct Writer<W> {
    inner: W,
    reference_sequence_repository: fasta::Repository,
    options: Options,
    records: Vec<Record>,
    record_counter: u64,
    buffered_base_count: u64,
}

impl<W> Writer<W> {
    /// Returns a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Returns a mutable reference to the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Unwraps and returns the underlying writer.
    ///
    /// Any buffered records are dropped; call [`Self::try_finish`] first.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W> Writer<W>
where
    W: Write,
{
    /// Creates a writer with default options.
    ///
    /// # Examples
    ///
    /// ```
    /// use crampack as cram;
    /// let writer = cram::io::Writer::new(Vec::new());
    /// ```
    pub fn new(inner: W) -> Self {
        Builder::default().build_from_writer(inner)
    }

    /// Writes the file definition and the SAM header container.
    ///
    /// Reference sequences missing an M5 field get one computed from the
    /// reference sequence repository.
    pub fn write_header(&mut self, header: &sam::Header) -> io::Result<()> {
        let file_definition = FileDefinition::from(self.options.version);

        header::write_header(
            &mut self.inner,
            &self.reference_sequence_repository,
            &file_definition,
            header,
            self.options.reference_required,
        )
    }

    /// Converts and buffers an alignment record.
    ///
    /// When the buffered records fill a container, the container is encoded
    /// and written.
    pub fn write_alignment_record(
        &mut self,
        header: &sam::Header,
        record: &dyn sam::alignment::Record,
    ) -> io::Result<()> {
        let record = self.convert_record(header, record)?;

        self.buffered_base_count += record.read_length as u64;
        self.records.push(record);

        let records_per_container = self
            .options
            .records_per_slice
            .saturating_mul(self.options.slices_per_container);

        let bases_per_container = self
            .options
            .bases_per_slice
            .saturating_mul(self.options.slices_per_container as u64);

        if self.records.len() >= records_per_container
            || self.buffered_base_count >= bases_per_container
        {
            self.flush(header)?;
        }

        Ok(())
    }

    /// Flushes any buffered records and writes the EOF container.
    pub fn try_finish(&mut self, header: &sam::Header) -> io::Result<()> {
        self.flush(header)?;
        container::write_eof_container(&mut self.inner, self.options.version)
    }

    fn convert_record(
        &self,
        header: &sam::Header,
        record: &dyn sam::alignment::Record,
    ) -> io::Result<Record> {
        let reference_sequence = self.get_reference_sequence(header, record)?;

        Record::try_from_alignment_record_with_options(
            header,
            record,
            reference_sequence.as_ref().map(|sequence| sequence.as_ref()),
            &self.options,
        )
    }

    fn get_reference_sequence(
        &self,
        header: &sam::Header,
        record: &dyn sam::alignment::Record,
    ) -> io::Result<Option<fasta::record::Sequence>> {
        if !self.options.reference_required || record.flags()?.is_unmapped() {
            return Ok(None);
        }

        let reference_sequence_id = record
            .reference_sequence_id(header)
            .transpose()?
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "mapped record is missing a reference sequence ID",
                )
            })?;

        let reference_sequence_name = header
            .reference_sequences()
            .get_index(reference_sequence_id)
            .map(|(name, _)| name)
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "invalid reference sequence ID")
            })?;

        let sequence = self
            .reference_sequence_repository
            .get(reference_sequence_name)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("missing reference sequence: {reference_sequence_name}"),
                )
            })??;

        Ok(Some((*sequence).clone()))
    }

    fn flush(&mut self, header: &sam::Header) -> io::Result<()> {
        if self.records.is_empty() {
            return Ok(());
        }

        let mut records = mem::take(&mut self.records);
        self.buffered_base_count = 0;

        write_container(
            &mut self.inner,
            &self.reference_sequence_repository,
            &self.options,
            header,
            self.record_counter,
            &mut records,
        )?;

        self.record_counter += records.len() as u64;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_empty_file() -> io::Result<()> {
        let mut writer = Writer::new(Vec::new());

        let header = sam::Header::default();
        writer.write_header(&header)?;
        writer.try_finish(&header)?;

        let buf = writer.into_inner();

        // file definition: magic + version + file ID
        assert_eq!(&buf[..4], b"CRAM");
        assert_eq!(&buf[4..6], &[3, 0]);

        // EOF container
        assert_eq!(&buf[buf.len() - container::EOF_V3.len()..], container::EOF_V3);

        Ok(())
    }
}
