mod convert;
mod feature;

pub use self::feature::Feature;

use bstr::BString;
use noodles_core::Position;
use noodles_sam::{
    self as sam,
    alignment::{
        record::{MappingQuality, data::field::Tag},
        record_buf::data::field::Value,
    },
};

use crate::record::{Flags, MateFlags};

/// A writer-side CRAM record.
///
/// Mate linkage is expressed as an index delta (`mate_distance`) into the
/// slice's record list, never as a reference to the mate itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub bam_flags: sam::alignment::record::Flags,
    pub cram_flags: Flags,
    pub reference_sequence_id: Option<usize>,
    pub read_length: usize,
    pub alignment_start: Option<Position>,
    pub read_group_id: Option<usize>,
    pub name: Option<BString>,
    pub mate_flags: MateFlags,
    pub mate_reference_sequence_id: Option<usize>,
    pub mate_alignment_start: Option<Position>,
    pub template_length: i64,
    pub mate_distance: Option<usize>,
    pub data: Vec<(Tag, Value)>,
    pub features: Vec<Feature>,
    pub mapping_quality: Option<MappingQuality>,
    pub sequence: Vec<u8>,
    pub quality_scores: Vec<u8>,
}

impl Record {
    /// Returns the 1-based inclusive alignment end.
    ///
    /// For mapped records this is the alignment start plus the number of
    /// reference bases consumed, minus one. Unmapped records cover a single
    /// position.
    pub fn alignment_end(&self) -> Option<Position> {
        self.alignment_start.and_then(|start| {
            let end = usize::from(start) + self.alignment_span() - 1;
            Position::new(end)
        })
    }

    fn alignment_span(&self) -> usize {
        if self.bam_flags.is_unmapped() {
            return 1;
        }

        let mut span = self.read_length as i64;

        for feature in &self.features {
            match feature {
                Feature::Insertion { bases, .. } => span -= bases.len() as i64,
                Feature::InsertBase { .. } => span -= 1,
                Feature::Deletion { len, .. } => span += *len as i64,
                Feature::ReferenceSkip { len, .. } => span += *len as i64,
                Feature::SoftClip { bases, .. } => span -= bases.len() as i64,
                _ => {}
            }
        }

        if span < 1 { 1 } else { span as usize }
    }
}

impl Default for Record {
    fn default() -> Self {
        Self {
            bam_flags: sam::alignment::record::Flags::UNMAPPED,
            cram_flags: Flags::default(),
            reference_sequence_id: None,
            read_length: 0,
            alignment_start: None,
            read_group_id: None,
            name: None,
            mate_flags: MateFlags::default(),
            mate_reference_sequence_id: None,
            mate_alignment_start: None,
            template_length: 0,
            mate_distance: None,
            data: Vec::new(),
            features: Vec::new(),
            mapping_quality: None,
            sequence: Vec::new(),
            quality_scores: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_end() -> Result<(), Box<dyn std::error::Error>> {
        let mut record = Record {
            bam_flags: sam::alignment::record::Flags::empty(),
            read_length: 8,
            alignment_start: Position::new(1),
            ..Default::default()
        };

        assert_eq!(record.alignment_end(), Position::new(8));

        // A deletion lengthens the reference span.
        record.features = vec![Feature::Deletion {
            position: Position::try_from(4)?,
            len: 2,
        }];
        assert_eq!(record.alignment_end(), Position::new(10));

        // A soft clip shortens it.
        record.features = vec![Feature::SoftClip {
            position: Position::try_from(1)?,
            bases: b"ACG".to_vec(),
        }];
        assert_eq!(record.alignment_end(), Position::new(5));

        Ok(())
    }

    #[test]
    fn test_alignment_end_with_unmapped_record() {
        let record = Record {
            alignment_start: Position::new(13),
            ..Default::default()
        };

        assert_eq!(record.alignment_end(), Position::new(13));
    }
}
