use noodles_core::Position;

use crate::container::compression_header::preservation_map::substitution_matrix::Base;

/// A reference-relative edit event attached to a record.
///
/// Positions are 1-based offsets into the read. The record writer emits the
/// delta from the previous feature's position.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Feature {
    /// A base substitution (`X`), encoded via the substitution matrix.
    Substitution {
        position: Position,
        reference_base: Base,
        read_base: Base,
    },
    /// A multi-base insertion (`I`).
    Insertion { position: Position, bases: Vec<u8> },
    /// A single-base insertion (`i`).
    InsertBase { position: Position, base: u8 },
    /// A deletion from the reference (`D`).
    Deletion { position: Position, len: usize },
    /// A soft clip (`S`).
    SoftClip { position: Position, bases: Vec<u8> },
    /// A hard clip (`H`).
    HardClip { position: Position, len: usize },
    /// A reference skip (`N`).
    ReferenceSkip { position: Position, len: usize },
    /// Padding (`P`).
    Padding { position: Position, len: usize },
    /// A verbatim base with its quality score (`B`).
    ReadBase {
        position: Position,
        base: u8,
        quality_score: u8,
    },
    /// A run of verbatim bases (`b`, CRAM 3.0+).
    Bases { position: Position, bases: Vec<u8> },
    /// A single quality score (`Q`).
    QualityScore {
        position: Position,
        quality_score: u8,
    },
}

impl Feature {
    /// Returns the in-read position of the feature.
    pub fn position(&self) -> Position {
        match self {
            Self::Substitution { position, .. }
            | Self::Insertion { position, .. }
            | Self::InsertBase { position, .. }
            | Self::Deletion { position, .. }
            | Self::SoftClip { position, .. }
            | Self::HardClip { position, .. }
            | Self::ReferenceSkip { position, .. }
            | Self::Padding { position, .. }
            | Self::ReadBase { position, .. }
            | Self::Bases { position, .. }
            | Self::QualityScore { position, .. } => *position,
        }
    }

    /// Returns the feature code written to the FC data series.
    pub fn code(&self) -> u8 {
        match self {
            Self::Substitution { .. } => b'X',
            Self::Insertion { .. } => b'I',
            Self::InsertBase { .. } => b'i',
            Self::Deletion { .. } => b'D',
            Self::SoftClip { .. } => b'S',
            Self::HardClip { .. } => b'H',
            Self::ReferenceSkip { .. } => b'N',
            Self::Padding { .. } => b'P',
            Self::ReadBase { .. } => b'B',
            Self::Bases { .. } => b'b',
            Self::QualityScore { .. } => b'Q',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code() -> Result<(), Box<dyn std::error::Error>> {
        let position = Position::try_from(1)?;

        assert_eq!(
            Feature::Substitution {
                position,
                reference_base: Base::A,
                read_base: Base::C
            }
            .code(),
            b'X'
        );
        assert_eq!(
            Feature::Insertion {
                position,
                bases: b"AC".to_vec()
            }
            .code(),
            b'I'
        );
        assert_eq!(Feature::InsertBase { position, base: b'A' }.code(), b'i');
        assert_eq!(Feature::Deletion { position, len: 1 }.code(), b'D');
        assert_eq!(
            Feature::SoftClip {
                position,
                bases: b"A".to_vec()
            }
            .code(),
            b'S'
        );
        assert_eq!(Feature::HardClip { position, len: 1 }.code(), b'H');
        assert_eq!(Feature::ReferenceSkip { position, len: 1 }.code(), b'N');
        assert_eq!(Feature::Padding { position, len: 1 }.code(), b'P');
        assert_eq!(
            Feature::ReadBase {
                position,
                base: b'A',
                quality_score: 45
            }
            .code(),
            b'B'
        );
        assert_eq!(
            Feature::Bases {
                position,
                bases: b"AC".to_vec()
            }
            .code(),
            b'b'
        );
        assert_eq!(
            Feature::QualityScore {
                position,
                quality_score: 45
            }
            .code(),
            b'Q'
        );

        Ok(())
    }
}
