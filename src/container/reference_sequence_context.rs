use std::cmp;

use noodles_core::Position;

/// The reference context of a container or slice.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReferenceSequenceContext {
    /// All records map to a single reference sequence.
    Some(Context),
    /// All records are unmapped.
    #[default]
    None,
    /// Records map to more than one reference sequence.
    Many,
}

impl ReferenceSequenceContext {
    /// Creates a single-reference context.
    pub fn some(
        reference_sequence_id: usize,
        alignment_start: Position,
        alignment_end: Position,
    ) -> Self {
        Self::Some(Context::new(
            reference_sequence_id,
            alignment_start,
            alignment_end,
        ))
    }

    /// Folds another record's reference coordinates into the context.
    pub fn update(
        &mut self,
        reference_sequence_id: Option<usize>,
        alignment_start: Option<Position>,
        alignment_end: Option<Position>,
    ) {
        *self = match (*self, reference_sequence_id, alignment_start, alignment_end) {
            (Self::Some(context), Some(id), Some(start), Some(end))
                if context.reference_sequence_id() == id =>
            {
                Self::some(
                    id,
                    cmp::min(context.alignment_start(), start),
                    cmp::max(context.alignment_end(), end),
                )
            }
            (Self::None, None, ..) => Self::None,
            _ => Self::Many,
        };
    }
}

/// A single-reference context: the reference sequence and the span covered
/// by all records.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Context {
    reference_sequence_id: usize,
    alignment_start: Position,
    alignment_end: Position,
}

impl Context {
    fn new(reference_sequence_id: usize, alignment_start: Position, alignment_end: Position) -> Self {
        Self {
            reference_sequence_id,
            alignment_start,
            alignment_end,
        }
    }

    /// Returns the reference sequence ID.
    pub fn reference_sequence_id(&self) -> usize {
        self.reference_sequence_id
    }

    /// Returns the minimum alignment start over all records.
    pub fn alignment_start(&self) -> Position {
        self.alignment_start
    }

    /// Returns the maximum alignment end over all records.
    pub fn alignment_end(&self) -> Position {
        self.alignment_end
    }

    /// Returns the number of reference bases covered.
    pub fn alignment_span(&self) -> usize {
        usize::from(self.alignment_end) - usize::from(self.alignment_start) + 1
    }
}
