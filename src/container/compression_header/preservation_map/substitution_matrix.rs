//! CRAM substitution matrix.

mod base;

pub use self::base::Base;

/// A substitution matrix (SM).
///
/// Each row is keyed by a reference base and holds the four other bases
/// ordered so that the most frequent substitution gets the smallest code.
/// Substitution features then carry a 2-bit index into the row instead of
/// the read base itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct SubstitutionMatrix {
    substitutions: [[Base; 4]; 5],
}

impl SubstitutionMatrix {
    pub(crate) fn new(substitutions: [[Base; 4]; 5]) -> Self {
        Self { substitutions }
    }

    /// Returns the read base for a (reference base, code) pair.
    pub fn get(&self, reference_base: Base, code: u8) -> Base {
        let i = reference_base as usize;
        let j = usize::from(code & 0x03);
        self.substitutions[i][j]
    }

    /// Returns the code for a (reference base, read base) pair.
    ///
    /// This is `None` when `read_base` is not in the reference base's row,
    /// which can only happen when the two bases are equal.
    pub fn find(&self, reference_base: Base, read_base: Base) -> Option<u8> {
        let row = &self.substitutions[reference_base as usize];
        row.iter()
            .position(|&base| base == read_base)
            .map(|i| i as u8)
    }

    pub(crate) fn rows(&self) -> &[[Base; 4]; 5] {
        &self.substitutions
    }
}

impl Default for SubstitutionMatrix {
    fn default() -> Self {
        Self {
            substitutions: [
                [Base::C, Base::G, Base::T, Base::N],
                [Base::A, Base::G, Base::T, Base::N],
                [Base::A, Base::C, Base::T, Base::N],
                [Base::A, Base::C, Base::G, Base::N],
                [Base::A, Base::C, Base::G, Base::T],
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get() {
        let matrix = SubstitutionMatrix::default();
        assert_eq!(matrix.get(Base::A, 0), Base::C);
        assert_eq!(matrix.get(Base::C, 1), Base::G);
        assert_eq!(matrix.get(Base::T, 3), Base::N);
        assert_eq!(matrix.get(Base::N, 0), Base::A);
    }

    #[test]
    fn test_find() {
        let matrix = SubstitutionMatrix::default();
        assert_eq!(matrix.find(Base::A, Base::C), Some(0));
        assert_eq!(matrix.find(Base::G, Base::C), Some(1));
        assert_eq!(matrix.find(Base::N, Base::T), Some(3));
        assert_eq!(matrix.find(Base::A, Base::A), None);
    }

    #[test]
    fn test_find_is_inverse_of_get() {
        let matrix = SubstitutionMatrix::default();

        for &reference_base in &[Base::A, Base::C, Base::G, Base::T, Base::N] {
            for code in 0..4 {
                let read_base = matrix.get(reference_base, code);
                assert_eq!(matrix.find(reference_base, read_base), Some(code));
            }
        }
    }
}
