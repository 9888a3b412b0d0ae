use std::{cmp::Reverse, io::{self, Write}};

use crate::{
    container::compression_header::preservation_map::{
        SubstitutionMatrix, substitution_matrix::Base,
    },
    io::writer::{Feature, Record},
};

const BASES: [Base; 5] = [Base::A, Base::C, Base::G, Base::T, Base::N];

/// Builds a substitution matrix from the observed substitution features.
///
/// Each row orders the four non-reference bases by descending substitution
/// frequency, ties in canonical base order, so the most common substitution
/// gets code 0.
pub(super) fn build_substitution_matrix(records: &[Record]) -> SubstitutionMatrix {
    let mut frequencies = [[0u64; 5]; 5];

    for record in records {
        for feature in &record.features {
            if let Feature::Substitution {
                reference_base,
                read_base,
                ..
            } = feature
            {
                frequencies[*reference_base as usize][*read_base as usize] += 1;
            }
        }
    }

    let mut rows = [[Base::N; 4]; 5];

    for (i, &reference_base) in BASES.iter().enumerate() {
        let mut alternatives: Vec<_> = BASES
            .iter()
            .copied()
            .filter(|&base| base != reference_base)
            .collect();

        // Stable sort keeps canonical order on ties.
        alternatives.sort_by_key(|&base| Reverse(frequencies[i][base as usize]));

        for (j, base) in alternatives.into_iter().enumerate() {
            rows[i][j] = base;
        }
    }

    SubstitutionMatrix::new(rows)
}

/// Writes the matrix as five bytes, one per reference base.
///
/// Each byte packs the codes of the non-reference bases in canonical order,
/// two bits per base, e.g. for reference base A the pairs are (C, G, T, N)
/// from the high bits down.
pub(super) fn write_substitution_matrix<W>(
    writer: &mut W,
    substitution_matrix: &SubstitutionMatrix,
) -> io::Result<()>
where
    W: Write,
{
    let mut buf = [0u8; 5];

    for (i, &reference_base) in BASES.iter().enumerate() {
        let row = &substitution_matrix.rows()[i];
        let mut b = 0;

        for alternative in BASES.iter().copied().filter(|&base| base != reference_base) {
            let code = row
                .iter()
                .position(|&base| base == alternative)
                .expect("row is a permutation of the non-reference bases") as u8;

            b = (b << 2) | code;
        }

        buf[i] = b;
    }

    writer.write_all(&buf)
}
