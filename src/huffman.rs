use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap},
    io,
};

use crate::io::BitWriter;

type CodeBook = HashMap<i32, (i32, u32)>;

#[derive(Clone, Debug)]
pub struct CanonicalHuffmanEncoder {
    code_book: CodeBook,
}

impl CanonicalHuffmanEncoder {
    pub fn new(alphabet: &[i32], bit_lens: &[u32]) -> Self {
        let code_book = build_canonical_code_book(alphabet, bit_lens);
        Self { code_book }
    }

    pub fn encode(&self, writer: &mut BitWriter, value: i32) -> io::Result<()> {
        let &(code, bit_len) = self.code_book.get(&value).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("symbol not in code book: {value}"),
            )
        })?;

        writer.write_u32(code as u32, bit_len as usize)
    }
}

/// Derives canonical code lengths for a symbol histogram.
///
/// Symbols are returned sorted ascending with their bit lengths. A
/// single-symbol alphabet gets a zero-length code: the value is implied by
/// the code book and no bits are emitted.
pub fn generate_canonical_code_lengths(frequencies: &[(i32, u64)]) -> (Vec<i32>, Vec<u32>) {
    assert!(!frequencies.is_empty());

    if frequencies.len() == 1 {
        return (vec![frequencies[0].0], vec![0]);
    }

    // Standard Huffman tree construction over (count, node) pairs. Ties
    // break on the smallest symbol to keep the result deterministic.
    let mut symbols: Vec<_> = frequencies.to_vec();
    symbols.sort_unstable();

    // Node i holds the leaf symbols beneath it; merging two nodes deepens
    // all of their leaves by one bit.
    let mut nodes: Vec<Vec<usize>> = (0..symbols.len()).map(|i| vec![i]).collect();

    let mut depths = vec![0u32; symbols.len()];

    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = symbols
        .iter()
        .enumerate()
        .map(|(i, &(_, count))| Reverse((count, i)))
        .collect();

    while heap.len() > 1 {
        let Reverse((count_a, a)) = heap.pop().expect("heap cannot be empty");
        let Reverse((count_b, b)) = heap.pop().expect("heap cannot be empty");

        let mut leaves = Vec::with_capacity(nodes[a].len() + nodes[b].len());
        leaves.extend_from_slice(&nodes[a]);
        leaves.extend_from_slice(&nodes[b]);

        for &leaf in &leaves {
            depths[leaf] += 1;
        }

        let i = nodes.len();
        nodes.push(leaves);

        heap.push(Reverse((count_a + count_b, i)));
    }

    let alphabet: Vec<_> = symbols.iter().map(|&(symbol, _)| symbol).collect();

    (alphabet, depths)
}

fn build_canonical_code_book(alphabet: &[i32], bit_lens: &[u32]) -> CodeBook {
    let sorted_alphabet = {
        let mut pairs: Vec<_> = alphabet.iter().zip(bit_lens.iter()).collect();
        pairs.sort_by_key(|&(symbol, bit_len)| (bit_len, symbol));
        pairs
    };

    let mut code_book = CodeBook::with_capacity(sorted_alphabet.len());

    let mut code = 0;
    let mut prev_bit_len = *sorted_alphabet[0].1;

    for (&symbol, &bit_len) in sorted_alphabet {
        if bit_len > prev_bit_len {
            code <<= bit_len - prev_bit_len;
        }

        code_book.insert(symbol, (code, bit_len));

        code += 1;
        prev_bit_len = bit_len;
    }

    code_book
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() -> io::Result<()> {
        let symbols = [0x4e, 0x44, 0x4c];
        let bit_lens = [1, 2, 2];
        let encoder = CanonicalHuffmanEncoder::new(&symbols, &bit_lens);

        let mut writer = BitWriter::default();
        encoder.encode(&mut writer, 0x4e)?;
        encoder.encode(&mut writer, 0x44)?;
        encoder.encode(&mut writer, 0x4c)?;
        encoder.encode(&mut writer, 0x4e)?;

        let data = writer.finish()?;
        assert_eq!(data, [0b01011000]);

        Ok(())
    }

    #[test]
    fn test_encode_unknown_symbol() {
        let encoder = CanonicalHuffmanEncoder::new(&[1, 2], &[1, 1]);
        let mut writer = BitWriter::default();
        assert!(encoder.encode(&mut writer, 3).is_err());
    }

    #[test]
    fn test_single_symbol_encode() -> io::Result<()> {
        let symbols = [42];
        let bit_lens = [0];
        let encoder = CanonicalHuffmanEncoder::new(&symbols, &bit_lens);

        let mut writer = BitWriter::default();
        encoder.encode(&mut writer, 42)?;
        encoder.encode(&mut writer, 42)?;

        let data = writer.finish()?;
        assert!(data.is_empty());

        Ok(())
    }

    #[test]
    fn test_build_canonical_code_book() {
        let symbols = [65, 66, 67, 68, 69, 70];
        let bit_lens = [1, 3, 3, 3, 4, 4];

        let code_book = build_canonical_code_book(&symbols, &bit_lens);

        assert_eq!(code_book.len(), 6);

        assert_eq!(code_book[&65], (0b0, 1));
        assert_eq!(code_book[&66], (0b100, 3));
        assert_eq!(code_book[&67], (0b101, 3));
        assert_eq!(code_book[&68], (0b110, 3));
        assert_eq!(code_book[&69], (0b1110, 4));
        assert_eq!(code_book[&70], (0b1111, 4));
    }

    #[test]
    fn test_generate_canonical_code_lengths() {
        let (alphabet, bit_lens) = generate_canonical_code_lengths(&[(7, 1)]);
        assert_eq!(alphabet, [7]);
        assert_eq!(bit_lens, [0]);

        let (alphabet, bit_lens) = generate_canonical_code_lengths(&[(1, 1), (2, 1)]);
        assert_eq!(alphabet, [1, 2]);
        assert_eq!(bit_lens, [1, 1]);

        // Skewed alphabet: the most frequent symbol gets the shortest code.
        let (alphabet, bit_lens) = generate_canonical_code_lengths(&[(1, 8), (2, 1), (3, 1)]);
        assert_eq!(alphabet, [1, 2, 3]);
        assert_eq!(bit_lens, [1, 2, 2]);
    }

    #[test]
    fn test_generated_lengths_satisfy_kraft() {
        let frequencies = [(0, 100), (1, 50), (2, 25), (3, 12), (4, 6), (5, 1)];
        let (_, bit_lens) = generate_canonical_code_lengths(&frequencies);

        let kraft: f64 = bit_lens.iter().map(|&len| 0.5f64.powi(len as i32)).sum();
        assert!(kraft <= 1.0 + f64::EPSILON);
    }
}
