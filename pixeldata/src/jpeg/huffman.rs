//! Canonical Huffman tables for the entropy-coded segment.
use super::error::{EndOfStream, InvalidHuffmanCode, Result};
use minidicom_encoding::BitReader;
use snafu::{OptionExt, ResultExt};

/// A decoding table built from a DHT segment: the ordered symbol
/// values plus, for each code length, the range of codes of that
/// length and the offset into the value list.
///
/// A length with no codes is marked with a `max_code` of -1.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    values: Vec<u8>,
    min_code: [i32; 17],
    max_code: [i32; 17],
    val_offset: [i32; 17],
}

impl HuffmanTable {
    /// Build a decoding table from the 16 per-length code counts and
    /// the symbol values in code order. The caller is responsible for
    /// checking that `values` holds exactly the declared number of
    /// symbols, and no more than 256.
    pub fn build(code_counts: &[u8; 16], values: &[u8]) -> Self {
        let mut min_code = [0i32; 17];
        let mut max_code = [-1i32; 17];
        let mut val_offset = [0i32; 17];

        let mut code = 0i32;
        let mut val_index = 0i32;
        for length in 1..=16 {
            let count = i32::from(code_counts[length - 1]);
            if count > 0 {
                min_code[length] = code;
                val_offset[length] = val_index - code;
                val_index += count;
                code += count;
                max_code[length] = code - 1;
            }
            code <<= 1;
        }

        HuffmanTable {
            values: values.to_vec(),
            min_code,
            max_code,
            val_offset,
        }
    }

    /// Decode one symbol from the bit stream, extending the candidate
    /// code one bit at a time until it falls within a populated length.
    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<u8> {
        let mut code = 0i32;
        for length in 1..=16 {
            code = (code << 1) | i32::from(reader.read_bits(1).context(EndOfStream)?);
            if self.max_code[length] >= 0
                && code >= self.min_code[length]
                && code <= self.max_code[length]
            {
                let index = (code + self.val_offset[length]) as usize;
                return self.values.get(index).copied().context(InvalidHuffmanCode);
            }
        }
        InvalidHuffmanCode.fail()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(entries: &[(usize, u8)]) -> [u8; 16] {
        let mut out = [0u8; 16];
        for &(length, count) in entries {
            out[length - 1] = count;
        }
        out
    }

    #[test]
    fn build_single_length_table() {
        // two 1-bit codes: 0 -> 0x00, 1 -> 0x01
        let table = HuffmanTable::build(&counts(&[(1, 2)]), &[0x00, 0x01]);
        let mut reader = BitReader::new(&[0b0100_0000]);
        assert_eq!(table.decode(&mut reader).unwrap(), 0x00);
        assert_eq!(table.decode(&mut reader).unwrap(), 0x01);
    }

    #[test]
    fn build_mixed_length_table() {
        // codes: 00, 01, 10 (2 bits) and 110 (3 bits)
        let table = HuffmanTable::build(&counts(&[(2, 3), (3, 1)]), &[0x00, 0x01, 0x02, 0x03]);
        // 00 01 10 110, padded with a trailing 1
        let mut reader = BitReader::new(&[0b0001_1011, 0b0100_0000]);
        assert_eq!(table.decode(&mut reader).unwrap(), 0x00);
        assert_eq!(table.decode(&mut reader).unwrap(), 0x01);
        assert_eq!(table.decode(&mut reader).unwrap(), 0x02);
        assert_eq!(table.decode(&mut reader).unwrap(), 0x03);
    }

    #[test]
    fn unassigned_code_is_rejected() {
        let table = HuffmanTable::build(&counts(&[(2, 3), (3, 1)]), &[0x00, 0x01, 0x02, 0x03]);
        // a run of 1 bits never lands on an assigned code
        // (0xFF data bytes are stuffed in the entropy stream)
        let ones = [0xFF, 0x00, 0xFF, 0x00, 0xFF, 0x00];
        let mut reader = BitReader::new(&ones);
        assert!(matches!(
            table.decode(&mut reader),
            Err(crate::jpeg::error::Error::InvalidHuffmanCode { .. })
        ));
    }
}
