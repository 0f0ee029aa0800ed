//! An endianness-aware cursor over an immutable byte slice.
//!
//! All DICOM structures handled by this library live in memory, so the
//! reader works on a borrowed slice and hands out borrowed sub-slices
//! instead of copying value data.
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use byteordered::Endianness;
use snafu::{ensure, Backtrace, Snafu};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display(
        "Unexpected end of data at position {} ({} bytes needed, {} available)",
        position,
        needed,
        available
    ))]
    UnexpectedEndOfData {
        position: usize,
        needed: usize,
        available: usize,
        backtrace: Backtrace,
    },
    #[snafu(display("Position {} is out of bounds (data length is {})", position, len))]
    PositionOutOfBounds {
        position: usize,
        len: usize,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A typed reading cursor over a byte slice, with a fixed endianness
/// for multi-byte reads.
///
/// Reads never copy: [`read_bytes`](ByteReader::read_bytes) returns a
/// view into the underlying slice, bound to its lifetime.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    position: usize,
    endianness: Endianness,
}

impl<'a> ByteReader<'a> {
    /// Create a new reader over the given slice, starting at position 0.
    pub fn new(data: &'a [u8], endianness: Endianness) -> Self {
        ByteReader {
            data,
            position: 0,
            endianness,
        }
    }

    /// The byte order applied to multi-byte reads.
    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// The current absolute position in the slice.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move the cursor to an absolute position.
    /// Any position in `[0, len]` is admitted, including moving backwards.
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        ensure!(
            position <= self.data.len(),
            PositionOutOfBounds {
                position,
                len: self.data.len()
            }
        );
        self.position = position;
        Ok(())
    }

    /// The number of bytes left between the cursor and the end.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Whether the cursor is at the end of the slice.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.position == self.data.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        ensure!(
            n <= self.remaining(),
            UnexpectedEndOfData {
                position: self.position,
                needed: n,
                available: self.remaining()
            }
        );
        let out = &self.data[self.position..self.position + n];
        self.position += n;
        Ok(out)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a 16-bit unsigned integer in the reader's byte order.
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(match self.endianness {
            Endianness::Little => LittleEndian::read_u16(bytes),
            Endianness::Big => BigEndian::read_u16(bytes),
        })
    }

    /// Read a 32-bit unsigned integer in the reader's byte order.
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(match self.endianness {
            Endianness::Little => LittleEndian::read_u32(bytes),
            Endianness::Big => BigEndian::read_u32(bytes),
        })
    }

    /// Read `n` bytes as a borrowed view into the underlying slice.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    /// Advance the cursor by `n` bytes without reading them.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_reads_little_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut reader = ByteReader::new(&data, Endianness::Little);
        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.read_u16().unwrap(), 0x0302);
        assert_eq!(reader.read_u32().unwrap(), 0x07060504);
        assert!(reader.is_at_end());
    }

    #[test]
    fn typed_reads_big_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        let mut reader = ByteReader::new(&data, Endianness::Big);
        assert_eq!(reader.read_u16().unwrap(), 0x0102);
        assert_eq!(reader.read_u32().unwrap(), 0x03040506);
    }

    #[test]
    fn read_bytes_borrows() {
        let data = [0xAA, 0xBB, 0xCC, 0xDD];
        let mut reader = ByteReader::new(&data, Endianness::Little);
        reader.skip(1).unwrap();
        let view = reader.read_bytes(2).unwrap();
        assert_eq!(view, &[0xBB, 0xCC]);
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn reads_past_the_end_fail() {
        let data = [0x01, 0x02];
        let mut reader = ByteReader::new(&data, Endianness::Little);
        assert!(matches!(
            reader.read_u32(),
            Err(Error::UnexpectedEndOfData { .. })
        ));
        // the failed read must not move the cursor
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_u16().unwrap(), 0x0201);
    }

    #[test]
    fn set_position_bounds() {
        let data = [0u8; 8];
        let mut reader = ByteReader::new(&data, Endianness::Little);
        reader.set_position(8).unwrap();
        assert!(reader.is_at_end());
        reader.set_position(2).unwrap();
        assert_eq!(reader.remaining(), 6);
        assert!(matches!(
            reader.set_position(9),
            Err(Error::PositionOutOfBounds { .. })
        ));
    }
}
