//! Low-level readers shared by the parsing and pixel data crates:
//! an endianness-aware byte cursor over an in-memory buffer, and a
//! bit-level reader for JPEG entropy-coded segments.
pub mod bitread;
pub mod reader;

pub use crate::bitread::BitReader;
pub use crate::reader::ByteReader;
pub use byteordered::Endianness;
