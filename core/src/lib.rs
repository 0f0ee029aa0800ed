//! This crate contains the base data structures for reading DICOM content:
//! the attribute tag, the value length, the value representation, and the
//! transfer syntax. Everything here is plain data with no I/O attached;
//! the parsing crates build on these types.
pub mod header;
pub mod tags;
pub mod transfer_syntax;

pub use crate::header::{Header, Length, Tag, VR};
pub use crate::transfer_syntax::TransferSyntax;
