//! Parsing of DICOM file meta information and main data sets from
//! in-memory buffers.
//!
//! The parser is non-owning: a [`DataSet`] is an index of element
//! headers and value byte ranges into the buffer given to it, which
//! must outlive the data set and every value view derived from it.
pub mod dataset;
pub mod error;
pub mod meta;

pub use crate::dataset::{DataElement, DataSet};
pub use crate::error::{Error, Result};
pub use crate::meta::FileMeta;

/// The expected total size of a preamble plus `DICM` prefix, in bytes.
pub const PREAMBLE_AND_PREFIX_LEN: usize = 132;

/// Returns whether the given bytes start with a DICOM P10 preamble,
/// by checking for the presence of the `DICM` prefix at offset 128.
pub fn is_dicom_bytes(data: &[u8]) -> bool {
    data.len() >= PREAMBLE_AND_PREFIX_LEN && &data[128..132] == b"DICM"
}

#[cfg(test)]
mod tests {
    use super::is_dicom_bytes;

    #[test]
    fn prefix_sniffing() {
        let mut data = vec![0u8; 132];
        assert!(!is_dicom_bytes(&data));
        data[128..132].copy_from_slice(b"DICM");
        assert!(is_dicom_bytes(&data));
        assert!(!is_dicom_bytes(&data[..131]));
    }
}
