//! The error type shared by the file meta and data set parsers.
use minidicom_core::{Length, Tag};
use snafu::{Backtrace, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
#[non_exhaustive]
pub enum Error {
    #[snafu(display(
        "File is too short for a DICOM preamble ({} bytes, 132 needed)",
        len
    ))]
    InvalidPreamble { len: usize, backtrace: Backtrace },

    #[snafu(display("Content is missing the `DICM` prefix at offset 128"))]
    InvalidPrefix { backtrace: Backtrace },

    #[snafu(display("Missing required file meta element `{}`", name))]
    InvalidFileMeta {
        name: &'static str,
        backtrace: Backtrace,
    },

    #[snafu(display("Could not read data element content"))]
    UnexpectedEndOfData {
        #[snafu(backtrace)]
        source: minidicom_encoding::reader::Error,
    },

    #[snafu(display(
        "Invalid value representation {:?} for element tagged {}",
        bytes,
        tag
    ))]
    InvalidVr {
        tag: Tag,
        bytes: [u8; 2],
        backtrace: Backtrace,
    },

    #[snafu(display(
        "Invalid length {} or sequence structure of element tagged {}",
        len,
        tag
    ))]
    InvalidLength {
        tag: Tag,
        len: Length,
        backtrace: Backtrace,
    },

    #[snafu(display("Unsupported transfer syntax `{}`", uid))]
    UnsupportedTransferSyntax { uid: String, backtrace: Backtrace },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
