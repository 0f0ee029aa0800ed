//! Error type for the JPEG Lossless decoder.
use snafu::{Backtrace, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Invalid JPEG marker {:#06X}", marker))]
    InvalidMarker { marker: u16, backtrace: Backtrace },

    #[snafu(display("Unsupported JPEG format (SOF{})", process))]
    UnsupportedFormat { process: u8, backtrace: Backtrace },

    #[snafu(display("Arithmetic-coded JPEG is not supported"))]
    ArithmeticCodingNotSupported { backtrace: Backtrace },

    #[snafu(display("Invalid frame header: {}", reason))]
    InvalidFrameHeader {
        reason: &'static str,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid scan header: {}", reason))]
    InvalidScanHeader {
        reason: &'static str,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid Huffman table definition: {}", reason))]
    InvalidHuffmanTable {
        reason: &'static str,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid Huffman code in entropy-coded segment"))]
    InvalidHuffmanCode { backtrace: Backtrace },

    #[snafu(display("Invalid magnitude category {}", category))]
    InvalidCategory { category: u16, backtrace: Backtrace },

    #[snafu(display("Unexpected EOI marker before any scan data"))]
    UnexpectedEndOfImage { backtrace: Backtrace },

    #[snafu(display("Unexpected end of data in JPEG stream"))]
    UnexpectedEndOfData {
        #[snafu(backtrace)]
        source: minidicom_encoding::reader::Error,
    },

    #[snafu(display("Entropy-coded segment ended prematurely"))]
    EndOfStream {
        #[snafu(backtrace)]
        source: minidicom_encoding::bitread::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
