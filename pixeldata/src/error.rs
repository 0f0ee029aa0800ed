//! Error type for pixel data extraction and normalization.
use snafu::{Backtrace, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Pixel data element (7FE0,0010) is missing"))]
    PixelDataNotFound { backtrace: Backtrace },

    #[snafu(display("Invalid pixel data: {}", reason))]
    InvalidPixelData {
        reason: &'static str,
        backtrace: Backtrace,
    },

    #[snafu(display("Unsupported transfer syntax {}", name))]
    UnsupportedTransferSyntax {
        name: &'static str,
        backtrace: Backtrace,
    },

    #[snafu(display("Unexpected end of encapsulated pixel data"))]
    UnexpectedEndOfData {
        #[snafu(backtrace)]
        source: minidicom_encoding::reader::Error,
    },

    #[snafu(display("Could not decode JPEG lossless frame"))]
    DecodeJpegLossless {
        #[snafu(backtrace)]
        source: crate::jpeg::Error,
    },

    #[snafu(display("Could not decode baseline JPEG frame"))]
    DecodeJpegBaseline { source: jpeg_decoder::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
