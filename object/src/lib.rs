//! High-level access to DICOM files held in memory.
//!
//! [`DicomFile::open`] parses the file meta group, resolves the
//! transfer syntax, and indexes the main data set in one call. On top
//! of that sit the operations a host environment typically wants from
//! a viewer backend: metadata as JSON, image dimensions, and a decoded
//! RGB frame. All of them take a plain byte slice and report failures
//! through a single error type whose `Display` rendering is suitable
//! for handing back across a host boundary.
pub mod metadata;

use minidicom_core::{tags, TransferSyntax};
use minidicom_parser::{DataSet, FileMeta};
use minidicom_pixeldata::PixelData;
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};

pub use crate::metadata::Metadata;
pub use minidicom_parser::is_dicom_bytes;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Could not parse DICOM content: {}", source))]
    ParseFile {
        #[snafu(backtrace)]
        source: minidicom_parser::Error,
    },

    #[snafu(display("Could not decode pixel data: {}", source))]
    DecodePixelData {
        #[snafu(backtrace)]
        source: minidicom_pixeldata::Error,
    },

    #[snafu(display("Invalid pixel data: missing {} attribute", name))]
    MissingImageAttribute {
        name: &'static str,
        backtrace: Backtrace,
    },

    #[snafu(display("Could not serialize metadata to JSON"))]
    SerializeMetadata { source: serde_json::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A parsed DICOM file: owned file meta information plus a non-owning
/// index of the main data set. The source buffer must outlive this
/// value.
#[derive(Debug)]
pub struct DicomFile<'a> {
    meta: FileMeta,
    transfer_syntax: TransferSyntax,
    dataset: DataSet<'a>,
}

impl<'a> DicomFile<'a> {
    /// Parse a DICOM P10 buffer: preamble, file meta group, and the
    /// main data set under the declared transfer syntax.
    pub fn open(data: &'a [u8]) -> Result<Self> {
        let meta = FileMeta::from_bytes(data).context(ParseFile)?;
        let transfer_syntax = meta.transfer_syntax().context(ParseFile)?;
        tracing::debug!(
            "Parsing data set with transfer syntax `{}`",
            transfer_syntax
        );
        let dataset = DataSet::parse(
            data,
            meta.data_set_start,
            transfer_syntax.is_explicit_vr(),
            transfer_syntax.endianness(),
        )
        .context(ParseFile)?;
        Ok(DicomFile {
            meta,
            transfer_syntax,
            dataset,
        })
    }

    /// The file meta information table.
    pub fn meta(&self) -> &FileMeta {
        &self.meta
    }

    /// The transfer syntax governing the main data set.
    pub fn transfer_syntax(&self) -> TransferSyntax {
        self.transfer_syntax
    }

    /// The indexed main data set.
    pub fn dataset(&self) -> &DataSet<'a> {
        &self.dataset
    }

    /// Extract and normalize this file's pixel data.
    pub fn pixel_data(&self) -> Result<PixelData<'a>> {
        PixelData::from_dataset(&self.dataset, self.transfer_syntax).context(DecodePixelData)
    }
}

/// A decoded frame as interleaved 8-bit RGB samples.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Parse a DICOM buffer and project its clinical metadata to a JSON
/// string.
pub fn extract_metadata(data: &[u8]) -> Result<String> {
    let file = DicomFile::open(data)?;
    let metadata = Metadata::from_dataset(file.dataset());
    serde_json::to_string(&metadata).context(SerializeMetadata)
}

/// Parse a DICOM buffer and report the image dimensions as
/// `(width, height)`, without touching the pixel data itself.
pub fn get_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    let file = DicomFile::open(data)?;
    let columns = file
        .dataset()
        .get_u16(tags::COLUMNS)
        .context(MissingImageAttribute { name: "Columns" })?;
    let rows = file
        .dataset()
        .get_u16(tags::ROWS)
        .context(MissingImageAttribute { name: "Rows" })?;
    Ok((u32::from(columns), u32::from(rows)))
}

/// Parse a DICOM buffer, decode its pixel data, and return a
/// display-ready RGB frame.
pub fn decode_to_rgb(data: &[u8]) -> Result<RgbFrame> {
    let file = DicomFile::open(data)?;
    let pixel_data = file.pixel_data()?;
    let rgb = pixel_data.to_rgb();
    Ok(RgbFrame {
        data: rgb,
        width: u32::from(pixel_data.columns),
        height: u32::from(pixel_data.rows),
    })
}
