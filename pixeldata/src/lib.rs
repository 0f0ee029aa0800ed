//! Extraction and normalization of DICOM pixel data.
//!
//! This crate takes a parsed data set and produces displayable 8-bit
//! rasters. Native (uncompressed) pixel data is borrowed straight from
//! the source buffer; encapsulated pixel data is de-framed and run
//! through the built-in JPEG Lossless decoder or, for JPEG Baseline,
//! through the `jpeg-decoder` crate.
//!
//! ```no_run
//! # use minidicom_parser::{DataSet, FileMeta};
//! # use minidicom_pixeldata::PixelData;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let bytes: Vec<u8> = vec![];
//! let meta = FileMeta::from_bytes(&bytes)?;
//! let ts = meta.transfer_syntax()?;
//! let dataset = DataSet::parse(&bytes, meta.data_set_start, ts.is_explicit_vr(), ts.endianness())?;
//! let pixel_data = PixelData::from_dataset(&dataset, ts)?;
//! let gray = pixel_data.to_grayscale();
//! #   Ok(())
//! # }
//! ```
pub mod encapsulation;
pub mod error;
pub mod jpeg;

use byteorder::{ByteOrder, LittleEndian};
use minidicom_core::{tags, TransferSyntax};
use minidicom_parser::DataSet;
use snafu::{ensure, OptionExt, ResultExt};
use std::borrow::Cow;

use crate::error::{
    DecodeJpegBaseline, DecodeJpegLossless, InvalidPixelData, PixelDataNotFound,
    UnsupportedTransferSyntax,
};
pub use crate::error::{Error, Result};
pub use crate::jpeg::DecodedImage;

/// Pixel data normalized for display: sample storage plus the geometry
/// and photometric attributes needed to interpret it.
///
/// Native pixel data borrows from the source buffer; decoded frames
/// own their samples.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelData<'a> {
    pub data: Cow<'a, [u8]>,
    pub rows: u16,
    pub columns: u16,
    pub bits_allocated: u16,
    pub bits_stored: u16,
    pub samples_per_pixel: u16,
    pub photometric_interpretation: String,
}

impl<'a> PixelData<'a> {
    /// Locate the pixel data element in a parsed data set and normalize
    /// it according to the transfer syntax: raw data is taken as-is,
    /// encapsulated data is de-framed and its first frame decoded.
    pub fn from_dataset(dataset: &DataSet<'a>, transfer_syntax: TransferSyntax) -> Result<Self> {
        let rows = dataset.get_u16(tags::ROWS).context(InvalidPixelData {
            reason: "missing Rows attribute",
        })?;
        let columns = dataset.get_u16(tags::COLUMNS).context(InvalidPixelData {
            reason: "missing Columns attribute",
        })?;
        let bits_allocated = dataset.get_u16(tags::BITS_ALLOCATED).unwrap_or(16);
        let bits_stored = dataset
            .get_u16(tags::BITS_STORED)
            .unwrap_or(bits_allocated);
        let samples_per_pixel = dataset.get_u16(tags::SAMPLES_PER_PIXEL).unwrap_or(1);
        let photometric_interpretation = dataset
            .get_string(tags::PHOTOMETRIC_INTERPRETATION)
            .unwrap_or_else(|| "MONOCHROME2".to_string());

        let element = dataset.find(tags::PIXEL_DATA).context(PixelDataNotFound)?;
        let value = dataset.value(element);

        if transfer_syntax.is_encapsulated() {
            ensure!(
                matches!(
                    transfer_syntax,
                    TransferSyntax::JPEGBaseline | TransferSyntax::JPEGLossless
                ),
                UnsupportedTransferSyntax {
                    name: transfer_syntax.uid()
                }
            );

            let frames = encapsulation::extract_frames(value)?;
            let frame = *frames.first().context(InvalidPixelData {
                reason: "no frames in encapsulated pixel data",
            })?;
            if frames.len() > 1 {
                tracing::debug!("Decoding frame 0 of {}", frames.len());
            }

            let decoded = match transfer_syntax {
                TransferSyntax::JPEGLossless => {
                    jpeg::decode(frame).context(DecodeJpegLossless)?
                }
                TransferSyntax::JPEGBaseline => decode_baseline_jpeg(frame)?,
                _ => unreachable!(),
            };
            ensure!(
                decoded.channels == 1 || decoded.channels == 3,
                InvalidPixelData {
                    reason: "unsupported decoded channel count"
                }
            );
            if u32::from(rows) != decoded.height || u32::from(columns) != decoded.width {
                tracing::warn!(
                    "Decoded frame is {}x{} but the data set declares {}x{}",
                    decoded.width,
                    decoded.height,
                    columns,
                    rows
                );
            }

            return Ok(PixelData {
                rows: decoded.height as u16,
                columns: decoded.width as u16,
                // decoded frames are always delivered as 8-bit samples
                bits_allocated: 8,
                bits_stored: 8,
                samples_per_pixel: decoded.channels as u16,
                photometric_interpretation,
                data: Cow::Owned(decoded.data),
            });
        }

        ensure!(
            bits_allocated == 8 || bits_allocated == 16,
            InvalidPixelData {
                reason: "BitsAllocated must be 8 or 16"
            }
        );
        ensure!(
            samples_per_pixel == 1 || samples_per_pixel == 3,
            InvalidPixelData {
                reason: "SamplesPerPixel must be 1 or 3"
            }
        );
        ensure!(
            samples_per_pixel == 1 || bits_allocated == 8,
            InvalidPixelData {
                reason: "multi-sample pixel data must be 8-bit"
            }
        );
        let expected = usize::from(rows)
            * usize::from(columns)
            * usize::from(samples_per_pixel)
            * usize::from(bits_allocated / 8);
        ensure!(
            value.len() >= expected,
            InvalidPixelData {
                reason: "pixel data is shorter than the declared geometry"
            }
        );

        Ok(PixelData {
            data: Cow::Borrowed(value),
            rows,
            columns,
            bits_allocated,
            bits_stored,
            samples_per_pixel,
            photometric_interpretation,
        })
    }

    /// Convert to one 8-bit grayscale sample per pixel.
    ///
    /// 16-bit samples are windowed over the observed value range,
    /// color samples collapse through the usual luma weights, and
    /// MONOCHROME1 data is inverted so that larger values are brighter.
    pub fn to_grayscale(&self) -> Vec<u8> {
        let pixel_count = usize::from(self.rows) * usize::from(self.columns);
        let mut gray: Vec<u8> = if self.samples_per_pixel == 3 {
            self.data[..pixel_count * 3]
                .chunks_exact(3)
                .map(|rgb| {
                    let luma = 0.299 * f32::from(rgb[0])
                        + 0.587 * f32::from(rgb[1])
                        + 0.114 * f32::from(rgb[2]);
                    luma.round() as u8
                })
                .collect()
        } else if self.bits_allocated == 16 {
            let samples: Vec<u16> = self.data[..pixel_count * 2]
                .chunks_exact(2)
                .map(LittleEndian::read_u16)
                .collect();
            let min = samples.iter().copied().min().unwrap_or(0);
            let max = samples.iter().copied().max().unwrap_or(0);
            if min == max {
                vec![0u8; pixel_count]
            } else {
                let range = u32::from(max - min);
                samples
                    .iter()
                    .map(|&s| (u32::from(s - min) * 255 / range) as u8)
                    .collect()
            }
        } else {
            self.data[..pixel_count].to_vec()
        };

        if self.photometric_interpretation == "MONOCHROME1" {
            for sample in &mut gray {
                *sample = 255 - *sample;
            }
        }
        gray
    }

    /// Convert to interleaved 8-bit RGB by replicating the grayscale
    /// rendition into all three channels.
    pub fn to_rgb(&self) -> Vec<u8> {
        let gray = self.to_grayscale();
        let mut rgb = Vec::with_capacity(gray.len() * 3);
        for sample in gray {
            rgb.extend_from_slice(&[sample, sample, sample]);
        }
        rgb
    }
}

/// Decode a baseline JPEG frame through the `jpeg-decoder` crate.
pub fn decode_baseline_jpeg(data: &[u8]) -> Result<DecodedImage> {
    let mut decoder = jpeg_decoder::Decoder::new(std::io::Cursor::new(data));
    let pixels = decoder.decode().context(DecodeJpegBaseline)?;
    let info = decoder.info().context(InvalidPixelData {
        reason: "baseline decoder returned no frame info",
    })?;
    let channels = match info.pixel_format {
        jpeg_decoder::PixelFormat::L8 => 1,
        jpeg_decoder::PixelFormat::RGB24 => 3,
        jpeg_decoder::PixelFormat::CMYK32 => 4,
    };
    Ok(DecodedImage {
        data: pixels,
        width: u32::from(info.width),
        height: u32::from(info.height),
        channels,
    })
}
