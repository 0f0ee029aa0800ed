//! A JPEG Lossless (SOF3) decoder.
//!
//! This is the predictive, Huffman-coded JPEG variant used by the
//! DICOM JPEG Lossless transfer syntax: no DCT and no quantization,
//! just per-sample prediction from causal neighbours plus an
//! entropy-coded difference. The decoder covers the full path from
//! marker scanning to an 8-bit raster, downscaling high-precision
//! samples through a min/max window.
pub mod error;
pub mod huffman;

use self::error::*;
use self::huffman::HuffmanTable;
use minidicom_encoding::{BitReader, ByteReader, Endianness};
use smallvec::SmallVec;
use snafu::{ensure, OptionExt, ResultExt};

pub use self::error::{Error, Result};

/// A decoded raster: 8-bit samples interleaved by component.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

/// Decode a complete JPEG Lossless (SOF3) stream into an 8-bit raster.
pub fn decode(data: &[u8]) -> Result<DecodedImage> {
    Decoder::new(data).decode()
}

#[derive(Debug, Clone, Copy)]
struct Component {
    id: u8,
    /// index of the DC Huffman table selected by the scan header
    dc_table: usize,
}

struct Decoder<'a> {
    reader: ByteReader<'a>,
    precision: u8,
    height: u16,
    width: u16,
    components: SmallVec<[Component; 4]>,
    dc_tables: [Option<HuffmanTable>; 4],
    restart_interval: u16,
    predictor: u8,
    point_transform: u8,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8]) -> Self {
        Decoder {
            // JPEG segment fields are big endian
            reader: ByteReader::new(data, Endianness::Big),
            precision: 0,
            height: 0,
            width: 0,
            components: SmallVec::new(),
            dc_tables: [None, None, None, None],
            restart_interval: 0,
            predictor: 0,
            point_transform: 0,
        }
    }

    fn decode(mut self) -> Result<DecodedImage> {
        let soi = self.reader.read_u16().context(UnexpectedEndOfData)?;
        ensure!(soi == 0xFFD8, InvalidMarker { marker: soi });

        loop {
            let marker = self.next_marker()?;
            match marker {
                0xC0..=0xCF if marker != 0xC4 && marker != 0xC8 && marker != 0xCC => {
                    let process = marker - 0xC0;
                    ensure!(
                        matches!(marker, 0xC3 | 0xC7 | 0xCB | 0xCF),
                        UnsupportedFormat { process }
                    );
                    ensure!(
                        !(marker >= 0xC9 && marker % 2 == 1),
                        ArithmeticCodingNotSupported
                    );
                    self.parse_sof()?;
                }
                0xC4 => self.parse_dht()?,
                0xDD => self.parse_dri()?,
                0xDA => {
                    self.parse_sos()?;
                    return self.decode_scan();
                }
                0xD9 => return UnexpectedEndOfImage.fail(),
                // standalone markers carry no length field
                0xD0..=0xD8 | 0x01 => {}
                _ => {
                    let length = self.reader.read_u16().context(UnexpectedEndOfData)?;
                    ensure!(
                        length >= 2,
                        InvalidMarker {
                            marker: u16::from(marker)
                        }
                    );
                    tracing::debug!("Skipping JPEG segment {:#04X} ({} bytes)", marker, length);
                    self.reader
                        .skip(usize::from(length) - 2)
                        .context(UnexpectedEndOfData)?;
                }
            }
        }
    }

    /// Advance to the next marker code, tolerating 0xFF fill bytes.
    fn next_marker(&mut self) -> Result<u8> {
        let byte = self.reader.read_u8().context(UnexpectedEndOfData)?;
        ensure!(
            byte == 0xFF,
            InvalidMarker {
                marker: u16::from(byte)
            }
        );
        let mut code = self.reader.read_u8().context(UnexpectedEndOfData)?;
        while code == 0xFF {
            code = self.reader.read_u8().context(UnexpectedEndOfData)?;
        }
        ensure!(code != 0x00, InvalidMarker { marker: 0xFF00u16 });
        Ok(code)
    }

    fn parse_sof(&mut self) -> Result<()> {
        let length = self.reader.read_u16().context(UnexpectedEndOfData)?;
        self.precision = self.reader.read_u8().context(UnexpectedEndOfData)?;
        self.height = self.reader.read_u16().context(UnexpectedEndOfData)?;
        self.width = self.reader.read_u16().context(UnexpectedEndOfData)?;
        let component_count = self.reader.read_u8().context(UnexpectedEndOfData)?;

        ensure!(
            (1..=4).contains(&component_count),
            InvalidFrameHeader {
                reason: "component count must be 1 to 4"
            }
        );
        ensure!(
            usize::from(length) == 8 + 3 * usize::from(component_count),
            InvalidFrameHeader {
                reason: "inconsistent segment length"
            }
        );
        ensure!(
            self.width > 0 && self.height > 0,
            InvalidFrameHeader {
                reason: "frame has no pixels"
            }
        );
        ensure!(
            (2..=16).contains(&self.precision),
            InvalidFrameHeader {
                reason: "sample precision out of range"
            }
        );

        self.components.clear();
        for _ in 0..component_count {
            let id = self.reader.read_u8().context(UnexpectedEndOfData)?;
            // sampling factors and the quantization table id are
            // irrelevant to lossless decoding
            let _sampling = self.reader.read_u8().context(UnexpectedEndOfData)?;
            let _quant_table = self.reader.read_u8().context(UnexpectedEndOfData)?;
            self.components.push(Component { id, dc_table: 0 });
        }
        Ok(())
    }

    fn parse_dht(&mut self) -> Result<()> {
        let length = self.reader.read_u16().context(UnexpectedEndOfData)?;
        ensure!(
            length >= 2,
            InvalidHuffmanTable {
                reason: "segment too short"
            }
        );
        let mut remaining = usize::from(length) - 2;
        while remaining > 0 {
            ensure!(
                remaining >= 17,
                InvalidHuffmanTable {
                    reason: "truncated table definition"
                }
            );
            let info = self.reader.read_u8().context(UnexpectedEndOfData)?;
            let class = info >> 4;
            let id = usize::from(info & 0x0F);
            ensure!(
                class <= 1,
                InvalidHuffmanTable {
                    reason: "table class must be 0 or 1"
                }
            );
            ensure!(
                id <= 3,
                InvalidHuffmanTable {
                    reason: "table id must be 0 to 3"
                }
            );

            let counts_bytes = self.reader.read_bytes(16).context(UnexpectedEndOfData)?;
            let mut code_counts = [0u8; 16];
            code_counts.copy_from_slice(counts_bytes);
            let total: usize = code_counts.iter().map(|&c| usize::from(c)).sum();
            ensure!(
                total <= 256,
                InvalidHuffmanTable {
                    reason: "more than 256 codes"
                }
            );
            ensure!(
                remaining >= 17 + total,
                InvalidHuffmanTable {
                    reason: "truncated value list"
                }
            );
            let values = self.reader.read_bytes(total).context(UnexpectedEndOfData)?;

            if class == 0 {
                self.dc_tables[id] = Some(HuffmanTable::build(&code_counts, values));
            } else {
                // lossless scans never reference AC tables
                tracing::debug!("Ignoring AC Huffman table {} in lossless stream", id);
            }
            remaining -= 17 + total;
        }
        Ok(())
    }

    fn parse_dri(&mut self) -> Result<()> {
        let length = self.reader.read_u16().context(UnexpectedEndOfData)?;
        ensure!(length >= 4, InvalidMarker { marker: 0xFFDDu16 });
        self.restart_interval = self.reader.read_u16().context(UnexpectedEndOfData)?;
        self.reader
            .skip(usize::from(length) - 4)
            .context(UnexpectedEndOfData)?;
        Ok(())
    }

    fn parse_sos(&mut self) -> Result<()> {
        ensure!(
            !self.components.is_empty(),
            InvalidScanHeader {
                reason: "scan header before frame header"
            }
        );
        let _length = self.reader.read_u16().context(UnexpectedEndOfData)?;
        let scan_components = self.reader.read_u8().context(UnexpectedEndOfData)?;
        ensure!(
            usize::from(scan_components) == self.components.len(),
            InvalidScanHeader {
                reason: "scan component count does not match frame"
            }
        );

        for _ in 0..scan_components {
            let selector = self.reader.read_u8().context(UnexpectedEndOfData)?;
            let tables = self.reader.read_u8().context(UnexpectedEndOfData)?;
            let dc_table = usize::from(tables >> 4);
            ensure!(
                dc_table <= 3,
                InvalidScanHeader {
                    reason: "DC table selector out of range"
                }
            );
            let component = self
                .components
                .iter_mut()
                .find(|c| c.id == selector)
                .context(InvalidScanHeader {
                    reason: "unknown component selector",
                })?;
            component.dc_table = dc_table;
        }

        self.predictor = self.reader.read_u8().context(UnexpectedEndOfData)?;
        ensure!(
            self.predictor <= 7,
            InvalidScanHeader {
                reason: "predictor selector out of range"
            }
        );
        let _spectral_end = self.reader.read_u8().context(UnexpectedEndOfData)?;
        let ah_al = self.reader.read_u8().context(UnexpectedEndOfData)?;
        self.point_transform = ah_al & 0x0F;
        Ok(())
    }

    fn decode_scan(mut self) -> Result<DecodedImage> {
        let width = usize::from(self.width);
        let height = usize::from(self.height);
        let component_count = self.components.len();

        let tables: SmallVec<[&HuffmanTable; 4]> = {
            let mut tables = SmallVec::new();
            for component in &self.components {
                tables.push(self.dc_tables[component.dc_table].as_ref().context(
                    InvalidHuffmanTable {
                        reason: "scan references an undefined table",
                    },
                )?);
            }
            tables
        };

        let segment = self
            .reader
            .read_bytes(self.reader.remaining())
            .context(UnexpectedEndOfData)?;
        let mut bits = BitReader::new(segment);

        let initial = initial_prediction(self.precision, self.point_transform);

        let mut samples = vec![0i32; width * height * component_count];
        let row_stride = width * component_count;
        // an MCU here is one pixel position across all components
        let mut mcus_since_restart = 0u32;

        for y in 0..height {
            for x in 0..width {
                if self.restart_interval > 0
                    && mcus_since_restart == u32::from(self.restart_interval)
                {
                    bits.align_to_byte();
                    // the refill path may have swallowed the marker
                    // already, so only consume one if it is still there
                    if bits.peek_byte() == Some(0xFF) {
                        bits.skip_bytes(2);
                    }
                    mcus_since_restart = 0;
                }

                for (c, table) in tables.iter().enumerate() {
                    let category = table.decode(&mut bits)?;
                    let diff = decode_value(&mut bits, category)?;

                    let index = (y * width + x) * component_count + c;
                    let prediction = if x == 0 && y == 0 {
                        initial
                    } else if y == 0 {
                        samples[index - component_count]
                    } else if x == 0 {
                        samples[index - row_stride]
                    } else {
                        predict(
                            self.predictor,
                            samples[index - component_count],
                            samples[index - row_stride],
                            samples[index - row_stride - component_count],
                        )
                    };
                    samples[index] = prediction.wrapping_add(diff);
                }
                mcus_since_restart += 1;
            }
        }

        drop(tables);
        Ok(self.into_image(samples))
    }

    /// Map the reconstructed samples down to 8 bits. Nominal 8-bit
    /// frames are clamped; anything wider is windowed over the
    /// observed sample range.
    fn into_image(self, samples: Vec<i32>) -> DecodedImage {
        let data = if self.precision <= 8 {
            samples
                .iter()
                .map(|&s| s.max(0).min(255) as u8)
                .collect()
        } else {
            let min = samples.iter().copied().min().unwrap_or(0);
            let max = samples.iter().copied().max().unwrap_or(0);
            if min == max {
                vec![0u8; samples.len()]
            } else {
                let range = i64::from(max) - i64::from(min);
                samples
                    .iter()
                    .map(|&s| {
                        let scaled = (i64::from(s) - i64::from(min)) * 255 / range;
                        scaled.max(0).min(255) as u8
                    })
                    .collect()
            }
        };

        DecodedImage {
            data,
            width: u32::from(self.width),
            height: u32::from(self.height),
            channels: self.components.len() as u32,
        }
    }
}

/// Reconstruct a difference value from its magnitude category and the
/// following extension bits, as defined by the JPEG DC coefficient
/// coding model.
fn decode_value(bits: &mut BitReader<'_>, category: u8) -> Result<i32> {
    if category == 0 {
        return Ok(0);
    }
    ensure!(
        category <= 16,
        InvalidCategory {
            category: u16::from(category)
        }
    );
    let raw = i32::from(bits.read_bits(category).context(EndOfStream)?);
    if raw >= 1 << (category - 1) {
        Ok(raw)
    } else {
        Ok(raw - (1 << category) + 1)
    }
}

/// The prediction used for the very first sample, 2^(P - Pt - 1),
/// or 0 in the degenerate case where the point transform eats the
/// whole sample precision.
fn initial_prediction(precision: u8, point_transform: u8) -> i32 {
    if precision > point_transform {
        1i32 << (precision - point_transform - 1)
    } else {
        0
    }
}

/// Apply one of the seven causal predictors to the left, above, and
/// above-left neighbours. Selector 0 (no prediction) yields 0.
fn predict(selector: u8, ra: i32, rb: i32, rc: i32) -> i32 {
    match selector {
        1 => ra,
        2 => rb,
        3 => rc,
        4 => ra + rb - rc,
        5 => ra + ((rb - rc) >> 1),
        6 => rb + ((ra - rc) >> 1),
        7 => (ra + rb) >> 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(marker: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0xFF, marker];
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    /// A DHT payload defining DC table 0 with 2-bit codes 00, 01, 10
    /// for the categories 0, 1, 2.
    fn dc_table_payload() -> Vec<u8> {
        let mut payload = vec![0x00];
        let mut counts = [0u8; 16];
        counts[1] = 3;
        payload.extend_from_slice(&counts);
        payload.extend_from_slice(&[0, 1, 2]);
        payload
    }

    fn sof3_payload(precision: u8, height: u16, width: u16) -> Vec<u8> {
        let mut payload = vec![precision];
        payload.extend_from_slice(&height.to_be_bytes());
        payload.extend_from_slice(&width.to_be_bytes());
        payload.push(1); // one component
        payload.extend_from_slice(&[1, 0x11, 0]);
        payload
    }

    fn sos_payload(predictor: u8) -> Vec<u8> {
        vec![1, 1, 0x00, predictor, 0, 0x00]
    }

    /// 2x2, 8-bit, predictor 1; pixels 128, 130, 127, 130.
    fn tiny_lossless_stream() -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        data.extend(segment(0xC4, &dc_table_payload()));
        data.extend(segment(0xC3, &sof3_payload(8, 2, 2)));
        data.extend(segment(0xDA, &sos_payload(1)));
        // diffs 0, +2, -1, +3 against an initial value of 128:
        // 00 | 10 10 | 01 0 | 10 11, padded with 1s
        data.extend_from_slice(&[0x29, 0x5F]);
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    #[test]
    fn predictor_table() {
        assert_eq!(predict(1, 100, 200, 50), 100);
        assert_eq!(predict(2, 100, 200, 50), 200);
        assert_eq!(predict(3, 100, 200, 50), 50);
        assert_eq!(predict(4, 100, 200, 50), 250);
        assert_eq!(predict(5, 100, 200, 50), 175);
        assert_eq!(predict(6, 100, 200, 50), 225);
        assert_eq!(predict(7, 100, 200, 50), 150);
        assert_eq!(predict(0, 100, 200, 50), 0);
    }

    #[test]
    fn initial_prediction_value() {
        assert_eq!(initial_prediction(8, 0), 128);
        assert_eq!(initial_prediction(16, 0), 32768);
        assert_eq!(initial_prediction(12, 2), 512);
        assert_eq!(initial_prediction(2, 4), 0);
    }

    #[test]
    fn value_extension() {
        // positive values keep their magnitude bits
        let mut bits = BitReader::new(&[0b1000_0000]);
        assert_eq!(decode_value(&mut bits, 1).unwrap(), 1);
        // low-range values are negative
        let mut bits = BitReader::new(&[0b0000_0000]);
        assert_eq!(decode_value(&mut bits, 1).unwrap(), -1);
        let mut bits = BitReader::new(&[0b0100_0000]);
        assert_eq!(decode_value(&mut bits, 2).unwrap(), -2);
        let mut bits = BitReader::new(&[0b1100_0000]);
        assert_eq!(decode_value(&mut bits, 2).unwrap(), 3);
        // category 0 reads no bits
        let mut bits = BitReader::new(&[]);
        assert_eq!(decode_value(&mut bits, 0).unwrap(), 0);
        assert!(matches!(
            decode_value(&mut bits, 17),
            Err(Error::InvalidCategory { .. })
        ));
    }

    #[test]
    fn decode_tiny_lossless_frame() {
        let image = decode(&tiny_lossless_stream()).unwrap();
        assert_eq!(image.width, 2);
        assert_eq!(image.height, 2);
        assert_eq!(image.channels, 1);
        assert_eq!(image.data, vec![128, 130, 127, 130]);
    }

    #[test]
    fn decode_high_precision_frame_windows_to_8bit() {
        // 2x1, 12-bit: initial value 2048, diffs 0 and +2
        let mut data = vec![0xFF, 0xD8];
        data.extend(segment(0xC4, &dc_table_payload()));
        data.extend(segment(0xC3, &sof3_payload(12, 1, 2)));
        data.extend(segment(0xDA, &sos_payload(1)));
        // 00 | 10 10, padded with 1s
        data.push(0b0010_1011);
        data.extend_from_slice(&[0xFF, 0xD9]);

        let image = decode(&data).unwrap();
        assert_eq!((image.width, image.height), (2, 1));
        // samples 2048 and 2050 window to the full output range
        assert_eq!(image.data, vec![0, 255]);
    }

    #[test]
    fn decode_across_restart_markers() {
        let mut data = vec![0xFF, 0xD8];
        data.extend(segment(0xC4, &dc_table_payload()));
        data.extend(segment(0xDD, &1u16.to_be_bytes()));
        data.extend(segment(0xC3, &sof3_payload(8, 1, 2)));
        data.extend(segment(0xDA, &sos_payload(1)));
        // pixel 128 (diff 0), RST0, pixel 130 (diff +2)
        data.push(0b0011_1111);
        data.extend_from_slice(&[0xFF, 0xD0]);
        data.push(0b1010_1111);
        data.extend_from_slice(&[0xFF, 0xD9]);

        let image = decode(&data).unwrap();
        assert_eq!(image.data, vec![128, 130]);
    }

    #[test]
    fn rejects_non_jpeg_data() {
        assert!(matches!(
            decode(b"DICM....."),
            Err(Error::InvalidMarker { .. })
        ));
    }

    #[test]
    fn rejects_baseline_frames() {
        let mut data = vec![0xFF, 0xD8];
        data.extend(segment(0xC0, &sof3_payload(8, 2, 2)));
        match decode(&data) {
            Err(Error::UnsupportedFormat { process, .. }) => assert_eq!(process, 0),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn rejects_arithmetic_lossless_frames() {
        let mut data = vec![0xFF, 0xD8];
        data.extend(segment(0xCB, &sof3_payload(8, 2, 2)));
        assert!(matches!(
            decode(&data),
            Err(Error::ArithmeticCodingNotSupported { .. })
        ));
    }

    #[test]
    fn premature_eoi_is_an_error() {
        let data = [0xFF, 0xD8, 0xFF, 0xD9];
        assert!(matches!(
            decode(&data),
            Err(Error::UnexpectedEndOfImage { .. })
        ));
    }

    #[test]
    fn unknown_segments_are_skipped() {
        let mut data = vec![0xFF, 0xD8];
        // APP0 segment with arbitrary content
        data.extend(segment(0xE0, b"JFIF\0"));
        data.extend(segment(0xC4, &dc_table_payload()));
        data.extend(segment(0xC3, &sof3_payload(8, 2, 2)));
        data.extend(segment(0xDA, &sos_payload(1)));
        data.extend_from_slice(&[0x29, 0x5F, 0xFF, 0xD9]);

        assert!(decode(&data).is_ok());
    }

    #[test]
    fn truncated_entropy_stream_is_an_error() {
        let mut data = vec![0xFF, 0xD8];
        data.extend(segment(0xC4, &dc_table_payload()));
        data.extend(segment(0xC3, &sof3_payload(8, 16, 16)));
        data.extend(segment(0xDA, &sos_payload(1)));
        // far fewer bits than 256 pixels require
        data.push(0x29);
        data.extend_from_slice(&[0xFF, 0xD9]);

        assert!(matches!(decode(&data), Err(Error::EndOfStream { .. })));
    }
}
