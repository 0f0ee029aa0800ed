//! Extraction of compressed frames from encapsulated pixel data.
//!
//! Under an encapsulated transfer syntax, the pixel data value is a
//! sequence of items: an optional basic offset table item, followed by
//! one item per compressed frame, closed by a sequence delimiter.
//! Frames are returned as views into the pixel data value.
use crate::error::{Result, UnexpectedEndOfData};
use minidicom_core::{tags, Tag};
use minidicom_encoding::{ByteReader, Endianness};
use snafu::ResultExt;

/// Walk the item sequence in `data` and collect one byte view per
/// encapsulated frame, skipping the basic offset table if present.
///
/// The item stream is itself always encoded in little endian,
/// regardless of the data set's transfer syntax.
pub fn extract_frames(data: &[u8]) -> Result<Vec<&[u8]>> {
    let mut reader = ByteReader::new(data, Endianness::Little);

    // A leading item with a nonzero length that is a multiple of 4 is
    // taken to be the basic offset table, whose content we do not need.
    if reader.remaining() >= 8 {
        let group = reader.read_u16().context(UnexpectedEndOfData)?;
        let element = reader.read_u16().context(UnexpectedEndOfData)?;
        let length = reader.read_u32().context(UnexpectedEndOfData)? as usize;
        if Tag(group, element) == tags::ITEM
            && length > 0
            && length % 4 == 0
            && length <= reader.remaining()
        {
            reader.skip(length).context(UnexpectedEndOfData)?;
        } else {
            reader.set_position(0).context(UnexpectedEndOfData)?;
        }
    }

    let mut frames = Vec::new();
    while reader.remaining() >= 8 {
        let group = reader.read_u16().context(UnexpectedEndOfData)?;
        let element = reader.read_u16().context(UnexpectedEndOfData)?;
        let tag = Tag(group, element);
        let length = reader.read_u32().context(UnexpectedEndOfData)? as usize;

        if tag != tags::ITEM {
            // sequence delimiter, or something we do not understand
            if tag != tags::SEQUENCE_DELIMITER {
                tracing::warn!("Unexpected tag {} in encapsulated pixel data", tag);
            }
            break;
        }
        if length == 0 {
            continue;
        }
        if length > reader.remaining() {
            tracing::warn!(
                "Encapsulated item claims {} bytes with {} available, stopping",
                length,
                reader.remaining()
            );
            break;
        }
        frames.push(reader.read_bytes(length).context(UnexpectedEndOfData)?);
    }
    Ok(frames)
}
