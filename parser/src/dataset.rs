//! The main data set parser and its non-owning element index.
//!
//! Element values are never copied at parse time. A [`DataElement`]
//! records the value's byte range in the original buffer, and the
//! [`DataSet`] keeps the borrow alive so that value views cannot
//! outlive the buffer they index.
use crate::error::{InvalidLength, Result, UnexpectedEndOfData};
use byteordered::Endianness;
use minidicom_core::{tags, Header, Length, Tag, VR};
use minidicom_encoding::ByteReader;
use snafu::ResultExt;

/// A single parsed data element: a header plus the byte range of its
/// value within the source buffer.
///
/// For elements declared with undefined length, the recorded range
/// spans the enclosed item sequence, up to (and not including) the
/// sequence delimiter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataElement {
    pub tag: Tag,
    pub vr: VR,
    /// Concrete length of the value range, in bytes.
    pub length: Length,
    /// Absolute offset of the value's first byte in the source buffer.
    pub value_offset: usize,
}

impl Header for DataElement {
    fn tag(&self) -> Tag {
        self.tag
    }

    fn length(&self) -> Length {
        self.length
    }
}

/// An ordered, non-owning index of the data elements in one data set.
///
/// Elements appear in stream order. Lookup is a linear scan with
/// first-match semantics, which is adequate for the header sizes
/// seen in practice (up to a few hundred elements).
#[derive(Debug)]
pub struct DataSet<'a> {
    data: &'a [u8],
    endianness: Endianness,
    elements: Vec<DataElement>,
}

impl<'a> DataSet<'a> {
    /// Parse every data element from `offset` to the end of `data`,
    /// under the given VR mode and byte order.
    pub fn parse(
        data: &'a [u8],
        offset: usize,
        explicit_vr: bool,
        endianness: Endianness,
    ) -> Result<Self> {
        let mut reader = ByteReader::new(data, endianness);
        reader.set_position(offset).context(UnexpectedEndOfData)?;

        let mut elements = Vec::new();
        while reader.remaining() >= 8 {
            let iteration_start = reader.position();
            let group = reader.read_u16().context(UnexpectedEndOfData)?;
            let element = reader.read_u16().context(UnexpectedEndOfData)?;
            let tag = Tag(group, element);
            if tag == Tag(0x0000, 0x0000) {
                break;
            }

            let (vr, length) = if explicit_vr {
                let vr_bytes = reader.read_bytes(2).context(UnexpectedEndOfData)?;
                let vr = match VR::from_bytes([vr_bytes[0], vr_bytes[1]]) {
                    Some(vr) => vr,
                    None => {
                        // a malformed VR means we lost the element
                        // framing, stop indexing here
                        tracing::warn!(
                            "Invalid VR {:02X?} for element {}, ending data set",
                            vr_bytes,
                            tag
                        );
                        break;
                    }
                };
                let length = if vr.has_32bit_length() {
                    reader.skip(2).context(UnexpectedEndOfData)?;
                    reader.read_u32().context(UnexpectedEndOfData)?
                } else {
                    u32::from(reader.read_u16().context(UnexpectedEndOfData)?)
                };
                (vr, length)
            } else {
                let length = reader.read_u32().context(UnexpectedEndOfData)?;
                (VR::infer_from_tag(tag), length)
            };

            let element = if Length(length).is_undefined() {
                Self::read_undefined_length_element(&mut reader, tag, vr)?
            } else {
                let value_offset = reader.position();
                reader.skip(length as usize).context(UnexpectedEndOfData)?;
                DataElement {
                    tag,
                    vr,
                    length: Length(length),
                    value_offset,
                }
            };
            elements.push(element);

            if reader.position() <= iteration_start {
                tracing::warn!("Data set parsing made no progress at {}, stopping", tag);
                break;
            }
        }

        Ok(DataSet {
            data,
            endianness,
            elements,
        })
    }

    /// Consume an undefined-length element by scanning over its item
    /// sequence until the sequence delimiter. The recorded value range
    /// covers the enclosed items, delimiter excluded.
    fn read_undefined_length_element(
        reader: &mut ByteReader<'a>,
        tag: Tag,
        vr: VR,
    ) -> Result<DataElement> {
        let value_offset = reader.position();
        loop {
            let span_end = reader.position();
            let group = reader.read_u16().context(UnexpectedEndOfData)?;
            let element = reader.read_u16().context(UnexpectedEndOfData)?;
            let item_tag = Tag(group, element);
            let item_length = reader.read_u32().context(UnexpectedEndOfData)?;

            if item_tag == tags::SEQUENCE_DELIMITER {
                return Ok(DataElement {
                    tag,
                    vr,
                    length: Length((span_end - value_offset) as u32),
                    value_offset,
                });
            }
            if item_tag != tags::ITEM || Length(item_length).is_undefined() {
                return InvalidLength {
                    tag,
                    len: Length(item_length),
                }
                .fail();
            }
            reader
                .skip(item_length as usize)
                .context(UnexpectedEndOfData)?;
        }
    }

    /// The parsed elements, in stream order.
    pub fn elements(&self) -> &[DataElement] {
        &self.elements
    }

    /// The byte order of the data set's binary values.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Find the first element with the given tag.
    pub fn find(&self, tag: Tag) -> Option<&DataElement> {
        self.elements.iter().find(|e| e.tag == tag)
    }

    /// The value bytes of the given element, as a view into the
    /// source buffer.
    pub fn value(&self, element: &DataElement) -> &'a [u8] {
        let len = element.length.get().unwrap_or(0) as usize;
        &self.data[element.value_offset..element.value_offset + len]
    }

    /// Fetch an element's value as text,
    /// with trailing space and NUL padding removed.
    pub fn get_string(&self, tag: Tag) -> Option<String> {
        let element = self.find(tag)?;
        let text = String::from_utf8_lossy(self.value(element));
        Some(
            text.trim_end_matches(|c| c == ' ' || c == '\0')
                .to_string(),
        )
    }

    /// Fetch an element's value as an unsigned 16-bit integer in the
    /// data set's byte order.
    pub fn get_u16(&self, tag: Tag) -> Option<u16> {
        let element = self.find(tag)?;
        let mut reader = ByteReader::new(self.value(element), self.endianness);
        reader.read_u16().ok()
    }

    /// Fetch an element's value as an unsigned 32-bit integer in the
    /// data set's byte order.
    pub fn get_u32(&self, tag: Tag) -> Option<u32> {
        let element = self.find(tag)?;
        let mut reader = ByteReader::new(self.value(element), self.endianness);
        reader.read_u32().ok()
    }

    /// Fetch an element's value as a decimal number. Multi-valued
    /// decimal strings yield their first component.
    pub fn get_f64(&self, tag: Tag) -> Option<f64> {
        let text = self.get_string(tag)?;
        let first = text.split('\\').next()?;
        first.trim().parse().ok()
    }
}
