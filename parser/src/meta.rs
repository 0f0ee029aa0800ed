//! Reading of the DICOM file meta information group.
//!
//! The file meta group is always encoded in Explicit VR Little Endian,
//! regardless of the transfer syntax it declares for the main data set.
use crate::error::{
    InvalidFileMeta, InvalidPreamble, InvalidPrefix, InvalidVr, Result, UnexpectedEndOfData,
    UnsupportedTransferSyntax,
};
use crate::PREAMBLE_AND_PREFIX_LEN;
use byteordered::Endianness;
use minidicom_core::{tags, Tag, TransferSyntax, VR};
use minidicom_encoding::ByteReader;
use snafu::{ensure, OptionExt, ResultExt};

const DICM_MAGIC_CODE: [u8; 4] = [b'D', b'I', b'C', b'M'];

/// Cap on the number of elements read from the meta group,
/// guarding against malformed streams that never leave group 0002.
const MAX_META_ELEMENTS: u32 = 100;

/// The parsed DICOM file meta information.
///
/// Unlike the main data set index, the string fields here are owned
/// copies, so the table may outlive the source buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMeta {
    /// The opaque 128-byte preamble.
    pub preamble: [u8; 128],
    /// The 4-byte magic code, always `DICM`.
    pub prefix: [u8; 4],
    /// File Meta Information Group Length, when present.
    pub information_group_length: Option<u32>,
    /// Media Storage SOP Class UID
    pub media_storage_sop_class_uid: String,
    /// Media Storage SOP Instance UID
    pub media_storage_sop_instance_uid: String,
    /// Transfer Syntax UID
    pub transfer_syntax_uid: String,
    /// Implementation Class UID
    pub implementation_class_uid: Option<String>,
    /// Absolute offset of the first main data set element.
    pub data_set_start: usize,
}

impl FileMeta {
    /// Parse the file meta group from the start of a DICOM P10 buffer.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        ensure!(
            data.len() >= PREAMBLE_AND_PREFIX_LEN,
            InvalidPreamble { len: data.len() }
        );
        ensure!(data[128..132] == DICM_MAGIC_CODE, InvalidPrefix);

        let mut preamble = [0u8; 128];
        preamble.copy_from_slice(&data[..128]);

        let mut reader = ByteReader::new(data, Endianness::Little);
        reader
            .set_position(PREAMBLE_AND_PREFIX_LEN)
            .context(UnexpectedEndOfData)?;

        let mut information_group_length = None;
        let mut media_storage_sop_class_uid = None;
        let mut media_storage_sop_instance_uid = None;
        let mut transfer_syntax_uid = None;
        let mut implementation_class_uid = None;

        for _ in 0..MAX_META_ELEMENTS {
            if reader.remaining() < 8 {
                break;
            }
            let group = reader.read_u16().context(UnexpectedEndOfData)?;
            let element = reader.read_u16().context(UnexpectedEndOfData)?;
            let tag = Tag(group, element);
            if group != 0x0002 {
                // the tag belongs to the main data set, put it back
                let rollback = reader.position() - 4;
                reader.set_position(rollback).context(UnexpectedEndOfData)?;
                break;
            }

            let vr_bytes = reader.read_bytes(2).context(UnexpectedEndOfData)?;
            let vr_bytes = [vr_bytes[0], vr_bytes[1]];
            let vr = VR::from_bytes(vr_bytes).context(InvalidVr {
                tag,
                bytes: vr_bytes,
            })?;
            let length = if vr.has_32bit_length() {
                reader.skip(2).context(UnexpectedEndOfData)?;
                reader.read_u32().context(UnexpectedEndOfData)?
            } else {
                u32::from(reader.read_u16().context(UnexpectedEndOfData)?)
            };
            let value = reader
                .read_bytes(length as usize)
                .context(UnexpectedEndOfData)?;

            match tag {
                tags::FILE_META_INFORMATION_GROUP_LENGTH => {
                    if value.len() == 4 {
                        let mut buf = [0u8; 4];
                        buf.copy_from_slice(value);
                        information_group_length = Some(u32::from_le_bytes(buf));
                    } else {
                        tracing::warn!(
                            "File meta group length has invalid size {}, ignoring",
                            value.len()
                        );
                    }
                }
                tags::MEDIA_STORAGE_SOP_CLASS_UID => {
                    media_storage_sop_class_uid = Some(decode_text(value));
                }
                tags::MEDIA_STORAGE_SOP_INSTANCE_UID => {
                    media_storage_sop_instance_uid = Some(decode_text(value));
                }
                tags::TRANSFER_SYNTAX_UID => {
                    transfer_syntax_uid = Some(decode_text(value));
                }
                tags::IMPLEMENTATION_CLASS_UID => {
                    implementation_class_uid = Some(decode_text(value));
                }
                _ => {}
            }
        }

        Ok(FileMeta {
            preamble,
            prefix: DICM_MAGIC_CODE,
            information_group_length,
            media_storage_sop_class_uid: media_storage_sop_class_uid
                .context(InvalidFileMeta {
                    name: "MediaStorageSOPClassUID",
                })?,
            media_storage_sop_instance_uid: media_storage_sop_instance_uid
                .context(InvalidFileMeta {
                    name: "MediaStorageSOPInstanceUID",
                })?,
            transfer_syntax_uid: transfer_syntax_uid.context(InvalidFileMeta {
                name: "TransferSyntaxUID",
            })?,
            implementation_class_uid,
            data_set_start: reader.position(),
        })
    }

    /// Resolve the declared transfer syntax UID against the set of
    /// recognized syntaxes.
    pub fn transfer_syntax(&self) -> Result<TransferSyntax> {
        TransferSyntax::from_uid(&self.transfer_syntax_uid).context(UnsupportedTransferSyntax {
            uid: self.transfer_syntax_uid.clone(),
        })
    }
}

/// Decode a text value, dropping trailing space and NUL padding.
fn decode_text(value: &[u8]) -> String {
    String::from_utf8_lossy(value)
        .trim_end_matches(|c| c == ' ' || c == '\0')
        .to_string()
}
