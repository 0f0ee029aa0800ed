//! Named constants for the attribute tags this library touches.
//!
//! This is deliberately not a full data dictionary. Only the attributes
//! needed for file meta parsing, image geometry, patient/study metadata,
//! and pixel data traversal are listed.
use crate::header::Tag;

// file meta group
pub const FILE_META_INFORMATION_GROUP_LENGTH: Tag = Tag(0x0002, 0x0000);
pub const MEDIA_STORAGE_SOP_CLASS_UID: Tag = Tag(0x0002, 0x0002);
pub const MEDIA_STORAGE_SOP_INSTANCE_UID: Tag = Tag(0x0002, 0x0003);
pub const TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);
pub const IMPLEMENTATION_CLASS_UID: Tag = Tag(0x0002, 0x0012);

// study module
pub const STUDY_DATE: Tag = Tag(0x0008, 0x0020);
pub const STUDY_TIME: Tag = Tag(0x0008, 0x0030);
pub const STUDY_DESCRIPTION: Tag = Tag(0x0008, 0x1030);
pub const STUDY_INSTANCE_UID: Tag = Tag(0x0020, 0x000D);

// patient module
pub const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);
pub const PATIENT_ID: Tag = Tag(0x0010, 0x0020);
pub const PATIENT_BIRTH_DATE: Tag = Tag(0x0010, 0x0030);
pub const PATIENT_SEX: Tag = Tag(0x0010, 0x0040);

// image pixel module
pub const SAMPLES_PER_PIXEL: Tag = Tag(0x0028, 0x0002);
pub const PHOTOMETRIC_INTERPRETATION: Tag = Tag(0x0028, 0x0004);
pub const ROWS: Tag = Tag(0x0028, 0x0010);
pub const COLUMNS: Tag = Tag(0x0028, 0x0011);
pub const BITS_ALLOCATED: Tag = Tag(0x0028, 0x0100);
pub const BITS_STORED: Tag = Tag(0x0028, 0x0101);

// VOI and modality LUT attributes, projected as metadata only
pub const WINDOW_CENTER: Tag = Tag(0x0028, 0x1050);
pub const WINDOW_WIDTH: Tag = Tag(0x0028, 0x1051);
pub const RESCALE_INTERCEPT: Tag = Tag(0x0028, 0x1052);
pub const RESCALE_SLOPE: Tag = Tag(0x0028, 0x1053);

pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

// item and delimitation tags
pub const ITEM: Tag = Tag(0xFFFE, 0xE000);
pub const ITEM_DELIMITER: Tag = Tag(0xFFFE, 0xE00D);
pub const SEQUENCE_DELIMITER: Tag = Tag(0xFFFE, 0xE0DD);
