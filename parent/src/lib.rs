//! This crate serves as a parent for the library crates in the
//! minidicom project.
//!
//! For high-level access to DICOM content, start with
//! [`minidicom_object`](../minidicom_object), re-exported here as
//! [`object`].
pub use minidicom_core as core;
pub use minidicom_encoding as encoding;
pub use minidicom_object as object;
pub use minidicom_parser as parser;
pub use minidicom_pixeldata as pixeldata;
