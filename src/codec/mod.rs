//! Two-file model documents: a JSON document plus one binary blob.
//!
//! The layout is the glTF 2.0 subset the editor round-trips: one scene,
//! nodes with TRS and children, one primitive per mesh, and accessors backed
//! by 4-byte aligned views into a single buffer. [`export_model`] writes a
//! subtree; [`import_model`] reads one back.

pub mod document;
pub mod export;
pub mod import;

pub use document::Document;
pub use export::{ExportedModel, export_model};
pub use import::{ImportOptions, import_document, import_model};

/// bufferView target for vertex attributes.
pub const ARRAY_BUFFER: u32 = 34962;
/// bufferView target for index lists.
pub const ELEMENT_ARRAY_BUFFER: u32 = 34963;

pub(crate) const DATA_URI_PREFIX: &str = "data:application/octet-stream;base64,";
