//! MIME type and file extension lookups backed by a bundled table, with
//! content sniffing as a fallback when a file name says nothing useful.
//!
//! ```
//! use std::path::Path;
//!
//! let mime_type = mimeguess::guess_type(Path::new("upload.jpg"), None)?;
//! assert_eq!(mime_type, "image/jpeg");
//! assert_eq!(mimeguess::extension_for_type(mime_type)?, Some("jpeg"));
//! # Ok::<(), mimeguess::MimeError>(())
//! ```

pub mod magic;
pub mod registry;
pub mod table;

pub use registry::{
    DEFAULT_EXTENSION, DEFAULT_TYPE, MimeError, MimeRegistry, extension_for_type,
    extensions_for_type, get_magic_type, guess_extension, guess_extension_or, guess_type,
    guess_type_or, has_extension, has_type, magic_type_for_bytes, registry, type_for_extension,
};
pub use table::{Entry, MimeTable, TableError};
