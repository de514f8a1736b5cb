use crate::magic;
use crate::table::{BUNDLED_TABLE, Entry, MimeTable, TableError};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, error, trace};

/// Returned by `guess_type` when nothing better is known
pub const DEFAULT_TYPE: &str = "application/octet-stream";

/// Returned by `guess_extension` when nothing better is known
pub const DEFAULT_EXTENSION: &str = "bin";

/// Extension and MIME type lookups over an immutable table
#[derive(Debug, Clone)]
pub struct MimeRegistry {
    entries: Vec<Entry>,
    by_type: HashMap<String, usize>,
}

impl MimeRegistry {
    pub fn new(table: MimeTable) -> Self {
        let entries = table.into_entries();
        let by_type = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.mime_type.clone(), index))
            .collect();

        Self { entries, by_type }
    }

    /// Build a registry from JSON text
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        MimeTable::from_json(json).map(Self::new)
    }

    /// Build a registry from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        MimeTable::from_path(path).map(Self::new)
    }

    /// Build a registry from the table shipped with the crate
    pub fn bundled() -> Result<Self, TableError> {
        Self::from_json(BUNDLED_TABLE)
    }

    /// Number of MIME types in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(mime type, extensions)` in table order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|entry| (entry.mime_type.as_str(), entry.extensions.as_slice()))
    }

    /// First MIME type listing the extension, compared case-insensitively
    pub fn type_for_extension(&self, extension: &str) -> Option<&str> {
        self.find_extension(extension)
            .map(|(entry, _)| entry.mime_type.as_str())
    }

    /// Canonical extension for a MIME type
    pub fn extension_for_type(&self, mime_type: &str) -> Option<&str> {
        self.entry(mime_type)
            .and_then(|entry| entry.extensions.first())
            .map(String::as_str)
    }

    /// All extensions for a MIME type, canonical first. The vector is a
    /// copy; changing it leaves the table alone.
    pub fn extensions_for_type(&self, mime_type: &str) -> Option<Vec<String>> {
        self.entry(mime_type).map(|entry| entry.extensions.clone())
    }

    pub fn has_extension(&self, extension: &str) -> bool {
        self.find_extension(extension).is_some()
    }

    /// Exact match, no case folding
    pub fn has_type(&self, mime_type: &str) -> bool {
        self.by_type.contains_key(mime_type)
    }

    /// Guess the MIME type of a file, falling back to `application/octet-stream`
    pub fn guess_type(
        &self,
        path: &Path,
        reference_name: Option<&str>,
    ) -> Result<&str, MimeError> {
        self.guess_type_or(path, reference_name, DEFAULT_TYPE)
    }

    /// Guess the MIME type of a file.
    ///
    /// The extension of `reference_name` (or of the file name when no
    /// reference is given) is tried first. If it is missing or unknown the
    /// file content is sniffed. `default` is returned when neither helps.
    pub fn guess_type_or<'a>(
        &'a self,
        path: &Path,
        reference_name: Option<&str>,
        default: &'a str,
    ) -> Result<&'a str, MimeError> {
        if let Some(extension) = reference_extension(path, reference_name) {
            if let Some(mime_type) = self.type_for_extension(extension) {
                trace!("Extension {:?} maps to {}", extension, mime_type);
                return Ok(mime_type);
            }
            debug!("Unknown extension {:?}, sniffing content", extension);
        }

        match self.get_magic_type(path)? {
            Some(mime_type) => Ok(mime_type),
            None => {
                debug!("No type for {}, using {}", path.display(), default);
                Ok(default)
            }
        }
    }

    /// Guess an extension for a file, falling back to `bin`
    pub fn guess_extension(
        &self,
        path: &Path,
        reference_name: Option<&str>,
    ) -> Result<&str, MimeError> {
        self.guess_extension_or(path, reference_name, DEFAULT_EXTENSION)
    }

    /// Guess an extension for a file.
    ///
    /// A known extension already on the name is returned as-is (lowercased),
    /// not remapped to the canonical one. Otherwise the file content is
    /// sniffed and the canonical extension of the detected type returned.
    pub fn guess_extension_or<'a>(
        &'a self,
        path: &Path,
        reference_name: Option<&str>,
        default: &'a str,
    ) -> Result<&'a str, MimeError> {
        if let Some(extension) = reference_extension(path, reference_name) {
            if let Some((_, known)) = self.find_extension(extension) {
                return Ok(known);
            }
            debug!("Unknown extension {:?}, sniffing content", extension);
        }

        let sniffed = self
            .get_magic_type(path)?
            .and_then(|mime_type| self.extension_for_type(mime_type));

        match sniffed {
            Some(extension) => Ok(extension),
            None => {
                debug!("No extension for {}, using {}", path.display(), default);
                Ok(default)
            }
        }
    }

    /// Sniff the file content. Only types present in the table are
    /// returned, so the result always works with the other lookups.
    pub fn get_magic_type(&self, path: &Path) -> Result<Option<&str>, MimeError> {
        let sniffed = magic::sniff_path(path).map_err(|source| MimeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(sniffed.and_then(|mime_type| self.known_type(mime_type)))
    }

    /// Same as `get_magic_type`, for content already in memory
    pub fn magic_type_for_bytes(&self, bytes: &[u8]) -> Option<&str> {
        magic::sniff_bytes(bytes).and_then(|mime_type| self.known_type(mime_type))
    }

    /// The table's own copy of a sniffed type, if the table lists it
    fn known_type(&self, mime_type: &str) -> Option<&str> {
        let known = self.entry(mime_type).map(|entry| entry.mime_type.as_str());
        if known.is_none() {
            debug!("Sniffed type {} is not in the table", mime_type);
        }
        known
    }

    fn entry(&self, mime_type: &str) -> Option<&Entry> {
        self.by_type.get(mime_type).map(|&index| &self.entries[index])
    }

    /// First entry listing the extension, along with the table's own copy
    /// of the extension string
    fn find_extension(&self, extension: &str) -> Option<(&Entry, &str)> {
        let extension = extension.to_ascii_lowercase();
        self.entries.iter().find_map(|entry| {
            entry
                .extensions
                .iter()
                .find(|candidate| **candidate == extension)
                .map(|candidate| (entry, candidate.as_str()))
        })
    }
}

/// Extension of the reference name, or of the path's file name when the
/// reference is absent or empty. The extension is everything after the
/// last dot of the final path component.
fn reference_extension<'a>(path: &'a Path, reference_name: Option<&'a str>) -> Option<&'a str> {
    let name = match reference_name.filter(|name| !name.is_empty()) {
        Some(name) => Path::new(name).file_name()?,
        None => path.file_name()?,
    };

    name.to_str()?
        .rsplit_once('.')
        .map(|(_, extension)| extension)
        .filter(|extension| !extension.is_empty())
}

static REGISTRY: OnceLock<Result<MimeRegistry, TableError>> = OnceLock::new();

/// The process-wide registry built from the bundled table.
///
/// Loaded on first call. A load failure is kept and returned on every
/// later call as well.
pub fn registry() -> Result<&'static MimeRegistry, MimeError> {
    load_once(&REGISTRY, MimeRegistry::bundled)
}

fn load_once<F>(
    cell: &OnceLock<Result<MimeRegistry, TableError>>,
    load: F,
) -> Result<&MimeRegistry, MimeError>
where
    F: FnOnce() -> Result<MimeRegistry, TableError>,
{
    cell.get_or_init(|| {
        let loaded = load();
        match &loaded {
            Ok(registry) => debug!("Loaded {} MIME types", registry.len()),
            Err(e) => error!("Failed to load MIME table: {}", e),
        }
        loaded
    })
    .as_ref()
    .map_err(|e| MimeError::Table(e.clone()))
}

pub fn type_for_extension(extension: &str) -> Result<Option<&'static str>, MimeError> {
    Ok(registry()?.type_for_extension(extension))
}

pub fn extension_for_type(mime_type: &str) -> Result<Option<&'static str>, MimeError> {
    Ok(registry()?.extension_for_type(mime_type))
}

pub fn extensions_for_type(mime_type: &str) -> Result<Option<Vec<String>>, MimeError> {
    Ok(registry()?.extensions_for_type(mime_type))
}

pub fn has_extension(extension: &str) -> Result<bool, MimeError> {
    Ok(registry()?.has_extension(extension))
}

pub fn has_type(mime_type: &str) -> Result<bool, MimeError> {
    Ok(registry()?.has_type(mime_type))
}

pub fn guess_type(path: &Path, reference_name: Option<&str>) -> Result<&'static str, MimeError> {
    registry()?.guess_type(path, reference_name)
}

pub fn guess_type_or<'a>(
    path: &Path,
    reference_name: Option<&str>,
    default: &'a str,
) -> Result<&'a str, MimeError> {
    registry()?.guess_type_or(path, reference_name, default)
}

pub fn guess_extension(
    path: &Path,
    reference_name: Option<&str>,
) -> Result<&'static str, MimeError> {
    registry()?.guess_extension(path, reference_name)
}

pub fn guess_extension_or<'a>(
    path: &Path,
    reference_name: Option<&str>,
    default: &'a str,
) -> Result<&'a str, MimeError> {
    registry()?.guess_extension_or(path, reference_name, default)
}

pub fn get_magic_type(path: &Path) -> Result<Option<&'static str>, MimeError> {
    registry()?.get_magic_type(path)
}

pub fn magic_type_for_bytes(bytes: &[u8]) -> Result<Option<&'static str>, MimeError> {
    Ok(registry()?.magic_type_for_bytes(bytes))
}

#[derive(Debug, thiserror::Error)]
pub enum MimeError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
