use std::io;
use std::path::Path;
use tracing::trace;

/// Detect a MIME type from the leading bytes of a file.
///
/// Returns `Ok(None)` when the content matches no known signature, which
/// includes empty files. Errors opening or reading the file are returned
/// as-is.
pub fn sniff_path(path: &Path) -> io::Result<Option<&'static str>> {
    let kind = infer::get_from_path(path)?;
    let mime_type = kind.map(|kind| kind.mime_type());
    trace!("Sniffed {} as {:?}", path.display(), mime_type);
    Ok(mime_type)
}

/// Detect a MIME type from an in-memory buffer
pub fn sniff_bytes(bytes: &[u8]) -> Option<&'static str> {
    infer::get(bytes).map(|kind| kind.mime_type())
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Smallest header that content sniffers accept as JPEG
    pub const JPEG: &[u8] = &[
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00,
        0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xD9,
    ];

    pub const GIF: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;";

    pub const FLAC: &[u8] = &[
        b'f', b'L', b'a', b'C', 0x00, 0x00, 0x00, 0x22, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    pub const PLAIN_TEXT: &[u8] = b"just some words, nothing magic about them\n";
}
