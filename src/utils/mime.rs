//! MIME type guessing for files read from disk.
//!
//! Uploads from a browser arrive with a MIME type; files on disk only have
//! an extension, so the CLI guesses one here before applying the image
//! guard.

use std::path::Path;

/// MIME type constants.
pub mod types {
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const AVIF: &str = "image/avif";
    pub const SVG: &str = "image/svg+xml";
    pub const BMP: &str = "image/bmp";
    pub const TIFF: &str = "image/tiff";

    pub const HTML: &str = "text/html";
    pub const PLAIN: &str = "text/plain";
    pub const JSON: &str = "application/json";
    pub const PDF: &str = "application/pdf";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}

/// Guess MIME type from a path's extension (case-insensitive).
pub fn from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    from_extension(ext.as_deref())
}

/// Guess MIME type from a lowercase extension.
pub fn from_extension(ext: Option<&str>) -> &'static str {
    match ext {
        Some("png") => types::PNG,
        Some("jpg" | "jpeg" | "jfif") => types::JPEG,
        Some("gif") => types::GIF,
        Some("webp") => types::WEBP,
        Some("avif") => types::AVIF,
        Some("svg") => types::SVG,
        Some("bmp") => types::BMP,
        Some("tif" | "tiff") => types::TIFF,

        Some("html" | "htm") => types::HTML,
        Some("txt") => types::PLAIN,
        Some("json") => types::JSON,
        Some("pdf") => types::PDF,

        _ => types::OCTET_STREAM,
    }
}

/// Whether a MIME type names an image (`image/*`).
#[inline]
pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// Whether the compressor has a codec for this image type.
///
/// Other `image/*` types (SVG, AVIF) are left as uploaded.
#[inline]
pub fn is_decodable_image(mime: &str) -> bool {
    matches!(
        mime,
        types::PNG | types::JPEG | types::GIF | types::WEBP | types::BMP | types::TIFF
    )
}
