//! MIME type detection for uploads.
//!
//! Magic bytes win over the file extension; the extension is only consulted
//! when the content is not recognized.

use std::path::Path;

const OCTET_STREAM: &str = "application/octet-stream";

/// Known extensions and their MIME types.
const EXTENSIONS: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("avif", "image/avif"),
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
    ("pdf", "application/pdf"),
];

fn sniff(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(b"%PDF-") {
        Some("application/pdf")
    } else if bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        Some("video/webm")
    } else if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        match &bytes[8..12] {
            b"qt  " => Some("video/quicktime"),
            b"avif" => Some("image/avif"),
            _ => Some("video/mp4"),
        }
    } else {
        None
    }
}

/// Detect the MIME type of a file from its content and name.
#[must_use]
pub fn detect_mimetype(filename: &str, bytes: &[u8]) -> String {
    if let Some(mimetype) = sniff(bytes) {
        return mimetype.to_string();
    }
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| {
            EXTENSIONS
                .iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(ext))
                .map(|(_, mimetype)| *mimetype)
        })
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

/// Preferred file extension for a MIME type.
#[must_use]
pub fn extension_for(mimetype: &str) -> Option<&'static str> {
    EXTENSIONS
        .iter()
        .find(|(_, known)| known.eq_ignore_ascii_case(mimetype))
        .map(|(ext, _)| *ext)
}
