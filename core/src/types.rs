use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ByteRange {
    /// Start byte offset (inclusive) within the document buffer.
    pub start: usize,
    /// End byte offset (exclusive) within the document buffer.
    pub end: usize,
}

impl From<std::ops::Range<usize>> for ByteRange {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

/// An image reference found in a document: the unescaped target plus where it lives.
///
/// The region is opaque to this crate; hosts use it to anchor previews.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageReference {
    pub raw_path: String,
    pub region: ByteRange,
}

impl ImageReference {
    pub fn new(raw_path: impl Into<String>, region: impl Into<ByteRange>) -> Self {
        Self {
            raw_path: raw_path.into(),
            region: region.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodedImageFormat {
    Png,
    Jpeg,
    Other,
}

impl EncodedImageFormat {
    pub fn label(self) -> &'static str {
        match self {
            EncodedImageFormat::Png => "PNG",
            EncodedImageFormat::Jpeg => "JPEG",
            EncodedImageFormat::Other => "IMG",
        }
    }

    /// MIME type browsers accept inline; `None` for formats that must be re-encoded first.
    pub fn mime_type(self) -> Option<&'static str> {
        match self {
            EncodedImageFormat::Png => Some("image/png"),
            EncodedImageFormat::Jpeg => Some("image/jpeg"),
            EncodedImageFormat::Other => None,
        }
    }

    /// Infer a format from the path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("png") => EncodedImageFormat::Png,
            Some("jpg") | Some("jpeg") => EncodedImageFormat::Jpeg,
            _ => EncodedImageFormat::Other,
        }
    }
}
