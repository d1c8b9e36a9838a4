//! Inline previews for image references.
//!
//! Every reference is resolved to a local file and embedded as a `data:` URI, so the overlay
//! never depends on the viewer being able to read the file itself. PNG and JPEG bytes are
//! embedded as they are; anything else is decoded and re-encoded as PNG first.

use std::path::Path;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::DynamicImage;
use image_paste_core::ByteRange;
use image_paste_core::EncodedImageFormat;
use image_paste_core::FileUriError;
use image_paste_core::ImageReference;
use image_paste_core::decode_file_uri;
use image_paste_core::encode_file_uri;
use percent_encoding::percent_decode_str;

use crate::collaborators::ImageCodec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub region: ByteRange,
    /// HTML for the overlay: a single `<img>` element.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewUpdate {
    /// Same overlays as last time; leave the view alone.
    Unchanged,
    /// Drop whatever is shown and show these instead (possibly none).
    Replace(Vec<Overlay>),
}

/// Renders overlays and remembers the last emitted set for one view.
pub struct PreviewRenderer<I> {
    codec: I,
    shown: Vec<Overlay>,
}

impl<I: ImageCodec> PreviewRenderer<I> {
    pub fn new(codec: I) -> Self {
        Self {
            codec,
            shown: Vec::new(),
        }
    }

    /// Lazily compute one overlay per resolvable reference.
    ///
    /// Files are re-read on every call since they may change between renders. Relative
    /// references need `resolve_base`, the document's directory; without it they are skipped.
    pub fn overlays<'a>(
        &'a self,
        references: &'a [ImageReference],
        max_width: u32,
        resolve_base: Option<&'a Path>,
    ) -> impl Iterator<Item = Overlay> + 'a {
        references
            .iter()
            .filter_map(move |reference| self.overlay_for(reference, max_width, resolve_base))
    }

    pub fn render(
        &mut self,
        references: &[ImageReference],
        max_width: u32,
        resolve_base: Option<&Path>,
    ) -> PreviewUpdate {
        let overlays: Vec<Overlay> = self
            .overlays(references, max_width, resolve_base)
            .collect();
        if overlays == self.shown {
            return PreviewUpdate::Unchanged;
        }
        self.shown = overlays.clone();
        PreviewUpdate::Replace(overlays)
    }

    /// Forget the shown overlays, e.g. when the host closed them.
    pub fn clear(&mut self) -> PreviewUpdate {
        if self.shown.is_empty() {
            return PreviewUpdate::Unchanged;
        }
        self.shown.clear();
        PreviewUpdate::Replace(Vec::new())
    }

    fn overlay_for(
        &self,
        reference: &ImageReference,
        max_width: u32,
        resolve_base: Option<&Path>,
    ) -> Option<Overlay> {
        let path = match resolve_reference_path(&reference.raw_path, resolve_base) {
            Ok(Some(path)) => path,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!("cannot preview {:?}: {err}", reference.raw_path);
                return None;
            }
        };

        let src = match image_data_uri(&self.codec, &path) {
            Ok(src) => src,
            Err(err) => {
                tracing::warn!("cannot load preview for {}: {err}", path.display());
                // Let the overlay show its broken-image state for the file.
                encode_file_uri(&path).ok()?
            }
        };

        let content = match self.codec.dimensions(&path) {
            Ok(natural) => {
                let (width, height) = display_dimensions(natural, max_width);
                tracing::trace!("preview {} at {width}x{height}", path.display());
                format!("<img src='{src}' width='{width}' height='{height}'/>")
            }
            Err(err) => {
                tracing::debug!("no dimensions for {}: {err}", path.display());
                format!("<img src='{src}'/>")
            }
        };

        Some(Overlay {
            region: reference.region,
            content,
        })
    }
}

/// Map a reference target to a local file.
///
/// Percent-escapes are decoded in every form, matching how references are escaped on insert.
/// `file:` URIs and absolute paths stand alone; relative targets are appended to the URI of
/// `resolve_base`. Targets with another URI scheme, and relative targets without a base,
/// resolve to `None`.
pub fn resolve_reference_path(
    raw: &str,
    resolve_base: Option<&Path>,
) -> Result<Option<PathBuf>, FileUriError> {
    if raw.starts_with("file:") {
        return decode_file_uri(raw).map(Some);
    }
    if raw.contains("://") || raw.starts_with("data:") {
        return Ok(None);
    }
    let unescaped = PathBuf::from(percent_decode_str(raw).decode_utf8_lossy().as_ref());
    if unescaped.is_absolute() {
        return Ok(Some(unescaped));
    }
    let Some(base) = resolve_base else {
        return Ok(None);
    };
    let base_uri = encode_file_uri(base)?;
    decode_file_uri(&format!("{}/{raw}", base_uri.trim_end_matches('/'))).map(Some)
}

/// `data:` URI for the image at `path`, in a format browsers display.
pub fn image_data_uri(codec: &impl ImageCodec, path: &Path) -> anyhow::Result<String> {
    let (mime, bytes) = match EncodedImageFormat::from_path(path).mime_type() {
        Some(mime) => (mime, codec.read_bytes(path)?),
        None => {
            let (image, _) = codec.decode(path)?;
            let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
            ("image/png", codec.encode(&rgba, EncodedImageFormat::Png)?)
        }
    };
    Ok(format!("data:{mime};base64,{}", BASE64.encode(bytes)))
}

/// Scale `natural` down to `max_width`, keeping the aspect ratio and truncating the height.
pub fn display_dimensions(natural: (u32, u32), max_width: u32) -> (u32, u32) {
    let (width, height) = natural;
    if width <= max_width {
        return natural;
    }
    let scaled = u64::from(height) * u64::from(max_width) / u64::from(width);
    (max_width, u32::try_from(scaled).unwrap_or(height))
}
