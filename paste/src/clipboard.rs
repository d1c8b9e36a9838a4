use std::path::PathBuf;

use image::DynamicImage;
use image::RgbaImage;
use image_paste_core::decode_file_uri;

use crate::codec::ImageCrateCodec;
use crate::collaborators::CapturedImage;
use crate::collaborators::ClipboardSource;
use crate::collaborators::ImageCodec;

/// [`ClipboardSource`] reading the OS clipboard through `arboard`.
///
/// Raw pixel data wins. Otherwise the clipboard text is treated as a file list (one path or
/// `file:` URI per line, as file managers put it there) and the first entry that decodes as
/// an image is used.
#[derive(Debug, Default)]
pub struct ArboardClipboard {
    codec: ImageCrateCodec,
}

impl ArboardClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardSource for ArboardClipboard {
    fn grab(&mut self) -> Option<CapturedImage> {
        let mut clipboard = match arboard::Clipboard::new() {
            Ok(clipboard) => clipboard,
            Err(err) => {
                tracing::warn!("clipboard unavailable: {err}");
                return None;
            }
        };

        match clipboard.get_image() {
            Ok(data) => {
                tracing::debug!("clipboard image size={}x{}", data.width, data.height);
                let width = u32::try_from(data.width).ok()?;
                let height = u32::try_from(data.height).ok()?;
                let rgba = RgbaImage::from_raw(width, height, data.bytes.into_owned())?;
                return Some(CapturedImage {
                    image: DynamicImage::ImageRgba8(rgba),
                    source_path: None,
                });
            }
            Err(arboard::Error::ContentNotAvailable) => {}
            Err(err) => tracing::debug!("clipboard image read failed: {err}"),
        }

        let text = clipboard.get_text().ok()?;
        image_from_file_list(&text, &self.codec)
    }
}

/// Pick the first entry of a clipboard file list that is an existing, decodable image.
pub fn image_from_file_list(text: &str, codec: &impl ImageCodec) -> Option<CapturedImage> {
    for path in text.lines().filter_map(file_list_entry) {
        if !path.is_file() {
            continue;
        }
        match codec.decode(&path) {
            Ok((image, format)) => {
                tracing::debug!(
                    "clipboard file {} format={}",
                    path.display(),
                    format.label()
                );
                return Some(CapturedImage {
                    image,
                    source_path: Some(path),
                });
            }
            Err(err) => tracing::trace!("skipping clipboard file: {err}"),
        }
    }
    None
}

fn file_list_entry(line: &str) -> Option<PathBuf> {
    let line = line.trim();
    // `text/uri-list` allows comment lines.
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    if line.starts_with("file:") {
        return decode_file_uri(line).ok();
    }
    let path = PathBuf::from(line);
    path.is_absolute().then_some(path)
}
