//! Narrow interfaces to everything outside the paste/preview logic: the OS clipboard, the
//! filesystem, image decoding, and the host editor.

use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use image::DynamicImage;
use image_paste_core::EncodedImageFormat;
use image_paste_core::Insertion;

/// An image taken from the clipboard.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub image: DynamicImage,
    /// Set when the clipboard held a reference to an image file rather than pixel data.
    pub source_path: Option<PathBuf>,
}

pub trait ClipboardSource {
    /// Return the clipboard image, or `None` when the clipboard holds no usable image.
    fn grab(&mut self) -> Option<CapturedImage>;
}

pub trait FileStore {
    fn copy_file(&self, src: &Path, dest: &Path) -> anyhow::Result<()>;
    /// Write `bytes` to a fresh temporary file ending in `.{extension}` and return its path.
    fn write_temp(&self, bytes: &[u8], extension: &str) -> anyhow::Result<PathBuf>;
    fn move_file(&self, src: &Path, dest: &Path) -> anyhow::Result<()>;
    fn make_dirs(&self, path: &Path) -> anyhow::Result<()>;
    fn remove_file(&self, path: &Path) -> anyhow::Result<()>;
    /// Remove `path` if it is an empty directory; a non-empty directory is left alone.
    fn remove_empty_dir(&self, path: &Path) -> anyhow::Result<()>;
    fn exists(&self, path: &Path) -> bool;
}

pub trait ImageCodec {
    fn decode(&self, path: &Path) -> anyhow::Result<(DynamicImage, EncodedImageFormat)>;

    fn encode(&self, image: &DynamicImage, format: EncodedImageFormat) -> anyhow::Result<Vec<u8>>;

    /// Natural `(width, height)` of the image stored at `path`.
    fn dimensions(&self, path: &Path) -> anyhow::Result<(u32, u32)> {
        let (image, _) = self.decode(path)?;
        Ok((image.width(), image.height()))
    }

    fn read_bytes(&self, path: &Path) -> anyhow::Result<Vec<u8>> {
        std::fs::read(path).with_context(|| format!("read {}", path.display()))
    }
}

pub trait EditorSink {
    fn insert_text(&mut self, text: &str);

    /// Insert a snippet template; `$0` marks where the caret ends up.
    fn insert_snippet(&mut self, template: &str);

    /// Ask the user to confirm or edit the filename, pre-filled with `default`.
    ///
    /// Returns `None` when the prompt was dismissed.
    fn prompt_filename(&mut self, default: &str) -> Option<String>;

    fn set_persistent_setting(&mut self, key: &str, value: &str);

    fn status_message(&mut self, message: &str);

    /// Run the host's ordinary text paste.
    fn paste_text(&mut self);

    fn insert(&mut self, insertion: &Insertion) {
        match insertion {
            Insertion::Snippet(template) => self.insert_snippet(template),
            Insertion::Text(text) => self.insert_text(text),
        }
    }
}
