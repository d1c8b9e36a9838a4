//! Save the clipboard image next to the document and insert a reference to it.

use std::path::Path;
use std::path::PathBuf;

use chrono::DateTime;
use chrono::Local;
use image::DynamicImage;
use image_paste_core::EncodedImageFormat;
use image_paste_core::Insertion;
use image_paste_core::PasteContext;
use image_paste_core::SyntaxKind;
use image_paste_core::reference_for;
use image_paste_core::resolve_root_dir;

use crate::collaborators::CapturedImage;
use crate::collaborators::ClipboardSource;
use crate::collaborators::EditorSink;
use crate::collaborators::FileStore;
use crate::collaborators::ImageCodec;
use crate::settings::LAST_USED_DIR_KEY;

const SCREENSHOT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H%M%S";

/// Encodings tried for raw clipboard pixels, in order of preference.
const ENCODE_PREFERENCE: [(EncodedImageFormat, &str); 2] = [
    (EncodedImageFormat::Png, "png"),
    (EncodedImageFormat::Jpeg, "jpg"),
];

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to save image in any of the supported formats")]
    NoSupportedFormat,
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

/// Per-invocation inputs of a capture.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub context: PasteContext,
    /// Syntax at the first caret.
    pub syntax: SyntaxKind,
    /// Ask for the final filename before inserting the reference.
    pub confirm_filename: bool,
    /// Where the image goes when no root directory can be resolved.
    pub fallback_root: PathBuf,
    pub now: DateTime<Local>,
}

impl CaptureRequest {
    pub fn new(context: PasteContext, syntax: SyntaxKind) -> Self {
        Self {
            context,
            syntax,
            confirm_filename: true,
            fallback_root: dirs::home_dir().unwrap_or_else(std::env::temp_dir),
            now: Local::now(),
        }
    }
}

#[derive(Debug)]
pub enum CaptureOutcome {
    /// The clipboard held no image; nothing was written.
    NoImage,
    Inserted {
        path: PathBuf,
        reference: Insertion,
    },
    /// The user dismissed the filename prompt. `cleanup` reports whether the saved file could
    /// be removed again; callers are free to ignore it.
    Cancelled { cleanup: anyhow::Result<()> },
}

/// An image already written into its root directory, waiting for filename confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub path: PathBuf,
    pub root: PathBuf,
    created_root: bool,
}

pub struct ImageCaptureWorkflow<C, F, I> {
    clipboard: C,
    store: F,
    codec: I,
}

impl<C, F, I> ImageCaptureWorkflow<C, F, I>
where
    C: ClipboardSource,
    F: FileStore,
    I: ImageCodec,
{
    pub fn new(clipboard: C, store: F, codec: I) -> Self {
        Self {
            clipboard,
            store,
            codec,
        }
    }

    /// Run the whole paste: save the clipboard image, optionally confirm its filename through
    /// `sink`, then insert the reference at the caret.
    pub fn capture(
        &mut self,
        request: &CaptureRequest,
        sink: &mut impl EditorSink,
    ) -> Result<CaptureOutcome, CaptureError> {
        let Some(saved) = self.save_clipboard_image(request)? else {
            return Ok(CaptureOutcome::NoImage);
        };

        if !request.confirm_filename {
            let reference = insert_reference(sink, &saved.path, request);
            return Ok(CaptureOutcome::Inserted {
                path: saved.path,
                reference,
            });
        }

        let default = saved.path.to_string_lossy().into_owned();
        match sink.prompt_filename(&default) {
            Some(input) => self.confirm(saved, &input, request, sink),
            None => Ok(CaptureOutcome::Cancelled {
                cleanup: self.discard(&saved),
            }),
        }
    }

    /// Grab the clipboard image and persist it under the resolved root directory.
    ///
    /// Returns `Ok(None)` when the clipboard holds no image.
    pub fn save_clipboard_image(
        &mut self,
        request: &CaptureRequest,
    ) -> Result<Option<SavedImage>, CaptureError> {
        let Some(captured) = self.clipboard.grab() else {
            return Ok(None);
        };

        let root = match resolve_root_dir(&request.context) {
            Ok(root) => root,
            Err(err) => {
                tracing::warn!(
                    "{err}; saving to {} instead",
                    request.fallback_root.display()
                );
                request.fallback_root.clone()
            }
        };

        let created_root = !self.store.exists(&root);
        let path = self.persist(&captured, &root, request.now)?;
        tracing::debug!("saved clipboard image to {}", path.display());
        Ok(Some(SavedImage {
            path,
            root,
            created_root,
        }))
    }

    /// Finish a paste with the filename the user settled on.
    ///
    /// An empty `input` counts as cancelling. Relative names are taken relative to the root
    /// directory the image was saved in. Once the file is in place, its directory is remembered
    /// for the next paste.
    pub fn confirm(
        &self,
        saved: SavedImage,
        input: &str,
        request: &CaptureRequest,
        sink: &mut impl EditorSink,
    ) -> Result<CaptureOutcome, CaptureError> {
        if input.is_empty() {
            return Ok(CaptureOutcome::Cancelled {
                cleanup: self.discard(&saved),
            });
        }

        let target = saved.root.join(input);
        if target != saved.path {
            if let Some(dir) = target.parent() {
                self.store.make_dirs(dir)?;
            }
            self.store.move_file(&saved.path, &target)?;
        }
        if let Some(dir) = target.parent() {
            sink.set_persistent_setting(LAST_USED_DIR_KEY, &dir.to_string_lossy());
        }

        let reference = insert_reference(sink, &target, request);
        Ok(CaptureOutcome::Inserted {
            path: target,
            reference,
        })
    }

    /// Undo [`Self::save_clipboard_image`]: delete the file, and its directory when this paste
    /// created it and nothing else has been put there since.
    pub fn discard(&self, saved: &SavedImage) -> anyhow::Result<()> {
        self.store.remove_file(&saved.path)?;
        if saved.created_root {
            self.store.remove_empty_dir(&saved.root)?;
        }
        Ok(())
    }

    fn persist(
        &self,
        captured: &CapturedImage,
        root: &Path,
        now: DateTime<Local>,
    ) -> Result<PathBuf, CaptureError> {
        if let Some(source) = captured.source_path.as_deref() {
            return self.copy_source_file(source, root);
        }

        let stem = format!("Screenshot {}", now.format(SCREENSHOT_TIMESTAMP_FORMAT));
        let (extension, bytes) = self.encode_first_supported(&captured.image)?;
        let temp = self.store.write_temp(&bytes, extension)?;

        let moved = self.store.make_dirs(root).and_then(|()| {
            let target = unique_destination(&self.store, root, &stem, Some(extension));
            self.store.move_file(&temp, &target).map(|()| target)
        });
        match moved {
            Ok(target) => Ok(target),
            Err(err) => {
                if let Err(cleanup_err) = self.store.remove_file(&temp) {
                    tracing::warn!("failed to clean up {}: {cleanup_err}", temp.display());
                }
                Err(err.into())
            }
        }
    }

    fn copy_source_file(&self, source: &Path, root: &Path) -> Result<PathBuf, CaptureError> {
        let Some(stem) = source.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            return Err(anyhow::anyhow!("clipboard file has no name: {}", source.display()).into());
        };
        let extension = source
            .extension()
            .map(|e| e.to_string_lossy().into_owned());

        // The saved path never aliases `source`; a file already in `root` gets a numbered copy.
        self.store.make_dirs(root)?;
        let target = unique_destination(&self.store, root, &stem, extension.as_deref());
        self.store.copy_file(source, &target)?;
        Ok(target)
    }

    fn encode_first_supported(
        &self,
        image: &DynamicImage,
    ) -> Result<(&'static str, Vec<u8>), CaptureError> {
        for (format, extension) in ENCODE_PREFERENCE {
            match self.codec.encode(image, format) {
                Ok(bytes) => {
                    tracing::debug!("encoded clipboard image as {}", format.label());
                    return Ok((extension, bytes));
                }
                Err(err) => {
                    tracing::debug!("cannot encode clipboard image as {}: {err}", format.label());
                }
            }
        }
        Err(CaptureError::NoSupportedFormat)
    }
}

/// First of `stem.ext`, `stem (2).ext`, `stem (3).ext`, … that does not exist yet.
fn unique_destination(
    store: &impl FileStore,
    root: &Path,
    stem: &str,
    extension: Option<&str>,
) -> PathBuf {
    for idx in 1u32.. {
        let name = match (idx, extension) {
            (1, Some(ext)) => format!("{stem}.{ext}"),
            (1, None) => stem.to_string(),
            (n, Some(ext)) => format!("{stem} ({n}).{ext}"),
            (n, None) => format!("{stem} ({n})"),
        };
        let candidate = root.join(name);
        if !store.exists(&candidate) {
            return candidate;
        }
    }

    unreachable!("destination index overflow");
}

/// Reference text for `path`: relative to the document when it has been saved, with `/` as
/// the separator on every platform.
pub fn reference_path(path: &Path, document_path: Option<&Path>) -> String {
    let relative = document_path
        .and_then(Path::parent)
        .and_then(|doc_dir| pathdiff::diff_paths(path, doc_dir));
    relative
        .as_deref()
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn insert_reference(
    sink: &mut impl EditorSink,
    path: &Path,
    request: &CaptureRequest,
) -> Insertion {
    let text = reference_path(path, request.context.document_path.as_deref());
    let insertion = reference_for(request.syntax, &text);
    sink.insert(&insertion);
    insertion
}
