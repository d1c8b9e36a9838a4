//! Decide which directory a freshly pasted image is saved into.
//!
//! Precedence, first match wins:
//!
//! 1. an `image_paste_folder` setting starting with `//` is relative to the first workspace folder;
//! 2. an absolute setting is used verbatim;
//! 3. any other setting is relative to the document's directory;
//! 4. the last directory a paste was confirmed into, while it still exists;
//! 5. the document's directory;
//! 6. the first workspace folder.
//!
//! Rules 1–3 fail outright when their anchor is missing instead of falling through, so a
//! configured folder is never silently ignored.

use std::path::Path;
use std::path::PathBuf;

use path_absolutize::Absolutize;

/// Prefix marking an `image_paste_folder` value as relative to the first workspace folder.
pub const WORKSPACE_RELATIVE_MARKER: &str = "//";

/// Everything root resolution looks at. Built fresh by the host for every paste.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteContext {
    /// Raw `image_paste_folder` setting. Empty counts as unset.
    pub root_dir_setting: Option<String>,
    /// Directory the previous confirmed paste went to. May no longer exist.
    pub last_used_dir: Option<PathBuf>,
    /// Path of the document being edited; `None` while it has never been saved.
    pub document_path: Option<PathBuf>,
    /// Folders of the window the view lives in; `None` when the view is detached.
    pub workspace_folders: Option<Vec<PathBuf>>,
}

impl PasteContext {
    fn setting(&self) -> Option<&str> {
        self.root_dir_setting.as_deref().filter(|s| !s.is_empty())
    }

    fn document_dir(&self) -> Option<&Path> {
        self.document_path
            .as_deref()
            .map(|path| path.parent().unwrap_or_else(|| Path::new(".")))
    }

    fn first_workspace_folder(&self) -> Option<&Path> {
        self.workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .map(PathBuf::as_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RootDirError {
    #[error(
        "window has no folders attached to it but image_paste_folder ({setting:?}) is set to be relative to one"
    )]
    NoWorkspaceFolder { setting: String },
    #[error("view is detached but image_paste_folder ({setting:?}) is set to be relative to one")]
    DetachedView { setting: String },
    #[error("view is unnamed but image_paste_folder ({setting:?}) is set to be relative to one")]
    UnsavedDocument { setting: String },
    #[error("view is unnamed and image_paste_folder is not set")]
    NoResolvableRoot,
}

/// Resolve the root directory, checking the last-used directory against the filesystem.
pub fn resolve_root_dir(context: &PasteContext) -> Result<PathBuf, RootDirError> {
    resolve_root_dir_with(context, Path::is_dir)
}

/// Resolve the root directory with an injected existence probe for the last-used directory.
///
/// A last-used directory that vanished between the probe and the write is not an error here;
/// the caller recreates it.
pub fn resolve_root_dir_with(
    context: &PasteContext,
    dir_exists: impl Fn(&Path) -> bool,
) -> Result<PathBuf, RootDirError> {
    let resolved = if let Some(setting) = context.setting() {
        resolve_setting(context, setting)?
    } else if let Some(last_used) = context
        .last_used_dir
        .as_deref()
        .filter(|dir| !dir.as_os_str().is_empty() && dir_exists(dir))
    {
        last_used.to_path_buf()
    } else if let Some(document_dir) = context.document_dir() {
        document_dir.to_path_buf()
    } else if let Some(folder) = context.first_workspace_folder() {
        folder.to_path_buf()
    } else {
        return Err(RootDirError::NoResolvableRoot);
    };

    tracing::debug!("resolved image root dir {}", resolved.display());
    Ok(resolved)
}

fn resolve_setting(context: &PasteContext, setting: &str) -> Result<PathBuf, RootDirError> {
    if let Some(rest) = setting.strip_prefix(WORKSPACE_RELATIVE_MARKER) {
        let Some(folders) = context.workspace_folders.as_ref() else {
            return Err(RootDirError::DetachedView {
                setting: setting.to_string(),
            });
        };
        let Some(first) = folders.first() else {
            return Err(RootDirError::NoWorkspaceFolder {
                setting: setting.to_string(),
            });
        };
        if rest.is_empty() {
            return Ok(first.clone());
        }
        return Ok(first.join(rest));
    }

    let setting_path = Path::new(setting);
    if setting_path.is_absolute() {
        return Ok(setting_path.to_path_buf());
    }

    let Some(document_dir) = context.document_dir() else {
        return Err(RootDirError::UnsavedDocument {
            setting: setting.to_string(),
        });
    };
    match setting_path.absolutize_from(document_dir) {
        Ok(normalized) => Ok(normalized.into_owned()),
        Err(err) => {
            tracing::warn!(
                "failed to normalize {setting:?} against {}: {err}",
                document_dir.display()
            );
            Ok(document_dir.join(setting_path))
        }
    }
}
