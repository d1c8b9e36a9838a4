//! User settings, read from a TOML file.
//!
//! Only `image_paste_last_used_dir` is ever written back; edits keep the rest of the file
//! (comments included) intact.

use std::io::ErrorKind;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use image_paste_core::PasteContext;
use toml_edit::DocumentMut;
use toml_edit::Item as TomlItem;

use crate::fs_store::replace_atomically;

pub const IMAGE_PASTE_FOLDER_KEY: &str = "image_paste_folder";
pub const LAST_USED_DIR_KEY: &str = "image_paste_last_used_dir";
pub const CONFIRM_FILENAME_KEY: &str = "confirm_filename";
pub const LEAVE_MY_KEYS_ALONE_KEY: &str = "leave_my_keys_alone";
pub const PREVIEW_WIDTH_EMS_KEY: &str = "preview_width_ems";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Where images go: absolute, relative to the document, or `//`-prefixed to be relative
    /// to the first workspace folder.
    pub image_paste_folder: Option<String>,
    pub image_paste_last_used_dir: Option<PathBuf>,
    pub confirm_filename: bool,
    /// Keep the host's plain `paste` command untouched.
    pub leave_my_keys_alone: bool,
    /// Maximum preview width, in multiples of the editor's em width.
    pub preview_width_ems: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image_paste_folder: None,
            image_paste_last_used_dir: None,
            confirm_filename: true,
            leave_my_keys_alone: false,
            preview_width_ems: 60,
        }
    }
}

impl Settings {
    pub fn paste_context(
        &self,
        document_path: Option<PathBuf>,
        workspace_folders: Option<Vec<PathBuf>>,
    ) -> PasteContext {
        PasteContext {
            root_dir_setting: self.image_paste_folder.clone(),
            last_used_dir: self.image_paste_last_used_dir.clone(),
            document_path,
            workspace_folders,
        }
    }

    /// Preview width cap in pixels for an editor whose em is `em_width` pixels wide.
    pub fn preview_max_width(&self, em_width: f64) -> u32 {
        (f64::from(self.preview_width_ems) * em_width).max(0.0) as u32
    }

    fn from_document(doc: &DocumentMut) -> Self {
        let defaults = Self::default();
        Self {
            image_paste_folder: read_str(doc, IMAGE_PASTE_FOLDER_KEY).map(str::to_string),
            image_paste_last_used_dir: read_str(doc, LAST_USED_DIR_KEY)
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            confirm_filename: read_bool(doc, CONFIRM_FILENAME_KEY)
                .unwrap_or(defaults.confirm_filename),
            leave_my_keys_alone: read_bool(doc, LEAVE_MY_KEYS_ALONE_KEY)
                .unwrap_or(defaults.leave_my_keys_alone),
            preview_width_ems: read_value(doc, PREVIEW_WIDTH_EMS_KEY)
                .and_then(toml_edit::Value::as_integer)
                .and_then(|ems| u32::try_from(ems).ok())
                .unwrap_or(defaults.preview_width_ems),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn new_default() -> anyhow::Result<Self> {
        let Some(home) = dirs::home_dir() else {
            anyhow::bail!("cannot determine home directory for settings path");
        };
        Ok(Self::new(default_settings_path(&home)))
    }

    /// Load settings; a missing file yields defaults and an unparsable one is ignored.
    pub fn load(&self) -> anyhow::Result<Settings> {
        let Some(content) = read_document_string(&self.path)? else {
            return Ok(Settings::default());
        };
        match content.parse::<DocumentMut>() {
            Ok(doc) => Ok(Settings::from_document(&doc)),
            Err(err) => {
                tracing::warn!("ignoring invalid settings in {}: {err}", self.path.display());
                Ok(Settings::default())
            }
        }
    }

    pub fn set_last_used_dir(&self, dir: &Path) -> anyhow::Result<()> {
        self.set_string(LAST_USED_DIR_KEY, &dir.to_string_lossy())
    }

    /// Set a top-level string setting, preserving the rest of the file.
    ///
    /// Refuses to touch a file that does not parse rather than clobbering it.
    pub fn set_string(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let content = read_document_string(&self.path)?.unwrap_or_default();
        let mut doc = content
            .parse::<DocumentMut>()
            .with_context(|| format!("parse {}", self.path.display()))?;
        doc[key] = toml_edit::value(value);
        replace_atomically(&self.path, |tmp| {
            tmp.write_all(doc.to_string().as_bytes())
                .with_context(|| format!("write {}", self.path.display()))
        })
    }
}

fn default_settings_path(home: &Path) -> PathBuf {
    home.join(".image-paste").join("settings.toml")
}

fn read_value<'a>(doc: &'a DocumentMut, key: &str) -> Option<&'a toml_edit::Value> {
    doc.get(key).and_then(TomlItem::as_value)
}

fn read_str<'a>(doc: &'a DocumentMut, key: &str) -> Option<&'a str> {
    read_value(doc, key).and_then(toml_edit::Value::as_str)
}

fn read_bool(doc: &DocumentMut, key: &str) -> Option<bool> {
    read_value(doc, key).and_then(toml_edit::Value::as_bool)
}

fn read_document_string(path: &Path) -> anyhow::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(anyhow::Error::new(err).context(format!("read {}", path.display()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SettingsStore::new(dir.path().join("settings.toml"));
        assert_eq!(store.load().expect("load"), Settings::default());
    }

    #[test]
    fn reads_all_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            r#"image_paste_folder = "//assets"
image_paste_last_used_dir = "/tmp/shots"
confirm_filename = false
leave_my_keys_alone = true
preview_width_ems = 40
"#,
        )
        .expect("write settings");

        let settings = SettingsStore::new(path).load().expect("load");
        assert_eq!(
            settings,
            Settings {
                image_paste_folder: Some("//assets".to_string()),
                image_paste_last_used_dir: Some(PathBuf::from("/tmp/shots")),
                confirm_filename: false,
                leave_my_keys_alone: true,
                preview_width_ems: 40,
            }
        );
    }

    #[test]
    fn wrong_types_fall_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "confirm_filename = \"no\"\npreview_width_ems = -3\n")
            .expect("write settings");

        assert_eq!(
            SettingsStore::new(path).load().expect("load"),
            Settings::default()
        );
    }

    #[test]
    fn invalid_toml_is_ignored_on_load_but_not_overwritten() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[broken\n").expect("write settings");

        let store = SettingsStore::new(path.clone());
        assert_eq!(store.load().expect("load"), Settings::default());
        assert!(store.set_last_used_dir(Path::new("/tmp/x")).is_err());
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "[broken\n");
    }

    #[test]
    fn persisting_last_used_dir_preserves_comments() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "# where screenshots go\nimage_paste_folder = \"img\" # keep me\n",
        )
        .expect("write settings");

        let store = SettingsStore::new(path.clone());
        store
            .set_last_used_dir(Path::new("/home/me/notes/img"))
            .expect("persist");

        let updated = std::fs::read_to_string(&path).expect("read updated");
        assert!(updated.contains("# where screenshots go"));
        assert!(updated.contains("# keep me"));
        let settings = store.load().expect("load");
        assert_eq!(settings.image_paste_folder.as_deref(), Some("img"));
        assert_eq!(
            settings.image_paste_last_used_dir,
            Some(PathBuf::from("/home/me/notes/img"))
        );
    }

    #[test]
    fn paste_context_carries_settings_and_view_state() {
        let settings = Settings {
            image_paste_folder: Some("img".to_string()),
            image_paste_last_used_dir: Some(PathBuf::from("/tmp/last")),
            ..Settings::default()
        };
        let context = settings.paste_context(Some(PathBuf::from("/a/doc.md")), None);
        assert_eq!(
            context,
            PasteContext {
                root_dir_setting: Some("img".to_string()),
                last_used_dir: Some(PathBuf::from("/tmp/last")),
                document_path: Some(PathBuf::from("/a/doc.md")),
                workspace_folders: None,
            }
        );
    }

    #[test]
    fn preview_width_scales_with_em_width() {
        assert_eq!(Settings::default().preview_max_width(8.5), 510);
    }

    #[test]
    fn default_settings_path_uses_home_dir() {
        let home = Path::new("home");
        assert_eq!(
            default_settings_path(home),
            home.join(".image-paste").join("settings.toml")
        );
    }
}
