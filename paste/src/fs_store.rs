use std::fs::File;
use std::io::ErrorKind;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use tempfile::NamedTempFile;

use crate::collaborators::FileStore;

/// [`FileStore`] backed by `std::fs`, staging new files in the system temp directory.
///
/// Files only ever appear at their destination complete: copies and cross-filesystem moves
/// are written to a sibling temp file first and renamed into place.
#[derive(Debug, Clone, Default)]
pub struct StdFileStore {
    temp_dir: Option<PathBuf>,
}

impl StdFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage temporary files under `dir` instead of the system temp directory.
    pub fn with_temp_dir(dir: PathBuf) -> Self {
        Self {
            temp_dir: Some(dir),
        }
    }
}

impl FileStore for StdFileStore {
    fn copy_file(&self, src: &Path, dest: &Path) -> anyhow::Result<()> {
        let mut source = File::open(src).with_context(|| format!("open {}", src.display()))?;
        replace_atomically(dest, |tmp| {
            std::io::copy(&mut source, tmp)
                .with_context(|| format!("copy {} to {}", src.display(), dest.display()))?;
            Ok(())
        })
    }

    fn write_temp(&self, bytes: &[u8], extension: &str) -> anyhow::Result<PathBuf> {
        let suffix = format!(".{extension}");
        let mut builder = tempfile::Builder::new();
        builder.prefix("image-paste-").suffix(&suffix);
        let mut tmp = match self.temp_dir.as_deref() {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .context("create temp file")?;
        tmp.write_all(bytes).context("write temp file")?;
        tmp.flush().context("flush temp file")?;

        let path = tmp.into_temp_path().keep().context("keep temp file")?;
        Ok(path)
    }

    fn move_file(&self, src: &Path, dest: &Path) -> anyhow::Result<()> {
        move_with(src, dest, rename)
    }

    fn make_dirs(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(path).with_context(|| format!("create {}", path.display()))
    }

    fn remove_file(&self, path: &Path) -> anyhow::Result<()> {
        std::fs::remove_file(path).with_context(|| format!("remove {}", path.display()))
    }

    fn remove_empty_dir(&self, path: &Path) -> anyhow::Result<()> {
        let mut entries =
            std::fs::read_dir(path).with_context(|| format!("read {}", path.display()))?;
        if entries.next().is_some() {
            return Ok(());
        }
        std::fs::remove_dir(path).with_context(|| format!("remove {}", path.display()))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

fn rename(from: &Path, to: &Path) -> std::io::Result<()> {
    std::fs::rename(from, to)
}

fn move_with(
    src: &Path,
    dest: &Path,
    try_rename: impl Fn(&Path, &Path) -> std::io::Result<()>,
) -> anyhow::Result<()> {
    match try_rename(src, dest) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::CrossesDevices => {
            tracing::debug!(
                "{} is on another filesystem than {}; copying",
                src.display(),
                dest.display()
            );
            StdFileStore::new().copy_file(src, dest)?;
            std::fs::remove_file(src).with_context(|| format!("remove {}", src.display()))
        }
        Err(err) => Err(anyhow::Error::new(err)
            .context(format!("move {} to {}", src.display(), dest.display()))),
    }
}

/// Fill a temp file next to `dest` with `fill`, then rename it over `dest`.
///
/// On failure the temp file is dropped and `dest` is left untouched.
pub(crate) fn replace_atomically(
    dest: &Path,
    fill: impl FnOnce(&mut NamedTempFile) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) else {
        anyhow::bail!("no parent directory for {}", dest.display());
    };
    std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    fill(&mut tmp)?;
    tmp.flush().context("flush temp file")?;
    tmp.persist(dest).map_err(|err| {
        anyhow::Error::new(err.error).context(format!("persist {}", dest.display()))
    })?;
    Ok(())
}
