//! Conversion between local `file:` URIs and native filesystem paths.
//!
//! Decoding accepts everything a host editor hands out for local files: POSIX paths
//! (`file:///home/x`), drive-letter paths in either colon or bar form (`file:///C:/x`,
//! `file:///C|/x`), UNC shares (`file://server/share/x`, `file://///server/share/x`) and the
//! explicit `localhost` authority. The result is normalized the way the target platform prints
//! paths: redundant separators and `.` segments are dropped, and Windows paths use backslashes.
//!
//! Both directions are parameterized by [`PathStyle`] so Windows conventions can be exercised
//! from any host; [`decode_file_uri`] and [`encode_file_uri`] use the native style.

use std::path::Path;
use std::path::PathBuf;

use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;
use percent_encoding::percent_decode_str;
use percent_encoding::percent_encode;

const FILE_SCHEME: &str = "file:";

/// Characters left alone when quoting a path for a URI: unreserved characters plus `/`.
pub(crate) const URI_PATH_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileUriError {
    #[error("URI does not start with 'file:': {uri:?}")]
    InvalidScheme { uri: String },
    #[error("URI is not absolute: {uri:?} (parsed so far: {parsed:?})")]
    NotAbsolute { uri: String, parsed: String },
    #[error("cannot express a relative path as a file URI: {path:?}")]
    RelativePath { path: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStyle {
    Posix,
    Windows,
}

impl PathStyle {
    pub const fn native() -> Self {
        if cfg!(windows) {
            PathStyle::Windows
        } else {
            PathStyle::Posix
        }
    }

    fn is_separator(self, byte: u8) -> bool {
        match self {
            PathStyle::Posix => byte == b'/',
            PathStyle::Windows => byte == b'/' || byte == b'\\',
        }
    }
}

/// Decode a `file:` URI into a native path.
pub fn decode_file_uri(uri: &str) -> Result<PathBuf, FileUriError> {
    let bytes = decode_to_bytes(uri, PathStyle::native())?;
    Ok(path_from_bytes(bytes))
}

/// Decode a `file:` URI into a path string following `style`'s conventions.
pub fn decode_file_uri_as(uri: &str, style: PathStyle) -> Result<String, FileUriError> {
    let bytes = decode_to_bytes(uri, style)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Encode an absolute native path as a `file:` URI. Inverse of [`decode_file_uri`].
pub fn encode_file_uri(path: &Path) -> Result<String, FileUriError> {
    encode_from_bytes(&path_to_bytes(path), PathStyle::native())
}

/// Encode an absolute path string written in `style` as a `file:` URI.
pub fn encode_file_uri_as(path: &str, style: PathStyle) -> Result<String, FileUriError> {
    encode_from_bytes(path.as_bytes(), style)
}

fn decode_to_bytes(uri: &str, style: PathStyle) -> Result<Vec<u8>, FileUriError> {
    let Some(rest) = uri.strip_prefix(FILE_SCHEME) else {
        return Err(FileUriError::InvalidScheme {
            uri: uri.to_string(),
        });
    };
    let decoded: Vec<u8> = percent_decode_str(rest).collect();

    // Empty or `localhost` authority collapses to a single leading slash.
    let mut path = if decoded.starts_with(b"///") {
        decoded[2..].to_vec()
    } else if decoded.starts_with(b"//localhost/") {
        decoded[11..].to_vec()
    } else {
        decoded
    };

    if style == PathStyle::Windows {
        strip_windows_prefix(&mut path);
    }

    if !is_absolute(&path, style) {
        return Err(FileUriError::NotAbsolute {
            uri: uri.to_string(),
            parsed: String::from_utf8_lossy(&path).into_owned(),
        });
    }
    Ok(normalize(&path, style))
}

/// Turn the URI form of a drive or UNC path into the path itself: the slash in front of a
/// drive letter or share belongs to the URI, and `C|` is an old spelling of `C:`.
fn strip_windows_prefix(path: &mut Vec<u8>) {
    if path.starts_with(b"///")
        || (path.first() == Some(&b'/') && matches!(path.get(2), Some(b':' | b'|')))
    {
        path.remove(0);
        if let Some(first) = path.first_mut() {
            first.make_ascii_uppercase();
        }
    }
    if path.get(1) == Some(&b'|') {
        path[1] = b':';
    }
}

fn encode_from_bytes(path: &[u8], style: PathStyle) -> Result<String, FileUriError> {
    if !is_absolute(path, style) {
        return Err(FileUriError::RelativePath {
            path: String::from_utf8_lossy(path).into_owned(),
        });
    }
    let normalized = normalize(path, style);
    match style {
        PathStyle::Posix => Ok(format!(
            "file://{}",
            percent_encode(&normalized, URI_PATH_SAFE)
        )),
        PathStyle::Windows => {
            let forward: Vec<u8> = normalized
                .iter()
                .map(|b| if *b == b'\\' { b'/' } else { *b })
                .collect();
            if drive_letter(&forward) {
                let drive = String::from_utf8_lossy(&forward[..2]);
                Ok(format!(
                    "file:///{drive}{}",
                    percent_encode(&forward[2..], URI_PATH_SAFE)
                ))
            } else {
                Ok(format!("file:{}", percent_encode(&forward, URI_PATH_SAFE)))
            }
        }
    }
}

fn drive_letter(path: &[u8]) -> bool {
    path.len() >= 2 && path[0].is_ascii_alphabetic() && path[1] == b':'
}

/// Byte length of `\\server\share` when `path` starts with a UNC prefix.
fn unc_prefix_len(path: &[u8]) -> Option<usize> {
    let style = PathStyle::Windows;
    if path.len() < 3 || !style.is_separator(path[0]) || !style.is_separator(path[1]) {
        return None;
    }
    if style.is_separator(path[2]) {
        return None;
    }
    let server_end = 2 + path[2..].iter().position(|b| style.is_separator(*b))?;
    let share_start = server_end + 1;
    let share_len = path[share_start..]
        .iter()
        .position(|b| style.is_separator(*b))
        .unwrap_or(path.len() - share_start);
    if share_len == 0 {
        return None;
    }
    Some(share_start + share_len)
}

fn is_absolute(path: &[u8], style: PathStyle) -> bool {
    match style {
        PathStyle::Posix => path.first() == Some(&b'/'),
        PathStyle::Windows => {
            if drive_letter(path) {
                return path.get(2).is_some_and(|b| style.is_separator(*b));
            }
            unc_prefix_len(path).is_some()
        }
    }
}

fn normalize(path: &[u8], style: PathStyle) -> Vec<u8> {
    let (mut out, rest, separator) = match style {
        PathStyle::Posix => {
            let leading = path.iter().take_while(|b| **b == b'/').count();
            let root: &[u8] = match leading {
                0 => b"",
                2 => b"//",
                _ => b"/",
            };
            (root.to_vec(), &path[leading..], b'/')
        }
        PathStyle::Windows => {
            if drive_letter(path) {
                let mut out = path[..2].to_vec();
                if path.get(2).is_some_and(|b| style.is_separator(*b)) {
                    out.push(b'\\');
                }
                (out, &path[2..], b'\\')
            } else if let Some(len) = unc_prefix_len(path) {
                let mut out = b"\\\\".to_vec();
                out.extend(
                    path[2..len]
                        .iter()
                        .map(|b| if style.is_separator(*b) { b'\\' } else { *b }),
                );
                out.push(b'\\');
                (out, &path[len..], b'\\')
            } else {
                (Vec::new(), path, b'\\')
            }
        }
    };

    let mut first = true;
    for part in rest
        .split(|b| style.is_separator(*b))
        .filter(|part| !part.is_empty() && *part != b".")
    {
        if !first {
            out.push(separator);
        }
        out.extend_from_slice(part);
        first = false;
    }
    out
}

#[cfg(unix)]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;
    PathBuf::from(OsString::from_vec(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: Vec<u8>) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(unix)]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().to_vec()
}

#[cfg(not(unix))]
fn path_to_bytes(path: &Path) -> Vec<u8> {
    path.to_string_lossy().into_owned().into_bytes()
}
