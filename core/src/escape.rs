//! Escaping of image paths for the markup languages references are inserted into.

use percent_encoding::utf8_percent_encode;

use crate::file_uri::URI_PATH_SAFE;

/// Escape `path` for use as a Markdown image target.
///
/// Paths containing whitespace are wrapped in angle brackets, with literal `<` and `>`
/// percent-encoded so they cannot close the bracket early. Anything else is returned as is.
pub fn escape_for_markdown(path: &str) -> String {
    if path.chars().any(char::is_whitespace) {
        format!("<{}>", path.replace('<', "%3C").replace('>', "%3E"))
    } else {
        path.to_string()
    }
}

/// Escape `path` for use as the argument of a reStructuredText `image::`/`figure::` directive.
///
/// Bare when every character is in `[A-Za-z0-9_\-./]`, double-quoted when it additionally only
/// uses whitespace and `!@%&()=+,;`, percent-encoded otherwise.
pub fn escape_for_rst(path: &str) -> String {
    if !path.is_empty() && path.chars().all(is_rst_bare) {
        return path.to_string();
    }
    if !path.is_empty() && path.chars().all(|c| is_rst_bare(c) || is_rst_quotable(c)) {
        return format!("\"{path}\"");
    }
    utf8_percent_encode(path, URI_PATH_SAFE).to_string()
}

fn is_rst_bare(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/')
}

fn is_rst_quotable(c: char) -> bool {
    c.is_whitespace() || matches!(c, '!' | '@' | '%' | '&' | '(' | ')' | '=' | '+' | ',' | ';')
}
