use crate::escape::escape_for_markdown;
use crate::escape::escape_for_rst;

const MARKDOWN_SCOPE: &str = "text.html.markdown";
const RST_SCOPE: &str = "text.restructuredtext";

/// Markup language at the caret, which decides how a reference is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyntaxKind {
    Markdown,
    Rst,
    #[default]
    PlainText,
}

impl SyntaxKind {
    /// Classify a host scope name such as `text.html.markdown meta.paragraph.markdown`.
    pub fn from_scope(scope: &str) -> Self {
        if scope.contains(MARKDOWN_SCOPE) {
            SyntaxKind::Markdown
        } else if scope.contains(RST_SCOPE) {
            SyntaxKind::Rst
        } else {
            SyntaxKind::PlainText
        }
    }
}

/// Text to hand to the editor: snippets may carry a `$0` tab stop, plain text is literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    Snippet(String),
    Text(String),
}

impl Insertion {
    pub fn as_str(&self) -> &str {
        match self {
            Insertion::Snippet(text) | Insertion::Text(text) => text,
        }
    }
}

/// Build the reference for `path` (already using `/` separators) in the given syntax.
///
/// The caret lands on the alt text for Markdown and in front of the directive name for RST, so
/// the user can type a description or turn `image::` into `figure::`.
pub fn reference_for(kind: SyntaxKind, path: &str) -> Insertion {
    match kind {
        SyntaxKind::Markdown => Insertion::Snippet(format!(
            "![$0]({})",
            escape_snippet_literal(&escape_for_markdown(path))
        )),
        SyntaxKind::Rst => Insertion::Snippet(format!(
            ".. $0image:: {}",
            escape_snippet_literal(&escape_for_rst(path))
        )),
        SyntaxKind::PlainText => Insertion::Text(path.to_string()),
    }
}

fn escape_snippet_literal(text: &str) -> String {
    text.replace('\\', "\\\\").replace('$', "\\$")
}
