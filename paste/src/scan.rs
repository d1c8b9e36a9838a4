//! Find image references in a document, for hosts that cannot select them by syntax scope.

use std::ops::Range;

use image_paste_core::ImageReference;
use image_paste_core::SyntaxKind;
use pulldown_cmark::Event;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;

const RST_IMAGE_DIRECTIVES: [&str; 2] = ["image::", "figure::"];

/// Image references in `text`, in document order.
///
/// Markdown regions span the whole `![alt](target)`; RST regions span the directive argument.
pub fn find_image_references(text: &str, kind: SyntaxKind) -> Vec<ImageReference> {
    match kind {
        SyntaxKind::Markdown => markdown_references(text),
        SyntaxKind::Rst => rst_references(text),
        SyntaxKind::PlainText => Vec::new(),
    }
}

fn markdown_references(text: &str) -> Vec<ImageReference> {
    Parser::new_ext(text, Options::empty())
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::Image { dest_url, .. }) if !dest_url.is_empty() => {
                Some(ImageReference::new(dest_url.to_string(), range))
            }
            _ => None,
        })
        .collect()
}

fn rst_references(text: &str) -> Vec<ImageReference> {
    let mut out = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if let Some(range) = rst_directive_argument(line) {
            let argument = &line[range.clone()];
            let raw = argument
                .strip_prefix('"')
                .and_then(|a| a.strip_suffix('"'))
                .unwrap_or(argument);
            out.push(ImageReference::new(
                raw,
                offset + range.start..offset + range.end,
            ));
        }
        offset += line.len();
    }
    out
}

/// Byte range of the argument of an `.. image::` / `.. figure::` directive on `line`,
/// substitution definitions (`.. |name| image::`) included.
fn rst_directive_argument(line: &str) -> Option<Range<usize>> {
    let indent = line.len() - line.trim_start().len();
    let after_marker = line[indent..].strip_prefix("..")?;
    if !after_marker.starts_with(char::is_whitespace) {
        return None;
    }
    let mut body = after_marker.trim_start();
    let mut pos = indent + 2 + (after_marker.len() - body.len());

    if let Some(substitution) = body.strip_prefix('|') {
        let close = substitution.find('|')?;
        let after_name = &substitution[close + 1..];
        let trimmed = after_name.trim_start();
        pos += 1 + close + 1 + (after_name.len() - trimmed.len());
        body = trimmed;
    }

    let directive = RST_IMAGE_DIRECTIVES
        .iter()
        .find(|directive| body.starts_with(**directive))?;
    let start = pos + directive.len();
    let rest = &line[start..];
    let argument = rest.trim();
    if argument.is_empty() {
        return None;
    }
    let start = start + (rest.len() - rest.trim_start().len());
    Some(start..start + argument.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_paste_core::ByteRange;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_markdown_images_with_regions() {
        let text = "# Notes\n\nSee ![shot](img/a.png) and ![](<my shot.png>).\n[link](x.png)\n";
        let refs = find_image_references(text, SyntaxKind::Markdown);
        assert_eq!(
            refs.iter().map(|r| r.raw_path.as_str()).collect::<Vec<_>>(),
            vec!["img/a.png", "my shot.png"]
        );
        let first = refs[0].region;
        assert_eq!(&text[first.start..first.end], "![shot](img/a.png)");
    }

    #[test]
    fn markdown_ignores_code_spans() {
        let text = "`![not](an/image.png)`\n";
        assert!(find_image_references(text, SyntaxKind::Markdown).is_empty());
    }

    #[test]
    fn finds_rst_directives() {
        let text = "Title\n=====\n\n.. image:: img/a.png\n   :width: 200\n\n  .. figure:: \"my shot.png\"\n\n.. |logo| image:: logo.png\n.. note:: image:: not.png\n";
        let refs = find_image_references(text, SyntaxKind::Rst);
        assert_eq!(
            refs.iter().map(|r| r.raw_path.as_str()).collect::<Vec<_>>(),
            vec!["img/a.png", "my shot.png", "logo.png"]
        );
        let ByteRange { start, end } = refs[0].region;
        assert_eq!(&text[start..end], "img/a.png");
        let ByteRange { start, end } = refs[1].region;
        assert_eq!(&text[start..end], "\"my shot.png\"");
    }

    #[test]
    fn plain_text_has_no_references() {
        assert!(find_image_references("![a](b.png)", SyntaxKind::PlainText).is_empty());
    }
}
