// markdown2html — Markdown to HTML converter driven by a renderer trait.
//
// Architecture:
//   markdown bytes → first pass (reference extraction + normalization)
//   → block parser → inline tokenizer → `Render` callbacks → HTML
//
// The grammar is traditional Markdown with opt-in extensions (tables,
// fenced code, autolinks, strikethrough, superscript, …). Parsing is
// byte-oriented and never decodes codepoints; UTF-8 input passes through
// unharmed. Unrecognized syntax is emitted verbatim; no input fails to
// render.

mod autolink;
mod buffer;
mod parse;
mod render;

pub use autolink::{is_safe, AutolinkFlags};
pub use buffer::{Buffer, BufferError, MAX_ALLOC};
pub use parse::{Extensions, Markdown};
pub use render::html::{is_html_tag, Html, HtmlFlags, HtmlTag, Toc};
pub use render::smartypants::smartypants;
pub use render::{AutolinkKind, Callbacks, ListFlags, Render, TableFlags};

/// Nesting budget used by the convenience entry points. Most documents
/// stay in the single digits.
pub const DEFAULT_MAX_NESTING: usize = 16;

/// Library version as a `(major, minor, patch)` triple.
pub fn version() -> (u32, u32, u32) {
    (
        env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
        env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
        env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
    )
}

/// Render a Markdown string to HTML with no extensions and default
/// renderer settings.
///
/// # Examples
///
/// ```
/// let html = markdown2html::to_html("# Hello\n");
/// assert_eq!(html, "<h1>Hello</h1>\n");
/// ```
pub fn to_html(markdown: &str) -> String {
    to_html_with(markdown, Extensions::empty(), HtmlFlags::empty())
}

/// Render a Markdown string to HTML with the given extensions and
/// renderer flags.
///
/// # Examples
///
/// ```
/// use markdown2html::{to_html_with, Extensions, HtmlFlags};
///
/// let html = to_html_with("~~gone~~\n", Extensions::STRIKETHROUGH, HtmlFlags::empty());
/// assert_eq!(html, "<p><del>gone</del></p>\n");
/// ```
pub fn to_html_with(markdown: &str, extensions: Extensions, flags: HtmlFlags) -> String {
    let mut engine = Markdown::new(extensions, DEFAULT_MAX_NESTING, Html::new(flags));
    let mut ob = Buffer::new(64);
    engine.render(&mut ob, markdown.as_bytes());
    String::from_utf8_lossy(&ob).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(to_html(""), "");
    }

    #[test]
    fn test_simple_paragraph() {
        assert_eq!(to_html("Hello, world!\n"), "<p>Hello, world!</p>\n");
    }

    #[test]
    fn test_version_matches_manifest() {
        let (major, minor, _) = version();
        assert_eq!(major, 0);
        assert_eq!(minor, 1);
    }

    #[test]
    fn test_engine_is_reusable() {
        let mut engine = Markdown::new(Extensions::empty(), 16, Html::default());

        let mut first = Buffer::new(64);
        engine.render(&mut first, b"*one*\n");
        let mut second = Buffer::new(64);
        engine.render(&mut second, b"*two*\n");

        assert_eq!(&first[..], b"<p><em>one</em></p>\n");
        assert_eq!(&second[..], b"<p><em>two</em></p>\n");
    }
}
