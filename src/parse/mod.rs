// Parsing engine.
//
// Two passes over the document: the first strips reference definitions into
// the table while normalizing the text (tab expansion, newline collapse,
// BOM skip); the second runs the block dispatcher over the normalized
// bytes, which recurses into the inline tokenizer for span content. All
// output goes through the renderer's callbacks.

pub(crate) mod block;
pub(crate) mod inline;
pub(crate) mod refs;

use bitflags::bitflags;

use crate::buffer::{Buffer, WorkPool};
use crate::render::{Callbacks, Render};
use refs::RefTable;

bitflags! {
    /// Opt-in grammar extensions.
    ///
    /// Bit values are stable; bit 5 is reserved.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Extensions: u32 {
        /// `foo_bar_baz` stays plain; emphasis needs word boundaries.
        const NO_INTRA_EMPHASIS = 1 << 0;
        const TABLES = 1 << 1;
        const FENCED_CODE = 1 << 2;
        /// Recognize bare `http://…`, `www.…`, and e-mail autolinks.
        const AUTOLINK = 1 << 3;
        /// `~~text~~`.
        const STRIKETHROUGH = 1 << 4;
        /// Require a space between `#` and an ATX header title.
        const SPACE_HEADERS = 1 << 6;
        /// `^text` / `^(text)`.
        const SUPERSCRIPT = 1 << 7;
        /// Markdown-1.0-style early paragraph termination.
        const LAX_SPACING = 1 << 8;
    }
}

// Inline handler selected per byte by the active-character table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharKind {
    None,
    Emphasis,
    Codespan,
    Linebreak,
    Link,
    Langle,
    Escape,
    Entity,
    AutolinkUrl,
    AutolinkEmail,
    AutolinkWww,
    Superscript,
}

// Scratch-buffer starting sizes per scope.
const BLOCK_BUF_UNIT: usize = 256;
const SPAN_BUF_UNIT: usize = 64;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// The markdown engine: immutable configuration plus per-render state,
/// reusable across documents.
///
/// One `render` call owns the engine for its duration; use separate engines
/// for concurrent rendering.
pub struct Markdown<R: Render> {
    pub(crate) renderer: R,
    pub(crate) callbacks: Callbacks,
    pub(crate) extensions: Extensions,
    pub(crate) max_nesting: usize,
    pub(crate) active: [CharKind; 256],
    pub(crate) refs: RefTable,
    pub(crate) block_bufs: WorkPool,
    pub(crate) span_bufs: WorkPool,
    pub(crate) in_link_body: bool,
}

impl<R: Render> Markdown<R> {
    /// Create an engine with the given extensions, nesting budget, and
    /// renderer. The active-character table is fixed here from the
    /// extensions and the renderer's declared callbacks.
    pub fn new(extensions: Extensions, max_nesting: usize, renderer: R) -> Self {
        debug_assert!(max_nesting > 0);

        let callbacks = renderer.callbacks();
        let mut active = [CharKind::None; 256];

        if callbacks.intersects(
            Callbacks::EMPHASIS | Callbacks::DOUBLE_EMPHASIS | Callbacks::TRIPLE_EMPHASIS,
        ) {
            active[b'*' as usize] = CharKind::Emphasis;
            active[b'_' as usize] = CharKind::Emphasis;
            if extensions.contains(Extensions::STRIKETHROUGH) {
                active[b'~' as usize] = CharKind::Emphasis;
            }
        }

        if callbacks.contains(Callbacks::CODESPAN) {
            active[b'`' as usize] = CharKind::Codespan;
        }

        if callbacks.contains(Callbacks::LINEBREAK) {
            active[b'\n' as usize] = CharKind::Linebreak;
        }

        if callbacks.intersects(Callbacks::LINK | Callbacks::IMAGE) {
            active[b'[' as usize] = CharKind::Link;
        }

        active[b'<' as usize] = CharKind::Langle;
        active[b'\\' as usize] = CharKind::Escape;
        active[b'&' as usize] = CharKind::Entity;

        if extensions.contains(Extensions::AUTOLINK) {
            active[b':' as usize] = CharKind::AutolinkUrl;
            active[b'@' as usize] = CharKind::AutolinkEmail;
            active[b'w' as usize] = CharKind::AutolinkWww;
        }

        if extensions.contains(Extensions::SUPERSCRIPT) {
            active[b'^' as usize] = CharKind::Superscript;
        }

        Self {
            renderer,
            callbacks,
            extensions,
            max_nesting,
            active,
            refs: RefTable::new(),
            block_bufs: WorkPool::new(BLOCK_BUF_UNIT),
            span_bufs: WorkPool::new(SPAN_BUF_UNIT),
            in_link_body: false,
        }
    }

    /// Render `doc` into `ob` through the renderer's callbacks.
    ///
    /// Never fails: unrecognized constructs pass through verbatim, and
    /// overly deep nesting is silently truncated.
    pub fn render(&mut self, ob: &mut Buffer, doc: &[u8]) {
        #[cfg(feature = "tracing")]
        tracing::debug!(bytes = doc.len(), "rendering document");

        let mut text = Buffer::new(SPAN_BUF_UNIT);
        let _ = text.grow(doc.len());

        self.refs.clear();

        // First pass: collect reference definitions, copy everything else
        // with tabs expanded and newlines collapsed to `\n`.
        let mut beg = 0;
        if doc.len() >= 3 && doc[..3] == UTF8_BOM {
            beg = 3;
        }

        while beg < doc.len() {
            if let Some(end) = refs::is_ref(doc, beg, doc.len(), &mut self.refs) {
                beg = end;
            } else {
                let mut end = beg;
                while end < doc.len() && doc[end] != b'\n' && doc[end] != b'\r' {
                    end += 1;
                }

                if end > beg {
                    expand_tabs(&mut text, &doc[beg..end]);
                }

                while end < doc.len() && (doc[end] == b'\n' || doc[end] == b'\r') {
                    // one `\n` per newline, whether it was \n, \r, or \r\n
                    if doc[end] == b'\n' || (end + 1 < doc.len() && doc[end + 1] != b'\n') {
                        text.put_byte(b'\n');
                    }
                    end += 1;
                }

                beg = end;
            }
        }

        let _ = ob.grow(ob.len() + text.len() + text.len() / 2);

        // Second pass: actual rendering.
        self.renderer.doc_header(ob);

        if !text.is_empty() {
            if text[text.len() - 1] != b'\n' && text[text.len() - 1] != b'\r' {
                text.put_byte(b'\n');
            }
            let text = text.into_vec();
            self.parse_block(ob, &text);
        }

        self.renderer.doc_footer(ob);

        debug_assert_eq!(self.span_bufs.depth(), 0);
        debug_assert_eq!(self.block_bufs.depth(), 0);

        #[cfg(feature = "tracing")]
        tracing::trace!(output = ob.len(), "render finished");
    }

    /// Consume the engine, returning the renderer (useful for renderers
    /// that accumulate state, like the TOC builder).
    pub fn into_renderer(self) -> R {
        self.renderer
    }

    pub(crate) fn nesting(&self) -> usize {
        self.span_bufs.depth() + self.block_bufs.depth()
    }

    pub(crate) fn has(&self, cb: Callbacks) -> bool {
        self.callbacks.contains(cb)
    }
}

// Markdown whitespace: plain space or newline. Tabs and carriage returns
// are gone after the first pass.
pub(crate) fn is_md_space(b: u8) -> bool {
    b == b' ' || b == b'\n'
}

// Expand tabs to 4-column stops, measured from the start of the line.
fn expand_tabs(ob: &mut Buffer, line: &[u8]) {
    let mut i = 0;
    let mut tab = 0;

    while i < line.len() {
        let org = i;
        while i < line.len() && line[i] != b'\t' {
            i += 1;
            tab += 1;
        }

        if i > org {
            ob.put(&line[org..i]);
        }

        if i >= line.len() {
            break;
        }

        loop {
            ob.put_byte(b' ');
            tab += 1;
            if tab % 4 == 0 {
                break;
            }
        }

        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_expand_to_four_column_stops() {
        let mut ob = Buffer::new(32);
        expand_tabs(&mut ob, b"a\tb");
        assert_eq!(&ob[..], b"a   b");

        let mut ob = Buffer::new(32);
        expand_tabs(&mut ob, b"abcd\tb");
        assert_eq!(&ob[..], b"abcd    b");
    }

    #[test]
    fn active_table_follows_extensions() {
        struct Sink;
        impl Render for Sink {}

        let md = Markdown::new(Extensions::empty(), 16, Sink);
        assert_eq!(md.active[b'*' as usize], CharKind::Emphasis);
        assert_eq!(md.active[b'~' as usize], CharKind::None);
        assert_eq!(md.active[b':' as usize], CharKind::None);

        let md = Markdown::new(
            Extensions::STRIKETHROUGH | Extensions::AUTOLINK | Extensions::SUPERSCRIPT,
            16,
            Sink,
        );
        assert_eq!(md.active[b'~' as usize], CharKind::Emphasis);
        assert_eq!(md.active[b':' as usize], CharKind::AutolinkUrl);
        assert_eq!(md.active[b'@' as usize], CharKind::AutolinkEmail);
        assert_eq!(md.active[b'w' as usize], CharKind::AutolinkWww);
        assert_eq!(md.active[b'^' as usize], CharKind::Superscript);
    }
}
