// Renderer contract.
//
// The parser never emits HTML itself; it drives a `Render` implementation
// through block, span, and low-level callbacks. Block callbacks write
// straight into the output buffer; span callbacks return whether they
// handled the construct (declining prints the source verbatim); the
// low-level pair defaults to copying input through untouched.

pub(crate) mod escape;
pub mod html;
pub mod smartypants;

use bitflags::bitflags;

use crate::buffer::Buffer;

/// What kind of autolink was recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutolinkKind {
    /// A scheme-qualified link (`http://…`, `ftp://…`, …).
    Normal,
    /// A bare e-mail address, without an explicit `mailto:`.
    Email,
}

bitflags! {
    /// Flags delivered with `list` and `listitem` callbacks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ListFlags: u32 {
        const ORDERED = 1;
        /// The item holds block-level content.
        const BLOCK = 2;
    }
}

bitflags! {
    /// Flags delivered with `table_cell` callbacks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TableFlags: u32 {
        const ALIGN_LEFT = 1;
        const ALIGN_RIGHT = 2;
        const ALIGN_CENTER = Self::ALIGN_LEFT.bits() | Self::ALIGN_RIGHT.bits();
        const ALIGN_MASK = Self::ALIGN_CENTER.bits();
        /// Cell belongs to the header row.
        const HEADER = 4;
    }
}

bitflags! {
    /// Which callbacks a renderer actually implements.
    ///
    /// The engine uses this the way the original callback table used null
    /// entries: a missing callback doesn't just skip output, it disables
    /// recognition of the construct, so e.g. a renderer without `BLOCKHTML`
    /// sees `<div>`-led lines fall through to paragraph parsing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Callbacks: u32 {
        const EMPHASIS = 1 << 0;
        const DOUBLE_EMPHASIS = 1 << 1;
        const TRIPLE_EMPHASIS = 1 << 2;
        const STRIKETHROUGH = 1 << 3;
        const SUPERSCRIPT = 1 << 4;
        const CODESPAN = 1 << 5;
        const LINEBREAK = 1 << 6;
        const LINK = 1 << 7;
        const IMAGE = 1 << 8;
        const AUTOLINK = 1 << 9;
        const RAW_HTML_TAG = 1 << 10;
        const BLOCKHTML = 1 << 11;
        const TABLE_CELLS = 1 << 12;
    }
}

/// Rendering callbacks.
///
/// All methods have defaults, so an implementation only overrides what it
/// cares about. Block-level defaults skip the block entirely; span-level
/// defaults decline (`false`), which makes the parser print the span's
/// source bytes verbatim; `entity` and `normal_text` default to a verbatim
/// copy.
///
/// An implementation that leaves some constructs unhandled on purpose
/// should also drop them from [`Render::callbacks`], which feeds the
/// engine's active-character table and recognition gates.
#[allow(unused_variables)]
pub trait Render {
    /// Which callbacks this renderer implements. Defaults to all of them.
    fn callbacks(&self) -> Callbacks {
        Callbacks::all()
    }

    // Block-level.

    fn blockcode(&mut self, ob: &mut Buffer, text: &[u8], lang: Option<&[u8]>) {}

    fn blockquote(&mut self, ob: &mut Buffer, content: &[u8]) {}

    fn blockhtml(&mut self, ob: &mut Buffer, text: &[u8]) {}

    fn header(&mut self, ob: &mut Buffer, content: &[u8], level: u32) {}

    fn hrule(&mut self, ob: &mut Buffer) {}

    fn list(&mut self, ob: &mut Buffer, content: &[u8], flags: ListFlags) {}

    fn listitem(&mut self, ob: &mut Buffer, content: &[u8], flags: ListFlags) {}

    fn paragraph(&mut self, ob: &mut Buffer, content: &[u8]) {}

    fn table(&mut self, ob: &mut Buffer, header: &[u8], body: &[u8]) {}

    fn table_row(&mut self, ob: &mut Buffer, content: &[u8]) {}

    fn table_cell(&mut self, ob: &mut Buffer, content: &[u8], flags: TableFlags) {}

    // Span-level.

    fn autolink(&mut self, ob: &mut Buffer, link: &[u8], kind: AutolinkKind) -> bool {
        false
    }

    /// `text` is `None` for an empty code span (`` ` ` ``).
    fn codespan(&mut self, ob: &mut Buffer, text: Option<&[u8]>) -> bool {
        false
    }

    fn double_emphasis(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        false
    }

    fn emphasis(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        false
    }

    fn image(
        &mut self,
        ob: &mut Buffer,
        link: Option<&[u8]>,
        title: Option<&[u8]>,
        alt: Option<&[u8]>,
    ) -> bool {
        false
    }

    fn linebreak(&mut self, ob: &mut Buffer) -> bool {
        false
    }

    fn link(
        &mut self,
        ob: &mut Buffer,
        link: Option<&[u8]>,
        title: Option<&[u8]>,
        content: Option<&[u8]>,
    ) -> bool {
        false
    }

    fn raw_html_tag(&mut self, ob: &mut Buffer, tag: &[u8]) -> bool {
        false
    }

    fn triple_emphasis(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        false
    }

    fn strikethrough(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        false
    }

    fn superscript(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        false
    }

    // Low-level.

    fn entity(&mut self, ob: &mut Buffer, entity: &[u8]) {
        ob.put(entity);
    }

    fn normal_text(&mut self, ob: &mut Buffer, text: &[u8]) {
        ob.put(text);
    }

    // Document bracketing.

    fn doc_header(&mut self, ob: &mut Buffer) {}

    fn doc_footer(&mut self, ob: &mut Buffer) {}
}
