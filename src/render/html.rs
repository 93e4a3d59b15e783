// Default HTML renderer, plus the table-of-contents renderer.
//
// Both are plain `Render` implementations; everything renderer-specific
// (skip flags, safe-link checking, TOC anchors, XHTML closings) lives
// here, not in the parser.

use std::fmt::Write;

use bitflags::bitflags;

use crate::autolink::is_safe;
use crate::buffer::Buffer;
use crate::render::escape::{escape_href, escape_html};
use crate::render::{AutolinkKind, Callbacks, ListFlags, Render, TableFlags};

bitflags! {
    /// HTML renderer behavior flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HtmlFlags: u32 {
        /// Drop raw HTML blocks and inline tags.
        const SKIP_HTML = 1 << 0;
        /// Drop `<style>` tags.
        const SKIP_STYLE = 1 << 1;
        /// Drop images.
        const SKIP_IMAGES = 1 << 2;
        /// Drop links and autolinks.
        const SKIP_LINKS = 1 << 3;
        /// Reserved.
        const EXPAND_TABS = 1 << 4;
        /// Only emit links whose target passes [`is_safe`].
        const SAFELINK = 1 << 5;
        /// Give headers `toc_N` anchors for a TOC pass.
        const TOC = 1 << 6;
        /// Render every newline inside a paragraph as `<br>`.
        const HARD_WRAP = 1 << 7;
        /// Self-closing tags in XHTML style (`<hr/>`, `<br/>`).
        const USE_XHTML = 1 << 8;
        /// Escape all raw HTML instead of passing it through.
        const ESCAPE = 1 << 9;
    }
}

/// Result of matching a raw tag against a tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlTag {
    None,
    Open,
    Close,
}

/// Whether `tag` (raw bytes, starting at `<`) opens or closes `tagname`.
pub fn is_html_tag(tag: &[u8], tagname: &str) -> HtmlTag {
    let name = tagname.as_bytes();

    if tag.len() < 3 || tag[0] != b'<' {
        return HtmlTag::None;
    }

    let mut i = 1;
    let mut closed = false;
    if tag[i] == b'/' {
        closed = true;
        i += 1;
    }

    let mut n = 0;
    while i < tag.len() && n < name.len() {
        if tag[i] != name[n] {
            return HtmlTag::None;
        }
        i += 1;
        n += 1;
    }

    if n < name.len() || i == tag.len() {
        return HtmlTag::None;
    }

    if tag[i].is_ascii_whitespace() || tag[i] == b'>' {
        if closed {
            HtmlTag::Close
        } else {
            HtmlTag::Open
        }
    } else {
        HtmlTag::None
    }
}

#[derive(Default)]
struct TocState {
    header_count: i32,
    current_level: i32,
    level_offset: i32,
}

/// The stock HTML renderer.
pub struct Html {
    flags: HtmlFlags,
    toc: TocState,
    /// Hook to append extra attributes to every `<a>` tag; receives the
    /// output buffer and the link target.
    pub link_attributes: Option<fn(&mut Buffer, Option<&[u8]>)>,
}

impl Html {
    pub fn new(flags: HtmlFlags) -> Self {
        Self {
            flags,
            toc: TocState::default(),
            link_attributes: None,
        }
    }

    fn xhtml(&self) -> bool {
        self.flags.contains(HtmlFlags::USE_XHTML)
    }
}

impl Default for Html {
    fn default() -> Self {
        Self::new(HtmlFlags::empty())
    }
}

impl Render for Html {
    fn callbacks(&self) -> Callbacks {
        let mut cb = Callbacks::all();
        if self.flags.contains(HtmlFlags::SKIP_IMAGES) {
            cb.remove(Callbacks::IMAGE);
        }
        if self.flags.contains(HtmlFlags::SKIP_LINKS) {
            cb.remove(Callbacks::LINK | Callbacks::AUTOLINK);
        }
        if self
            .flags
            .intersects(HtmlFlags::SKIP_HTML | HtmlFlags::ESCAPE)
        {
            cb.remove(Callbacks::BLOCKHTML);
        }
        cb
    }

    fn blockcode(&mut self, ob: &mut Buffer, text: &[u8], lang: Option<&[u8]>) {
        if !ob.is_empty() {
            ob.put_byte(b'\n');
        }

        match lang {
            Some(lang) if !lang.is_empty() => {
                ob.put_str("<pre><code class=\"");

                // the info string is a whitespace-separated class list;
                // a leading dot on a class is dropped
                let mut cls = 0;
                let mut i = 0;
                while i < lang.len() {
                    while i < lang.len() && lang[i].is_ascii_whitespace() {
                        i += 1;
                    }
                    if i < lang.len() {
                        let mut org = i;
                        while i < lang.len() && !lang[i].is_ascii_whitespace() {
                            i += 1;
                        }
                        if lang[org] == b'.' {
                            org += 1;
                        }
                        if cls > 0 {
                            ob.put_byte(b' ');
                        }
                        escape_html(ob, &lang[org..i], false);
                        cls += 1;
                    }
                }

                ob.put_str("\">");
            }
            _ => ob.put_str("<pre><code>"),
        }

        escape_html(ob, text, false);
        ob.put_str("</code></pre>\n");
    }

    fn blockquote(&mut self, ob: &mut Buffer, content: &[u8]) {
        if !ob.is_empty() {
            ob.put_byte(b'\n');
        }
        ob.put_str("<blockquote>\n");
        ob.put(content);
        ob.put_str("</blockquote>\n");
    }

    fn blockhtml(&mut self, ob: &mut Buffer, text: &[u8]) {
        let mut sz = text.len();
        while sz > 0 && text[sz - 1] == b'\n' {
            sz -= 1;
        }
        let mut org = 0;
        while org < sz && text[org] == b'\n' {
            org += 1;
        }

        if org >= sz {
            return;
        }

        if !ob.is_empty() {
            ob.put_byte(b'\n');
        }
        ob.put(&text[org..sz]);
        ob.put_byte(b'\n');
    }

    fn header(&mut self, ob: &mut Buffer, content: &[u8], level: u32) {
        if !ob.is_empty() {
            ob.put_byte(b'\n');
        }

        if self.flags.contains(HtmlFlags::TOC) {
            let count = self.toc.header_count;
            self.toc.header_count += 1;
            let _ = write!(ob, "<h{} id=\"toc_{}\">", level, count);
        } else {
            let _ = write!(ob, "<h{}>", level);
        }

        ob.put(content);
        let _ = writeln!(ob, "</h{}>", level);
    }

    fn hrule(&mut self, ob: &mut Buffer) {
        if !ob.is_empty() {
            ob.put_byte(b'\n');
        }
        ob.put_str(if self.xhtml() { "<hr/>\n" } else { "<hr>\n" });
    }

    fn list(&mut self, ob: &mut Buffer, content: &[u8], flags: ListFlags) {
        if !ob.is_empty() {
            ob.put_byte(b'\n');
        }
        let ordered = flags.contains(ListFlags::ORDERED);
        ob.put_str(if ordered { "<ol>\n" } else { "<ul>\n" });
        ob.put(content);
        ob.put_str(if ordered { "</ol>\n" } else { "</ul>\n" });
    }

    fn listitem(&mut self, ob: &mut Buffer, content: &[u8], _flags: ListFlags) {
        ob.put_str("<li>");
        let mut size = content.len();
        while size > 0 && content[size - 1] == b'\n' {
            size -= 1;
        }
        ob.put(&content[..size]);
        ob.put_str("</li>\n");
    }

    fn paragraph(&mut self, ob: &mut Buffer, content: &[u8]) {
        if !ob.is_empty() {
            ob.put_byte(b'\n');
        }

        let mut i = 0;
        while i < content.len() && content[i].is_ascii_whitespace() {
            i += 1;
        }
        if i == content.len() {
            return;
        }

        ob.put_str("<p>");
        if self.flags.contains(HtmlFlags::HARD_WRAP) {
            while i < content.len() {
                let org = i;
                while i < content.len() && content[i] != b'\n' {
                    i += 1;
                }

                if i > org {
                    ob.put(&content[org..i]);
                }

                // no break after the paragraph's last line
                if i >= content.len() - 1 {
                    break;
                }

                self.linebreak(ob);
                i += 1;
            }
        } else {
            ob.put(&content[i..]);
        }
        ob.put_str("</p>\n");
    }

    fn table(&mut self, ob: &mut Buffer, header: &[u8], body: &[u8]) {
        if !ob.is_empty() {
            ob.put_byte(b'\n');
        }
        ob.put_str("<table><thead>\n");
        ob.put(header);
        ob.put_str("</thead><tbody>\n");
        ob.put(body);
        ob.put_str("</tbody></table>\n");
    }

    fn table_row(&mut self, ob: &mut Buffer, content: &[u8]) {
        ob.put_str("<tr>\n");
        ob.put(content);
        ob.put_str("</tr>\n");
    }

    fn table_cell(&mut self, ob: &mut Buffer, content: &[u8], flags: TableFlags) {
        let header = flags.contains(TableFlags::HEADER);
        ob.put_str(if header { "<th" } else { "<td" });

        let align = flags & TableFlags::ALIGN_MASK;
        if align == TableFlags::ALIGN_CENTER {
            ob.put_str(" align=\"center\">");
        } else if align == TableFlags::ALIGN_LEFT {
            ob.put_str(" align=\"left\">");
        } else if align == TableFlags::ALIGN_RIGHT {
            ob.put_str(" align=\"right\">");
        } else {
            ob.put_str(">");
        }

        ob.put(content);
        ob.put_str(if header { "</th>\n" } else { "</td>\n" });
    }

    fn autolink(&mut self, ob: &mut Buffer, link: &[u8], kind: AutolinkKind) -> bool {
        if link.is_empty() {
            return false;
        }

        if self.flags.contains(HtmlFlags::SAFELINK)
            && !is_safe(link)
            && kind != AutolinkKind::Email
        {
            return false;
        }

        ob.put_str("<a href=\"");
        if kind == AutolinkKind::Email {
            ob.put_str("mailto:");
        }
        escape_href(ob, link);

        if let Some(attrs) = self.link_attributes {
            ob.put_byte(b'"');
            attrs(ob, Some(link));
            ob.put_byte(b'>');
        } else {
            ob.put_str("\">");
        }

        // an explicit mailto: URI displays without the scheme
        if let Some(stripped) = link.strip_prefix(b"mailto:".as_slice()) {
            escape_html(ob, stripped, false);
        } else {
            escape_html(ob, link, false);
        }

        ob.put_str("</a>");
        true
    }

    fn codespan(&mut self, ob: &mut Buffer, text: Option<&[u8]>) -> bool {
        ob.put_str("<code>");
        if let Some(text) = text {
            escape_html(ob, text, false);
        }
        ob.put_str("</code>");
        true
    }

    fn double_emphasis(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        if content.is_empty() {
            return false;
        }
        ob.put_str("<strong>");
        ob.put(content);
        ob.put_str("</strong>");
        true
    }

    fn emphasis(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        if content.is_empty() {
            return false;
        }
        ob.put_str("<em>");
        ob.put(content);
        ob.put_str("</em>");
        true
    }

    fn image(
        &mut self,
        ob: &mut Buffer,
        link: Option<&[u8]>,
        title: Option<&[u8]>,
        alt: Option<&[u8]>,
    ) -> bool {
        let link = match link {
            Some(link) if !link.is_empty() => link,
            _ => return false,
        };

        ob.put_str("<img src=\"");
        escape_href(ob, link);
        ob.put_str("\" alt=\"");

        if let Some(alt) = alt {
            if !alt.is_empty() {
                escape_html(ob, alt, false);
            }
        }

        if let Some(title) = title {
            if !title.is_empty() {
                ob.put_str("\" title=\"");
                escape_html(ob, title, false);
            }
        }

        ob.put_str(if self.xhtml() { "\"/>" } else { "\">" });
        true
    }

    fn linebreak(&mut self, ob: &mut Buffer) -> bool {
        ob.put_str(if self.xhtml() { "<br/>\n" } else { "<br>\n" });
        true
    }

    fn link(
        &mut self,
        ob: &mut Buffer,
        link: Option<&[u8]>,
        title: Option<&[u8]>,
        content: Option<&[u8]>,
    ) -> bool {
        if let Some(link) = link {
            if self.flags.contains(HtmlFlags::SAFELINK) && !is_safe(link) {
                return false;
            }
        }

        ob.put_str("<a href=\"");
        if let Some(link) = link {
            if !link.is_empty() {
                escape_href(ob, link);
            }
        }

        if let Some(title) = title {
            if !title.is_empty() {
                ob.put_str("\" title=\"");
                escape_html(ob, title, false);
            }
        }

        if let Some(attrs) = self.link_attributes {
            ob.put_byte(b'"');
            attrs(ob, link);
            ob.put_byte(b'>');
        } else {
            ob.put_str("\">");
        }

        if let Some(content) = content {
            if !content.is_empty() {
                ob.put(content);
            }
        }

        ob.put_str("</a>");
        true
    }

    fn raw_html_tag(&mut self, ob: &mut Buffer, tag: &[u8]) -> bool {
        // ESCAPE overrides the skip flags: everything gets escaped, valid
        // tag or not
        if self.flags.contains(HtmlFlags::ESCAPE) {
            escape_html(ob, tag, false);
            return true;
        }

        if self.flags.contains(HtmlFlags::SKIP_HTML) {
            return true;
        }

        if self.flags.contains(HtmlFlags::SKIP_STYLE)
            && is_html_tag(tag, "style") != HtmlTag::None
        {
            return true;
        }

        if self.flags.contains(HtmlFlags::SKIP_LINKS) && is_html_tag(tag, "a") != HtmlTag::None {
            return true;
        }

        if self.flags.contains(HtmlFlags::SKIP_IMAGES) && is_html_tag(tag, "img") != HtmlTag::None
        {
            return true;
        }

        ob.put(tag);
        true
    }

    fn triple_emphasis(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        if content.is_empty() {
            return false;
        }
        ob.put_str("<strong><em>");
        ob.put(content);
        ob.put_str("</em></strong>");
        true
    }

    fn strikethrough(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        if content.is_empty() {
            return false;
        }
        ob.put_str("<del>");
        ob.put(content);
        ob.put_str("</del>");
        true
    }

    fn superscript(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        if content.is_empty() {
            return false;
        }
        ob.put_str("<sup>");
        ob.put(content);
        ob.put_str("</sup>");
        true
    }

    fn normal_text(&mut self, ob: &mut Buffer, text: &[u8]) {
        escape_html(ob, text, false);
    }
}

/// Table-of-contents renderer: headers become nested `<ul>` anchor
/// entries, links collapse to their text, and everything else is dropped.
///
/// Render the document once with [`Html`] (with [`HtmlFlags::TOC`] so the
/// header ids line up), then again with `Toc` to build the index.
pub struct Toc {
    toc: TocState,
}

impl Toc {
    pub fn new() -> Self {
        Self {
            toc: TocState::default(),
        }
    }
}

impl Default for Toc {
    fn default() -> Self {
        Self::new()
    }
}

impl Render for Toc {
    fn callbacks(&self) -> Callbacks {
        Callbacks::EMPHASIS
            | Callbacks::DOUBLE_EMPHASIS
            | Callbacks::TRIPLE_EMPHASIS
            | Callbacks::STRIKETHROUGH
            | Callbacks::SUPERSCRIPT
            | Callbacks::CODESPAN
            | Callbacks::LINK
    }

    fn header(&mut self, ob: &mut Buffer, content: &[u8], level: u32) {
        let mut level = level as i32;

        // the first header seen anchors the top level
        if self.toc.current_level == 0 {
            self.toc.level_offset = level - 1;
        }
        level -= self.toc.level_offset;

        if level > self.toc.current_level {
            while level > self.toc.current_level {
                ob.put_str("<ul>\n<li>\n");
                self.toc.current_level += 1;
            }
        } else if level < self.toc.current_level {
            ob.put_str("</li>\n");
            while level < self.toc.current_level {
                ob.put_str("</ul>\n</li>\n");
                self.toc.current_level -= 1;
            }
            ob.put_str("<li>\n");
        } else {
            ob.put_str("</li>\n<li>\n");
        }

        let _ = write!(ob, "<a href=\"#toc_{}\">", self.toc.header_count);
        self.toc.header_count += 1;
        escape_html(ob, content, false);
        ob.put_str("</a>\n");
    }

    fn link(
        &mut self,
        ob: &mut Buffer,
        _link: Option<&[u8]>,
        _title: Option<&[u8]>,
        content: Option<&[u8]>,
    ) -> bool {
        if let Some(content) = content {
            if !content.is_empty() {
                ob.put(content);
            }
        }
        true
    }

    fn codespan(&mut self, ob: &mut Buffer, text: Option<&[u8]>) -> bool {
        ob.put_str("<code>");
        if let Some(text) = text {
            escape_html(ob, text, false);
        }
        ob.put_str("</code>");
        true
    }

    fn double_emphasis(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        if content.is_empty() {
            return false;
        }
        ob.put_str("<strong>");
        ob.put(content);
        ob.put_str("</strong>");
        true
    }

    fn emphasis(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        if content.is_empty() {
            return false;
        }
        ob.put_str("<em>");
        ob.put(content);
        ob.put_str("</em>");
        true
    }

    fn triple_emphasis(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        if content.is_empty() {
            return false;
        }
        ob.put_str("<strong><em>");
        ob.put(content);
        ob.put_str("</em></strong>");
        true
    }

    fn strikethrough(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        if content.is_empty() {
            return false;
        }
        ob.put_str("<del>");
        ob.put(content);
        ob.put_str("</del>");
        true
    }

    fn superscript(&mut self, ob: &mut Buffer, content: &[u8]) -> bool {
        if content.is_empty() {
            return false;
        }
        ob.put_str("<sup>");
        ob.put(content);
        ob.put_str("</sup>");
        true
    }

    fn doc_footer(&mut self, ob: &mut Buffer) {
        while self.toc.current_level > 0 {
            ob.put_str("</li>\n</ul>\n");
            self.toc.current_level -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_matching() {
        assert_eq!(is_html_tag(b"<style>", "style"), HtmlTag::Open);
        assert_eq!(is_html_tag(b"<style media=\"x\">", "style"), HtmlTag::Open);
        assert_eq!(is_html_tag(b"</style>", "style"), HtmlTag::Close);
        assert_eq!(is_html_tag(b"<styleish>", "style"), HtmlTag::None);
        assert_eq!(is_html_tag(b"<div>", "style"), HtmlTag::None);
    }

    #[test]
    fn skip_flags_withdraw_callbacks() {
        let html = Html::new(HtmlFlags::SKIP_LINKS | HtmlFlags::SKIP_HTML);
        let cb = html.callbacks();
        assert!(!cb.contains(Callbacks::LINK));
        assert!(!cb.contains(Callbacks::AUTOLINK));
        assert!(!cb.contains(Callbacks::BLOCKHTML));
        assert!(cb.contains(Callbacks::IMAGE));
    }

    #[test]
    fn table_cell_alignment_attributes() {
        let mut html = Html::default();
        let mut ob = Buffer::new(64);
        html.table_cell(&mut ob, b"x", TableFlags::ALIGN_CENTER | TableFlags::HEADER);
        assert_eq!(&ob[..], b"<th align=\"center\">x</th>\n");

        let mut ob = Buffer::new(64);
        html.table_cell(&mut ob, b"x", TableFlags::ALIGN_RIGHT);
        assert_eq!(&ob[..], b"<td align=\"right\">x</td>\n");
    }
}
