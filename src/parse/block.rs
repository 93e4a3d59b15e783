// Line-oriented block dispatcher.
//
// `parse_block` consumes the normalized text one construct at a time,
// testing recognizers in fixed priority: ATX header, raw HTML block, empty
// line, horizontal rule, fenced code, table, blockquote, indented code,
// lists, then paragraph as the fallthrough. Construct bodies recurse into
// `parse_block` or `parse_inline` through pooled work buffers.

use std::ops::Range;

use crate::buffer::Buffer;
use crate::render::{Callbacks, ListFlags, Render, TableFlags};

use super::{is_md_space, Extensions, Markdown};

// Block-level HTML tag names recognized as openers, sorted for lookup.
const BLOCK_TAGS: [&str; 24] = [
    "blockquote",
    "del",
    "div",
    "dl",
    "fieldset",
    "figure",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "iframe",
    "ins",
    "math",
    "noscript",
    "ol",
    "p",
    "pre",
    "script",
    "style",
    "table",
    "ul",
];

// Case-insensitive lookup over the closed tag set.
fn find_block_tag(tag: &[u8]) -> Option<&'static str> {
    if tag.is_empty() || tag.len() > 10 {
        return None;
    }

    let mut lower = [0u8; 10];
    for (i, &b) in tag.iter().enumerate() {
        lower[i] = b.to_ascii_lowercase();
    }
    let needle = &lower[..tag.len()];

    BLOCK_TAGS
        .binary_search_by(|probe| probe.as_bytes().cmp(needle))
        .ok()
        .map(|idx| BLOCK_TAGS[idx])
}

// Length of an empty line (through its newline), or 0.
fn is_empty(data: &[u8]) -> usize {
    let mut i = 0;
    while i < data.len() && data[i] != b'\n' {
        if data[i] != b' ' {
            return 0;
        }
        i += 1;
    }
    i + 1
}

// A line of three or more `*`, `-`, or `_` (one kind), spaces allowed.
fn is_hrule(data: &[u8]) -> bool {
    let size = data.len();
    if size < 3 {
        return false;
    }

    let mut i = 0;
    if data[0] == b' ' {
        i += 1;
        if data[1] == b' ' {
            i += 1;
            if data[2] == b' ' {
                i += 1;
            }
        }
    }

    if i + 2 >= size || (data[i] != b'*' && data[i] != b'-' && data[i] != b'_') {
        return false;
    }
    let c = data[i];

    let mut n = 0;
    while i < size && data[i] != b'\n' {
        if data[i] == c {
            n += 1;
        } else if data[i] != b' ' {
            return false;
        }
        i += 1;
    }

    n >= 3
}

// Width of a fence opener (three or more backticks or tildes), or 0.
fn prefix_codefence(data: &[u8]) -> usize {
    let size = data.len();
    if size < 3 {
        return 0;
    }

    let mut i = 0;
    if data[0] == b' ' {
        i += 1;
        if data[1] == b' ' {
            i += 1;
            if data[2] == b' ' {
                i += 1;
            }
        }
    }

    if i + 2 >= size || !(data[i] == b'~' || data[i] == b'`') {
        return 0;
    }
    let c = data[i];

    let mut n = 0;
    while i < size && data[i] == c {
        n += 1;
        i += 1;
    }

    if n < 3 {
        return 0;
    }
    i
}

// Full fence line: opener, optional info string (bare or `{…}`-wrapped),
// then nothing but whitespace. Returns the consumed length through the
// newline, filling `syntax` with the info-string range.
fn is_codefence(data: &[u8], syntax: Option<&mut Range<usize>>) -> usize {
    let size = data.len();

    let mut i = prefix_codefence(data);
    if i == 0 {
        return 0;
    }

    while i < size && data[i] == b' ' {
        i += 1;
    }

    let mut syn_start = i;
    let mut syn_len = 0;

    if i < size && data[i] == b'{' {
        i += 1;
        syn_start += 1;

        while i < size && data[i] != b'}' && data[i] != b'\n' {
            syn_len += 1;
            i += 1;
        }

        if i == size || data[i] != b'}' {
            return 0;
        }

        while syn_len > 0 && is_md_space(data[syn_start]) {
            syn_start += 1;
            syn_len -= 1;
        }
        while syn_len > 0 && is_md_space(data[syn_start + syn_len - 1]) {
            syn_len -= 1;
        }

        i += 1;
    } else {
        while i < size && !is_md_space(data[i]) {
            syn_len += 1;
            i += 1;
        }
    }

    if let Some(syntax) = syntax {
        *syntax = syn_start..syn_start + syn_len;
    }

    while i < size && data[i] != b'\n' {
        if !is_md_space(data[i]) {
            return 0;
        }
        i += 1;
    }

    i + 1
}

// Setext underline: `=` runs make level 1, `-` runs level 2.
fn is_headerline(data: &[u8]) -> usize {
    let size = data.len();
    if size == 0 {
        return 0;
    }

    if data[0] == b'=' {
        let mut i = 1;
        while i < size && data[i] == b'=' {
            i += 1;
        }
        while i < size && data[i] == b' ' {
            i += 1;
        }
        return if i >= size || data[i] == b'\n' { 1 } else { 0 };
    }

    if data[0] == b'-' {
        let mut i = 1;
        while i < size && data[i] == b'-' {
            i += 1;
        }
        while i < size && data[i] == b' ' {
            i += 1;
        }
        return if i >= size || data[i] == b'\n' { 2 } else { 0 };
    }

    0
}

fn is_next_headerline(data: &[u8]) -> bool {
    let size = data.len();
    let mut i = 0;

    while i < size && data[i] != b'\n' {
        i += 1;
    }
    i += 1;
    if i >= size {
        return false;
    }

    is_headerline(&data[i..]) != 0
}

// Blockquote prefix length: up to 3 spaces, `>`, optional space.
fn prefix_quote(data: &[u8]) -> usize {
    let size = data.len();
    let mut i = 0;
    if i < size && data[i] == b' ' {
        i += 1;
    }
    if i < size && data[i] == b' ' {
        i += 1;
    }
    if i < size && data[i] == b' ' {
        i += 1;
    }

    if i < size && data[i] == b'>' {
        if i + 1 < size && data[i + 1] == b' ' {
            return i + 2;
        }
        return i + 1;
    }

    0
}

// Indented-code prefix: exactly four leading spaces.
fn prefix_code(data: &[u8]) -> usize {
    if data.len() > 3 && data[0] == b' ' && data[1] == b' ' && data[2] == b' ' && data[3] == b' ' {
        return 4;
    }
    0
}

// Ordered-list marker: digits, `.`, space.
fn prefix_oli(data: &[u8]) -> usize {
    let size = data.len();
    let mut i = 0;
    if i < size && data[i] == b' ' {
        i += 1;
    }
    if i < size && data[i] == b' ' {
        i += 1;
    }
    if i < size && data[i] == b' ' {
        i += 1;
    }

    if i >= size || !data[i].is_ascii_digit() {
        return 0;
    }
    while i < size && data[i].is_ascii_digit() {
        i += 1;
    }

    if i + 1 >= size || data[i] != b'.' || data[i + 1] != b' ' {
        return 0;
    }

    if is_next_headerline(&data[i..]) {
        return 0;
    }

    i + 2
}

// Unordered-list marker: `*`, `+`, or `-`, then a space.
fn prefix_uli(data: &[u8]) -> usize {
    let size = data.len();
    let mut i = 0;
    if i < size && data[i] == b' ' {
        i += 1;
    }
    if i < size && data[i] == b' ' {
        i += 1;
    }
    if i < size && data[i] == b' ' {
        i += 1;
    }

    if i + 1 >= size
        || (data[i] != b'*' && data[i] != b'+' && data[i] != b'-')
        || data[i + 1] != b' '
    {
        return 0;
    }

    if is_next_headerline(&data[i..]) {
        return 0;
    }

    i + 2
}

// Close of an HTML block: `</tag>` then a blank line.
fn htmlblock_end_tag(tag: &str, data: &[u8]) -> usize {
    let tag_len = tag.len();
    let size = data.len();

    if tag_len + 3 >= size
        || !data[2..2 + tag_len].eq_ignore_ascii_case(tag.as_bytes())
        || data[tag_len + 2] != b'>'
    {
        return 0;
    }

    let mut i = tag_len + 3;
    let w = is_empty(&data[i..]);
    if w == 0 {
        return 0; // non-blank after the closing tag
    }
    i += w;

    let mut w = 0;
    if i < size {
        w = is_empty(&data[i..]);
    }

    i + w
}

fn htmlblock_end(tag: &str, data: &[u8], start_of_line: bool) -> usize {
    let size = data.len();
    let mut i = 1;
    let mut block_lines = 0;

    while i < size {
        i += 1;
        while i < size && !(data[i - 1] == b'<' && data[i] == b'/') {
            if data[i] == b'\n' {
                block_lines += 1;
            }
            i += 1;
        }

        // when matching unindented tags only, skip closers that don't
        // follow a newline (unless still on the opening line)
        if start_of_line && block_lines > 0 && data[i - 2] != b'\n' {
            continue;
        }

        if i + 2 + tag.len() >= size {
            break;
        }

        let end_tag = htmlblock_end_tag(tag, &data[i - 1..]);
        if end_tag > 0 {
            return i + end_tag - 1;
        }
    }

    0
}

impl<R: Render> Markdown<R> {
    /// Parse block-level markdown in `data`, emitting through the renderer.
    pub(crate) fn parse_block(&mut self, ob: &mut Buffer, data: &[u8]) {
        if self.nesting() > self.max_nesting {
            return;
        }

        let size = data.len();
        let mut beg = 0;

        while beg < size {
            let txt = &data[beg..];

            if self.is_atxheader(txt) {
                beg += self.parse_atxheader(ob, txt);
                continue;
            }

            if txt[0] == b'<' && self.has(Callbacks::BLOCKHTML) {
                let i = self.parse_htmlblock(ob, txt, true);
                if i > 0 {
                    beg += i;
                    continue;
                }
            }

            let i = is_empty(txt);
            if i > 0 {
                beg += i;
                continue;
            }

            if is_hrule(txt) {
                self.renderer.hrule(ob);
                while beg < size && data[beg] != b'\n' {
                    beg += 1;
                }
                beg += 1;
                continue;
            }

            if self.extensions.contains(Extensions::FENCED_CODE) {
                let i = self.parse_fencedcode(ob, txt);
                if i > 0 {
                    beg += i;
                    continue;
                }
            }

            if self.extensions.contains(Extensions::TABLES) {
                let i = self.parse_table(ob, txt);
                if i > 0 {
                    beg += i;
                    continue;
                }
            }

            if prefix_quote(txt) > 0 {
                beg += self.parse_blockquote(ob, txt);
                continue;
            }

            if prefix_code(txt) > 0 {
                beg += self.parse_blockcode(ob, txt);
                continue;
            }

            if prefix_uli(txt) > 0 {
                beg += self.parse_list(ob, txt, ListFlags::empty());
                continue;
            }

            if prefix_oli(txt) > 0 {
                beg += self.parse_list(ob, txt, ListFlags::ORDERED);
                continue;
            }

            beg += self.parse_paragraph(ob, txt);
        }
    }

    fn is_atxheader(&self, data: &[u8]) -> bool {
        if data.is_empty() || data[0] != b'#' {
            return false;
        }

        if self.extensions.contains(Extensions::SPACE_HEADERS) {
            let mut level = 0;
            while level < data.len() && level < 6 && data[level] == b'#' {
                level += 1;
            }
            if level < data.len() && data[level] != b' ' {
                return false;
            }
        }

        true
    }

    fn parse_atxheader(&mut self, ob: &mut Buffer, data: &[u8]) -> usize {
        let size = data.len();

        let mut level = 0;
        while level < size && level < 6 && data[level] == b'#' {
            level += 1;
        }

        let mut i = level;
        while i < size && data[i] == b' ' {
            i += 1;
        }

        let mut end = i;
        while end < size && data[end] != b'\n' {
            end += 1;
        }
        let skip = end;

        // trailing hashes and spaces are not part of the title
        while end > 0 && data[end - 1] == b'#' {
            end -= 1;
        }
        while end > 0 && data[end - 1] == b' ' {
            end -= 1;
        }

        if end > i {
            let mut work = self.span_bufs.checkout();
            self.parse_inline(&mut work, &data[i..end]);
            self.renderer.header(ob, &work, level as u32);
            self.span_bufs.restore(work);
        }

        skip
    }

    fn parse_htmlblock(&mut self, ob: &mut Buffer, data: &[u8], do_render: bool) -> usize {
        let size = data.len();

        if size < 2 || data[0] != b'<' {
            return 0;
        }

        let mut i = 1;
        while i < size && data[i] != b'>' && data[i] != b' ' {
            i += 1;
        }

        let curtag = if i < size {
            find_block_tag(&data[1..i])
        } else {
            None
        };

        let Some(curtag) = curtag else {
            // HTML comment, laxist form
            if size > 5 && data[1] == b'!' && data[2] == b'-' && data[3] == b'-' {
                let mut i = 5;
                while i < size && !(data[i - 2] == b'-' && data[i - 1] == b'-' && data[i] == b'>') {
                    i += 1;
                }
                i += 1;

                if i < size {
                    let j = is_empty(&data[i..]);
                    if j > 0 {
                        let work_size = i + j;
                        if do_render && self.has(Callbacks::BLOCKHTML) {
                            self.renderer.blockhtml(ob, &data[..work_size]);
                        }
                        return work_size;
                    }
                }
            }

            // `<hr>`, the only self-closing block tag considered
            if size > 4
                && (data[1] == b'h' || data[1] == b'H')
                && (data[2] == b'r' || data[2] == b'R')
            {
                let mut i = 3;
                while i < size && data[i] != b'>' {
                    i += 1;
                }

                if i + 1 < size {
                    i += 1;
                    let j = is_empty(&data[i..]);
                    if j > 0 {
                        let work_size = i + j;
                        if do_render && self.has(Callbacks::BLOCKHTML) {
                            self.renderer.blockhtml(ob, &data[..work_size]);
                        }
                        return work_size;
                    }
                }
            }

            return 0;
        };

        // unindented matching closer first; the indented fallback is not
        // tried for ins/del, following Markdown.pl
        let mut tag_end = htmlblock_end(curtag, data, true);
        if tag_end == 0 && curtag != "ins" && curtag != "del" {
            tag_end = htmlblock_end(curtag, data, false);
        }

        if tag_end == 0 {
            return 0;
        }

        if do_render && self.has(Callbacks::BLOCKHTML) {
            self.renderer.blockhtml(ob, &data[..tag_end]);
        }

        tag_end
    }

    fn parse_blockquote(&mut self, ob: &mut Buffer, data: &[u8]) -> usize {
        let size = data.len();
        let mut out = self.block_bufs.checkout();
        let mut work: Vec<u8> = Vec::new();

        let mut beg = 0;
        let mut end = 0;
        while beg < size {
            end = beg + 1;
            while end < size && data[end - 1] != b'\n' {
                end += 1;
            }

            let pre = prefix_quote(&data[beg..end]);
            if pre > 0 {
                beg += pre; // skipping prefix
            } else if is_empty(&data[beg..end]) > 0
                && (end >= size
                    || (prefix_quote(&data[end..]) == 0 && is_empty(&data[end..]) == 0))
            {
                // empty line followed by a non-quote line ends the quote
                break;
            }

            if beg < end {
                work.extend_from_slice(&data[beg..end]);
            }
            beg = end;
        }

        self.parse_block(&mut out, &work);
        self.renderer.blockquote(ob, &out);
        self.block_bufs.restore(out);
        end
    }

    fn parse_paragraph(&mut self, ob: &mut Buffer, data: &[u8]) -> usize {
        let size = data.len();
        let mut i = 0;
        let mut end = 0;
        let mut level = 0;

        while i < size {
            end = i + 1;
            while end < size && data[end - 1] != b'\n' {
                end += 1;
            }

            if is_empty(&data[i..]) > 0 {
                break;
            }

            level = is_headerline(&data[i..]);
            if level != 0 {
                break;
            }

            if self.is_atxheader(&data[i..])
                || is_hrule(&data[i..])
                || prefix_quote(&data[i..]) > 0
            {
                end = i;
                break;
            }

            // Markdown 1.0.0 terminated a paragraph at any line that looks
            // like the start of another block; gated because the 1.0.3
            // test suite disagrees.
            if self.extensions.contains(Extensions::LAX_SPACING)
                && !data[i].is_ascii_alphanumeric()
            {
                if prefix_oli(&data[i..]) > 0 || prefix_uli(&data[i..]) > 0 {
                    end = i;
                    break;
                }

                if data[i] == b'<'
                    && self.has(Callbacks::BLOCKHTML)
                    && self.parse_htmlblock(ob, &data[i..], false) > 0
                {
                    end = i;
                    break;
                }

                if self.extensions.contains(Extensions::FENCED_CODE)
                    && is_codefence(&data[i..], None) > 0
                {
                    end = i;
                    break;
                }
            }

            i = end;
        }

        let mut work_size = i;
        while work_size > 0 && data[work_size - 1] == b'\n' {
            work_size -= 1;
        }

        if level == 0 {
            let mut tmp = self.block_bufs.checkout();
            self.parse_inline(&mut tmp, &data[..work_size]);
            self.renderer.paragraph(ob, &tmp);
            self.block_bufs.restore(tmp);
        } else {
            // setext header: the underlined line becomes the header, any
            // preceding lines stay a paragraph
            let mut w_start = 0;
            let mut w_size = work_size;

            if w_size > 0 {
                let full = w_size;
                w_size -= 1;

                while w_size > 0 && data[w_size] != b'\n' {
                    w_size -= 1;
                }
                let title_beg = w_size + 1;

                while w_size > 0 && data[w_size - 1] == b'\n' {
                    w_size -= 1;
                }

                if w_size > 0 {
                    let mut tmp = self.block_bufs.checkout();
                    self.parse_inline(&mut tmp, &data[..w_size]);
                    self.renderer.paragraph(ob, &tmp);
                    self.block_bufs.restore(tmp);

                    w_start = title_beg;
                    w_size = full - title_beg;
                } else {
                    w_size = full;
                }
            }

            let mut header_work = self.span_bufs.checkout();
            self.parse_inline(&mut header_work, &data[w_start..w_start + w_size]);
            self.renderer.header(ob, &header_work, level as u32);
            self.span_bufs.restore(header_work);
        }

        end
    }

    fn parse_fencedcode(&mut self, ob: &mut Buffer, data: &[u8]) -> usize {
        let size = data.len();

        let mut lang = 0..0;
        let mut beg = is_codefence(data, Some(&mut lang));
        if beg == 0 {
            return 0;
        }

        let mut work = self.block_bufs.checkout();

        while beg < size {
            let mut fence_trail = 0..0;
            let fence_end = is_codefence(&data[beg..], Some(&mut fence_trail));
            if fence_end > 0 && fence_trail.is_empty() {
                beg += fence_end;
                break;
            }

            let mut end = beg + 1;
            while end < size && data[end - 1] != b'\n' {
                end += 1;
            }

            if beg < end {
                if is_empty(&data[beg..end]) > 0 {
                    work.put_byte(b'\n');
                } else {
                    work.put(&data[beg..end]);
                }
            }
            beg = end;
        }

        if !work.is_empty() && work[work.len() - 1] != b'\n' {
            work.put_byte(b'\n');
        }

        let lang_slice = (!lang.is_empty()).then(|| &data[lang]);
        self.renderer.blockcode(ob, &work, lang_slice);
        self.block_bufs.restore(work);

        beg
    }

    fn parse_blockcode(&mut self, ob: &mut Buffer, data: &[u8]) -> usize {
        let size = data.len();
        let mut work = self.block_bufs.checkout();

        let mut beg = 0;
        while beg < size {
            let mut end = beg + 1;
            while end < size && data[end - 1] != b'\n' {
                end += 1;
            }

            let pre = prefix_code(&data[beg..end]);
            if pre > 0 {
                beg += pre; // skipping prefix
            } else if is_empty(&data[beg..end]) == 0 {
                // non-empty non-prefixed line ends the block
                break;
            }

            if beg < end {
                if is_empty(&data[beg..end]) > 0 {
                    work.put_byte(b'\n');
                } else {
                    work.put(&data[beg..end]);
                }
            }
            beg = end;
        }

        let mut len = work.len();
        while len > 0 && work[len - 1] == b'\n' {
            len -= 1;
        }
        work.truncate(len);
        work.put_byte(b'\n');

        self.renderer.blockcode(ob, &work, None);
        self.block_bufs.restore(work);

        beg
    }

    // One list item; the marker prefix is recognized here. `end_of_list`
    // is set when the item also terminates the enclosing list.
    fn parse_listitem(
        &mut self,
        ob: &mut Buffer,
        data: &[u8],
        flags: &mut ListFlags,
        end_of_list: &mut bool,
    ) -> usize {
        let size = data.len();

        // remember the indent of the opening marker
        let mut orgpre = 0;
        while orgpre < 3 && orgpre < size && data[orgpre] == b' ' {
            orgpre += 1;
        }

        let mut beg = prefix_uli(data);
        if beg == 0 {
            beg = prefix_oli(data);
        }
        if beg == 0 {
            return 0;
        }

        let mut end = beg;
        while end < size && data[end - 1] != b'\n' {
            end += 1;
        }

        let mut work = self.span_bufs.checkout();
        let mut inter = self.span_bufs.checkout();

        work.put(&data[beg..end]);
        beg = end;

        let mut in_empty = false;
        let mut has_inside_empty = false;
        let mut in_fence = false;
        let mut sublist = 0;

        while beg < size {
            end += 1;
            while end < size && data[end - 1] != b'\n' {
                end += 1;
            }

            if is_empty(&data[beg..end]) > 0 {
                in_empty = true;
                beg = end;
                continue;
            }

            let mut i = 0;
            while i < 4 && beg + i < end && data[beg + i] == b' ' {
                i += 1;
            }
            let pre = i;

            if self.extensions.contains(Extensions::FENCED_CODE)
                && is_codefence(&data[beg + i..end], None) > 0
            {
                in_fence = !in_fence;
            }

            // new-bullet detection is off inside a fenced region
            let (has_next_uli, has_next_oli) = if in_fence {
                (0, 0)
            } else {
                (
                    prefix_uli(&data[beg + i..end]),
                    prefix_oli(&data[beg + i..end]),
                )
            };

            // ul/ol switch after a blank line ends the whole list
            if in_empty
                && ((flags.contains(ListFlags::ORDERED) && has_next_uli > 0)
                    || (!flags.contains(ListFlags::ORDERED) && has_next_oli > 0))
            {
                *end_of_list = true;
                break;
            }

            if (has_next_uli > 0 && !is_hrule(&data[beg + i..end])) || has_next_oli > 0 {
                if in_empty {
                    has_inside_empty = true;
                }

                if pre == orgpre {
                    // same-indent bullet: a sibling item starts here
                    break;
                }

                if sublist == 0 {
                    sublist = work.len();
                }
            } else if in_empty && pre == 0 {
                // unindented continuation after a blank line
                *end_of_list = true;
                break;
            } else if in_empty {
                work.put_byte(b'\n');
                has_inside_empty = true;
            }

            in_empty = false;

            work.put(&data[beg + i..end]);
            beg = end;
        }

        if has_inside_empty {
            *flags |= ListFlags::BLOCK;
        }

        if flags.contains(ListFlags::BLOCK) {
            // block-mode item
            if sublist > 0 && sublist < work.len() {
                self.parse_block(&mut inter, &work[..sublist]);
                self.parse_block(&mut inter, &work[sublist..]);
            } else {
                self.parse_block(&mut inter, &work);
            }
        } else {
            // inline-mode item, with any sub-list parsed in block mode
            if sublist > 0 && sublist < work.len() {
                self.parse_inline(&mut inter, &work[..sublist]);
                self.parse_block(&mut inter, &work[sublist..]);
            } else {
                self.parse_inline(&mut inter, &work);
            }
        }

        self.renderer.listitem(ob, &inter, *flags);
        self.span_bufs.restore(inter);
        self.span_bufs.restore(work);

        beg
    }

    fn parse_list(&mut self, ob: &mut Buffer, data: &[u8], mut flags: ListFlags) -> usize {
        let size = data.len();
        let mut work = self.block_bufs.checkout();

        let mut i = 0;
        let mut end_of_list = false;
        while i < size {
            let j = self.parse_listitem(&mut work, &data[i..], &mut flags, &mut end_of_list);
            i += j;

            if j == 0 || end_of_list {
                break;
            }
        }

        self.renderer.list(ob, &work, flags);
        self.block_bufs.restore(work);
        i
    }

    fn parse_table_row(
        &mut self,
        ob: &mut Buffer,
        data: &[u8],
        columns: usize,
        col_data: &[TableFlags],
        header_flag: TableFlags,
    ) {
        if !self.has(Callbacks::TABLE_CELLS) {
            return;
        }

        let size = data.len();
        let mut row_work = self.span_bufs.checkout();

        let mut i = 0;
        if i < size && data[i] == b'|' {
            i += 1;
        }

        let mut col = 0;
        while col < columns && i < size {
            let mut cell_work = self.span_bufs.checkout();

            while i < size && is_md_space(data[i]) {
                i += 1;
            }
            let cell_start = i;

            while i < size && data[i] != b'|' {
                i += 1;
            }

            // trim the cell, keeping one byte when it is all spaces
            let mut cell_end = i - 1;
            while cell_end > cell_start && is_md_space(data[cell_end]) {
                cell_end -= 1;
            }
            let cell_len = 1 + cell_end - cell_start;

            self.parse_inline(&mut cell_work, &data[cell_start..cell_start + cell_len]);
            self.renderer
                .table_cell(&mut row_work, &cell_work, col_data[col] | header_flag);

            self.span_bufs.restore(cell_work);
            i += 1;
            col += 1;
        }

        while col < columns {
            // missing trailing cells come out empty
            self.renderer
                .table_cell(&mut row_work, &[], col_data[col] | header_flag);
            col += 1;
        }

        self.renderer.table_row(ob, &row_work);
        self.span_bufs.restore(row_work);
    }

    // Header row plus the alignment underline. Returns (consumed, columns,
    // per-column flags); consumed == 0 means "not a table".
    fn parse_table_header(
        &mut self,
        ob: &mut Buffer,
        data: &[u8],
    ) -> (usize, usize, Vec<TableFlags>) {
        let size = data.len();

        let mut i = 0;
        let mut pipes: i32 = 0;
        while i < size && data[i] != b'\n' {
            if data[i] == b'|' {
                pipes += 1;
            }
            i += 1;
        }

        if i == size || pipes == 0 {
            return (0, 0, Vec::new());
        }

        let mut header_end = i;
        while header_end > 0 && is_md_space(data[header_end - 1]) {
            header_end -= 1;
        }

        if data[0] == b'|' {
            pipes -= 1;
        }
        if header_end > 0 && data[header_end - 1] == b'|' {
            pipes -= 1;
        }

        let columns = (pipes + 1).max(0) as usize;
        let mut col_data = vec![TableFlags::empty(); columns];

        // the underline row
        i += 1;
        if i < size && data[i] == b'|' {
            i += 1;
        }

        let mut under_end = i;
        while under_end < size && data[under_end] != b'\n' {
            under_end += 1;
        }

        let mut col = 0;
        while col < columns && i < under_end {
            let mut dashes = 0;

            while i < under_end && data[i] == b' ' {
                i += 1;
            }

            if i < under_end && data[i] == b':' {
                i += 1;
                col_data[col] |= TableFlags::ALIGN_LEFT;
                dashes += 1;
            }

            while i < under_end && data[i] == b'-' {
                i += 1;
                dashes += 1;
            }

            if i < under_end && data[i] == b':' {
                i += 1;
                col_data[col] |= TableFlags::ALIGN_RIGHT;
                dashes += 1;
            }

            while i < under_end && data[i] == b' ' {
                i += 1;
            }

            if i < under_end && data[i] != b'|' {
                break;
            }

            if dashes < 3 {
                break;
            }

            i += 1;
            col += 1;
        }

        if col < columns {
            return (0, 0, Vec::new());
        }

        self.parse_table_row(ob, &data[..header_end], columns, &col_data, TableFlags::HEADER);

        (under_end + 1, columns, col_data)
    }

    fn parse_table(&mut self, ob: &mut Buffer, data: &[u8]) -> usize {
        let size = data.len();

        let mut header_work = self.span_bufs.checkout();
        let mut body_work = self.block_bufs.checkout();

        let (mut i, columns, col_data) = self.parse_table_header(&mut header_work, data);
        if i > 0 {
            while i < size {
                let row_start = i;
                let mut pipes = 0;

                while i < size && data[i] != b'\n' {
                    if data[i] == b'|' {
                        pipes += 1;
                    }
                    i += 1;
                }

                if pipes == 0 || i == size {
                    // first line without a pipe ends the table
                    i = row_start;
                    break;
                }

                self.parse_table_row(
                    &mut body_work,
                    &data[row_start..i],
                    columns,
                    &col_data,
                    TableFlags::empty(),
                );

                i += 1;
            }

            self.renderer.table(ob, &header_work, &body_work);
        }

        self.span_bufs.restore(header_work);
        self.block_bufs.restore(body_work);
        i
    }
}
