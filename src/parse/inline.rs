// Character-triggered inline tokenizer.
//
// The loop copies runs of inactive bytes through `normal_text`, then
// dispatches each active byte to the handler named by the engine's
// character table. A handler returns the number of bytes it consumed;
// zero means "no construct here", and the trigger byte falls back into the
// next verbatim run.

use crate::autolink::{self, AutolinkFlags};
use crate::buffer::Buffer;
use crate::render::{AutolinkKind, Callbacks, Render};

use super::{is_md_space, CharKind, Extensions, Markdown};

const ESCAPE_CHARS: &[u8] = b"\\`*_{}[]()#+-.!:|&<>^~";

impl<R: Render> Markdown<R> {
    /// Parse span-level markdown in `data`, emitting through the renderer.
    pub(crate) fn parse_inline(&mut self, ob: &mut Buffer, data: &[u8]) {
        if self.nesting() > self.max_nesting {
            return;
        }

        let size = data.len();
        let mut i = 0;
        let mut end = 0;

        while i < size {
            let mut action = CharKind::None;
            while end < size {
                action = self.active[data[end] as usize];
                if action != CharKind::None {
                    break;
                }
                end += 1;
            }

            self.renderer.normal_text(ob, &data[i..end]);

            if end >= size {
                break;
            }
            i = end;

            let consumed = match action {
                CharKind::Emphasis => self.span_emphasis(ob, data, i),
                CharKind::Codespan => self.span_codespan(ob, data, i),
                CharKind::Linebreak => self.span_linebreak(ob, data, i),
                CharKind::Link => self.span_link(ob, data, i),
                CharKind::Langle => self.span_angle(ob, data, i),
                CharKind::Escape => self.span_escape(ob, data, i),
                CharKind::Entity => self.span_entity(ob, data, i),
                CharKind::AutolinkUrl => self.span_autolink_url(ob, data, i),
                CharKind::AutolinkEmail => self.span_autolink_email(ob, data, i),
                CharKind::AutolinkWww => self.span_autolink_www(ob, data, i),
                CharKind::Superscript => self.span_superscript(ob, data, i),
                CharKind::None => 0,
            };

            if consumed == 0 {
                end = i + 1;
            } else {
                i += consumed;
                end = i;
            }
        }
    }

    // `*`, `_`, and (with the extension) `~`. The trigger dispatches on
    // run length; triple runs may rewind into the shorter recognizers.
    fn span_emphasis(&mut self, ob: &mut Buffer, data: &[u8], offset: usize) -> usize {
        let cur = &data[offset..];
        let size = cur.len();
        let c = cur[0];

        if self.extensions.contains(Extensions::NO_INTRA_EMPHASIS)
            && offset > 0
            && !is_md_space(data[offset - 1])
            && data[offset - 1] != b'>'
        {
            return 0;
        }

        if size > 2 && cur[1] != c {
            // whitespace can't follow an opening delimiter, and
            // strikethrough only comes doubled
            if c == b'~' || is_md_space(cur[1]) {
                return 0;
            }
            let ret = self.parse_single_emphasis(ob, &cur[1..], c);
            return if ret == 0 { 0 } else { ret + 1 };
        }

        if size > 3 && cur[1] == c && cur[2] != c {
            if is_md_space(cur[2]) {
                return 0;
            }
            let ret = self.parse_double_emphasis(ob, &cur[2..], c);
            return if ret == 0 { 0 } else { ret + 2 };
        }

        if size > 4 && cur[1] == c && cur[2] == c && cur[3] != c {
            if c == b'~' || is_md_space(cur[3]) {
                return 0;
            }
            let ret = self.parse_triple_emphasis(ob, data, offset + 3, c);
            return if ret == 0 { 0 } else { ret + 3 };
        }

        0
    }

    // Single emphasis: closed by a delimiter not preceded by whitespace.
    fn parse_single_emphasis(&mut self, ob: &mut Buffer, data: &[u8], c: u8) -> usize {
        if !self.has(Callbacks::EMPHASIS) {
            return 0;
        }

        let size = data.len();
        let mut i = 0;

        // skip one delimiter when delegated from a triple run
        if size > 1 && data[0] == c && data[1] == c {
            i = 1;
        }

        while i < size {
            let len = find_emphasis_char(&data[i..], c);
            if len == 0 {
                return 0;
            }
            i += len;
            if i >= size {
                return 0;
            }

            if data[i] == c && !is_md_space(data[i - 1]) {
                if self.extensions.contains(Extensions::NO_INTRA_EMPHASIS)
                    && i + 1 < size
                    && data[i + 1].is_ascii_alphanumeric()
                {
                    continue;
                }

                let mut work = self.span_bufs.checkout();
                self.parse_inline(&mut work, &data[..i]);
                let r = self.renderer.emphasis(ob, &work);
                self.span_bufs.restore(work);
                return if r { i + 1 } else { 0 };
            }
        }

        0
    }

    // Double emphasis, or strikethrough when the delimiter is `~`.
    fn parse_double_emphasis(&mut self, ob: &mut Buffer, data: &[u8], c: u8) -> usize {
        let strike = c == b'~';
        let needed = if strike {
            Callbacks::STRIKETHROUGH
        } else {
            Callbacks::DOUBLE_EMPHASIS
        };
        if !self.has(needed) {
            return 0;
        }

        let size = data.len();
        let mut i = 0;

        while i < size {
            let len = find_emphasis_char(&data[i..], c);
            if len == 0 {
                return 0;
            }
            i += len;

            if i + 1 < size && data[i] == c && data[i + 1] == c && i > 0 && !is_md_space(data[i - 1])
            {
                let mut work = self.span_bufs.checkout();
                self.parse_inline(&mut work, &data[..i]);
                let r = if strike {
                    self.renderer.strikethrough(ob, &work)
                } else {
                    self.renderer.double_emphasis(ob, &work)
                };
                self.span_bufs.restore(work);
                return if r { i + 2 } else { 0 };
            }
            i += 1;
        }

        0
    }

    // Triple emphasis: finds the first close, then hands shorter closes
    // back to the single/double recognizers with the delimiters rewound.
    fn parse_triple_emphasis(
        &mut self,
        ob: &mut Buffer,
        data: &[u8],
        start: usize,
        c: u8,
    ) -> usize {
        let size = data.len() - start;
        let mut i = 0;

        while i < size {
            let len = find_emphasis_char(&data[start + i..], c);
            if len == 0 {
                return 0;
            }
            i += len;

            let cur = &data[start..];
            if cur[i] != c || is_md_space(cur[i - 1]) {
                continue;
            }

            if i + 2 < size
                && cur[i + 1] == c
                && cur[i + 2] == c
                && self.has(Callbacks::TRIPLE_EMPHASIS)
            {
                let mut work = self.span_bufs.checkout();
                self.parse_inline(&mut work, &cur[..i]);
                let r = self.renderer.triple_emphasis(ob, &work);
                self.span_bufs.restore(work);
                return if r { i + 3 } else { 0 };
            } else if i + 1 < size && cur[i + 1] == c {
                // double close: re-parse as single emphasis two bytes back
                let len = self.parse_single_emphasis(ob, &data[start - 2..], c);
                return if len == 0 { 0 } else { len - 2 };
            } else {
                // single close: re-parse as double emphasis one byte back
                let len = self.parse_double_emphasis(ob, &data[start - 1..], c);
                return if len == 0 { 0 } else { len - 1 };
            }
        }

        0
    }

    // Backtick-run code span: the closer is an equal-length run.
    fn span_codespan(&mut self, ob: &mut Buffer, data: &[u8], offset: usize) -> usize {
        let cur = &data[offset..];
        let size = cur.len();

        let mut nb = 0;
        while nb < size && cur[nb] == b'`' {
            nb += 1;
        }

        let mut i = 0;
        let mut end = nb;
        while end < size && i < nb {
            if cur[end] == b'`' {
                i += 1;
            } else {
                i = 0;
            }
            end += 1;
        }

        if i < nb && end >= size {
            return 0; // no matching closer
        }

        // one leading and one trailing space are stripped
        let mut f_begin = nb;
        while f_begin < end && cur[f_begin] == b' ' {
            f_begin += 1;
        }

        let mut f_end = end - nb;
        while f_end > nb && cur[f_end - 1] == b' ' {
            f_end -= 1;
        }

        let r = if f_begin < f_end {
            self.renderer.codespan(ob, Some(&cur[f_begin..f_end]))
        } else {
            self.renderer.codespan(ob, None)
        };

        if r {
            end
        } else {
            0
        }
    }

    // Hard break: `\n` preceded by two spaces.
    fn span_linebreak(&mut self, ob: &mut Buffer, data: &[u8], offset: usize) -> usize {
        if offset < 2 || data[offset - 1] != b' ' || data[offset - 2] != b' ' {
            return 0;
        }

        let mut len = ob.len();
        while len > 0 && ob[len - 1] == b' ' {
            len -= 1;
        }
        ob.truncate(len);

        if self.renderer.linebreak(ob) {
            1
        } else {
            0
        }
    }

    // Backslash escape of a markdown-significant byte.
    fn span_escape(&mut self, ob: &mut Buffer, data: &[u8], offset: usize) -> usize {
        let cur = &data[offset..];

        if cur.len() > 1 {
            if !ESCAPE_CHARS.contains(&cur[1]) {
                return 0;
            }
            self.renderer.normal_text(ob, &cur[1..2]);
        } else if cur.len() == 1 {
            ob.put_byte(cur[0]);
        }

        2
    }

    // `&` starts an entity only when it matches `&#?[A-Za-z0-9]+;`.
    fn span_entity(&mut self, ob: &mut Buffer, data: &[u8], offset: usize) -> usize {
        let cur = &data[offset..];
        let size = cur.len();
        let mut end = 1;

        if end < size && cur[end] == b'#' {
            end += 1;
        }

        while end < size && cur[end].is_ascii_alphanumeric() {
            end += 1;
        }

        if end < size && cur[end] == b';' {
            end += 1;
        } else {
            return 0; // lone '&'
        }

        self.renderer.entity(ob, &cur[..end]);
        end
    }

    // `<…>`: an angle autolink, or a raw tag handed to the renderer.
    fn span_angle(&mut self, ob: &mut Buffer, data: &[u8], offset: usize) -> usize {
        let cur = &data[offset..];
        let (end, kind) = tag_length(cur);
        let mut handled = false;

        if end > 2 {
            match kind {
                Some(kind) if self.has(Callbacks::AUTOLINK) => {
                    let mut u_link = self.span_bufs.checkout();
                    unescape_backslashes(&mut u_link, &cur[1..end - 1]);
                    handled = self.renderer.autolink(ob, &u_link, kind);
                    self.span_bufs.restore(u_link);
                }
                _ if self.has(Callbacks::RAW_HTML_TAG) => {
                    handled = self.renderer.raw_html_tag(ob, &cur[..end]);
                }
                _ => {}
            }
        }

        if handled {
            end
        } else {
            0
        }
    }

    fn span_autolink_www(&mut self, ob: &mut Buffer, data: &[u8], offset: usize) -> usize {
        if !self.has(Callbacks::LINK) || self.in_link_body {
            return 0;
        }

        let mut link = self.span_bufs.checkout();
        let (link_len, rewind) =
            autolink::scan_www(&mut link, data, offset, AutolinkFlags::empty());

        if link_len > 0 {
            let mut link_url = self.span_bufs.checkout();
            link_url.put_str("http://");
            link_url.put(&link);

            ob.truncate(ob.len().saturating_sub(rewind));

            let mut link_text = self.span_bufs.checkout();
            self.renderer.normal_text(&mut link_text, &link);
            self.renderer
                .link(ob, Some(&link_url[..]), None, Some(&link_text[..]));
            self.span_bufs.restore(link_text);
            self.span_bufs.restore(link_url);
        }

        self.span_bufs.restore(link);
        link_len
    }

    fn span_autolink_email(&mut self, ob: &mut Buffer, data: &[u8], offset: usize) -> usize {
        if !self.has(Callbacks::AUTOLINK) || self.in_link_body {
            return 0;
        }

        let mut link = self.span_bufs.checkout();
        let (link_len, rewind) =
            autolink::scan_email(&mut link, data, offset, AutolinkFlags::empty());

        if link_len > 0 {
            ob.truncate(ob.len().saturating_sub(rewind));
            self.renderer.autolink(ob, &link, AutolinkKind::Email);
        }

        self.span_bufs.restore(link);
        link_len
    }

    fn span_autolink_url(&mut self, ob: &mut Buffer, data: &[u8], offset: usize) -> usize {
        if !self.has(Callbacks::AUTOLINK) || self.in_link_body {
            return 0;
        }

        let mut link = self.span_bufs.checkout();
        let (link_len, rewind) =
            autolink::scan_url(&mut link, data, offset, AutolinkFlags::empty());

        if link_len > 0 {
            ob.truncate(ob.len().saturating_sub(rewind));
            self.renderer.autolink(ob, &link, AutolinkKind::Normal);
        }

        self.span_bufs.restore(link);
        link_len
    }

    // `[text](url "title")`, `[text][label]`, or `[text]`; an image when
    // the byte before the bracket is `!`.
    fn span_link(&mut self, ob: &mut Buffer, data: &[u8], offset: usize) -> usize {
        let is_img = offset > 0 && data[offset - 1] == b'!';
        let cur = &data[offset..];
        let size = cur.len();

        if (is_img && !self.has(Callbacks::IMAGE)) || (!is_img && !self.has(Callbacks::LINK)) {
            return 0;
        }

        // matching closing bracket, tracking nesting and escapes
        let mut text_has_nl = false;
        let mut level = 1i32;
        let mut i = 1;
        while i < size {
            if cur[i] == b'\n' {
                text_has_nl = true;
            } else if cur[i - 1] == b'\\' {
                // escaped byte, not structural
            } else if cur[i] == b'[' {
                level += 1;
            } else if cur[i] == b']' {
                level -= 1;
                if level <= 0 {
                    break;
                }
            }
            i += 1;
        }

        if i >= size {
            return 0;
        }

        let txt_e = i;
        i += 1;

        // any amount of whitespace or newline (laxer than the original
        // Markdown syntax)
        while i < size && is_md_space(cur[i]) {
            i += 1;
        }

        let mut link: Option<Buffer> = None;
        let mut title: Option<Buffer> = None;

        if i < size && cur[i] == b'(' {
            // inline style
            i += 1;
            while i < size && is_md_space(cur[i]) {
                i += 1;
            }

            let mut link_b = i;

            // link runs to `)`, or to a quote that opens a title
            while i < size {
                if cur[i] == b'\\' {
                    i += 2;
                } else if cur[i] == b')' {
                    break;
                } else if i >= 1 && is_md_space(cur[i - 1]) && (cur[i] == b'\'' || cur[i] == b'"')
                {
                    break;
                } else {
                    i += 1;
                }
            }

            if i >= size {
                return 0;
            }
            let mut link_e = i;
            let mut title_b = 0;
            let mut title_e = 0;

            if cur[i] == b'\'' || cur[i] == b'"' {
                let qtype = cur[i];
                let mut in_title = true;
                i += 1;
                title_b = i;

                while i < size {
                    if cur[i] == b'\\' {
                        i += 2;
                    } else if cur[i] == qtype {
                        in_title = false;
                        i += 1;
                    } else if cur[i] == b')' && !in_title {
                        break;
                    } else {
                        i += 1;
                    }
                }

                if i >= size {
                    return 0;
                }

                // skip whitespace after the title, then demand the closer
                title_e = i - 1;
                while title_e > title_b && is_md_space(cur[title_e]) {
                    title_e -= 1;
                }
                if cur[title_e] != b'\'' && cur[title_e] != b'"' {
                    title_b = 0;
                    title_e = 0;
                    link_e = i;
                }
            }

            while link_e > link_b && is_md_space(cur[link_e - 1]) {
                link_e -= 1;
            }

            // optional angle brackets around the link
            if cur[link_b] == b'<' {
                link_b += 1;
            }
            if link_e > 0 && cur[link_e - 1] == b'>' {
                link_e -= 1;
            }

            if link_e > link_b {
                let mut l = Buffer::new(link_e - link_b);
                l.put(&cur[link_b..link_e]);
                link = Some(l);
            }

            if title_e > title_b {
                let mut t = Buffer::new(title_e - title_b);
                t.put(&cur[title_b..title_e]);
                title = Some(t);
            }

            i += 1;
        } else if i < size && cur[i] == b'[' {
            // reference style
            i += 1;
            let link_b = i;
            while i < size && cur[i] != b']' {
                i += 1;
            }
            if i >= size {
                return 0;
            }
            let link_e = i;

            let found = if link_b == link_e {
                if text_has_nl {
                    let id = collapse_newlines(&cur[1..txt_e]);
                    self.refs.find(&id).map(|r| (r.link.clone(), r.title.clone()))
                } else {
                    self.refs
                        .find(&cur[1..txt_e])
                        .map(|r| (r.link.clone(), r.title.clone()))
                }
            } else {
                self.refs
                    .find(&cur[link_b..link_e])
                    .map(|r| (r.link.clone(), r.title.clone()))
            };

            match found {
                Some((l, t)) => {
                    link = Some(l);
                    title = t;
                }
                None => return 0,
            }

            i += 1;
        } else {
            // shortcut reference style
            let found = if text_has_nl {
                let id = collapse_newlines(&cur[1..txt_e]);
                self.refs.find(&id).map(|r| (r.link.clone(), r.title.clone()))
            } else {
                self.refs
                    .find(&cur[1..txt_e])
                    .map(|r| (r.link.clone(), r.title.clone()))
            };

            match found {
                Some((l, t)) => {
                    link = Some(l);
                    title = t;
                }
                None => return 0,
            }

            // rewind the whitespace
            i = txt_e + 1;
        }

        // content: image alt stays verbatim, link text is inline-parsed
        let mut content: Option<Buffer> = None;
        if txt_e > 1 {
            let mut c = self.span_bufs.checkout();
            if is_img {
                c.put(&cur[1..txt_e]);
            } else {
                // no nested autolinks inside link text
                self.in_link_body = true;
                self.parse_inline(&mut c, &cur[1..txt_e]);
                self.in_link_body = false;
            }
            content = Some(c);
        }

        let mut u_link: Option<Buffer> = None;
        if let Some(ref l) = link {
            let mut u = self.span_bufs.checkout();
            unescape_backslashes(&mut u, l);
            u_link = Some(u);
        }

        let handled = if is_img {
            if !ob.is_empty() && ob[ob.len() - 1] == b'!' {
                ob.truncate(ob.len() - 1);
            }
            self.renderer.image(
                ob,
                u_link.as_deref(),
                title.as_deref(),
                content.as_deref(),
            )
        } else {
            self.renderer.link(
                ob,
                u_link.as_deref(),
                title.as_deref(),
                content.as_deref(),
            )
        };

        if let Some(c) = content {
            self.span_bufs.restore(c);
        }
        if let Some(u) = u_link {
            self.span_bufs.restore(u);
        }

        if handled {
            i
        } else {
            0
        }
    }

    // `^word` or `^(spanning text)`.
    fn span_superscript(&mut self, ob: &mut Buffer, data: &[u8], offset: usize) -> usize {
        if !self.has(Callbacks::SUPERSCRIPT) {
            return 0;
        }

        let cur = &data[offset..];
        let size = cur.len();
        if size < 2 {
            return 0;
        }

        let sup_start;
        let mut sup_len;

        if cur[1] == b'(' {
            sup_start = 2;
            sup_len = 2;

            while sup_len < size && cur[sup_len] != b')' && cur[sup_len - 1] != b'\\' {
                sup_len += 1;
            }

            if sup_len == size {
                return 0;
            }
        } else {
            sup_start = 1;
            sup_len = 1;

            while sup_len < size && !is_md_space(cur[sup_len]) {
                sup_len += 1;
            }
        }

        if sup_len == sup_start {
            return if sup_start == 2 { 3 } else { 0 };
        }

        let mut sup = self.span_bufs.checkout();
        self.parse_inline(&mut sup, &cur[sup_start..sup_len]);
        self.renderer.superscript(ob, &sup);
        self.span_bufs.restore(sup);

        if sup_start == 2 {
            sup_len + 1
        } else {
            sup_len
        }
    }
}

// Find the next occurrence of `c` usable as an emphasis close, skipping
// code spans, bracket groups, and escaped bytes. When a skipped group runs
// off the end, the earliest candidate seen inside it is still reported so
// an unterminated group can close the outer emphasis.
fn find_emphasis_char(data: &[u8], c: u8) -> usize {
    let size = data.len();
    let mut i = 1;

    while i < size {
        while i < size && data[i] != c && data[i] != b'`' && data[i] != b'[' {
            i += 1;
        }

        if i == size {
            return 0;
        }

        if data[i] == c {
            return i;
        }

        // escaped delimiters don't count
        if i > 0 && data[i - 1] == b'\\' {
            i += 1;
            continue;
        }

        if data[i] == b'`' {
            // skip the code span, matching the opening run length
            let mut span_nb = 0;
            let mut tmp_i = 0;

            while i < size && data[i] == b'`' {
                i += 1;
                span_nb += 1;
            }

            if i >= size {
                return 0;
            }

            let mut bt = 0;
            while i < size && bt < span_nb {
                if tmp_i == 0 && data[i] == c {
                    tmp_i = i;
                }
                if data[i] == b'`' {
                    bt += 1;
                } else {
                    bt = 0;
                }
                i += 1;
            }

            if i >= size {
                return tmp_i;
            }
        } else if data[i] == b'[' {
            // skip a link-shaped group
            let mut tmp_i = 0;

            i += 1;
            while i < size && data[i] != b']' {
                if tmp_i == 0 && data[i] == c {
                    tmp_i = i;
                }
                i += 1;
            }

            i += 1;
            while i < size && (data[i] == b' ' || data[i] == b'\n') {
                i += 1;
            }

            if i >= size {
                return tmp_i;
            }

            let cc = match data[i] {
                b'[' => b']',
                b'(' => b')',
                _ => {
                    if tmp_i > 0 {
                        return tmp_i;
                    }
                    continue;
                }
            };

            i += 1;
            while i < size && data[i] != cc {
                if tmp_i == 0 && data[i] == c {
                    tmp_i = i;
                }
                i += 1;
            }

            if i >= size {
                return tmp_i;
            }

            i += 1;
        }
    }

    0
}

// Mail address inside an angle autolink: `[-@._a-zA-Z0-9]+` with exactly
// one `@`, closed by `>`.
fn is_mail_autolink(data: &[u8]) -> usize {
    let mut nb = 0;

    for (i, &c) in data.iter().enumerate() {
        if c.is_ascii_alphanumeric() {
            continue;
        }
        match c {
            b'@' => nb += 1,
            b'-' | b'.' | b'_' => {}
            b'>' => return if nb == 1 { i + 1 } else { 0 },
            _ => return 0,
        }
    }

    0
}

// Length of the tag starting at `data[0] == '<'`, plus the autolink kind
// when the contents read as a URI or mail address rather than a tag.
fn tag_length(data: &[u8]) -> (usize, Option<AutolinkKind>) {
    let size = data.len();

    // a valid tag can't be shorter than 3 bytes, and begins with `<`,
    // an optional `/`, then a letter or digit
    if size < 3 || data[0] != b'<' {
        return (0, None);
    }
    let mut i = if data[1] == b'/' { 2 } else { 1 };

    if !data[i].is_ascii_alphanumeric() {
        return (0, None);
    }

    // scheme test
    while i < size
        && (data[i].is_ascii_alphanumeric() || data[i] == b'.' || data[i] == b'+' || data[i] == b'-')
    {
        i += 1;
    }

    if i > 1 && i < size && data[i] == b'@' {
        let j = is_mail_autolink(&data[i..]);
        if j > 0 {
            return (i + j, Some(AutolinkKind::Email));
        }
    }

    let mut is_uri = false;
    if i > 2 && i < size && data[i] == b':' {
        is_uri = true;
        i += 1;
    }

    if is_uri && i < size {
        // completing the autolink test: no whitespace or quotes allowed
        let j = i;

        while i < size {
            if data[i] == b'\\' {
                i += 2;
            } else if data[i] == b'>'
                || data[i] == b'\''
                || data[i] == b'"'
                || data[i] == b' '
                || data[i] == b'\n'
            {
                break;
            } else {
                i += 1;
            }
        }

        if i >= size {
            return (0, None);
        }
        if i > j && data[i] == b'>' {
            return (i + 1, Some(AutolinkKind::Normal));
        }
        // a forbidden byte: not an autolink after all
    }

    // something shaped like a tag end
    while i < size && data[i] != b'>' {
        i += 1;
    }
    if i >= size {
        return (0, None);
    }
    (i + 1, None)
}

// Copy `src`, consuming backslash escapes as pairs.
fn unescape_backslashes(ob: &mut Buffer, src: &[u8]) {
    let mut i = 0;

    while i < src.len() {
        let org = i;
        while i < src.len() && src[i] != b'\\' {
            i += 1;
        }

        if i > org {
            ob.put(&src[org..i]);
        }

        if i + 1 >= src.len() {
            break;
        }

        ob.put_byte(src[i + 1]);
        i += 2;
    }
}

// Reference labels spanning lines collapse each newline to one space.
// `text` starts just past the opening bracket, so the byte before index 0
// is the `[` itself: a leading newline always collapses to a space.
fn collapse_newlines(text: &[u8]) -> Vec<u8> {
    let mut id = Vec::with_capacity(text.len());

    for (j, &b) in text.iter().enumerate() {
        if b != b'\n' {
            id.push(b);
        } else if j == 0 || text[j - 1] != b' ' {
            id.push(b' ');
        }
    }

    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emphasis_char_skips_code_spans() {
        assert_eq!(find_emphasis_char(b"a `*` b*", b'*'), 7);
        assert_eq!(find_emphasis_char(b"a *b", b'*'), 2);
        assert_eq!(find_emphasis_char(b"no close", b'*'), 0);
    }

    #[test]
    fn emphasis_char_skips_bracket_groups() {
        assert_eq!(find_emphasis_char(b"x [a*b](u) c*", b'*'), 12);
    }

    #[test]
    fn tag_length_classifies_autolinks() {
        assert_eq!(
            tag_length(b"<http://e.com>"),
            (14, Some(AutolinkKind::Normal))
        );
        assert_eq!(tag_length(b"<a@b.com>"), (9, Some(AutolinkKind::Email)));
        assert_eq!(tag_length(b"<em>"), (4, None));
        assert_eq!(tag_length(b"<>"), (0, None));
        assert_eq!(tag_length(b"<no end"), (0, None));
    }

    #[test]
    fn unescape_consumes_pairs() {
        let mut ob = Buffer::new(16);
        unescape_backslashes(&mut ob, b"a\\_b\\*c");
        assert_eq!(&ob[..], b"a_b*c");
    }

    #[test]
    fn collapse_newlines_in_labels() {
        assert_eq!(collapse_newlines(b"two\nlines"), b"two lines");
        assert_eq!(collapse_newlines(b"spaced \nlabel"), b"spaced label");
        assert_eq!(collapse_newlines(b"\nleading"), b" leading");
    }
}
