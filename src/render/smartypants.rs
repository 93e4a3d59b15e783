// Smart-punctuation post-processor.
//
// Runs over already-rendered HTML and rewrites ASCII punctuation into
// typographic entities: paired curly quotes, en/em dashes, ellipses,
// `(c)`/`(r)`/`(tm)`, and vulgar fractions. Content inside `<pre>`,
// `<code>` and similar tags passes through untouched. Same dispatch shape
// as the inline tokenizer: a 256-entry table selects a handler per byte.

use std::fmt::Write;

use crate::buffer::Buffer;
use crate::render::html::{is_html_tag, HtmlTag};

// Handler index per byte; 0 passes through.
const CB_CHARS: [u8; 256] = {
    let mut t = [0u8; 256];
    t[b'-' as usize] = 1;
    t[b'(' as usize] = 2;
    t[b'\'' as usize] = 3;
    t[b'"' as usize] = 4;
    t[b'&' as usize] = 5;
    t[b'.' as usize] = 6;
    t[b'1' as usize] = 7;
    t[b'3' as usize] = 7;
    t[b'<' as usize] = 8;
    t[b'`' as usize] = 9;
    t[b'\\' as usize] = 10;
    t
};

// Tags whose contents are left alone.
const SKIP_TAGS: [&str; 8] = [
    "pre", "code", "var", "samp", "kbd", "math", "script", "style",
];

struct QuoteState {
    in_squote: bool,
    in_dquote: bool,
}

fn word_boundary(c: u8) -> bool {
    c == 0 || c.is_ascii_whitespace() || c.is_ascii_punctuation()
}

// Emit the left or right quote entity for `quote` ('s' or 'd'), flipping
// the open state. Fails when the surrounding bytes say this can't be a
// quote edge.
fn smart_quote(ob: &mut Buffer, previous: u8, next: u8, quote: u8, is_open: &mut bool) -> bool {
    if *is_open && !word_boundary(next) {
        return false;
    }
    if !*is_open && !word_boundary(previous) {
        return false;
    }

    let _ = write!(
        ob,
        "&{}{}quo;",
        if *is_open { 'r' } else { 'l' },
        quote as char
    );
    *is_open = !*is_open;
    true
}

fn cb_squote(ob: &mut Buffer, smrt: &mut QuoteState, previous: u8, text: &[u8]) -> usize {
    let size = text.len();

    if size >= 2 {
        let t1 = text[1].to_ascii_lowercase();

        if t1 == b'\'' {
            let next = if size >= 3 { text[2] } else { 0 };
            if smart_quote(ob, previous, next, b'd', &mut smrt.in_dquote) {
                return 1;
            }
        }

        // common contractions get a right quote outright
        if matches!(t1, b's' | b't' | b'm' | b'd')
            && (size == 3 || word_boundary(*text.get(2).unwrap_or(&0)))
        {
            ob.put_str("&rsquo;");
            return 0;
        }

        if size >= 3 {
            let t2 = text[2].to_ascii_lowercase();

            if ((t1 == b'r' && t2 == b'e') || (t1 == b'l' && t2 == b'l') || (t1 == b'v' && t2 == b'e'))
                && (size == 4 || word_boundary(*text.get(3).unwrap_or(&0)))
            {
                ob.put_str("&rsquo;");
                return 0;
            }
        }
    }

    let next = text.get(1).copied().unwrap_or(0);
    if smart_quote(ob, previous, next, b's', &mut smrt.in_squote) {
        return 0;
    }

    ob.put_byte(text[0]);
    0
}

fn cb_parens(ob: &mut Buffer, _smrt: &mut QuoteState, _previous: u8, text: &[u8]) -> usize {
    let size = text.len();

    if size >= 3 {
        let t1 = text[1].to_ascii_lowercase();
        let t2 = text[2].to_ascii_lowercase();

        if t1 == b'c' && t2 == b')' {
            ob.put_str("&copy;");
            return 2;
        }

        if t1 == b'r' && t2 == b')' {
            ob.put_str("&reg;");
            return 2;
        }

        if size >= 4 && t1 == b't' && t2 == b'm' && text[3] == b')' {
            ob.put_str("&trade;");
            return 3;
        }
    }

    ob.put_byte(text[0]);
    0
}

fn cb_dash(ob: &mut Buffer, _smrt: &mut QuoteState, _previous: u8, text: &[u8]) -> usize {
    let size = text.len();

    if size >= 3 && text[1] == b'-' && text[2] == b'-' {
        ob.put_str("&mdash;");
        return 2;
    }

    if size >= 2 && text[1] == b'-' {
        ob.put_str("&ndash;");
        return 1;
    }

    ob.put_byte(text[0]);
    0
}

fn cb_amp(ob: &mut Buffer, smrt: &mut QuoteState, previous: u8, text: &[u8]) -> usize {
    if text.starts_with(b"&quot;") {
        let next = text.get(6).copied().unwrap_or(0);
        if smart_quote(ob, previous, next, b'd', &mut smrt.in_dquote) {
            return 5;
        }
    }

    if text.starts_with(b"&#0;") {
        return 3;
    }

    ob.put_byte(b'&');
    0
}

fn cb_period(ob: &mut Buffer, _smrt: &mut QuoteState, _previous: u8, text: &[u8]) -> usize {
    let size = text.len();

    if size >= 3 && text[1] == b'.' && text[2] == b'.' {
        ob.put_str("&hellip;");
        return 2;
    }

    if size >= 5 && text[1] == b' ' && text[2] == b'.' && text[3] == b' ' && text[4] == b'.' {
        ob.put_str("&hellip;");
        return 4;
    }

    ob.put_byte(text[0]);
    0
}

fn cb_backtick(ob: &mut Buffer, smrt: &mut QuoteState, previous: u8, text: &[u8]) -> usize {
    if text.len() >= 2 && text[1] == b'`' {
        let next = text.get(2).copied().unwrap_or(0);
        if smart_quote(ob, previous, next, b'd', &mut smrt.in_dquote) {
            return 1;
        }
    }

    0
}

fn cb_number(ob: &mut Buffer, _smrt: &mut QuoteState, previous: u8, text: &[u8]) -> usize {
    let size = text.len();

    if word_boundary(previous) && size >= 3 {
        if text[0] == b'1' && text[1] == b'/' && text[2] == b'2' {
            if size == 3 || word_boundary(*text.get(3).unwrap_or(&0)) {
                ob.put_str("&frac12;");
                return 2;
            }
        }

        if text[0] == b'1' && text[1] == b'/' && text[2] == b'4' {
            if size == 3
                || word_boundary(*text.get(3).unwrap_or(&0))
                || (size >= 5
                    && text[3].to_ascii_lowercase() == b't'
                    && text[4].to_ascii_lowercase() == b'h')
            {
                ob.put_str("&frac14;");
                return 2;
            }
        }

        if text[0] == b'3' && text[1] == b'/' && text[2] == b'4' {
            if size == 3
                || word_boundary(*text.get(3).unwrap_or(&0))
                || (size >= 6
                    && text[3].to_ascii_lowercase() == b't'
                    && text[4].to_ascii_lowercase() == b'h'
                    && text[5].to_ascii_lowercase() == b's')
            {
                ob.put_str("&frac34;");
                return 2;
            }
        }
    }

    ob.put_byte(text[0]);
    0
}

fn cb_dquote(ob: &mut Buffer, smrt: &mut QuoteState, previous: u8, text: &[u8]) -> usize {
    let next = text.get(1).copied().unwrap_or(0);

    if !smart_quote(ob, previous, next, b'd', &mut smrt.in_dquote) {
        ob.put_str("&quot;");
    }

    0
}

fn cb_ltag(ob: &mut Buffer, _smrt: &mut QuoteState, _previous: u8, text: &[u8]) -> usize {
    let size = text.len();
    let mut i = 0;

    while i < size && text[i] != b'>' {
        i += 1;
    }

    let mut tag = 0;
    while tag < SKIP_TAGS.len() {
        if is_html_tag(text, SKIP_TAGS[tag]) == HtmlTag::Open {
            break;
        }
        tag += 1;
    }

    if tag < SKIP_TAGS.len() {
        // copy through to the matching closing tag
        loop {
            while i < size && text[i] != b'<' {
                i += 1;
            }

            if i == size {
                break;
            }

            if is_html_tag(&text[i..], SKIP_TAGS[tag]) == HtmlTag::Close {
                break;
            }

            i += 1;
        }

        while i < size && text[i] != b'>' {
            i += 1;
        }
    }

    ob.put(&text[..(i + 1).min(size)]);
    i
}

fn cb_escape(ob: &mut Buffer, _smrt: &mut QuoteState, _previous: u8, text: &[u8]) -> usize {
    if text.len() < 2 {
        return 0;
    }

    match text[1] {
        b'\\' | b'"' | b'\'' | b'.' | b'-' | b'`' => {
            ob.put_byte(text[1]);
            1
        }
        _ => {
            ob.put_byte(b'\\');
            0
        }
    }
}

/// Rewrite ASCII punctuation in rendered HTML into typographic entities.
pub fn smartypants(ob: &mut Buffer, text: &[u8]) {
    let mut smrt = QuoteState {
        in_squote: false,
        in_dquote: false,
    };

    let _ = ob.grow(ob.len() + text.len());

    let mut i = 0;
    while i < text.len() {
        let org = i;
        let mut action = 0;

        while i < text.len() {
            action = CB_CHARS[text[i] as usize];
            if action != 0 {
                break;
            }
            i += 1;
        }

        if i > org {
            ob.put(&text[org..i]);
        }

        if i < text.len() {
            let previous = if i > 0 { text[i - 1] } else { 0 };
            let cur = &text[i..];

            i += match action {
                1 => cb_dash(ob, &mut smrt, previous, cur),
                2 => cb_parens(ob, &mut smrt, previous, cur),
                3 => cb_squote(ob, &mut smrt, previous, cur),
                4 => cb_dquote(ob, &mut smrt, previous, cur),
                5 => cb_amp(ob, &mut smrt, previous, cur),
                6 => cb_period(ob, &mut smrt, previous, cur),
                7 => cb_number(ob, &mut smrt, previous, cur),
                8 => cb_ltag(ob, &mut smrt, previous, cur),
                9 => cb_backtick(ob, &mut smrt, previous, cur),
                10 => cb_escape(ob, &mut smrt, previous, cur),
                _ => 0,
            };
        }

        i += 1;
    }
}
