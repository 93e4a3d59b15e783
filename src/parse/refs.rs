// Link-reference definitions.
//
// The first pass strips `[label]: url "title"` lines from the document and
// stores them here, keyed by a hash of the lowercased label. Lookup matches
// on the stored hash alone and never re-compares label bytes, so two labels
// that collide on the 32-bit hash silently alias; kept for compatibility
// with the lineage this grammar comes from.

use crate::buffer::Buffer;

const TABLE_SIZE: usize = 8;

/// A stored reference definition.
pub(crate) struct LinkRef {
    id: u32,
    pub(crate) link: Buffer,
    pub(crate) title: Option<Buffer>,
}

/// Fixed-size bucket table of reference definitions.
pub(crate) struct RefTable {
    buckets: [Vec<LinkRef>; TABLE_SIZE],
}

fn hash_label(label: &[u8]) -> u32 {
    let mut hash = 0u32;
    for &b in label {
        hash = (b.to_ascii_lowercase() as u32)
            .wrapping_add(hash << 6)
            .wrapping_add(hash << 16)
            .wrapping_sub(hash);
    }
    hash
}

impl RefTable {
    pub(crate) fn new() -> Self {
        Self {
            buckets: Default::default(),
        }
    }

    pub(crate) fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    pub(crate) fn insert(&mut self, label: &[u8], link: Buffer, title: Option<Buffer>) {
        let id = hash_label(label);
        self.buckets[(id as usize) % TABLE_SIZE].push(LinkRef { id, link, title });
    }

    pub(crate) fn find(&self, label: &[u8]) -> Option<&LinkRef> {
        let id = hash_label(label);
        // Latest definition of a label wins.
        self.buckets[(id as usize) % TABLE_SIZE]
            .iter()
            .rev()
            .find(|r| r.id == id)
    }
}

/// Try to parse a reference definition starting at `data[beg..]`.
///
/// On a match the definition is inserted into `refs` and the position just
/// past the matched span is returned; on any mismatch the caller copies the
/// line verbatim instead.
pub(crate) fn is_ref(data: &[u8], beg: usize, end: usize, refs: &mut RefTable) -> Option<usize> {
    // up to 3 optional leading spaces
    if beg + 3 >= end {
        return None;
    }
    let mut i = 0;
    if data[beg] == b' ' {
        i = 1;
        if data[beg + 1] == b' ' {
            i = 2;
            if data[beg + 2] == b' ' {
                i = 3;
                if data[beg + 3] == b' ' {
                    return None;
                }
            }
        }
    }
    i += beg;

    // label part: anything but a newline between brackets
    if data[i] != b'[' {
        return None;
    }
    i += 1;
    let id_offset = i;
    while i < end && data[i] != b'\n' && data[i] != b'\r' && data[i] != b']' {
        i += 1;
    }
    if i >= end || data[i] != b']' {
        return None;
    }
    let id_end = i;

    // spacer: colon (space)* newline? (space)*
    i += 1;
    if i >= end || data[i] != b':' {
        return None;
    }
    i += 1;
    while i < end && data[i] == b' ' {
        i += 1;
    }
    if i < end && (data[i] == b'\n' || data[i] == b'\r') {
        i += 1;
        if i < end && data[i] == b'\r' && data[i - 1] == b'\n' {
            i += 1;
        }
    }
    while i < end && data[i] == b' ' {
        i += 1;
    }
    if i >= end {
        return None;
    }

    // link: whitespace-free sequence, optionally between angle brackets
    if data[i] == b'<' {
        i += 1;
    }
    let link_offset = i;
    while i < end && data[i] != b' ' && data[i] != b'\n' && data[i] != b'\r' {
        i += 1;
    }
    let link_end = if data[i - 1] == b'>' { i - 1 } else { i };

    // optional spacer: (space)* (newline | quote | paren)
    while i < end && data[i] == b' ' {
        i += 1;
    }
    if i < end
        && data[i] != b'\n'
        && data[i] != b'\r'
        && data[i] != b'\''
        && data[i] != b'"'
        && data[i] != b'('
    {
        return None;
    }
    let mut line_end = 0;
    if i >= end || data[i] == b'\r' || data[i] == b'\n' {
        line_end = i;
    }
    if i + 1 < end && data[i] == b'\n' && data[i + 1] == b'\r' {
        line_end = i + 1;
    }

    if line_end > 0 {
        i = line_end + 1;
        while i < end && data[i] == b' ' {
            i += 1;
        }
    }

    // optional title, enclosed in quotes or parens, alone on its line
    let mut title_offset = 0;
    let mut title_end = 0;
    if i + 1 < end && (data[i] == b'\'' || data[i] == b'"' || data[i] == b'(') {
        i += 1;
        title_offset = i;

        while i < end && data[i] != b'\n' && data[i] != b'\r' {
            i += 1;
        }
        title_end = if i + 1 < end && data[i] == b'\n' && data[i + 1] == b'\r' {
            i + 1
        } else {
            i
        };

        // step back over trailing whitespace to the closing delimiter
        i -= 1;
        while i > title_offset && data[i] == b' ' {
            i -= 1;
        }
        if i > title_offset && (data[i] == b'\'' || data[i] == b'"' || data[i] == b')') {
            line_end = title_end;
            title_end = i;
        }
    }

    if line_end == 0 || link_end == link_offset {
        return None; // garbage after the link, or empty link
    }

    let mut link = Buffer::new((link_end - link_offset).max(1));
    link.put(&data[link_offset..link_end]);

    let title = (title_end > title_offset).then(|| {
        let mut t = Buffer::new(title_end - title_offset);
        t.put(&data[title_offset..title_end]);
        t
    });

    refs.insert(&data[id_offset..id_end], link, title);

    Some(line_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> (RefTable, Option<usize>) {
        let mut refs = RefTable::new();
        let bytes = line.as_bytes();
        let last = is_ref(bytes, 0, bytes.len(), &mut refs);
        (refs, last)
    }

    #[test]
    fn simple_definition() {
        let (refs, last) = parse("[id]: http://example.com \"Title\"\n");
        assert!(last.is_some());
        let r = refs.find(b"id").unwrap();
        assert_eq!(&r.link[..], b"http://example.com");
        assert_eq!(&r.title.as_ref().unwrap()[..], b"Title");
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let (refs, _) = parse("[Example]: /url\n");
        assert!(refs.find(b"example").is_some());
        assert!(refs.find(b"EXAMPLE").is_some());
        assert!(refs.find(b"other").is_none());
    }

    #[test]
    fn angle_brackets_are_stripped() {
        let (refs, _) = parse("[x]: <http://example.com>\n");
        assert_eq!(&refs.find(b"x").unwrap().link[..], b"http://example.com");
    }

    #[test]
    fn title_on_following_line() {
        let (refs, last) = parse("[x]: /url\n    'The Title'\n");
        assert!(last.is_some());
        let r = refs.find(b"x").unwrap();
        assert_eq!(&r.link[..], b"/url");
        assert_eq!(&r.title.as_ref().unwrap()[..], b"The Title");
    }

    #[test]
    fn four_space_indent_is_not_a_definition() {
        let (_, last) = parse("    [x]: /url\n");
        assert!(last.is_none());
    }

    #[test]
    fn empty_url_fails() {
        let (_, last) = parse("[x]: \n");
        assert!(last.is_none());
    }

    #[test]
    fn latest_definition_wins() {
        let mut refs = RefTable::new();
        let first = b"[x]: /one\n";
        let second = b"[x]: /two\n";
        is_ref(first, 0, first.len(), &mut refs);
        is_ref(second, 0, second.len(), &mut refs);
        assert_eq!(&refs.find(b"x").unwrap().link[..], b"/two");
    }
}
