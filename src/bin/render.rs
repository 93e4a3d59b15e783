use std::io::{self, Read};

use markdown2html::{to_html_with, Extensions, HtmlFlags};

fn main() {
    let mut markdown = String::new();
    io::stdin()
        .read_to_string(&mut markdown)
        .expect("read stdin");

    let extensions = Extensions::TABLES
        | Extensions::FENCED_CODE
        | Extensions::AUTOLINK
        | Extensions::STRIKETHROUGH;
    let html = to_html_with(&markdown, extensions, HtmlFlags::empty());
    print!("{html}");
}
