// Rendering tests with exact expected HTML, block and inline constructs,
// extension gating, and renderer fallback behavior.

use pretty_assertions::assert_eq;

use markdown2html::{
    smartypants, to_html, to_html_with, Buffer, Callbacks, Extensions, Html, HtmlFlags, Markdown,
    Render, Toc,
};

fn render_ext(input: &str, extensions: Extensions) -> String {
    to_html_with(input, extensions, HtmlFlags::empty())
}

// ---------------------------------------------------------------------------
// Inline constructs
// ---------------------------------------------------------------------------

#[test]
fn emphasis_and_strong() {
    assert_eq!(
        to_html("**bold** and *em*\n"),
        "<p><strong>bold</strong> and <em>em</em></p>\n"
    );
}

#[test]
fn underscore_emphasis() {
    assert_eq!(to_html("_em_ and __strong__\n"), "<p><em>em</em> and <strong>strong</strong></p>\n");
}

#[test]
fn triple_emphasis() {
    assert_eq!(
        to_html("***all three***\n"),
        "<p><strong><em>all three</em></strong></p>\n"
    );
}

#[test]
fn unclosed_emphasis_stays_verbatim() {
    assert_eq!(to_html("a *b c\n"), "<p>a *b c</p>\n");
    assert_eq!(to_html("**a\n"), "<p>**a</p>\n");
}

#[test]
fn opening_delimiter_rejects_following_space() {
    assert_eq!(to_html("a * b * c\n"), "<p>a * b * c</p>\n");
}

#[test]
fn code_span() {
    assert_eq!(to_html("`code` span\n"), "<p><code>code</code> span</p>\n");
}

#[test]
fn code_span_double_backticks() {
    assert_eq!(
        to_html("``a `tick` b``\n"),
        "<p><code>a `tick` b</code></p>\n"
    );
}

#[test]
fn code_span_trims_one_space() {
    assert_eq!(to_html("` x `\n"), "<p><code>x</code></p>\n");
}

#[test]
fn code_span_protects_emphasis() {
    assert_eq!(
        to_html("*a `*` b*\n"),
        "<p><em>a <code>*</code> b</em></p>\n"
    );
}

#[test]
fn hard_linebreak_needs_two_spaces() {
    assert_eq!(to_html("a  \nb\n"), "<p>a<br>\nb</p>\n");
    assert_eq!(to_html("a \nb\n"), "<p>a \nb</p>\n");
}

#[test]
fn escapes_emit_literals() {
    assert_eq!(to_html("\\*not\\* emphasis\n"), "<p>*not* emphasis</p>\n");
}

#[test]
fn entity_passthrough_and_bare_ampersand() {
    assert_eq!(to_html("AT&amp;T\n"), "<p>AT&amp;T</p>\n");
    assert_eq!(to_html("a & b\n"), "<p>a &amp; b</p>\n");
    assert_eq!(to_html("&#169; ok\n"), "<p>&#169; ok</p>\n");
}

#[test]
fn normal_text_is_html_escaped() {
    assert_eq!(to_html("1 < 2\n"), "<p>1 &lt; 2</p>\n");
}

#[test]
fn angle_autolink() {
    assert_eq!(
        to_html("<http://x.com/>\n"),
        "<p><a href=\"http://x.com/\">http://x.com/</a></p>\n"
    );
}

#[test]
fn angle_email_autolink() {
    assert_eq!(
        to_html("<foo@bar.com>\n"),
        "<p><a href=\"mailto:foo@bar.com\">foo@bar.com</a></p>\n"
    );
}

#[test]
fn raw_inline_tag_passes_through() {
    assert_eq!(to_html("a <em>x</em> b\n"), "<p>a <em>x</em> b</p>\n");
}

// ---------------------------------------------------------------------------
// Links and images
// ---------------------------------------------------------------------------

#[test]
fn inline_link() {
    assert_eq!(
        to_html("[text](/url)\n"),
        "<p><a href=\"/url\">text</a></p>\n"
    );
}

#[test]
fn inline_link_with_title() {
    assert_eq!(
        to_html("[x](/u \"T\")\n"),
        "<p><a href=\"/u\" title=\"T\">x</a></p>\n"
    );
}

#[test]
fn inline_link_angle_url() {
    assert_eq!(
        to_html("[x](</url>)\n"),
        "<p><a href=\"/url\">x</a></p>\n"
    );
}

#[test]
fn reference_link() {
    assert_eq!(
        to_html("[x][1]\n\n[1]: http://e.com \"T\"\n"),
        "<p><a href=\"http://e.com\" title=\"T\">x</a></p>\n"
    );
}

#[test]
fn reference_lookup_is_case_insensitive() {
    assert_eq!(
        to_html("[A][b]\n\n[B]: /url\n"),
        "<p><a href=\"/url\">A</a></p>\n"
    );
}

#[test]
fn shortcut_reference_link() {
    assert_eq!(
        to_html("[x]\n\n[x]: /url\n"),
        "<p><a href=\"/url\">x</a></p>\n"
    );
}

#[test]
fn unknown_reference_stays_verbatim() {
    assert_eq!(to_html("[x][nope]\n"), "<p>[x][nope]</p>\n");
}

#[test]
fn image() {
    assert_eq!(
        to_html("![alt](/img.png)\n"),
        "<p><img src=\"/img.png\" alt=\"alt\"></p>\n"
    );
}

#[test]
fn image_with_title() {
    assert_eq!(
        to_html("![a](/i.png \"t\")\n"),
        "<p><img src=\"/i.png\" alt=\"a\" title=\"t\"></p>\n"
    );
}

#[test]
fn link_content_is_inline_parsed() {
    assert_eq!(
        to_html("[*em* text](/u)\n"),
        "<p><a href=\"/u\"><em>em</em> text</a></p>\n"
    );
}

#[test]
fn link_url_is_href_escaped() {
    assert_eq!(
        to_html("[x](/a b)\n"),
        "<p><a href=\"/a%20b\">x</a></p>\n"
    );
}

// ---------------------------------------------------------------------------
// Block constructs
// ---------------------------------------------------------------------------

#[test]
fn atx_headers() {
    assert_eq!(to_html("# Title\n"), "<h1>Title</h1>\n");
    assert_eq!(to_html("### deep ###\n"), "<h3>deep</h3>\n");
    assert_eq!(to_html("####### seven\n"), "<h6># seven</h6>\n");
}

#[test]
fn setext_headers() {
    assert_eq!(to_html("Title\n=====\n"), "<h1>Title</h1>\n");
    assert_eq!(to_html("Sub\n---\n"), "<h2>Sub</h2>\n");
}

#[test]
fn setext_header_after_paragraph_lines() {
    assert_eq!(
        to_html("para\nTitle\n---\n"),
        "<p>para</p>\n\n<h2>Title</h2>\n"
    );
}

#[test]
fn horizontal_rules() {
    assert_eq!(to_html("***\n"), "<hr>\n");
    assert_eq!(to_html(" - - -\n"), "<hr>\n");
    assert_eq!(to_html("___\n"), "<hr>\n");
}

#[test]
fn blockquote() {
    assert_eq!(
        to_html("> quoted\n> lines\n"),
        "<blockquote>\n<p>quoted\nlines</p>\n</blockquote>\n"
    );
}

#[test]
fn nested_blockquote() {
    assert_eq!(
        to_html("> > inner\n"),
        "<blockquote>\n<blockquote>\n<p>inner</p>\n</blockquote>\n</blockquote>\n"
    );
}

#[test]
fn indented_code_block() {
    assert_eq!(
        to_html("    int x;\n"),
        "<pre><code>int x;\n</code></pre>\n"
    );
}

#[test]
fn indented_code_is_not_inline_parsed() {
    assert_eq!(
        to_html("    *stars*\n"),
        "<pre><code>*stars*\n</code></pre>\n"
    );
}

#[test]
fn unordered_list() {
    assert_eq!(
        to_html("* a\n* b\n"),
        "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n"
    );
}

#[test]
fn ordered_list() {
    assert_eq!(
        to_html("1. one\n2. two\n"),
        "<ol>\n<li>one</li>\n<li>two</li>\n</ol>\n"
    );
}

#[test]
fn loose_list_items_become_blocks() {
    assert_eq!(
        to_html("* a\n\n* b\n"),
        "<ul>\n<li><p>a</p></li>\n<li><p>b</p></li>\n</ul>\n"
    );
}

#[test]
fn list_item_inline_content() {
    assert_eq!(
        to_html("- *em* here\n"),
        "<ul>\n<li><em>em</em> here</li>\n</ul>\n"
    );
}

#[test]
fn multiple_paragraphs() {
    assert_eq!(
        to_html("one\n\ntwo\n"),
        "<p>one</p>\n\n<p>two</p>\n"
    );
}

#[test]
fn html_block_passthrough() {
    assert_eq!(
        to_html("<div>\nfoo\n</div>\n\nafter\n"),
        "<div>\nfoo\n</div>\n\n<p>after</p>\n"
    );
}

#[test]
fn html_comment_block() {
    assert_eq!(
        to_html("<!-- note -->\n\nx\n"),
        "<!-- note -->\n\n<p>x</p>\n"
    );
}

#[test]
fn unknown_tag_is_not_a_block() {
    assert_eq!(to_html("<span>x</span>\n"), "<p><span>x</span></p>\n");
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

#[test]
fn crlf_is_normalized() {
    assert_eq!(to_html("a\r\nb\r\n"), "<p>a\nb</p>\n");
    assert_eq!(to_html("a\rb\r"), "<p>a\nb</p>\n");
}

#[test]
fn bom_is_skipped() {
    assert_eq!(to_html("\u{FEFF}# H\n"), "<h1>H</h1>\n");
}

#[test]
fn tabs_expand_in_paragraphs() {
    assert_eq!(to_html("a\tb\n"), "<p>a   b</p>\n");
}

#[test]
fn missing_final_newline_is_tolerated() {
    assert_eq!(to_html("plain"), "<p>plain</p>\n");
}

// ---------------------------------------------------------------------------
// Extensions
// ---------------------------------------------------------------------------

#[test]
fn fenced_code() {
    assert_eq!(
        render_ext("```c\nint x;\n```\n", Extensions::FENCED_CODE),
        "<pre><code class=\"c\">int x;\n</code></pre>\n"
    );
}

#[test]
fn fenced_code_without_language() {
    assert_eq!(
        render_ext("~~~\ntext\n~~~\n", Extensions::FENCED_CODE),
        "<pre><code>text\n</code></pre>\n"
    );
}

#[test]
fn fenced_code_dotted_language_class() {
    assert_eq!(
        render_ext("``` {.rb}\nputs 1\n```\n", Extensions::FENCED_CODE),
        "<pre><code class=\"rb\">puts 1\n</code></pre>\n"
    );
}

#[test]
fn fence_off_means_paragraph() {
    let out = to_html("```c\nint x;\n```\n");
    assert!(!out.contains("<pre>"));
}

#[test]
fn table() {
    let input = "a | b\n---|---\n1 | 2\n";
    let expected = "<table><thead>\n<tr>\n<th>a</th>\n<th>b</th>\n</tr>\n</thead><tbody>\n<tr>\n<td>1</td>\n<td>2</td>\n</tr>\n</tbody></table>\n";
    assert_eq!(render_ext(input, Extensions::TABLES), expected);
}

#[test]
fn table_alignment() {
    let input = "a|b\n:--- | ---:\n1|2\n";
    let expected = "<table><thead>\n<tr>\n<th align=\"left\">a</th>\n<th align=\"right\">b</th>\n</tr>\n</thead><tbody>\n<tr>\n<td align=\"left\">1</td>\n<td align=\"right\">2</td>\n</tr>\n</tbody></table>\n";
    assert_eq!(render_ext(input, Extensions::TABLES), expected);
}

#[test]
fn table_missing_cells_are_empty() {
    let input = "a|b\n---|---\n1|\n";
    let expected = "<table><thead>\n<tr>\n<th>a</th>\n<th>b</th>\n</tr>\n</thead><tbody>\n<tr>\n<td>1</td>\n<td></td>\n</tr>\n</tbody></table>\n";
    assert_eq!(render_ext(input, Extensions::TABLES), expected);
}

#[test]
fn strikethrough() {
    assert_eq!(
        render_ext("~~gone~~ kept\n", Extensions::STRIKETHROUGH),
        "<p><del>gone</del> kept</p>\n"
    );
}

#[test]
fn superscript() {
    assert_eq!(
        render_ext("2^10 x\n", Extensions::SUPERSCRIPT),
        "<p>2<sup>10</sup> x</p>\n"
    );
    assert_eq!(
        render_ext("x^(a b)\n", Extensions::SUPERSCRIPT),
        "<p>x<sup>a b</sup></p>\n"
    );
}

#[test]
fn bare_autolinks() {
    assert_eq!(
        render_ext("go to http://e.com now\n", Extensions::AUTOLINK),
        "<p>go to <a href=\"http://e.com\">http://e.com</a> now</p>\n"
    );
    assert_eq!(
        render_ext("see www.example.com now\n", Extensions::AUTOLINK),
        "<p>see <a href=\"http://www.example.com\">www.example.com</a> now</p>\n"
    );
    assert_eq!(
        render_ext("mail foo@example.com ok\n", Extensions::AUTOLINK),
        "<p>mail <a href=\"mailto:foo@example.com\">foo@example.com</a> ok</p>\n"
    );
}

#[test]
fn no_autolinks_inside_link_text() {
    assert_eq!(
        render_ext("[see http://e.com](/u)\n", Extensions::AUTOLINK),
        "<p><a href=\"/u\">see http://e.com</a></p>\n"
    );
}

#[test]
fn space_headers() {
    assert_eq!(
        render_ext("#nospace\n", Extensions::SPACE_HEADERS),
        "<p>#nospace</p>\n"
    );
    assert_eq!(
        render_ext("# spaced\n", Extensions::SPACE_HEADERS),
        "<h1>spaced</h1>\n"
    );
}

#[test]
fn no_intra_emphasis() {
    assert_eq!(
        render_ext("foo_bar_baz\n", Extensions::NO_INTRA_EMPHASIS),
        "<p>foo_bar_baz</p>\n"
    );
    assert_eq!(to_html("foo_bar_baz\n"), "<p>foo<em>bar</em>baz</p>\n");
}

#[test]
fn lax_spacing_splits_paragraph_at_list() {
    assert_eq!(
        render_ext("para\n* item\n", Extensions::LAX_SPACING),
        "<p>para</p>\n\n<ul>\n<li>item</li>\n</ul>\n"
    );
    assert_eq!(to_html("para\n* item\n"), "<p>para\n* item</p>\n");
}

// ---------------------------------------------------------------------------
// Renderer flags
// ---------------------------------------------------------------------------

#[test]
fn xhtml_self_closing() {
    assert_eq!(
        to_html_with("***\n", Extensions::empty(), HtmlFlags::USE_XHTML),
        "<hr/>\n"
    );
    assert_eq!(
        to_html_with("a  \nb\n", Extensions::empty(), HtmlFlags::USE_XHTML),
        "<p>a<br/>\nb</p>\n"
    );
}

#[test]
fn hard_wrap() {
    assert_eq!(
        to_html_with("a\nb\n", Extensions::empty(), HtmlFlags::HARD_WRAP),
        "<p>a<br>\nb</p>\n"
    );
}

#[test]
fn safe_link_refuses_scripty_urls() {
    assert_eq!(
        to_html_with("[x](javascript:alert(1))\n", Extensions::empty(), HtmlFlags::SAFELINK),
        "<p>[x](javascript:alert(1))</p>\n"
    );
    assert_eq!(
        to_html_with("[x](/fine)\n", Extensions::empty(), HtmlFlags::SAFELINK),
        "<p><a href=\"/fine\">x</a></p>\n"
    );
}

#[test]
fn skip_html_drops_inline_tags() {
    assert_eq!(
        to_html_with("a <em>x</em> b\n", Extensions::empty(), HtmlFlags::SKIP_HTML),
        "<p>a x b</p>\n"
    );
}

#[test]
fn skip_html_turns_blocks_into_paragraphs() {
    let out = to_html_with(
        "<div>\nfoo\n</div>\n\n",
        Extensions::empty(),
        HtmlFlags::SKIP_HTML,
    );
    // with the block callback withdrawn, the lines fall through to
    // paragraph parsing and the tags are dropped as inline HTML
    assert_eq!(out, "<p>foo\n</p>\n");
}

#[test]
fn escape_mode_escapes_raw_html() {
    assert_eq!(
        to_html_with("a <em>x</em>\n", Extensions::empty(), HtmlFlags::ESCAPE),
        "<p>a &lt;em&gt;x&lt;/em&gt;</p>\n"
    );
}

#[test]
fn toc_header_ids_and_index() {
    let input = "# A\n## B\n# C\n";

    let body = to_html_with(input, Extensions::empty(), HtmlFlags::TOC);
    assert_eq!(
        body,
        "<h1 id=\"toc_0\">A</h1>\n\n<h2 id=\"toc_1\">B</h2>\n\n<h1 id=\"toc_2\">C</h1>\n"
    );

    let mut engine = Markdown::new(Extensions::empty(), 16, Toc::new());
    let mut ob = Buffer::new(64);
    engine.render(&mut ob, input.as_bytes());
    let toc = String::from_utf8_lossy(&ob).into_owned();
    assert_eq!(
        toc,
        "<ul>\n<li>\n<a href=\"#toc_0\">A</a>\n<ul>\n<li>\n<a href=\"#toc_1\">B</a>\n</li>\n</ul>\n</li>\n<li>\n<a href=\"#toc_2\">C</a>\n</li>\n</ul>\n"
    );
}

// ---------------------------------------------------------------------------
// Engine behavior
// ---------------------------------------------------------------------------

#[test]
fn rendering_is_stable_across_reuse() {
    let input = b"# T\n\n* a\n* b\n\n> q\n";
    let mut engine = Markdown::new(Extensions::empty(), 16, Html::default());

    let mut first = Buffer::new(64);
    engine.render(&mut first, input);
    let mut second = Buffer::new(64);
    engine.render(&mut second, input);
    let mut third = Buffer::new(64);
    engine.render(&mut third, input);

    assert_eq!(&first[..], &second[..]);
    assert_eq!(&second[..], &third[..]);
}

#[test]
fn nesting_budget_truncates_quietly() {
    let input = "> ".repeat(40) + "deep\n";
    let mut engine = Markdown::new(Extensions::empty(), 4, Html::default());
    let mut ob = Buffer::new(64);
    engine.render(&mut ob, input.as_bytes());

    let out = String::from_utf8_lossy(&ob);
    let opens = out.matches("<blockquote>").count();
    let closes = out.matches("</blockquote>").count();
    assert_eq!(opens, closes, "truncated output must stay well-formed");
    assert!(opens <= 5);
}

// A renderer that declines every span and emits block text bare: spans
// fall back to their source bytes, so a paragraph round-trips.
struct Passthrough;

impl Render for Passthrough {
    fn paragraph(&mut self, ob: &mut Buffer, content: &[u8]) {
        ob.put(content);
        ob.put_byte(b'\n');
    }
}

#[test]
fn declined_spans_fall_back_to_source_bytes() {
    let mut engine = Markdown::new(Extensions::empty(), 16, Passthrough);
    let mut ob = Buffer::new(64);
    engine.render(&mut ob, b"keep *stars* and `ticks` intact\n");
    assert_eq!(&ob[..], b"keep *stars* and `ticks` intact\n");
}

// A renderer that never registers emphasis leaves the delimiters as
// ordinary text.
struct NoEmphasis;

impl Render for NoEmphasis {
    fn callbacks(&self) -> Callbacks {
        Callbacks::all() - Callbacks::EMPHASIS - Callbacks::DOUBLE_EMPHASIS
            - Callbacks::TRIPLE_EMPHASIS - Callbacks::STRIKETHROUGH
    }

    fn paragraph(&mut self, ob: &mut Buffer, content: &[u8]) {
        ob.put(content);
        ob.put_byte(b'\n');
    }
}

#[test]
fn withdrawn_callbacks_deactivate_trigger_bytes() {
    let mut engine = Markdown::new(Extensions::empty(), 16, NoEmphasis);
    let mut ob = Buffer::new(64);
    engine.render(&mut ob, b"*stays*\n");
    assert_eq!(&ob[..], b"*stays*\n");
}

// ---------------------------------------------------------------------------
// Smartypants post-processing
// ---------------------------------------------------------------------------

#[test]
fn smartypants_over_rendered_html() {
    // apostrophes reach smartypants pre-escaped by the renderer, so only
    // the `&quot;` pairs, dashes, and ellipses change
    let html = to_html("\"quoted\" -- it's...\n");
    assert_eq!(html, "<p>&quot;quoted&quot; -- it&#39;s...</p>\n");

    let mut ob = Buffer::new(64);
    smartypants(&mut ob, html.as_bytes());
    assert_eq!(
        String::from_utf8_lossy(&ob),
        "<p>&ldquo;quoted&rdquo; &ndash; it&#39;s&hellip;</p>\n"
    );
}
