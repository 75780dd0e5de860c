//! Note formatting.
//!
//! A note is escaped once, then a fixed series of passes turns inline
//! constructs into markup. Each pass only sees text that no earlier pass has
//! claimed, so nothing is escaped or substituted twice.
//!
//! Line breaks are preserved: every input line becomes one [`Fragment`].

use {
    super::html::{anchor, escape},
    regex::{Captures, Regex},
    std::{str::Lines, sync::OnceLock},
};

/// Piece of a line: escaped text still open to later passes, or finished markup.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Markup(String),
}

/// Bare URLs wait between these private use characters until emphasis is done.
const URL_OPEN: char = '\u{E000}';
const URL_CLOSE: char = '\u{E001}';

/// Formatted line of a note. The carried strings are safe markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Line(String),
    Quote(String),
    Blank,
}

impl Fragment {
    fn parse(line: &str) -> Self {
        let line = line.trim_end();

        if line.is_empty() {
            Fragment::Blank
        } else if let Some(quoted) = line.strip_prefix("> ") {
            Fragment::Quote(format_inline(quoted))
        } else {
            Fragment::Line(format_inline(line))
        }
    }

    pub fn html(&self) -> String {
        match self {
            Fragment::Line(s) => s.clone(),
            Fragment::Quote(s) => format!("<blockquote>{s}</blockquote>"),
            Fragment::Blank => String::new(),
        }
    }

    fn is_block(&self) -> bool {
        matches!(self, Fragment::Quote(_))
    }
}

/// Lazy iterator over the formatted lines of a note.
pub struct NoteLines<'a> {
    lines: Lines<'a>,
}

impl<'a> Iterator for NoteLines<'a> {
    type Item = Fragment;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.next().map(Fragment::parse)
    }
}

pub fn format_note(note: &str) -> NoteLines<'_> {
    NoteLines {
        lines: note.trim().lines(),
    }
}

/// Render a whole note. Adjacent lines are separated by `<br>`, quotes are blocks.
pub fn render_note(note: &str) -> String {
    let mut out = String::new();
    let mut prev: Option<Fragment> = None;

    for fragment in format_note(note) {
        if let Some(p) = &prev {
            if !p.is_block() && !fragment.is_block() {
                out.push_str("<br>");
            }
            out.push('\n');
        }

        out.push_str(&fragment.html());
        prev = Some(fragment);
    }

    out
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).unwrap())
}

fn format_inline(line: &str) -> String {
    static RE_LINK: OnceLock<Regex> = OnceLock::new();
    static RE_BOLD_ITALIC: OnceLock<Regex> = OnceLock::new();
    static RE_BOLD: OnceLock<Regex> = OnceLock::new();
    static RE_ITALIC: OnceLock<Regex> = OnceLock::new();
    static RE_UNDERLINE: OnceLock<Regex> = OnceLock::new();
    static RE_URL: OnceLock<Regex> = OnceLock::new();
    static RE_URL_SLOT: OnceLock<Regex> = OnceLock::new();

    let re_link = regex(
        &RE_LINK,
        r"\[([^\[\]]+)\]\((https?://(?:[^\s()]|\([^\s()]*\))+)\)",
    );
    let re_bold_italic = regex(&RE_BOLD_ITALIC, r"\*\*\*(.+?)\*\*\*");
    let re_bold = regex(&RE_BOLD, r"\*\*(.+?)\*\*");
    let re_italic = regex(&RE_ITALIC, r"\*([^*\s](?:[^*]*[^*\s])?)\*");
    let re_underline = regex(&RE_UNDERLINE, r"__(.+?)__");
    let re_url = regex(&RE_URL, r"https?://\S+");
    let re_url_slot = regex(&RE_URL_SLOT, "\u{E000}([0-9]+)\u{E001}");

    let escaped = escape(line)
        .replace(URL_OPEN, "&#57344;")
        .replace(URL_CLOSE, "&#57345;");
    let segments = vec![Segment::Text(escaped)];

    let segments = substitute(segments, re_link, |caps| {
        vec![Segment::Markup(anchor(&caps[2], &caps[1]))]
    });

    // Bare URLs are claimed before emphasis, but only linked after it.
    let mut urls = Vec::new();
    let segments = protect_urls(segments, re_url, &mut urls);

    let segments = substitute(segments, re_bold_italic, |caps| {
        let mut out = vec![Segment::Markup("<strong>".to_owned())];
        out.extend(wrap(caps, "em"));
        out.push(Segment::Markup("</strong>".to_owned()));
        out
    });
    let segments = substitute(segments, re_bold, |caps| wrap(caps, "strong"));
    let segments = substitute(segments, re_italic, |caps| wrap(caps, "em"));
    let segments = substitute(segments, re_underline, |caps| wrap(caps, "u"));

    let joined: String = segments
        .into_iter()
        .map(|s| match s {
            Segment::Text(s) | Segment::Markup(s) => s,
        })
        .collect();

    re_url_slot
        .replace_all(&joined, |caps: &Captures| {
            let url = caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| urls.get(i))
                .map(String::as_str)
                .unwrap_or_default();
            anchor(url, url)
        })
        .into_owned()
}

/// Run one pass over the text segments, leaving markup untouched.
fn substitute<F>(segments: Vec<Segment>, re: &Regex, mut replace: F) -> Vec<Segment>
where
    F: FnMut(&Captures) -> Vec<Segment>,
{
    let mut out = Vec::with_capacity(segments.len());

    for segment in segments {
        let text = match segment {
            Segment::Text(text) => text,
            markup => {
                out.push(markup);
                continue;
            }
        };

        let mut last = 0;
        for caps in re.captures_iter(&text) {
            let Some(m) = caps.get(0) else {
                continue;
            };

            if m.start() > last {
                out.push(Segment::Text(text[last..m.start()].to_owned()));
            }

            out.extend(replace(&caps));
            last = m.end();
        }

        if last < text.len() {
            out.push(Segment::Text(text[last..].to_owned()));
        }
    }

    out
}

/// Emphasis keeps its content open so later passes still apply inside it.
fn wrap(caps: &Captures, tag: &str) -> Vec<Segment> {
    vec![
        Segment::Markup(format!("<{tag}>")),
        Segment::Text(caps[1].to_owned()),
        Segment::Markup(format!("</{tag}>")),
    ]
}

/// Swap bare URLs in the text segments for numbered slots so emphasis cannot cut them.
fn protect_urls(segments: Vec<Segment>, re: &Regex, urls: &mut Vec<String>) -> Vec<Segment> {
    segments
        .into_iter()
        .map(|segment| {
            let text = match segment {
                Segment::Text(text) => text,
                markup => return markup,
            };

            let mut out = String::with_capacity(text.len());
            let mut last = 0;

            for m in re.find_iter(&text) {
                let candidate = m.as_str();
                let end = url_end(&text[..m.start()], candidate);
                let url = &candidate[..end];

                if url.ends_with("://") {
                    continue;
                }

                out.push_str(&text[last..m.start()]);
                out.push(URL_OPEN);
                out.push_str(&urls.len().to_string());
                out.push(URL_CLOSE);
                urls.push(url.to_owned());
                last = m.start() + end;
            }

            out.push_str(&text[last..]);
            Segment::Text(out)
        })
        .collect()
}

const TRAILING_ENTITIES: [&str; 4] = ["&quot;", "&#39;", "&gt;", "&lt;"];
const TRAILING_PUNCTUATION: &str = ".,!?:";
const EMPHASIS_MARKERS: [&str; 3] = ["**", "__", "*"];

/// Length of the URL inside `candidate`, without trailing punctuation,
/// quotes, an unbalanced `)` or an emphasis marker opened in `before`.
fn url_end(before: &str, candidate: &str) -> usize {
    let mut end = candidate.len();

    loop {
        let s = &candidate[..end];

        if let Some(e) = TRAILING_ENTITIES.iter().find(|e| s.ends_with(*e)) {
            end -= e.len();
            continue;
        }

        if let Some(m) = EMPHASIS_MARKERS
            .iter()
            .find(|m| s.ends_with(*m) && before.contains(*m))
        {
            end -= m.len();
            continue;
        }

        match s.chars().last() {
            Some(c) if TRAILING_PUNCTUATION.contains(c) => end -= 1,
            Some(')') if s.matches('(').count() < s.matches(')').count() => end -= 1,
            _ => break,
        }
    }

    end
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    const LINK_ATTRS: &str = r#"target="_blank" rel="noopener noreferrer""#;

    #[test]
    fn empty_note_has_no_fragments() {
        assert_eq!(format_note("").count(), 0);
        assert_eq!(format_note("  \n\n ").count(), 0);
        assert_eq!(render_note(""), "");
    }

    #[test]
    fn escapes_plain_text() {
        assert_eq!(
            render_note(r#"a & b < c > d "e" 'f'"#),
            "a &amp; b &lt; c &gt; d &quot;e&quot; &#39;f&#39;"
        );
    }

    #[test]
    fn script_is_never_markup() {
        let out = render_note("<script>alert('x')</script>");
        assert!(!out.contains("<script"));
        assert_eq!(out, "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;");
    }

    #[test]
    fn bold() {
        assert_eq!(render_note("**bold**"), "<strong>bold</strong>");
        assert!(!render_note("some **bold** text").contains('*'));
    }

    #[test]
    fn italic_and_underline() {
        assert_eq!(render_note("*it*"), "<em>it</em>");
        assert_eq!(render_note("__under__"), "<u>under</u>");
        assert_eq!(
            render_note("**bold *both* bold**"),
            "<strong>bold <em>both</em> bold</strong>"
        );
    }

    #[test]
    fn reference_link() {
        assert_eq!(
            render_note("[x](https://a.com)"),
            format!(r#"<a href="https://a.com" {LINK_ATTRS}>x</a>"#)
        );
    }

    #[test]
    fn url_in_label_is_not_relinked() {
        let out = render_note("[see https://b.com](https://a.com)");
        assert_eq!(out.matches("<a ").count(), 1);
        assert_eq!(
            out,
            format!(r#"<a href="https://a.com" {LINK_ATTRS}>see https://b.com</a>"#)
        );
    }

    #[test]
    fn bare_url_is_linked_once() {
        assert_eq!(
            render_note("plain https://a.com text"),
            format!(r#"plain <a href="https://a.com" {LINK_ATTRS}>https://a.com</a> text"#)
        );
    }

    #[test]
    fn bare_url_drops_trailing_punctuation_and_quotes() {
        assert_eq!(
            render_note(r#"go to "https://a.com/x?y=1&z=2"."#),
            format!(
                r#"go to &quot;<a href="https://a.com/x?y=1&amp;z=2" {LINK_ATTRS}>https://a.com/x?y=1&amp;z=2</a>&quot;."#
            )
        );
    }

    #[test]
    fn url_inside_bold_is_linked() {
        assert_eq!(
            render_note("**https://a.com**"),
            format!(r#"<strong><a href="https://a.com" {LINK_ATTRS}>https://a.com</a></strong>"#)
        );
    }

    #[test]
    fn blockquote_lines() {
        let fragments: Vec<Fragment> = format_note("intro\n> quoted *words*\nafter").collect();
        assert_eq!(
            fragments,
            vec![
                Fragment::Line("intro".to_string()),
                Fragment::Quote("quoted <em>words</em>".to_string()),
                Fragment::Line("after".to_string()),
            ]
        );
        assert_eq!(
            render_note("intro\n> quoted\nafter"),
            "intro\n<blockquote>quoted</blockquote>\nafter"
        );
    }

    #[test]
    fn quote_marker_needs_a_space() {
        assert_eq!(render_note(">not a quote"), "&gt;not a quote");
    }

    #[test]
    fn line_breaks_are_preserved() {
        assert_eq!(render_note("one\ntwo"), "one<br>\ntwo");
        assert_eq!(render_note("one\r\n\r\ntwo"), "one<br>\n<br>\ntwo");
    }

    #[test]
    fn malformed_constructs_stay_literal() {
        assert_eq!(render_note("**open"), "**open");
        assert_eq!(render_note("[label](not a url)"), "[label](not a url)");
        assert_eq!(render_note("[unclosed"), "[unclosed");
        assert_eq!(render_note("a * b"), "a * b");
        assert_eq!(render_note("https://"), "https://");
    }

    #[test]
    fn escaping_happens_once() {
        let out = render_note("**a & b** [<x>](https://a.com/?q=1&r=2) __\"u\"__ https://c.com/?a&b");
        assert!(!out.contains("&amp;amp;"));
        assert!(!out.contains("&amp;lt;"));
        assert!(!out.contains("&amp;quot;"));
        assert!(out.contains("<strong>a &amp; b</strong>"));
        assert!(out.contains(r#"href="https://a.com/?q=1&amp;r=2""#));
        assert!(out.contains(">&lt;x&gt;</a>"));
        assert!(out.contains("<u>&quot;u&quot;</u>"));
    }

    #[test]
    fn reference_link_with_parentheses() {
        assert_eq!(
            render_note("[Rust](https://en.wikipedia.org/wiki/Rust_(programming_language))"),
            format!(
                r#"<a href="https://en.wikipedia.org/wiki/Rust_(programming_language)" {LINK_ATTRS}>Rust</a>"#
            )
        );
    }

    #[test]
    fn bare_url_keeps_balanced_parentheses() {
        let url = "https://en.wikipedia.org/wiki/Rust_(programming_language)";
        assert_eq!(
            render_note(&format!("see {url}.")),
            format!(r#"see <a href="{url}" {LINK_ATTRS}>{url}</a>."#)
        );
        assert_eq!(
            render_note("(see https://a.com)"),
            format!(r#"(see <a href="https://a.com" {LINK_ATTRS}>https://a.com</a>)"#)
        );
    }

    #[test]
    fn emphasis_does_not_cut_bare_urls() {
        let url = "https://docs.python.org/3/reference/datamodel.html#object.__init__";
        assert_eq!(
            render_note(&format!("{url} and __del__")),
            format!(r#"<a href="{url}" {LINK_ATTRS}>{url}</a> and <u>del</u>"#)
        );
        assert_eq!(
            render_note("https://a.com/*x*/y"),
            format!(r#"<a href="https://a.com/*x*/y" {LINK_ATTRS}>https://a.com/*x*/y</a>"#)
        );
    }

    #[test]
    fn url_inside_underline_is_linked() {
        assert_eq!(
            render_note("__https://a.com__"),
            format!(r#"<u><a href="https://a.com" {LINK_ATTRS}>https://a.com</a></u>"#)
        );
    }

    #[test]
    fn bold_italic() {
        assert_eq!(render_note("***x***"), "<strong><em>x</em></strong>");
        assert!(!render_note("a ***b*** c").contains('*'));
    }

    #[test]
    fn private_use_characters_are_kept_as_text() {
        assert_eq!(render_note("\u{E000}0\u{E001}"), "&#57344;0&#57345;");
    }

    #[test]
    fn fragments_are_lazy() {
        let mut lines = format_note("first\nsecond\nthird");
        assert_eq!(lines.next(), Some(Fragment::Line("first".to_string())));
        assert_eq!(lines.next(), Some(Fragment::Line("second".to_string())));
    }
}
