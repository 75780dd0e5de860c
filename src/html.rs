/// Escape the characters that are significant in HTML text and attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());

    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }

    out
}

/// Anchor opened in a new browsing context without opener or referrer.
/// Both `href` and `label` must already be escaped.
pub fn anchor(href: &str, label: &str) -> String {
    format!(r#"<a href="{href}" target="_blank" rel="noopener noreferrer">{label}</a>"#)
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; background: #f4f4f5; color: #18181b; margin: 0; }
h1 { text-align: center; margin: 2rem 0 1rem; }
#links { max-width: 48rem; margin: 0 auto; padding: 0 1rem 3rem; display: grid; gap: 1.25rem; }
.link-card { background: #fff; border-radius: 0.75rem; padding: 1.25rem; box-shadow: 0 1px 3px rgba(0,0,0,0.12); }
.link-card h2 { margin: 0 0 0.5rem; font-size: 1.2rem; }
.link-card a { color: #1d4ed8; }
.link-note { line-height: 1.5; }
.link-note blockquote { border-left: 3px solid #d4d4d8; margin: 0.5rem 0; padding-left: 0.75rem; color: #52525b; }
.single-image img, .video-thumb img { max-width: 100%; border-radius: 0.5rem; }
.image-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(10rem, 1fr)); gap: 0.5rem; }
.image-grid img { width: 100%; border-radius: 0.5rem; }
.video-thumb { position: relative; display: inline-block; }
.video-thumb .play { position: absolute; inset: 0; display: flex; align-items: center; justify-content: center; font-size: 3rem; color: #fff; text-shadow: 0 0 8px #000; }
.link-date { margin-top: 0.75rem; font-size: 0.85rem; color: #71717a; }
.load-error { text-align: center; color: #b91c1c; }
"#;

pub struct Html;

impl Html {
    pub fn h1(s: &str) -> String {
        format!("<h1>{}</h1>", escape(s))
    }

    pub fn link(title: &str, link: &str) -> String {
        anchor(&escape(link), &escape(title))
    }

    pub fn image(src: &str, alt: &str) -> String {
        format!(
            r#"<img src="{}" alt="{}" loading="lazy">"#,
            escape(src),
            escape(alt)
        )
    }

    /// Card heading, linked when the record has a URL.
    pub fn heading(title: &str, url: Option<&str>) -> String {
        match url {
            Some(url) => format!("<h2>{}</h2>", Html::link(title, url)),
            None => format!("<h2>{}</h2>", escape(title)),
        }
    }

    /// Wrap already formatted note markup.
    pub fn note(note_html: &str) -> String {
        if note_html.is_empty() {
            return String::new();
        }

        format!(r#"<div class="link-note">{note_html}</div>"#)
    }

    /// One image gets its own block, several images share a grid.
    pub fn images(images: &[String], alt: &str) -> String {
        match images {
            [] => String::new(),
            [single] => format!(
                r#"<div class="single-image">{}</div>"#,
                Html::image(single, alt)
            ),
            many => {
                let mut grid = String::from(r#"<div class="image-grid">"#);

                for src in many {
                    grid.push_str(&Html::image(src, alt));
                }

                grid.push_str("</div>");
                grid
            }
        }
    }

    pub fn video_thumbnail(thumbnail: &str, url: Option<&str>, alt: &str) -> String {
        let inner = format!(
            r#"{}<span class="play" aria-hidden="true">&#9654;</span>"#,
            Html::image(thumbnail, alt)
        );

        let inner = match url {
            Some(url) => anchor(&escape(url), &inner),
            None => inner,
        };

        format!(r#"<div class="video-thumb">{inner}</div>"#)
    }

    pub fn date(date: &str) -> String {
        format!(r#"<div class="link-date">{}</div>"#, escape(date))
    }

    /// Assemble a card from its sections, skipping empty ones.
    pub fn card(sections: &[String], video: bool) -> String {
        let class = if video {
            "link-card video"
        } else {
            "link-card"
        };

        let mut card = format!(r#"<article class="{class}">"#);
        card.push('\n');

        for section in sections.iter().filter(|s| !s.is_empty()) {
            card.push_str("  ");
            card.push_str(section);
            card.push('\n');
        }

        card.push_str("</article>\n");
        card
    }

    pub fn warning(msg: &str) -> String {
        format!(r#"<p class="load-error">{}</p>"#, escape(msg))
    }

    /// Complete document whose `#links` container holds `content`.
    pub fn page(title: &str, content: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{}</title>
<style>{STYLE}</style>
</head>
<body>
{}
<main id="links">
{content}</main>
</body>
</html>
"#,
            escape(title),
            Html::h1(title)
        )
    }
}
