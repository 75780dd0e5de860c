use {
    super::{error::LinkError, html::Html, note::render_note},
    chrono::{DateTime, FixedOffset, Locale, NaiveDate, NaiveDateTime},
    error_stack::{Report, Result},
    jlogger_tracing::{jdebug, jwarn},
    regex::Regex,
    serde::Deserialize,
    std::{cmp::Ordering, fs, path::Path, sync::OnceLock},
};

const DATE_FORMAT: &str = "%b %-d, %Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Plain,
    Video,
}

impl LinkKind {
    /// A link is a video when its URL or note points at a known video host.
    pub fn classify(url: Option<&str>, note: Option<&str>) -> Self {
        static RE_VIDEO: OnceLock<Regex> = OnceLock::new();
        let re = RE_VIDEO.get_or_init(|| {
            Regex::new(
                r"(?i)(?:^|[/.\s])(?:youtube\.com|youtu\.be|vimeo\.com|twitch\.tv|dailymotion\.com|dai\.ly|tiktok\.com|loom\.com)(?:[/:?#\s]|$)",
            )
            .unwrap()
        });

        if url.into_iter().chain(note).any(|s| re.is_match(s)) {
            LinkKind::Video
        } else {
            LinkKind::Plain
        }
    }
}

/// Eleven character video id of a YouTube watch, embed, shorts or short link.
pub fn youtube_id(url: &str) -> Option<&str> {
    static RE_YOUTUBE: OnceLock<Regex> = OnceLock::new();
    let re = RE_YOUTUBE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:youtube\.com/(?:watch\?(?:[^#\s]*&)?v=|embed/|shorts/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})",
        )
        .unwrap()
    });

    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn parse_date(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();

    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d);
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(d) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(d.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc().fixed_offset())
}

pub fn format_date(date: &DateTime<FixedOffset>, locale: Option<Locale>) -> String {
    match locale {
        Some(locale) => date.format_localized(DATE_FORMAT, locale).to_string(),
        None => date.format(DATE_FORMAT).to_string(),
    }
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    #[serde(default)]
    title: String,
    url: Option<String>,
    note: Option<String>,
    images: Option<Vec<String>>,
    added_at: Option<String>,
    thumbnail: Option<String>,
}

impl LinkRecord {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> Option<&str> {
        non_empty(&self.url)
    }

    pub fn note(&self) -> Option<&str> {
        non_empty(&self.note)
    }

    pub fn images(&self) -> &[String] {
        self.images.as_deref().unwrap_or(&[])
    }

    pub fn date(&self) -> Option<DateTime<FixedOffset>> {
        non_empty(&self.added_at).and_then(parse_date)
    }

    pub fn kind(&self) -> LinkKind {
        LinkKind::classify(self.url(), self.note())
    }

    /// Explicit thumbnail, or the standard one for YouTube links.
    pub fn thumbnail(&self) -> Option<String> {
        if let Some(thumbnail) = non_empty(&self.thumbnail) {
            return Some(thumbnail.to_owned());
        }

        self.url()
            .and_then(youtube_id)
            .map(|id| format!("https://img.youtube.com/vi/{id}/hqdefault.jpg"))
    }

    pub fn render(&self, locale: Option<Locale>) -> String {
        let kind = self.kind();
        let mut sections = vec![
            Html::heading(self.title(), self.url()),
            Html::note(&render_note(self.note().unwrap_or_default())),
        ];

        if kind == LinkKind::Video {
            if let Some(thumbnail) = self.thumbnail() {
                sections.push(Html::video_thumbnail(&thumbnail, self.url(), self.title()));
            } else {
                jdebug!("No thumbnail for video link {}", self.title());
            }
        }

        sections.push(Html::images(self.images(), self.title()));

        if let Some(added_at) = non_empty(&self.added_at) {
            if let Some(date) = parse_date(added_at) {
                sections.push(Html::date(&format_date(&date, locale)));
            } else {
                jwarn!("Invalid date `{}` for {}", added_at, self.title());
            }
        }

        Html::card(&sections, kind == LinkKind::Video)
    }
}

#[derive(Debug, Default)]
pub struct LinkList {
    links: Vec<LinkRecord>,
}

impl LinkList {
    pub fn load(file: &Path) -> Result<Self, LinkError> {
        let data = fs::read_to_string(file).map_err(|e| {
            Report::new(LinkError::IOError)
                .attach_printable(format!("Failed to read {} : {e}", file.display()))
        })?;

        let list = Self::parse(&data).map_err(|e| {
            e.attach_printable(format!("Invalid link data in {}", file.display()))
        })?;

        jdebug!("Loaded {} links from {}", list.len(), file.display());
        Ok(list)
    }

    pub fn parse(data: &str) -> Result<Self, LinkError> {
        let links: Vec<LinkRecord> = serde_json::from_str(data).map_err(|e| {
            Report::new(LinkError::ParseError)
                .attach_printable(format!("Failed to parse link records: {e}"))
        })?;

        Ok(Self { links })
    }

    /// Newest first. Links without a usable date keep their order at the end.
    pub fn sort_by_date(&mut self) {
        self.links.sort_by(|a, b| match (a.date(), b.date()) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }

    pub fn links(&self) -> &[LinkRecord] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
