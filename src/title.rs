use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::classifier::match_series;
use crate::error::Result;

const RESOLUTION_TAGS: &[&str] = &["2160p", "1080p", "720p", "480p", "4k", "uhd", "hdr"];

const SOURCE_TAGS: &[&str] = &[
    "web-dl", "webdl", "webrip", "web", "bluray", "blu-ray", "bdrip", "brrip", "bdremux",
    "remux", "hdrip", "dvdrip", "hdtv", "hdcam", "camrip", "hdts", "x264", "x265", "h264",
    "h265", "hevc",
];

const LANGUAGE_TAGS: &[&str] = &[
    "latino", "castellano", "spanish", "esp", "lat", "dual", "dublado", "dubbed", "vose",
    "subbed", "multi",
];

/// Release tags that mark the end of the title part of a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTags {
    pub resolution: Vec<String>,
    pub source: Vec<String>,
    pub language: Vec<String>,
    pub extra: Vec<String>,
}

impl Default for ReleaseTags {
    fn default() -> Self {
        let owned = |tags: &[&str]| tags.iter().map(|t| t.to_string()).collect();
        Self {
            resolution: owned(RESOLUTION_TAGS),
            source: owned(SOURCE_TAGS),
            language: owned(LANGUAGE_TAGS),
            extra: Vec::new(),
        }
    }
}

impl ReleaseTags {
    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra.extend(extra.into_iter().map(Into::into));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.resolution
            .iter()
            .chain(&self.source)
            .chain(&self.language)
            .chain(&self.extra)
            .map(String::as_str)
    }

    /// Regex matching the first separator-delimited tag and everything after it.
    fn tail_pattern(&self) -> Result<Regex> {
        let mut tags: Vec<&str> = self.iter().map(str::trim).filter(|t| !t.is_empty()).collect();
        // Longest first so "web-dl" is preferred over "web".
        tags.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        tags.dedup();

        let alternation = tags
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"(?i)[.\s_\-\[(](?:{alternation})(?:[.\s_\-\])].*)?$");
        Ok(Regex::new(&pattern)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleMode {
    Movie,
    Series,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleInfo {
    pub title: String,
    pub year: Option<String>,
}

impl TitleInfo {
    pub fn display(&self) -> String {
        match &self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }
}

/// A separator followed by a standalone four-digit number.
static YEAR_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.\s]\d{4}\b").expect("valid year token pattern"));

static MOVIE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<title>.+)\.(?P<year>\d{4})(?:[.\s]|$)").expect("valid movie pattern")
});

/// Best-effort title and year extraction from release names.
#[derive(Debug, Clone)]
pub struct TitleNormalizer {
    tail: Regex,
}

impl TitleNormalizer {
    pub fn new(tags: &ReleaseTags) -> Result<Self> {
        Ok(Self {
            tail: tags.tail_pattern()?,
        })
    }

    /// Cut the trailing release-tag block. Tags are only looked for after the
    /// last year token, so title words such as "Web" survive.
    pub fn strip_release_tags<'a>(&self, name: &'a str) -> &'a str {
        let start = YEAR_TOKEN.find_iter(name).last().map_or(0, |m| m.end());
        match self.tail.find_at(name, start) {
            Some(m) => &name[..m.start()],
            None => name,
        }
    }

    /// Never fails: a name that does not match falls back to the trimmed name
    /// with no year.
    pub fn normalize(&self, name: &str, mode: TitleMode) -> TitleInfo {
        let trimmed = name.trim().trim_end_matches('/');
        let stripped = self.strip_release_tags(trimmed);

        let matched = match mode {
            TitleMode::Movie => MOVIE_PATTERN
                .captures(stripped)
                .map(|c| (c["title"].to_string(), c["year"].to_string())),
            TitleMode::Series => match_series(stripped).map(|m| (m.name, m.year)),
        };

        match matched {
            Some((title, year)) => TitleInfo {
                title: humanize(&title),
                year: Some(year),
            },
            None => {
                tracing::debug!(name = trimmed, ?mode, "No title match, using raw name");
                TitleInfo {
                    title: trimmed.to_string(),
                    year: None,
                }
            }
        }
    }
}

impl Default for TitleNormalizer {
    fn default() -> Self {
        DEFAULT_NORMALIZER.clone()
    }
}

static DEFAULT_NORMALIZER: Lazy<TitleNormalizer> = Lazy::new(|| {
    TitleNormalizer::new(&ReleaseTags::default()).expect("default release tags compile")
});

fn humanize(dotted: &str) -> String {
    dotted.replace('.', " ").trim().to_string()
}

pub fn extract_movie_title_and_year(name: &str) -> TitleInfo {
    DEFAULT_NORMALIZER.normalize(name, TitleMode::Movie)
}

pub fn extract_series_title_and_year(name: &str) -> TitleInfo {
    DEFAULT_NORMALIZER.normalize(name, TitleMode::Series)
}

/// Human-readable form of a dotted series key.
pub fn series_display_name(series_key: &str) -> String {
    humanize(series_key)
}
