use crate::catalog::ContentKind;
use crate::metadata::{MediaKind, Metadata};
use crate::quality::Quality;
use crate::title::TitleInfo;

/// Wizard position. Steps only move forward; once a link is shown `n` starts
/// over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ContentType,
    Query,
    SearchResults,
    Seasons,
    Episodes,
    Servers,
    Magnet,
    Category,
    Qualities,
    Movies,
    SeriesNames,
    SeriesEpisodes,
    Link,
}

impl Step {
    pub fn title(&self) -> &'static str {
        match self {
            Step::ContentType => "What are you looking for?",
            Step::Query => "Search",
            Step::SearchResults => "Search Results",
            Step::Seasons => "Seasons",
            Step::Episodes => "Episodes",
            Step::Servers => "Servers",
            Step::Magnet => "Magnet Link",
            Step::Category => "Storage",
            Step::Qualities => "Quality",
            Step::Movies => "Movies",
            Step::SeriesNames => "Series",
            Step::SeriesEpisodes => "Episodes",
            Step::Link => "Download Link",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentChoice {
    Movies,
    Series,
    Storage,
}

impl ContentChoice {
    pub const ALL: [ContentChoice; 3] = [
        ContentChoice::Movies,
        ContentChoice::Series,
        ContentChoice::Storage,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ContentChoice::Movies => "Search movies",
            ContentChoice::Series => "Search series",
            ContentChoice::Storage => "Browse storage folder",
        }
    }

    pub fn search_kind(&self) -> Option<ContentKind> {
        match self {
            ContentChoice::Movies => Some(ContentKind::Movies),
            ContentChoice::Series => Some(ContentKind::Series),
            ContentChoice::Storage => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Movies,
    Series,
}

/// Work the event loop has to do before the wizard can move on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Search { query: String, kind: ContentKind },
    Seasons { url: String },
    Servers { url: String },
    Magnet { url: String },
    Listing,
    Metadata {
        title: String,
        kind: MediaKind,
        year: Option<String>,
    },
}

impl Request {
    pub fn describe(&self) -> String {
        match self {
            Request::Search { query, kind } => format!("Searching {kind} for \"{query}\"..."),
            Request::Seasons { .. } => "Loading seasons...".to_string(),
            Request::Servers { .. } => "Loading servers...".to_string(),
            Request::Magnet { .. } => "Loading magnet link...".to_string(),
            Request::Listing => "Loading storage folder...".to_string(),
            Request::Metadata { title, .. } => format!("Looking up \"{title}\"..."),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataState {
    /// No credential configured.
    Disabled,
    Pending,
    Found(Metadata),
    Unavailable(String),
}

/// Everything the final storage step shows for one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkView {
    pub info: TitleInfo,
    pub episode_code: Option<String>,
    pub quality: Quality,
    pub link: String,
    pub metadata: MetadataState,
}
