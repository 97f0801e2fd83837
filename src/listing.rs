use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::Serialize;
use url::Url;

use crate::decode::decode_special_chars;
use crate::error::Result;
use crate::http::HttpFetcher;

static LISTING_ANCHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td > a").expect("valid listing selector"));

/// One row of a storage folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Display name; a trailing `/` marks a directory.
    pub name: String,
    /// URL prefix the final filename is appended to.
    pub link: String,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
        }
    }

    pub fn trimmed_name(&self) -> &str {
        self.name.trim_end_matches('/')
    }

    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }
}

/// Extract `(name, link)` rows from a folder listing page. Links are resolved
/// against `base`.
pub fn parse_folder_listing(html: &str, base: &Url) -> Vec<FileEntry> {
    let document = Html::parse_document(html);
    let mut files = Vec::new();

    for anchor in document.select(&LISTING_ANCHOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let name = anchor.text().collect::<String>();
        let name = name.trim();
        if name.is_empty() || name == "../" || name == ".." {
            continue;
        }

        let link = match base.join(href.trim()) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::warn!(href, error = %e, "Skipping listing row with bad link");
                continue;
            }
        };

        files.push(FileEntry::new(
            decode_special_chars(name),
            decode_special_chars(&link),
        ));
    }

    tracing::debug!(count = files.len(), "Parsed folder listing");
    files
}

/// Fetches the storage folder listing.
#[derive(Debug, Clone)]
pub struct ListingClient {
    http: HttpFetcher,
    folder_url: Url,
}

impl ListingClient {
    pub fn new(http: HttpFetcher, folder_url: &str) -> Result<Self> {
        Ok(Self {
            http,
            folder_url: Url::parse(folder_url)?,
        })
    }

    pub fn folder_url(&self) -> &Url {
        &self.folder_url
    }

    pub async fn fetch(&self) -> Result<Vec<FileEntry>> {
        self.fetch_url(&self.folder_url).await
    }

    /// Fetch a sub-folder (or any listing page) by URL.
    pub async fn fetch_url(&self, url: &Url) -> Result<Vec<FileEntry>> {
        let html = self.http.get_text(url.as_str()).await?;
        Ok(parse_folder_listing(&html, url))
    }
}
