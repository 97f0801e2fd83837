use std::fmt;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

use crate::decode::decode_special_chars;
use crate::error::{FinderError, Result};
use crate::http::HttpFetcher;

static SEARCH_LINKS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article a[href]").expect("valid search link selector"));
static SEARCH_TITLES: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"article h3[class="hover_caption_caption"] div[class="in_title"]"#)
        .expect("valid search title selector")
});
static SERVER_ANCHORS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"ul[id="sbss"] a"#).expect("valid server selector"));
static SERVER_ITEM: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li").expect("valid server item selector"));
static SERVER_QUALITY: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li > span").expect("valid quality selector"));
static SEASON_LABELS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"div[id="seasons"] span[class="title dfr"]"#).expect("valid season selector")
});
static MAGNET_INPUT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"input[class="input"]"#).expect("valid magnet selector"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Movies,
    Series,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Movies => f.write_str("movies"),
            ContentKind::Series => f.write_str("series"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
}

/// One row of a title page's download panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerLink {
    pub server: String,
    pub quality: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodeLink {
    pub title: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Season {
    pub label: String,
    pub episodes: Vec<EpisodeLink>,
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// First non-blank text node directly under `element`.
fn own_text(element: ElementRef<'_>) -> Option<String> {
    element
        .children()
        .filter_map(|node| node.value().as_text())
        .map(|text| text.trim())
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

/// Titles and links are collected independently and zipped, so the shorter
/// list decides the result count.
pub fn parse_search_results(html: &str) -> Vec<SearchResult> {
    let document = Html::parse_document(html);

    let links = document
        .select(&SEARCH_LINKS)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.trim().to_string());
    let titles = document
        .select(&SEARCH_TITLES)
        .map(|div| decode_special_chars(&element_text(div)));

    titles
        .zip(links)
        .map(|(title, link)| SearchResult { title, link })
        .collect()
}

pub fn parse_servers(html: &str) -> Vec<ServerLink> {
    let document = Html::parse_document(html);
    let mut servers = Vec::new();

    for anchor in document.select(&SERVER_ANCHORS) {
        let server = anchor.select(&SERVER_ITEM).find_map(own_text);
        let link = anchor.value().attr("href").map(str::trim);

        let (Some(server), Some(link)) = (server, link) else {
            tracing::warn!(html = %anchor.html(), "Skipping server entry without name or link");
            continue;
        };

        let quality = anchor
            .select(&SERVER_QUALITY)
            .map(element_text)
            .find(|q| !q.is_empty())
            .unwrap_or_else(|| "N/A".to_string());

        servers.push(ServerLink {
            server,
            quality,
            link: link.to_string(),
        });
    }

    servers
}

pub fn parse_seasons(html: &str) -> Result<Vec<Season>> {
    let document = Html::parse_document(html);
    let mut seasons = Vec::new();

    for label in document.select(&SEASON_LABELS) {
        let label_text = element_text(label);
        let tab = label
            .parent()
            .and_then(ElementRef::wrap)
            .and_then(|parent| parent.value().attr("data-tab"));

        let Some(tab) = tab else {
            tracing::warn!(season = %label_text, "Season label without data-tab");
            continue;
        };
        if tab.contains('"') || tab.contains('\\') {
            tracing::warn!(season = %label_text, tab, "Unusable data-tab value");
            continue;
        }

        let css = format!(r#"div[id="jstab"][data-tab="{tab}"] ul[class="episodios"] a"#);
        let episode_anchors =
            Selector::parse(&css).map_err(|e| FinderError::Selector(e.to_string()))?;

        let episodes = document
            .select(&episode_anchors)
            .filter_map(|a| {
                let link = a.value().attr("href")?.trim().to_string();
                Some(EpisodeLink {
                    title: element_text(a),
                    link,
                })
            })
            .collect();

        seasons.push(Season {
            label: label_text,
            episodes,
        });
    }

    Ok(seasons)
}

pub fn parse_magnet_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&MAGNET_INPUT)
        .find_map(|input| input.value().attr("value"))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Scraper for the movie/series catalog site.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: HttpFetcher,
    base_url: Url,
}

impl CatalogClient {
    pub fn new(http: HttpFetcher, base_url: &str) -> Result<Self> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn search_url(&self, query: &str, kind: ContentKind) -> Url {
        let terms = query
            .split_whitespace()
            .map(urlencoding::encode)
            .collect::<Vec<_>>()
            .join("+");
        let query = match kind {
            ContentKind::Movies => format!("s={terms}"),
            ContentKind::Series => format!("s={terms}&post_type=series"),
        };

        let mut url = self.base_url.clone();
        url.set_query(Some(&query));
        url
    }

    pub async fn search(&self, query: &str, kind: ContentKind) -> Result<Vec<SearchResult>> {
        let url = self.search_url(query, kind);
        let html = self.http.get_text(url.as_str()).await?;
        let results: Vec<SearchResult> = parse_search_results(&html)
            .into_iter()
            .map(|r| SearchResult {
                link: self.resolve(&r.link),
                title: r.title,
            })
            .collect();
        tracing::info!(query, %kind, count = results.len(), "Search finished");
        Ok(results)
    }

    pub async fn servers(&self, url: &str) -> Result<Vec<ServerLink>> {
        let html = self.http.get_text(url).await?;
        Ok(parse_servers(&html))
    }

    pub async fn seasons(&self, url: &str) -> Result<Vec<Season>> {
        let html = self.http.get_text(url).await?;
        parse_seasons(&html)
    }

    pub async fn magnet_link(&self, url: &str) -> Result<Option<String>> {
        let html = self.http.get_text(url).await?;
        Ok(parse_magnet_link(&html))
    }

    fn resolve(&self, href: &str) -> String {
        self.base_url
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string())
    }
}
