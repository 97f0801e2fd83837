use std::fmt;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::MetadataConfig;
use crate::error::{FinderError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    pub fn as_path(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }

    fn year_param(&self) -> &'static str {
        match self {
            MediaKind::Movie => "year",
            MediaKind::Tv => "first_air_date_year",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

/// What the link view shows next to a composed link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub title: String,
    pub overview: String,
    pub poster_url: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Movies carry `title`/`release_date`, shows carry `name`/`first_air_date`.
#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(alias = "name")]
    title: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    #[serde(alias = "first_air_date")]
    release_date: Option<String>,
}

/// Turn a search response body into the first hit, if any.
pub fn parse_search_response(body: &str, image_base_url: &str) -> Result<Option<Metadata>> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(first_hit(response, image_base_url))
}

fn first_hit(response: SearchResponse, image_base_url: &str) -> Option<Metadata> {
    let hit = response.results.into_iter().next()?;

    let poster_url = hit
        .poster_path
        .filter(|p| !p.is_empty())
        .map(|p| format!("{}/{}", image_base_url.trim_end_matches('/'), p.trim_start_matches('/')));
    let year = hit
        .release_date
        .as_deref()
        .and_then(|d| d.get(..4))
        .filter(|y| y.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string);

    Some(Metadata {
        title: hit.title.unwrap_or_default(),
        overview: hit.overview.unwrap_or_default(),
        poster_url,
        year,
    })
}

/// Credentials that look like a JWT are v4 read access tokens.
fn is_access_token(credential: &str) -> bool {
    credential.starts_with("eyJ")
}

/// Title/overview/poster lookup against a TMDB-style search API.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    client: Client,
    api_key: String,
    base_url: String,
    image_base_url: String,
    language: Option<String>,
}

impl MetadataClient {
    /// Returns `None` when no credential is configured, which disables lookups.
    pub fn from_config(client: Client, config: &MetadataConfig) -> Option<Self> {
        let api_key = config.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
        Some(Self {
            client,
            api_key: api_key.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.clone(),
            language: config.language.clone().filter(|l| !l.is_empty()),
        })
    }

    pub fn search_url(&self, kind: MediaKind) -> String {
        format!("{}/search/{}", self.base_url, kind.as_path())
    }

    pub async fn lookup(
        &self,
        title: &str,
        kind: MediaKind,
        year: Option<&str>,
    ) -> Result<Option<Metadata>> {
        let url = self.search_url(kind);
        tracing::info!(title, %kind, ?year, "Looking up metadata");

        let mut params: Vec<(&str, &str)> = vec![("query", title)];
        if let Some(year) = year.filter(|y| !y.is_empty()) {
            params.push((kind.year_param(), year));
        }
        if let Some(language) = &self.language {
            params.push(("language", language.as_str()));
        }

        let mut request = self.client.get(&url);
        if is_access_token(&self.api_key) {
            request = request.bearer_auth(&self.api_key);
        } else {
            params.push(("api_key", self.api_key.as_str()));
        }

        let response = request
            .query(&params)
            .send()
            .await
            .map_err(|e| FinderError::UpstreamUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(title, status = status.as_u16(), "Metadata lookup failed");
            return Err(FinderError::UpstreamUnavailable(format!(
                "metadata service returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| FinderError::UpstreamUnavailable(e.to_string()))?;
        let metadata = first_hit(body, &self.image_base_url);
        if metadata.is_none() {
            tracing::info!(title, %kind, "No metadata results");
        }
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGES: &str = "https://image.tmdb.org/t/p/w500";

    #[test]
    fn test_parse_movie_response() {
        let body = r#"{
            "page": 1,
            "results": [
                {"title": "The Matrix", "overview": "A hacker learns...", "poster_path": "/abc.jpg", "release_date": "1999-03-30"},
                {"title": "The Matrix Reloaded", "overview": "", "poster_path": null, "release_date": "2003-05-15"}
            ],
            "total_results": 2
        }"#;
        let metadata = parse_search_response(body, IMAGES).unwrap().unwrap();

        assert_eq!(metadata.title, "The Matrix");
        assert_eq!(metadata.overview, "A hacker learns...");
        assert_eq!(
            metadata.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
        assert_eq!(metadata.year.as_deref(), Some("1999"));
    }

    #[test]
    fn test_parse_tv_response() {
        let body = r#"{"results": [{"name": "Dark", "overview": "Kids vanish.", "first_air_date": "2017-12-01"}]}"#;
        let metadata = parse_search_response(body, IMAGES).unwrap().unwrap();

        assert_eq!(metadata.title, "Dark");
        assert_eq!(metadata.year.as_deref(), Some("2017"));
        assert_eq!(metadata.poster_url, None);
    }

    #[test]
    fn test_parse_empty_results() {
        assert_eq!(parse_search_response(r#"{"results": []}"#, IMAGES).unwrap(), None);
        assert_eq!(parse_search_response("{}", IMAGES).unwrap(), None);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_search_response("<html>", IMAGES),
            Err(FinderError::Json(_))
        ));
    }

    #[test]
    fn test_client_requires_credential() {
        let mut config = MetadataConfig::default();
        assert!(MetadataClient::from_config(Client::new(), &config).is_none());

        config.api_key = Some("   ".to_string());
        assert!(MetadataClient::from_config(Client::new(), &config).is_none());

        config.api_key = Some("abc123".to_string());
        let client = MetadataClient::from_config(Client::new(), &config).unwrap();
        assert_eq!(
            client.search_url(MediaKind::Tv),
            "https://api.themoviedb.org/3/search/tv"
        );
    }

    #[test]
    fn test_access_token_detection() {
        assert!(is_access_token("eyJhbGciOiJIUzI1NiJ9.payload"));
        assert!(!is_access_token("0123456789abcdef"));
    }
}
