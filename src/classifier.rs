use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::listing::FileEntry;
use crate::quality::Quality;

/// `<NAME>.S<ss>E<ee>.<yyyy>` at the start of a name; anything may follow.
static SERIES_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>.+?)\.S(?P<season>\d{2})E(?P<episode>\d{2})\.(?P<year>\d{4})")
        .expect("valid series pattern")
});

/// Structured result of matching a name against the season/episode pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesMatch {
    /// Dot-separated series name, not humanized.
    pub name: String,
    pub season: u32,
    pub episode: u32,
    pub year: String,
}

/// Match a trailing-separator-stripped name against the series pattern.
pub fn match_series(name: &str) -> Option<SeriesMatch> {
    let captures = SERIES_PATTERN.captures(name)?;
    let season = captures["season"].parse().ok()?;
    let episode = captures["episode"].parse().ok()?;

    Some(SeriesMatch {
        name: captures["name"].to_string(),
        season,
        episode,
        year: captures["year"].to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesEpisode {
    pub name: String,
    pub season: u32,
    pub episode: u32,
    pub link: String,
    pub quality: Quality,
}

impl SeriesEpisode {
    pub fn code(&self) -> String {
        format!("S{:02}E{:02}", self.season, self.episode)
    }

    pub fn trimmed_name(&self) -> &str {
        self.name.trim_end_matches('/')
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesBucket {
    pub name: String,
    pub episodes: Vec<SeriesEpisode>,
}

/// Series name to episodes, in the order series were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SeriesIndex {
    buckets: Vec<SeriesBucket>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl SeriesIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, series_name: &str, episode: SeriesEpisode) {
        let index = match self.positions.get(series_name) {
            Some(&index) => index,
            None => {
                self.buckets.push(SeriesBucket {
                    name: series_name.to_string(),
                    episodes: Vec::new(),
                });
                let index = self.buckets.len() - 1;
                self.positions.insert(series_name.to_string(), index);
                index
            }
        };
        self.buckets[index].episodes.push(episode);
    }

    pub fn get(&self, series_name: &str) -> Option<&[SeriesEpisode]> {
        self.positions
            .get(series_name)
            .map(|&index| self.buckets[index].episodes.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|b| b.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeriesBucket> {
        self.buckets.iter()
    }

    pub fn bucket(&self, index: usize) -> Option<&SeriesBucket> {
        self.buckets.get(index)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn episode_count(&self) -> usize {
        self.buckets.iter().map(|b| b.episodes.len()).sum()
    }

    /// Sort every bucket by (season, episode).
    pub fn sort_episodes(&mut self) {
        for bucket in &mut self.buckets {
            sort_episodes(&mut bucket.episodes);
        }
    }
}

/// Order episodes by season then episode. Stable, so exact duplicates keep
/// their listing order.
pub fn sort_episodes(episodes: &mut [SeriesEpisode]) {
    episodes.sort_by_key(|e| (e.season, e.episode));
}

/// A listing split into movies and series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifiedListing {
    pub movies: Vec<FileEntry>,
    pub series: SeriesIndex,
}

/// Split a listing into movies and per-series episode buckets.
///
/// An entry is a series episode iff its name matches the season/episode
/// pattern; every other entry is a movie and is kept as-is. Buckets are
/// sorted once all entries are classified.
pub fn classify_movies_and_series(files: &[FileEntry]) -> ClassifiedListing {
    let mut listing = ClassifiedListing::default();

    for file in files {
        match match_series(file.trimmed_name()) {
            Some(m) => {
                tracing::debug!(name = %file.name, series = %m.name, season = m.season, episode = m.episode, "Classified as episode");
                listing.series.push(
                    &m.name,
                    SeriesEpisode {
                        name: file.name.clone(),
                        season: m.season,
                        episode: m.episode,
                        link: file.link.clone(),
                        quality: Quality::detect(&file.name),
                    },
                );
            }
            None => {
                tracing::debug!(name = %file.name, "Classified as movie");
                listing.movies.push(file.clone());
            }
        }
    }

    listing.series.sort_episodes();
    listing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> FileEntry {
        FileEntry::new(name, format!("http://x/{name}"))
    }

    fn episode(season: u32, episode: u32, name: &str) -> SeriesEpisode {
        SeriesEpisode {
            name: name.to_string(),
            season,
            episode,
            link: String::new(),
            quality: Quality::Other,
        }
    }

    #[test]
    fn test_match_series() {
        let m = match_series("Show.Name.S02E05.2021.1080p").unwrap();
        assert_eq!(m.name, "Show.Name");
        assert_eq!(m.season, 2);
        assert_eq!(m.episode, 5);
        assert_eq!(m.year, "2021");
    }

    #[test]
    fn test_match_series_requires_full_token() {
        assert!(match_series("Show.S1E01.2020").is_none());
        assert!(match_series("Show.S01E01").is_none());
        assert!(match_series("Show.S01E01.20").is_none());
        assert!(match_series(".S01E01.2020").is_none());
        assert!(match_series("Show.s01e01.2020").is_none());
    }

    #[test]
    fn test_scenario_listing() {
        let files = vec![
            entry("Show.S01E01.2020.1080p/"),
            entry("Show.S01E02.2020.4k/"),
            entry("RandomMovie.2018.WEB-DL/"),
        ];
        let listing = classify_movies_and_series(&files);

        assert_eq!(listing.movies, vec![files[2].clone()]);
        assert_eq!(listing.series.len(), 1);

        let show = listing.series.get("Show").unwrap();
        assert_eq!(show.len(), 2);
        assert_eq!((show[0].season, show[0].episode, show[0].quality), (1, 1, Quality::FullHd));
        assert_eq!((show[1].season, show[1].episode, show[1].quality), (1, 2, Quality::FourK));
        assert_eq!(show[0].link, "http://x/Show.S01E01.2020.1080p/");
    }

    #[test]
    fn test_movies_are_unmodified_and_ordered() {
        let files = vec![entry("B.Movie.2019/"), entry("A.Movie.2018.mkv")];
        let listing = classify_movies_and_series(&files);
        assert_eq!(listing.movies, files);
        assert!(listing.series.is_empty());
    }

    #[test]
    fn test_names_collapsing_to_same_series_share_a_bucket() {
        let files = vec![
            entry("Show.S01E02.2020.2160p/"),
            entry("Other.S01E01.2019.720p/"),
            entry("Show.S01E01.2020.1080p/"),
        ];
        let listing = classify_movies_and_series(&files);

        let names: Vec<&str> = listing.series.names().collect();
        assert_eq!(names, vec!["Show", "Other"]);

        let show = listing.series.get("Show").unwrap();
        assert_eq!(show[0].code(), "S01E01");
        assert_eq!(show[1].code(), "S01E02");
    }

    #[test]
    fn test_sort_episodes_is_stable() {
        let mut episodes = vec![
            episode(2, 1, "a"),
            episode(1, 3, "b"),
            episode(1, 3, "c"),
            episode(1, 1, "d"),
            episode(1, 3, "e"),
        ];
        sort_episodes(&mut episodes);

        let order: Vec<&str> = episodes.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(order, vec!["d", "b", "c", "e", "a"]);
        assert!(episodes
            .windows(2)
            .all(|w| (w[0].season, w[0].episode) <= (w[1].season, w[1].episode)));
    }

    #[test]
    fn test_leading_zeros_parse() {
        let listing = classify_movies_and_series(&[entry("Show.S10E09.2020/")]);
        let show = listing.series.get("Show").unwrap();
        assert_eq!((show[0].season, show[0].episode), (10, 9));
    }
}
