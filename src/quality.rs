use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::listing::FileEntry;

/// Coarse quality bucket inferred from a release name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Quality {
    #[serde(rename = "4k")]
    FourK,
    #[serde(rename = "1080p")]
    FullHd,
    #[serde(rename = "other")]
    Other,
}

struct QualityRule {
    quality: Quality,
    markers: &'static [&'static str],
}

/// Checked in order, first hit wins. A name carrying markers from more than
/// one re-encode is tagged with the highest one.
const QUALITY_RULES: &[QualityRule] = &[
    QualityRule {
        quality: Quality::FourK,
        markers: &["4k", "2160p"],
    },
    QualityRule {
        quality: Quality::FullHd,
        markers: &["1080p"],
    },
];

impl Quality {
    pub const ALL: [Quality; 3] = [Quality::FourK, Quality::FullHd, Quality::Other];

    /// Tag a name by case-insensitive substring match.
    pub fn detect(name: &str) -> Self {
        let lower = name.to_lowercase();
        QUALITY_RULES
            .iter()
            .find(|rule| rule.markers.iter().any(|m| lower.contains(m)))
            .map(|rule| rule.quality)
            .unwrap_or(Quality::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::FourK => "4k",
            Quality::FullHd => "1080p",
            Quality::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quality::FourK => "4K / 2160p",
            Quality::FullHd => "1080p",
            Quality::Other => "Other",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A movie entry with its quality tag attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedMovie {
    #[serde(flatten)]
    pub entry: FileEntry,
    pub quality: Quality,
}

impl ClassifiedMovie {
    pub fn new(entry: FileEntry) -> Self {
        let quality = Quality::detect(&entry.name);
        Self { entry, quality }
    }
}

/// Group entries by quality, best first. Only non-empty groups are present and
/// each group keeps listing order.
pub fn classify_files_by_quality(files: &[FileEntry]) -> BTreeMap<Quality, Vec<ClassifiedMovie>> {
    let mut groups: BTreeMap<Quality, Vec<ClassifiedMovie>> = BTreeMap::new();
    for file in files {
        let movie = ClassifiedMovie::new(file.clone());
        groups.entry(movie.quality).or_default().push(movie);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> FileEntry {
        FileEntry::new(name, "http://x/")
    }

    #[test]
    fn test_detect_markers() {
        assert_eq!(Quality::detect("Movie.2019.2160p.WEB-DL/"), Quality::FourK);
        assert_eq!(Quality::detect("Movie.2019.4K.HDR"), Quality::FourK);
        assert_eq!(Quality::detect("Movie.2019.1080P.BluRay"), Quality::FullHd);
        assert_eq!(Quality::detect("Movie.2019.720p"), Quality::Other);
        assert_eq!(Quality::detect(""), Quality::Other);
    }

    #[test]
    fn test_four_k_wins_over_1080p() {
        assert_eq!(Quality::detect("Movie.1080p.and.2160p"), Quality::FourK);
        assert_eq!(Quality::detect("Movie.4k.1080p"), Quality::FourK);
    }

    #[test]
    fn test_detect_is_deterministic() {
        for name in ["A.1080p", "B.4k", "C"] {
            assert_eq!(Quality::detect(name), Quality::detect(name));
        }
    }

    #[test]
    fn test_group_order_and_contents() {
        let files = vec![
            entry("A.2018.720p/"),
            entry("B.2019.1080p/"),
            entry("C.2020.2160p/"),
            entry("D.2021.1080p/"),
        ];
        let groups = classify_files_by_quality(&files);

        let keys: Vec<Quality> = groups.keys().copied().collect();
        assert_eq!(keys, vec![Quality::FourK, Quality::FullHd, Quality::Other]);

        let hd: Vec<&str> = groups[&Quality::FullHd]
            .iter()
            .map(|m| m.entry.name.as_str())
            .collect();
        assert_eq!(hd, vec!["B.2019.1080p/", "D.2021.1080p/"]);

        let total: usize = groups.values().map(Vec::len).sum();
        assert_eq!(total, files.len());
    }

    #[test]
    fn test_empty_groups_are_omitted() {
        let groups = classify_files_by_quality(&[entry("A.1080p")]);
        assert_eq!(groups.len(), 1);
        assert!(groups.contains_key(&Quality::FullHd));
    }
}
