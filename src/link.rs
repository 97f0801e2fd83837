use crate::config::LinkConfig;
use crate::listing::FileEntry;

/// Builds final download URLs from a listing link prefix and a filename.
///
/// The container suffix is appended unless the last path segment already ends
/// in a known video extension. Release names are full of dots, so "has an
/// extension" means "ends in one of `known_extensions`", compared
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkComposer {
    container_extension: String,
    known_extensions: Vec<String>,
}

impl LinkComposer {
    pub fn new(container_extension: &str, known_extensions: &[String]) -> Self {
        let container_extension = normalize_extension(container_extension);
        let mut known_extensions: Vec<String> = known_extensions
            .iter()
            .map(|e| normalize_extension(e))
            .filter(|e| !e.is_empty())
            .collect();
        if !known_extensions.contains(&container_extension) {
            known_extensions.push(container_extension.clone());
        }

        Self {
            container_extension,
            known_extensions,
        }
    }

    pub fn from_config(config: &LinkConfig) -> Self {
        Self::new(&config.container_extension, &config.known_extensions)
    }

    pub fn container_extension(&self) -> &str {
        &self.container_extension
    }

    pub fn has_known_extension(&self, name: &str) -> bool {
        let segment = name.rsplit('/').next().unwrap_or(name);
        match segment.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                let ext = ext.to_lowercase();
                self.known_extensions.iter().any(|known| *known == ext)
            }
            _ => false,
        }
    }

    pub fn ensure_extension(&self, name: &str) -> String {
        if self.container_extension.is_empty() || self.has_known_extension(name) {
            name.to_string()
        } else {
            format!("{name}.{}", self.container_extension)
        }
    }

    /// `link` followed by the trailing-separator-stripped `name` with the
    /// container suffix ensured. No escaping is applied.
    pub fn compose(&self, link: &str, name: &str) -> String {
        let name = name.trim_end_matches('/');
        format!("{link}{}", self.ensure_extension(name))
    }

    pub fn compose_entry(&self, entry: &FileEntry) -> String {
        self.compose(&entry.link, &entry.name)
    }
}

impl Default for LinkComposer {
    fn default() -> Self {
        Self::from_config(&LinkConfig::default())
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer() -> LinkComposer {
        LinkComposer::new("mkv", &["mp4".to_string(), "avi".to_string()])
    }

    #[test]
    fn test_appends_when_missing() {
        assert_eq!(composer().compose("http://x/", "Movie"), "http://x/Movie.mkv");
    }

    #[test]
    fn test_never_doubles_suffix() {
        let c = composer();
        assert_eq!(c.compose("http://x/", "Movie.mkv"), "http://x/Movie.mkv");
        assert_eq!(c.compose("http://x/", "Movie.MKV"), "http://x/Movie.MKV");
        assert_eq!(c.compose("http://x/", "Movie.mp4"), "http://x/Movie.mp4");
    }

    #[test]
    fn test_dotted_release_names_get_suffix() {
        assert_eq!(
            composer().compose("http://x/My.Movie.2019.1080p/", "My.Movie.2019.1080p/"),
            "http://x/My.Movie.2019.1080p/My.Movie.2019.1080p.mkv"
        );
    }

    #[test]
    fn test_extension_check_uses_last_segment() {
        let c = composer();
        assert!(!c.has_known_extension("dir.mkv/file"));
        assert!(c.has_known_extension("dir/file.avi"));
        assert!(!c.has_known_extension(".mkv"));
    }

    #[test]
    fn test_container_extension_is_normalized() {
        let c = LinkComposer::new(".MP4", &[]);
        assert_eq!(c.container_extension(), "mp4");
        assert_eq!(c.ensure_extension("Movie"), "Movie.mp4");
        assert_eq!(c.ensure_extension("Movie.mp4"), "Movie.mp4");
    }

    #[test]
    fn test_compose_entry() {
        let entry = FileEntry::new("Show.S01E01.2020.1080p/", "http://x/Show.S01E01.2020.1080p/");
        assert_eq!(
            LinkComposer::default().compose_entry(&entry),
            "http://x/Show.S01E01.2020.1080p/Show.S01E01.2020.1080p.mkv"
        );
    }
}
