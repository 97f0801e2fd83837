use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use ratatui::widgets::{ListState, ScrollbarState};

use crate::catalog::{ContentKind, EpisodeLink, SearchResult, Season, ServerLink};
use crate::classifier::{ClassifiedListing, SeriesEpisode, classify_movies_and_series};
use crate::error::FinderError;
use crate::link::LinkComposer;
use crate::listing::FileEntry;
use crate::metadata::{MediaKind, Metadata};
use crate::quality::{ClassifiedMovie, Quality, classify_files_by_quality};
use crate::title::{TitleMode, TitleNormalizer, series_display_name};

use super::models::{Category, ContentChoice, LinkView, MetadataState, Request, Step};

const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug)]
pub struct App {
    pub step: Step,
    pub list_state: ListState,
    pub scroll_state: ScrollbarState,
    pub show_help: bool,
    pub should_quit: bool,
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,
    pub content: Option<ContentChoice>,
    pub query_input: String,
    pub search_results: Vec<SearchResult>,
    pub selected_result: Option<SearchResult>,
    pub seasons: Vec<Season>,
    pub episodes: Vec<EpisodeLink>,
    pub servers: Vec<ServerLink>,
    pub selected_server: Option<ServerLink>,
    pub magnet: Option<String>,
    pub listing: ClassifiedListing,
    pub quality_groups: BTreeMap<Quality, Vec<ClassifiedMovie>>,
    pub category: Option<Category>,
    pub quality: Option<Quality>,
    pub series_name: Option<String>,
    pub link_view: Option<LinkView>,
    composer: LinkComposer,
    normalizer: TitleNormalizer,
    metadata_enabled: bool,
}

impl App {
    pub fn new(composer: LinkComposer, normalizer: TitleNormalizer, metadata_enabled: bool) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        Self {
            step: Step::ContentType,
            list_state,
            scroll_state: ScrollbarState::default(),
            show_help: false,
            should_quit: false,
            status_message: None,
            status_message_time: None,
            content: None,
            query_input: String::new(),
            search_results: Vec::new(),
            selected_result: None,
            seasons: Vec::new(),
            episodes: Vec::new(),
            servers: Vec::new(),
            selected_server: None,
            magnet: None,
            listing: ClassifiedListing::default(),
            quality_groups: BTreeMap::new(),
            category: None,
            quality: None,
            series_name: None,
            link_view: None,
            composer,
            normalizer,
            metadata_enabled,
        }
    }

    /// Labels of the list shown at the current step.
    pub fn items(&self) -> Vec<String> {
        match self.step {
            Step::ContentType => ContentChoice::ALL
                .iter()
                .map(|c| c.label().to_string())
                .collect(),
            Step::SearchResults => self.search_results.iter().map(|r| r.title.clone()).collect(),
            Step::Seasons => self
                .seasons
                .iter()
                .map(|s| format!("{} ({} episodes)", s.label, s.episodes.len()))
                .collect(),
            Step::Episodes => self.episodes.iter().map(|e| e.title.clone()).collect(),
            Step::Servers => self
                .servers
                .iter()
                .map(|s| format!("{} [{}]", s.server, s.quality))
                .collect(),
            Step::Category => vec![
                format!("Movies ({})", self.listing.movies.len()),
                format!("Series ({})", self.listing.series.len()),
            ],
            Step::Qualities => self
                .quality_groups
                .iter()
                .map(|(quality, movies)| format!("{} ({})", quality.label(), movies.len()))
                .collect(),
            Step::Movies => self
                .current_movies()
                .iter()
                .map(|m| m.entry.trimmed_name().to_string())
                .collect(),
            Step::SeriesNames => self
                .listing
                .series
                .iter()
                .map(|b| format!("{} ({} episodes)", series_display_name(&b.name), b.episodes.len()))
                .collect(),
            Step::SeriesEpisodes => self
                .current_episodes()
                .iter()
                .map(|e| format!("{}  {}", e.code(), e.trimmed_name()))
                .collect(),
            Step::Query | Step::Magnet | Step::Link => Vec::new(),
        }
    }

    pub fn selected(&self) -> usize {
        self.list_state.selected().unwrap_or(0)
    }

    pub fn next(&mut self) {
        let len = self.items().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.select(i, len);
    }

    pub fn previous(&mut self) {
        let len = self.items().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.select(i, len);
    }

    fn select(&mut self, index: usize, len: usize) {
        self.list_state.select(Some(index));
        self.scroll_state = self.scroll_state.content_length(len).position(index);
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some(message);
        self.status_message_time = Some(Instant::now());
    }

    pub fn clear_status_message_if_expired(&mut self) {
        if let (Some(_), Some(time)) = (&self.status_message, self.status_message_time) {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    pub fn clear_status_message(&mut self) {
        self.status_message = None;
        self.status_message_time = None;
    }

    pub fn report_error(&mut self, error: &FinderError) {
        tracing::warn!(step = ?self.step, error = %error, "Step failed");
        match error {
            FinderError::EmptyResult(what) => self.set_status_message(format!("Nothing found: {what}")),
            other => self.set_status_message(format!("Error: {other}")),
        }
    }

    /// Start over from the content type menu.
    pub fn reset(&mut self) {
        let composer = self.composer.clone();
        let normalizer = self.normalizer.clone();
        *self = Self::new(composer, normalizer, self.metadata_enabled);
    }

    /// Moving to a new step drops any pending status such as a loading notice.
    fn go_to(&mut self, step: Step) {
        tracing::debug!(from = ?self.step, to = ?step, "Wizard step");
        self.step = step;
        self.clear_status_message();
        self.list_state.select(Some(0));
        self.scroll_state = ScrollbarState::new(self.items().len());
    }

    /// Map a key press to a state change. Returns the fetch the caller has to
    /// run, if any.
    pub fn handle_key(&mut self, code: KeyCode) -> Option<Request> {
        let typing = self.step == Step::Query && !self.show_help;

        match code {
            KeyCode::Esc => {
                if self.show_help {
                    self.show_help = false;
                } else {
                    self.should_quit = true;
                }
                None
            }
            KeyCode::Char(c) if typing => {
                self.query_input.push(c);
                None
            }
            KeyCode::Backspace if typing => {
                self.query_input.pop();
                None
            }
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('h') | KeyCode::F(1) => {
                self.toggle_help();
                None
            }
            _ if self.show_help => None,
            KeyCode::Char('n') if matches!(self.step, Step::Magnet | Step::Link) => {
                self.reset();
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.next();
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.previous();
                None
            }
            KeyCode::Enter => self.on_enter(),
            _ => None,
        }
    }

    pub fn on_enter(&mut self) -> Option<Request> {
        let selected = self.selected();

        match self.step {
            Step::ContentType => {
                let choice = *ContentChoice::ALL.get(selected)?;
                self.content = Some(choice);
                match choice.search_kind() {
                    Some(_) => {
                        self.go_to(Step::Query);
                        None
                    }
                    None => Some(Request::Listing),
                }
            }
            Step::Query => self.submit_query(),
            Step::SearchResults => {
                let result = self.search_results.get(selected)?.clone();
                let url = result.link.clone();
                self.selected_result = Some(result);
                match self.content {
                    Some(ContentChoice::Series) => Some(Request::Seasons { url }),
                    _ => Some(Request::Servers { url }),
                }
            }
            Step::Seasons => {
                self.select_season();
                None
            }
            Step::Episodes => {
                let episode = self.episodes.get(selected)?;
                Some(Request::Servers {
                    url: episode.link.clone(),
                })
            }
            Step::Servers => {
                let server = self.servers.get(selected)?.clone();
                let url = server.link.clone();
                self.selected_server = Some(server);
                Some(Request::Magnet { url })
            }
            Step::Category => {
                self.select_category();
                None
            }
            Step::Qualities => {
                self.select_quality();
                None
            }
            Step::Movies => self.select_movie(),
            Step::SeriesNames => {
                self.select_series();
                None
            }
            Step::SeriesEpisodes => self.select_episode(),
            Step::Magnet | Step::Link => None,
        }
    }

    pub fn submit_query(&mut self) -> Option<Request> {
        let query = self.query_input.trim().to_string();
        if query.is_empty() {
            self.set_status_message("Type a title to search".to_string());
            return None;
        }
        let kind = self
            .content
            .and_then(|c| c.search_kind())
            .unwrap_or(ContentKind::Movies);
        Some(Request::Search { query, kind })
    }

    pub fn load_search_results(&mut self, query: &str, results: Vec<SearchResult>) {
        if results.is_empty() {
            self.set_status_message(format!("No results for \"{query}\""));
            return;
        }
        self.search_results = results;
        self.go_to(Step::SearchResults);
    }

    /// Returns false when the page has no seasons, in which case the caller
    /// should load servers from the same page.
    pub fn load_seasons(&mut self, seasons: Vec<Season>) -> bool {
        if seasons.is_empty() {
            return false;
        }
        self.seasons = seasons;
        self.go_to(Step::Seasons);
        true
    }

    pub fn select_season(&mut self) {
        let Some(season) = self.seasons.get(self.selected()) else {
            return;
        };
        if season.episodes.is_empty() {
            let message = format!("No episodes listed for {}", season.label);
            self.set_status_message(message);
            return;
        }
        self.episodes = season.episodes.clone();
        self.go_to(Step::Episodes);
    }

    pub fn load_servers(&mut self, servers: Vec<ServerLink>) {
        if servers.is_empty() {
            self.set_status_message("No download servers on this page".to_string());
            return;
        }
        self.servers = servers;
        self.go_to(Step::Servers);
    }

    pub fn load_magnet(&mut self, magnet: Option<String>) {
        match magnet {
            Some(magnet) => {
                self.magnet = Some(magnet);
                self.go_to(Step::Magnet);
            }
            None => self.set_status_message("No magnet link on this page".to_string()),
        }
    }

    pub fn load_listing(&mut self, files: Vec<FileEntry>) {
        if files.is_empty() {
            self.set_status_message("The storage folder is empty".to_string());
            return;
        }
        self.listing = classify_movies_and_series(&files);
        self.quality_groups = classify_files_by_quality(&self.listing.movies);
        tracing::info!(
            movies = self.listing.movies.len(),
            series = self.listing.series.len(),
            episodes = self.listing.series.episode_count(),
            "Storage listing classified"
        );
        self.go_to(Step::Category);
    }

    pub fn select_category(&mut self) {
        match self.selected() {
            0 if self.quality_groups.is_empty() => {
                self.set_status_message("No movies in the storage folder".to_string())
            }
            0 => {
                self.category = Some(Category::Movies);
                self.go_to(Step::Qualities);
            }
            _ if self.listing.series.is_empty() => {
                self.set_status_message("No series in the storage folder".to_string())
            }
            _ => {
                self.category = Some(Category::Series);
                self.go_to(Step::SeriesNames);
            }
        }
    }

    pub fn select_quality(&mut self) {
        let Some(quality) = self.quality_groups.keys().nth(self.selected()).copied() else {
            return;
        };
        self.quality = Some(quality);
        self.go_to(Step::Movies);
    }

    pub fn current_movies(&self) -> &[ClassifiedMovie] {
        self.quality
            .and_then(|q| self.quality_groups.get(&q))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn select_movie(&mut self) -> Option<Request> {
        let movie = self.current_movies().get(self.selected())?.clone();
        let view = LinkView {
            info: self.normalizer.normalize(&movie.entry.name, TitleMode::Movie),
            episode_code: None,
            quality: movie.quality,
            link: self.composer.compose_entry(&movie.entry),
            metadata: MetadataState::Disabled,
        };
        self.show_link(view, MediaKind::Movie)
    }

    pub fn select_series(&mut self) {
        let Some(bucket) = self.listing.series.bucket(self.selected()) else {
            return;
        };
        self.series_name = Some(bucket.name.clone());
        self.go_to(Step::SeriesEpisodes);
    }

    pub fn current_episodes(&self) -> &[SeriesEpisode] {
        self.series_name
            .as_deref()
            .and_then(|name| self.listing.series.get(name))
            .unwrap_or(&[])
    }

    pub fn select_episode(&mut self) -> Option<Request> {
        let episode = self.current_episodes().get(self.selected())?.clone();
        let view = LinkView {
            info: self.normalizer.normalize(&episode.name, TitleMode::Series),
            episode_code: Some(episode.code()),
            quality: episode.quality,
            link: self.composer.compose(&episode.link, &episode.name),
            metadata: MetadataState::Disabled,
        };
        self.show_link(view, MediaKind::Tv)
    }

    fn show_link(&mut self, mut view: LinkView, kind: MediaKind) -> Option<Request> {
        let request = if self.metadata_enabled {
            view.metadata = MetadataState::Pending;
            Some(Request::Metadata {
                title: view.info.title.clone(),
                kind,
                year: view.info.year.clone(),
            })
        } else {
            None
        };

        tracing::info!(title = %view.info.title, link = %view.link, "Composed download link");
        self.link_view = Some(view);
        self.go_to(Step::Link);
        request
    }

    pub fn set_metadata(&mut self, result: Result<Option<Metadata>, FinderError>) {
        self.clear_status_message();
        let Some(view) = self.link_view.as_mut() else {
            return;
        };
        view.metadata = match result {
            Ok(Some(metadata)) => MetadataState::Found(metadata),
            Ok(None) => MetadataState::Unavailable("No metadata found for this title".to_string()),
            Err(e) => MetadataState::Unavailable(e.to_string()),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(metadata_enabled: bool) -> App {
        App::new(LinkComposer::default(), TitleNormalizer::default(), metadata_enabled)
    }

    fn entry(name: &str) -> FileEntry {
        FileEntry::new(name, format!("https://storage.example/{name}"))
    }

    fn storage_files() -> Vec<FileEntry> {
        vec![
            entry("Show.S01E02.2020.4k/"),
            entry("My.Movie.2019.1080p.WEB-DL/"),
            entry("Show.S01E01.2020.1080p/"),
            entry("Other.Movie.2018.2160p/"),
        ]
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = app(false);
        assert_eq!(app.items().len(), 3);

        app.previous();
        assert_eq!(app.selected(), 2);
        app.next();
        assert_eq!(app.selected(), 0);
        app.next();
        assert_eq!(app.selected(), 1);
    }

    #[test]
    fn test_search_flow_for_movies() {
        let mut app = app(false);
        assert_eq!(app.on_enter(), None);
        assert_eq!(app.step, Step::Query);

        for c in "el padrino".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        let request = app.handle_key(KeyCode::Enter);
        assert_eq!(
            request,
            Some(Request::Search {
                query: "el padrino".to_string(),
                kind: ContentKind::Movies,
            })
        );

        app.load_search_results(
            "el padrino",
            vec![SearchResult {
                title: "El Padrino".to_string(),
                link: "https://catalog.example/el-padrino/".to_string(),
            }],
        );
        assert_eq!(app.step, Step::SearchResults);
        assert_eq!(
            app.on_enter(),
            Some(Request::Servers {
                url: "https://catalog.example/el-padrino/".to_string()
            })
        );

        app.load_servers(vec![ServerLink {
            server: "Torrent".to_string(),
            quality: "1080p".to_string(),
            link: "https://catalog.example/torrent/1/".to_string(),
        }]);
        assert_eq!(app.step, Step::Servers);
        assert_eq!(
            app.on_enter(),
            Some(Request::Magnet {
                url: "https://catalog.example/torrent/1/".to_string()
            })
        );

        app.load_magnet(Some("magnet:?xt=urn:btih:abc".to_string()));
        assert_eq!(app.step, Step::Magnet);
        assert_eq!(app.magnet.as_deref(), Some("magnet:?xt=urn:btih:abc"));
    }

    #[test]
    fn test_series_search_uses_seasons() {
        let mut app = app(false);
        app.next();
        app.on_enter();
        app.query_input = "dark".to_string();
        assert_eq!(
            app.on_enter(),
            Some(Request::Search {
                query: "dark".to_string(),
                kind: ContentKind::Series,
            })
        );

        app.load_search_results(
            "dark",
            vec![SearchResult {
                title: "Dark".to_string(),
                link: "https://catalog.example/dark/".to_string(),
            }],
        );
        assert_eq!(
            app.on_enter(),
            Some(Request::Seasons {
                url: "https://catalog.example/dark/".to_string()
            })
        );

        assert!(!app.load_seasons(Vec::new()));
        assert_eq!(app.step, Step::SearchResults);

        let season = Season {
            label: "Temporada 1".to_string(),
            episodes: vec![EpisodeLink {
                title: "Episodio 1".to_string(),
                link: "https://catalog.example/dark/1x1/".to_string(),
            }],
        };
        assert!(app.load_seasons(vec![season]));
        assert_eq!(app.step, Step::Seasons);

        assert_eq!(app.on_enter(), None);
        assert_eq!(app.step, Step::Episodes);
        assert_eq!(
            app.on_enter(),
            Some(Request::Servers {
                url: "https://catalog.example/dark/1x1/".to_string()
            })
        );
    }

    #[test]
    fn test_loading_status_cleared_on_success() {
        let mut app = app(false);
        app.on_enter();
        app.query_input = "dune".to_string();
        let request = app.submit_query().unwrap();
        app.set_status_message(request.describe());

        app.load_search_results(
            "dune",
            vec![SearchResult {
                title: "Dune".to_string(),
                link: "https://catalog.example/dune/".to_string(),
            }],
        );
        assert_eq!(app.step, Step::SearchResults);
        assert_eq!(app.status_message, None);
        assert_eq!(app.status_message_time, None);
    }

    #[test]
    fn test_empty_results_stay_on_step() {
        let mut app = app(false);
        app.on_enter();
        app.query_input = "zzz".to_string();
        app.load_search_results("zzz", Vec::new());

        assert_eq!(app.step, Step::Query);
        assert_eq!(app.status_message.as_deref(), Some("No results for \"zzz\""));
    }

    #[test]
    fn test_blank_query_is_rejected() {
        let mut app = app(false);
        app.on_enter();
        app.query_input = "   ".to_string();
        assert_eq!(app.on_enter(), None);
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_typing_q_does_not_quit_in_query() {
        let mut app = app(false);
        app.on_enter();
        app.handle_key(KeyCode::Char('q'));
        assert!(!app.should_quit);
        assert_eq!(app.query_input, "q");

        app.handle_key(KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[test]
    fn test_storage_movie_flow() {
        let mut app = app(false);
        app.list_state.select(Some(2));
        assert_eq!(app.on_enter(), Some(Request::Listing));

        app.load_listing(storage_files());
        assert_eq!(app.step, Step::Category);
        assert_eq!(app.items(), vec!["Movies (2)", "Series (1)"]);

        app.on_enter();
        assert_eq!(app.step, Step::Qualities);
        assert_eq!(app.items(), vec!["4K / 2160p (1)", "1080p (1)"]);

        app.next();
        app.on_enter();
        assert_eq!(app.step, Step::Movies);
        assert_eq!(app.items(), vec!["My.Movie.2019.1080p.WEB-DL"]);

        assert_eq!(app.on_enter(), None);
        assert_eq!(app.step, Step::Link);
        let view = app.link_view.as_ref().unwrap();
        assert_eq!(view.info.display(), "My Movie (2019)");
        assert_eq!(view.quality, Quality::FullHd);
        assert_eq!(
            view.link,
            "https://storage.example/My.Movie.2019.1080p.WEB-DL/My.Movie.2019.1080p.WEB-DL.mkv"
        );
        assert_eq!(view.metadata, MetadataState::Disabled);
    }

    #[test]
    fn test_storage_series_flow_with_metadata() {
        let mut app = app(true);
        app.load_listing(storage_files());

        app.next();
        app.on_enter();
        assert_eq!(app.step, Step::SeriesNames);
        assert_eq!(app.items(), vec!["Show (2 episodes)"]);

        app.on_enter();
        assert_eq!(app.step, Step::SeriesEpisodes);
        assert_eq!(
            app.items(),
            vec!["S01E01  Show.S01E01.2020.1080p", "S01E02  Show.S01E02.2020.4k"]
        );

        app.next();
        let request = app.on_enter();
        assert_eq!(
            request,
            Some(Request::Metadata {
                title: "Show".to_string(),
                kind: MediaKind::Tv,
                year: Some("2020".to_string()),
            })
        );
        let view = app.link_view.as_ref().unwrap();
        assert_eq!(view.episode_code.as_deref(), Some("S01E02"));
        assert_eq!(view.quality, Quality::FourK);
        assert_eq!(view.metadata, MetadataState::Pending);

        app.set_status_message(request.as_ref().unwrap().describe());
        app.set_metadata(Err(FinderError::UpstreamUnavailable("HTTP 401".to_string())));
        assert_eq!(app.status_message, None);
        assert!(matches!(
            app.link_view.as_ref().unwrap().metadata,
            MetadataState::Unavailable(_)
        ));
    }

    #[test]
    fn test_empty_category_shows_message() {
        let mut app = app(false);
        app.load_listing(vec![entry("Only.Movie.2019.1080p/")]);

        app.next();
        app.on_enter();
        assert_eq!(app.step, Step::Category);
        assert_eq!(app.status_message.as_deref(), Some("No series in the storage folder"));
    }

    #[test]
    fn test_empty_listing_stays_on_content_type() {
        let mut app = app(false);
        app.load_listing(Vec::new());
        assert_eq!(app.step, Step::ContentType);
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_new_lookup_only_from_final_steps() {
        let mut app = app(false);
        app.load_listing(storage_files());
        app.handle_key(KeyCode::Char('n'));
        assert_eq!(app.step, Step::Category);

        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.step, Step::Link);

        app.handle_key(KeyCode::Char('n'));
        assert_eq!(app.step, Step::ContentType);
        assert!(app.listing.movies.is_empty());
        assert!(app.link_view.is_none());
    }
}
