use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::catalog::CatalogClient;
use crate::listing::ListingClient;
use crate::metadata::MetadataClient;

use super::app::App;
use super::models::Request;
use super::rendering::ui;

/// Network clients the wizard talks to.
pub struct Services {
    pub catalog: CatalogClient,
    /// Absent when no storage folder URL is configured.
    pub listing: Option<ListingClient>,
    /// Absent when no metadata credential is configured.
    pub metadata: Option<MetadataClient>,
}

pub async fn run_tui(mut app: App, services: Services) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &services).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    services: &Services,
) -> anyhow::Result<()> {
    loop {
        app.clear_status_message_if_expired();
        terminal.draw(|f| ui(f, app))?;

        if app.should_quit {
            return Ok(());
        }

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if let Some(request) = app.handle_key(key.code) {
            // Show what is loading before blocking on the request.
            app.set_status_message(request.describe());
            terminal.draw(|f| ui(f, app))?;
            perform(app, services, request).await;
        }
    }
}

async fn perform(app: &mut App, services: &Services, request: Request) {
    match request {
        Request::Search { query, kind } => match services.catalog.search(&query, kind).await {
            Ok(results) => app.load_search_results(&query, results),
            Err(e) => app.report_error(&e),
        },
        Request::Seasons { url } => match services.catalog.seasons(&url).await {
            Ok(seasons) => {
                if !app.load_seasons(seasons) {
                    tracing::debug!(url, "No seasons on page, loading servers");
                    load_servers(app, services, &url).await;
                }
            }
            Err(e) => app.report_error(&e),
        },
        Request::Servers { url } => load_servers(app, services, &url).await,
        Request::Magnet { url } => match services.catalog.magnet_link(&url).await {
            Ok(magnet) => app.load_magnet(magnet),
            Err(e) => app.report_error(&e),
        },
        Request::Listing => match &services.listing {
            Some(listing) => match listing.fetch().await {
                Ok(files) => app.load_listing(files),
                Err(e) => app.report_error(&e),
            },
            None => app.set_status_message(
                "No storage folder configured (set storage.folder_url or --folder-url)".to_string(),
            ),
        },
        Request::Metadata { title, kind, year } => match &services.metadata {
            Some(client) => {
                let result = client.lookup(&title, kind, year.as_deref()).await;
                app.set_metadata(result);
            }
            None => app.set_metadata(Ok(None)),
        },
    }
}

async fn load_servers(app: &mut App, services: &Services, url: &str) {
    match services.catalog.servers(url).await {
        Ok(servers) => app.load_servers(servers),
        Err(e) => app.report_error(&e),
    }
}
