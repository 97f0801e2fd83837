//! cine-finder - find download links on a movie catalog site and in a
//! storage folder listing.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use cine_finder::catalog::{CatalogClient, ContentKind};
use cine_finder::classifier::classify_movies_and_series;
use cine_finder::config::AppConfig;
use cine_finder::decode::encode_url;
use cine_finder::error::FinderError;
use cine_finder::http::HttpFetcher;
use cine_finder::link::LinkComposer;
use cine_finder::listing::ListingClient;
use cine_finder::metadata::MetadataClient;
use cine_finder::quality::classify_files_by_quality;
use cine_finder::title::{ReleaseTags, TitleMode, TitleNormalizer};
use cine_finder::tui::{self, App, Services};

/// Find movie and series download links.
///
/// Without a subcommand the interactive wizard is started.
#[derive(Parser)]
#[command(author, version, name = env!("CARGO_BIN_NAME"), about)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Override the catalog site base URL
    #[arg(long, value_name = "URL")]
    catalog_url: Option<String>,

    /// Override the storage folder listing URL
    #[arg(long, value_name = "URL")]
    folder_url: Option<String>,

    /// Metadata API key or read access token
    #[arg(long, env = "CINE_FINDER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the interactive wizard
    Tui,
    /// Search the catalog
    Search {
        query: String,
        /// Search series instead of movies
        #[arg(short, long)]
        series: bool,
    },
    /// List download servers on a title or episode page
    Servers { url: String },
    /// List seasons and episodes on a series page
    Seasons { url: String },
    /// Print the magnet link on a download page
    Magnet { url: String },
    /// Fetch the storage folder listing and classify it
    Files {
        /// Print the classified listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compose a download link from a listing link and a name
    Link {
        link: String,
        name: String,
        /// Percent-encode the result, keeping ':' and '/'
        #[arg(short, long)]
        encode: bool,
    },
    /// Extract title and year from a release name
    Title {
        name: String,
        /// Parse as a series episode name
        #[arg(short, long)]
        series: bool,
    },
    /// Show the effective configuration
    Config {
        /// Write it to the user config file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Tui);
    let _guard = init_logging(cli.verbose, matches!(command, Command::Tui))?;

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(url) = cli.catalog_url {
        config.catalog.base_url = url;
    }
    if let Some(url) = cli.folder_url {
        config.storage.folder_url = url;
    }
    if let Some(key) = cli.api_key {
        config.metadata.api_key = Some(key);
    }

    match run(command, &config).await {
        Err(e) => match e.downcast_ref::<FinderError>() {
            Some(FinderError::EmptyResult(what)) => {
                println!("No results: {what}");
                Ok(())
            }
            _ => Err(e),
        },
        ok => ok,
    }
}

/// Subcommands log to stderr; the wizard owns the terminal, so it logs to a
/// daily file instead.
fn init_logging(verbose: u8, to_file: bool) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cine_finder=info")),
        1 => EnvFilter::new("cine_finder=debug"),
        _ => EnvFilter::new("cine_finder=trace"),
    };

    if to_file {
        let log_dir = AppConfig::log_dir();
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
        let appender = tracing_appender::rolling::daily(log_dir, "cine-finder.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Ok(Some(guard))
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(None)
    }
}

fn normalizer(config: &AppConfig) -> Result<TitleNormalizer> {
    let tags = ReleaseTags::default().with_extra(config.titles.extra_release_tags.iter().cloned());
    Ok(TitleNormalizer::new(&tags)?)
}

fn listing_client(http: HttpFetcher, config: &AppConfig) -> Result<ListingClient> {
    Ok(ListingClient::new(http, config.storage_folder_url()?)?)
}

async fn run(command: Command, config: &AppConfig) -> Result<()> {
    let http = HttpFetcher::new(&config.catalog)?;
    let catalog = CatalogClient::new(http.clone(), &config.catalog.base_url)?;

    match command {
        Command::Tui => {
            let listing = match config.storage_folder_url() {
                Ok(url) => Some(ListingClient::new(http.clone(), url)?),
                Err(_) => None,
            };
            let metadata = MetadataClient::from_config(http.client().clone(), &config.metadata);
            let app = App::new(
                LinkComposer::from_config(&config.links),
                normalizer(config)?,
                metadata.is_some(),
            );
            let services = Services {
                catalog,
                listing,
                metadata,
            };
            tui::run_tui(app, services).await
        }
        Command::Search { query, series } => {
            let kind = if series {
                ContentKind::Series
            } else {
                ContentKind::Movies
            };
            let results = catalog.search(&query, kind).await?;
            if results.is_empty() {
                return Err(FinderError::EmptyResult(format!("{kind} matching \"{query}\"")).into());
            }
            for (i, result) in results.iter().enumerate() {
                println!("{:>3}. {}\t{}", i + 1, result.title, result.link);
            }
            Ok(())
        }
        Command::Servers { url } => {
            let servers = catalog.servers(&url).await?;
            if servers.is_empty() {
                return Err(FinderError::EmptyResult(format!("servers on {url}")).into());
            }
            for server in servers {
                println!("{}\t{}\t{}", server.server, server.quality, server.link);
            }
            Ok(())
        }
        Command::Seasons { url } => {
            let seasons = catalog.seasons(&url).await?;
            if seasons.is_empty() {
                return Err(FinderError::EmptyResult(format!("seasons on {url}")).into());
            }
            for season in seasons {
                println!("{}", season.label);
                for episode in season.episodes {
                    println!("  {}\t{}", episode.title, episode.link);
                }
            }
            Ok(())
        }
        Command::Magnet { url } => {
            let magnet = catalog
                .magnet_link(&url)
                .await?
                .ok_or_else(|| FinderError::EmptyResult(format!("magnet link on {url}")))?;
            println!("{magnet}");
            Ok(())
        }
        Command::Files { json } => {
            let files = listing_client(http, config)?.fetch().await?;
            if files.is_empty() {
                return Err(FinderError::EmptyResult("files in the storage folder".to_string()).into());
            }
            let listing = classify_movies_and_series(&files);
            let qualities = classify_files_by_quality(&listing.movies);

            if json {
                let output = serde_json::json!({
                    "movies": qualities,
                    "series": listing.series,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
                return Ok(());
            }

            let composer = LinkComposer::from_config(&config.links);
            for (quality, movies) in &qualities {
                println!("== Movies [{}] ({})", quality.label(), movies.len());
                for movie in movies {
                    println!("  {}\t{}", movie.entry.trimmed_name(), composer.compose_entry(&movie.entry));
                }
            }
            for bucket in listing.series.iter() {
                println!("== {} ({} episodes)", bucket.name, bucket.episodes.len());
                for episode in &bucket.episodes {
                    println!(
                        "  {} [{}]\t{}",
                        episode.code(),
                        episode.quality,
                        composer.compose(&episode.link, &episode.name)
                    );
                }
            }
            Ok(())
        }
        Command::Link { link, name, encode } => {
            let composed = LinkComposer::from_config(&config.links).compose(&link, &name);
            if encode {
                println!("{}", encode_url(&composed));
            } else {
                println!("{composed}");
            }
            Ok(())
        }
        Command::Title { name, series } => {
            let mode = if series { TitleMode::Series } else { TitleMode::Movie };
            let info = normalizer(config)?.normalize(&name, mode);
            match &info.year {
                Some(year) => println!("{}\t{}", info.title, year),
                None => println!("{}", info.title),
            }
            Ok(())
        }
        Command::Config { write } => {
            if write {
                let path = config.save()?;
                println!("Wrote {}", path.display());
            } else {
                println!("# {}", AppConfig::config_path().display());
                print!("{}", config.to_toml()?);
            }
            Ok(())
        }
    }
}
