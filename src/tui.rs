//! Interactive wizard over the catalog and storage clients.

mod app;
mod events;
mod models;
mod rendering;

pub use app::App;
pub use events::{Services, run_tui};
pub use models::{Category, ContentChoice, LinkView, MetadataState, Request, Step};
