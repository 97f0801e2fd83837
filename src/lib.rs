//! Movie and series link finder: scrapes a catalog site, classifies a storage
//! folder listing and composes direct download links.

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod decode;
pub mod error;
pub mod http;
pub mod link;
pub mod listing;
pub mod metadata;
pub mod quality;
pub mod title;
pub mod tui;
