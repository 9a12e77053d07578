//! slide-library - Upload slides to a cloud drive and catalog them in a spreadsheet
//!
//! This crate provides:
//! - Swappable asset stores (Google Drive, GCS, local filesystem)
//! - An append-only catalog backed by Google Sheets (or a local redb file)
//! - Download-link derivation, search and keyword filtering over the catalog
//! - REST API with multipart upload support

pub mod api;
pub mod asset_store;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod library;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use asset_store::LocalStore;
use config::Config;
use library::Library;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub library: Library,
    /// Set when assets are stored locally and served by this process.
    pub local_assets: Option<Arc<LocalStore>>,
}
