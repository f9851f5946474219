//! Server state and client-side state containers (catalog machine, cart).

pub mod cart;
/// Incremental catalog state machine.
pub mod catalog_machine;
pub mod query;

use std::sync::Arc;

use crate::{config::AppConfig, dao::catalog::CatalogSource};

/// Shared handle to the server state used by axum handlers.
pub type SharedState = Arc<AppState>;

/// Central server state: the catalog being served and the runtime configuration.
pub struct AppState {
    catalog: Arc<dyn CatalogSource>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(catalog: Arc<dyn CatalogSource>, config: AppConfig) -> SharedState {
        Arc::new(Self { catalog, config })
    }

    /// Catalog served by the games endpoint.
    pub fn catalog(&self) -> &dyn CatalogSource {
        self.catalog.as_ref()
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
