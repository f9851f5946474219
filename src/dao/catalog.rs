//! Read-only catalog data source served by the games endpoint.

use std::{
    collections::HashSet,
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{info, warn};
use validator::{Validate, ValidationErrors};

use crate::dao::models::Game;

/// Catalog shipped with the binary.
const EMBEDDED_CATALOG: &str = include_str!("../../data/catalog.json");

/// Provider of the full, unfiltered game collection.
pub trait CatalogSource: Send + Sync {
    /// Every game, in catalog order.
    fn games(&self) -> &[Game];
}

/// Failures raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog `{path}`")]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The catalog is not a JSON array of games.
    #[error("failed to parse catalog")]
    Parse(#[from] serde_json::Error),
    /// An entry failed validation.
    #[error("invalid catalog entry at index {index}: {source}")]
    InvalidEntry {
        /// Position of the entry in the catalog array.
        index: usize,
        /// Fields that failed validation.
        #[source]
        source: ValidationErrors,
    },
    /// Two entries share the same identifier.
    #[error("duplicate game id `{id}` in catalog")]
    DuplicateId {
        /// The repeated identifier.
        id: String,
    },
}

/// Catalog held in memory for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    games: Vec<Game>,
}

impl StaticCatalog {
    /// Validate and wrap a list of games.
    pub fn new(games: Vec<Game>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for (index, game) in games.iter().enumerate() {
            game.validate()
                .map_err(|source| CatalogError::InvalidEntry { index, source })?;
            if !seen.insert(game.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    id: game.id.clone(),
                });
            }
        }
        Ok(Self { games })
    }

    /// Parse a JSON array of games.
    pub fn from_json(contents: &str) -> Result<Self, CatalogError> {
        let games: Vec<Game> = serde_json::from_str(contents)?;
        Self::new(games)
    }

    /// Catalog bundled with the binary.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Read a catalog file from disk.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Load the catalog at `path`, falling back to the embedded one when it is missing or
    /// invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
        let Some(path) = path else {
            return Self::embedded();
        };

        match Self::from_path(path) {
            Ok(catalog) => {
                info!(path = %path.display(), count = catalog.games.len(), "loaded catalog");
                Ok(catalog)
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to load catalog; falling back to embedded catalog"
                );
                Self::embedded()
            }
        }
    }
}

impl CatalogSource for StaticCatalog {
    fn games(&self) -> &[Game] {
        &self.games
    }
}
