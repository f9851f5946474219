//! HTTP client for the paginated games endpoint.
//!
//! The client is a plain constructed value: callers build it from a [`ClientConfig`]
//! and hand it (usually as `Arc<dyn GamesApi>`) to whatever drives the catalog.

use std::sync::Arc;

use futures::{FutureExt, future::BoxFuture};
use reqwest::{
    Client, Url,
    header::{CACHE_CONTROL, CONTENT_TYPE},
};
use thiserror::Error;
use tracing::debug;

use crate::{
    config::ClientConfig,
    dto::games::GamesResponse,
    state::{
        catalog_machine::CatalogFailure,
        query::{GamesQuery, GamesResult},
    },
};

/// Path of the games endpoint, relative to the API base URL.
pub const GAMES_PATH: &str = "/api/games";

/// Failures of a games request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("Failed to fetch games: {status} {status_text}")]
    Fetch {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase, empty for non-standard codes.
        status_text: String,
    },
    /// The request never produced a response (connection refused, timeout, bad URL).
    #[error("games request failed: {message}")]
    Network {
        /// Transport error description.
        message: String,
    },
    /// The response body is not a games page.
    #[error("failed to decode games response: {message}")]
    Decode {
        /// Decoder error description.
        message: String,
    },
}

impl From<ClientError> for CatalogFailure {
    fn from(err: ClientError) -> Self {
        CatalogFailure::new(err.to_string())
    }
}

/// Source of catalog pages used by the catalog feed.
pub trait GamesApi: Send + Sync {
    /// Fetch one page of games for `query`.
    fn fetch_page(&self, query: &GamesQuery) -> BoxFuture<'static, Result<GamesResult, ClientError>>;
}

/// Games client issuing one `GET /api/games` round trip per call, without retries.
#[derive(Clone)]
pub struct GamesClient {
    client: Client,
    base_url: Arc<str>,
}

impl GamesClient {
    /// Build a client for the API described by `config`.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|err| ClientError::Network {
            message: err.to_string(),
        })?;

        Ok(Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
        })
    }

    /// Canonical query pairs: `genre` only when set, `page` always.
    pub fn query_pairs(query: &GamesQuery) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(2);
        if let Some(genre) = query.genre() {
            pairs.push(("genre", genre.to_string()));
        }
        pairs.push(("page", query.page().to_string()));
        pairs
    }

    /// Full request URL for `query`.
    pub fn request_url(&self, query: &GamesQuery) -> Result<Url, ClientError> {
        let endpoint = format!("{}{}", self.base_url, GAMES_PATH);
        Url::parse_with_params(&endpoint, Self::query_pairs(query)).map_err(|err| {
            ClientError::Network {
                message: format!("invalid games URL `{endpoint}`: {err}"),
            }
        })
    }

    /// Fetch one page of games.
    pub async fn get_games(&self, query: &GamesQuery) -> Result<GamesResult, ClientError> {
        let url = self.request_url(query)?;
        debug!(%url, "fetching games");

        let response = self
            .client
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|err| ClientError::Network {
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Fetch {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let page = response
            .json::<GamesResponse>()
            .await
            .map_err(|err| ClientError::Decode {
                message: err.to_string(),
            })?;

        Ok(page.into())
    }
}

impl GamesApi for GamesClient {
    fn fetch_page(&self, query: &GamesQuery) -> BoxFuture<'static, Result<GamesResult, ClientError>> {
        let client = self.clone();
        let query = query.clone();
        async move { client.get_games(&query).await }.boxed()
    }
}
