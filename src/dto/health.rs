use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "empty" when the catalog has no games).
    pub status: String,
    /// Number of games in the served catalog.
    pub games: usize,
}

impl HealthResponse {
    /// Build the health payload for a catalog of `games` entries.
    pub fn for_catalog(games: usize) -> Self {
        let status = if games == 0 { "empty" } else { "ok" };
        Self {
            status: status.to_string(),
            games,
        }
    }
}
