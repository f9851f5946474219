//! Server-side resolution of catalog queries.

use tokio::time::sleep;
use tracing::debug;
use validator::Validate;

use crate::{
    dto::games::{GamesQueryParams, GamesResponse},
    error::ServiceError,
    state::{
        SharedState,
        query::{PAGE_SIZE, resolve},
    },
};

/// Resolve a page of the catalog for the given raw query parameters.
pub async fn list_games(
    state: &SharedState,
    params: GamesQueryParams,
) -> Result<GamesResponse, ServiceError> {
    params.validate()?;
    let query = params.to_query();

    let latency = state.config().simulated_latency;
    if !latency.is_zero() {
        sleep(latency).await;
    }

    let result = resolve(state.catalog().games(), &query, PAGE_SIZE);
    debug!(
        genre = ?query.genre(),
        page = query.page(),
        returned = result.games.len(),
        total_pages = result.total_pages,
        "resolved games query"
    );

    Ok(result.into())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{catalog::StaticCatalog, models::fixtures::game},
        state::AppState,
    };

    fn state() -> SharedState {
        let games = (1..=14)
            .map(|i| game(&i.to_string(), "Action", 2999))
            .chain([game("rpg", "RPG", 3999)])
            .collect();
        AppState::new(
            Arc::new(StaticCatalog::new(games).unwrap()),
            AppConfig::default(),
        )
    }

    fn params(genre: Option<&str>, page: Option<&str>) -> GamesQueryParams {
        GamesQueryParams {
            genre: genre.map(str::to_string),
            page: page.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn lists_first_page_by_default() {
        let response = list_games(&state(), params(None, None)).await.unwrap();
        assert_eq!(response.games.len(), 12);
        assert_eq!(response.total_pages, 2);
        assert_eq!(response.current_page, 1);
        assert_eq!(response.available_filters, ["Action", "RPG"]);
    }

    #[tokio::test]
    async fn filters_by_genre_case_insensitively() {
        let response = list_games(&state(), params(Some("rpg"), Some("1")))
            .await
            .unwrap();
        assert_eq!(response.games.len(), 1);
        assert_eq!(response.games[0].id, "rpg");
        assert_eq!(response.total_pages, 1);
    }

    #[tokio::test]
    async fn malformed_page_resolves_to_first_page() {
        let response = list_games(&state(), params(Some("Action"), Some("-2")))
            .await
            .unwrap();
        assert_eq!(response.current_page, 1);

        let response = list_games(&state(), params(Some("Action"), Some("abc")))
            .await
            .unwrap();
        assert_eq!(response.current_page, 1);
    }

    #[tokio::test]
    async fn rejects_overly_long_genre() {
        let err = list_games(&state(), params(Some(&"x".repeat(100)), None))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
