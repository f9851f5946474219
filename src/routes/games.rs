use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::games::{GamesQueryParams, GamesResponse},
    error::AppError,
    services::catalog_service,
    state::SharedState,
};

/// Routes exposing the paginated catalog.
pub fn router() -> Router<SharedState> {
    Router::new().route("/api/games", get(list_games))
}

#[utoipa::path(
    get,
    path = "/api/games",
    tag = "games",
    params(GamesQueryParams),
    responses(
        (status = 200, description = "One page of the catalog", body = GamesResponse),
        (status = 400, description = "Invalid genre filter")
    )
)]
/// Return one page of games, optionally filtered by genre.
pub async fn list_games(
    State(state): State<SharedState>,
    Query(params): Query<GamesQueryParams>,
) -> Result<Json<GamesResponse>, AppError> {
    let payload = catalog_service::list_games(&state, params).await?;
    Ok(Json(payload))
}
