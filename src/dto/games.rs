use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dao::models::Game,
    dto::validation::validate_genre,
    state::query::{GamesQuery, GamesResult},
};

/// Raw query string of `GET /api/games`.
///
/// `page` is kept as text so that malformed values degrade to page 1 instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct GamesQueryParams {
    /// Case-insensitive genre filter. Omit for the whole catalog.
    #[validate(custom(function = "validate_genre"))]
    pub genre: Option<String>,
    /// 1-based page number; missing, non-numeric or < 1 values resolve to 1.
    #[param(value_type = Option<i64>)]
    pub page: Option<String>,
}

impl GamesQueryParams {
    /// Normalise into a [`GamesQuery`].
    pub fn to_query(&self) -> GamesQuery {
        GamesQuery::from_raw(self.genre.as_deref(), self.page.as_deref())
    }
}

/// One page of the catalog as returned by `GET /api/games`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GamesResponse {
    /// Games on the requested page.
    pub games: Vec<Game>,
    /// Every genre of the unfiltered catalog.
    pub available_filters: Vec<String>,
    /// Number of pages for the active filter; zero when nothing matches.
    pub total_pages: u32,
    /// The resolved page, possibly past `total_pages`.
    pub current_page: u32,
}

impl From<GamesResult> for GamesResponse {
    fn from(result: GamesResult) -> Self {
        Self {
            games: result.games,
            available_filters: result.available_filters,
            total_pages: result.total_pages,
            current_page: result.current_page,
        }
    }
}

impl From<GamesResponse> for GamesResult {
    fn from(response: GamesResponse) -> Self {
        Self {
            games: response.games,
            available_filters: response.available_filters,
            total_pages: response.total_pages,
            current_page: response.current_page,
        }
    }
}
