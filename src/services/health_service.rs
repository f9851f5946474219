use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the server has a catalog to serve.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let games = state.catalog().games().len();
    if games == 0 {
        warn!("catalog is empty");
    }

    HealthResponse::for_catalog(games)
}
