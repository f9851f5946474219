use axum::Router;

use crate::state::SharedState;

/// Swagger UI and OpenAPI document.
pub mod docs;
/// Paginated catalog endpoint.
pub mod games;
/// Health check endpoint.
pub mod health;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(games::router())
        .merge(docs::router())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::{net::SocketAddr, sync::Arc};

    use axum::Router;
    use tokio::net::TcpListener;

    use crate::{
        config::AppConfig,
        dao::{catalog::StaticCatalog, models::Game},
        state::AppState,
    };

    /// Serve `router` on an ephemeral local port and return its base URL.
    pub async fn spawn(router: Router) -> String {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Serve the full application router over `games`.
    pub async fn spawn_catalog(games: Vec<Game>) -> String {
        let state = AppState::new(
            Arc::new(StaticCatalog::new(games).unwrap()),
            AppConfig::default(),
        );
        spawn(super::router(state)).await
    }
}
