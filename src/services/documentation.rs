use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Gamer Shop catalog API.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::games::list_games,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::games::GamesResponse,
            crate::dao::models::Game,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "games", description = "Paginated game catalog"),
    )
)]
pub struct ApiDoc;
