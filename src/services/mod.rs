/// Server-side catalog query resolution.
pub mod catalog_service;
/// Incremental catalog loading driven by the games client.
pub mod catalog_feed;
/// OpenAPI documentation generation.
pub mod documentation;
/// HTTP client for the games endpoint.
pub mod games_client;
/// Health check service.
pub mod health_service;
