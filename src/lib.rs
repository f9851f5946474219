//! Library crate for gamer-shop: catalog server, games client, and cart state.

pub mod config;
/// Catalog data, models and key-value persistence.
pub mod dao;
/// Request and response payloads of the HTTP API.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
pub mod format;
/// Axum route trees.
pub mod routes;
/// Catalog services, games client and incremental feed.
pub mod services;
pub mod state;
