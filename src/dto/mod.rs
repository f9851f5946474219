/// Games endpoint query parameters and response payload.
pub mod games;
/// Health check payload.
pub mod health;
/// Custom validators shared by request DTOs.
pub mod validation;
