/// Read-only catalog data source.
pub mod catalog;
/// Catalog and cart model definitions.
pub mod models;
/// Local key-value persistence with JSON encoding.
pub mod storage;
