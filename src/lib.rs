//! kinmap - geocoded genealogy exports
//!
//! This library provides shared types and modules for the ingest and query binaries.

pub mod config;
pub mod dashboard;
pub mod discord;
pub mod enrich;
pub mod geocode;
pub mod models;
pub mod pipeline;
pub mod source;
pub mod store;

pub use models::{GenealogyTable, GeoPoint, Resolution, Value};
