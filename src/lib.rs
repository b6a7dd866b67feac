//! Prosperian Aggregation API Library
//!
//! This library provides the core functionality for the Prosperian API:
//! authenticated clients for the Pronto enrichment platform and the INSEE
//! Sirene business registry, the multi-source aggregation workflow that
//! merges and enriches their data, and the HTTP handlers exposing it.
//!
//! # Modules
//!
//! - `config`: Configuration management.
//! - `enrichment`: Per-item enrichment stage and request-scoped caches.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and shared state.
//! - `insee_client`: INSEE Sirene registry client with token refresh.
//! - `models`: Core data models.
//! - `pronto_client`: Pronto enrichment API client.
//! - `store`: Record/file store collaborator interfaces.
//! - `workflow`: The aggregation workflow.

pub mod config;
pub mod enrichment;
pub mod errors;
pub mod handlers;
pub mod insee_client;
pub mod models;
pub mod pronto_client;
pub mod store;
pub mod workflow;
