//! Catalog search service / 目录搜索服务
//!
//! HTTP façade over a full-text search engine for product, inventory and
//! vendor records: bulk sync into an index, reconcile two snapshots by
//! deleting what disappeared, and search or list across the catalog.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod state;
