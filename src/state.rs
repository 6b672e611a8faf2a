use std::sync::Arc;

use crate::config::{AppConfig, CatalogConfig};
use crate::engine::SearchEngine;

/// Shared handler state / 处理器共享状态
///
/// Built once in `main` from the loaded config; holds no per-request data.
pub struct AppState {
    pub engine: Arc<dyn SearchEngine>,
    pub catalog: CatalogConfig,
}

impl AppState {
    pub fn new(engine: Arc<dyn SearchEngine>, config: &AppConfig) -> Self {
        Self {
            engine,
            catalog: config.catalog.clone(),
        }
    }
}
