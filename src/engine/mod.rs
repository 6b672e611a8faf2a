//! Search engine layer - only provides primitives, does not control flow / 搜索引擎层
//!
//! Architecture principles / 架构原则：
//! - The engine exposes primitive operations: index existence/creation, bulk
//!   upsert, delete-by-query and federated search / 仅暴露原语操作
//! - Handlers and the reconciler decide ordering, batching and error
//!   reporting / 调用顺序、批处理与错误上报由上层决定
//! - Call direction: API → Engine (unidirectional) / 调用方向
//!
//! Backends / 后端：
//! - `elastic`: Elasticsearch over its REST API (production) / 生产环境
//! - `memory`: in-process store with the same observable behaviour (local
//!   runs and tests) / 本地运行与测试

pub mod elastic;
pub mod memory;
pub mod query;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{EngineConfig, EngineKind};
use crate::models::{BulkSummary, Document, SearchHit};

pub use elastic::ElasticsearchEngine;
pub use memory::{EngineCall, MemoryEngine};

/// Errors reported by an engine backend / 引擎错误
#[derive(Debug, Error)]
pub enum EngineError {
    /// Transport failure (connect, TLS, timeout) / 传输错误
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The engine answered with a non-success status / 引擎返回错误状态
    #[error("{reason} (status {status})")]
    Status { status: u16, reason: String },

    /// The engine answered with a body we could not understand / 响应无法解析
    #[error("unexpected engine response: {0}")]
    Decode(String),

    /// A request body could not be serialized / 请求体序列化失败
    #[error("could not encode engine request: {0}")]
    Encode(String),

    /// Backend refused the call without reaching a store / 后端不可用
    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Query shape used by /search and /all / 查询类型
#[derive(Debug, Clone, PartialEq)]
pub enum TextQuery {
    MatchAll,
    /// Relevance-ranked match of `query` against any of `fields` / 多字段匹配
    MultiMatch { query: String, fields: Vec<String> },
}

impl TextQuery {
    /// Free text to query; the empty string degrades to match-all / 空串退化为全匹配
    pub fn from_text(text: &str, fields: &[String]) -> Self {
        if text.is_empty() {
            TextQuery::MatchAll
        } else {
            TextQuery::MultiMatch {
                query: text.to_string(),
                fields: fields.to_vec(),
            }
        }
    }
}

/// Document store interface (external collaborator) / 文档存储接口
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Backend name, used in logs / 后端名称
    fn name(&self) -> &str;

    async fn index_exists(&self, index: &str) -> EngineResult<bool>;

    /// Create `index` with default settings / 以默认设置创建索引
    async fn create_index(&self, index: &str) -> EngineResult<()>;

    /// Upsert `docs` into `index` in one request / 批量写入
    ///
    /// With `refresh` the documents are searchable once the call returns.
    async fn bulk_index(
        &self,
        index: &str,
        docs: &[Document],
        refresh: bool,
    ) -> EngineResult<BulkSummary>;

    /// Delete every document of `index` whose `field` equals one of `values`.
    /// Returns the number of documents the store removed. / 按字段值删除
    async fn delete_by_match(
        &self,
        index: &str,
        field: &str,
        values: &[Value],
    ) -> EngineResult<u64>;

    /// Federated search over `indexes` / 跨索引搜索
    ///
    /// `size: None` leaves the page size to the engine default.
    async fn search(
        &self,
        indexes: &[String],
        query: &TextQuery,
        size: Option<usize>,
    ) -> EngineResult<Vec<SearchHit>>;
}

/// Build the configured backend / 根据配置创建引擎
pub fn build_engine(config: &EngineConfig) -> anyhow::Result<Arc<dyn SearchEngine>> {
    let engine: Arc<dyn SearchEngine> = match config.kind {
        EngineKind::Elasticsearch => Arc::new(ElasticsearchEngine::new(config)?),
        EngineKind::Memory => Arc::new(MemoryEngine::new()),
    };
    tracing::info!("Search engine backend: {}", engine.name());
    Ok(engine)
}
