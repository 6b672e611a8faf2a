//! In-memory engine - same primitives as Elasticsearch, nothing persisted / 内存引擎
//!
//! Behaviour mirrors what the service relies on from Elasticsearch:
//! - bulk `index` actions append (no ids, so re-syncing duplicates) / 批量写入追加
//! - `multi_match` scores by the number of query tokens found in the best field / 多字段匹配
//! - searching an unknown index fails with 404 / 未知索引返回 404
//! - default page size is 10 / 默认分页 10
//!
//! Deletes compare names by JSON value (numbers numerically). Elasticsearch is
//! looser: a `term` on a text-mapped `name` with `1` also hits a stored `"1"`,
//! and over-long strings are matched by phrase. Tests that depend on those
//! coercions need a real cluster. / 删除按 JSON 值比较，比 Elasticsearch 严格
//!
//! Every call is journaled so tests can assert what reached the store. / 记录每次调用

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;

use super::{EngineError, EngineResult, SearchEngine, TextQuery};
use crate::models::{BulkSummary, Document, SearchHit};

/// Engine default page size / 默认返回条数
const DEFAULT_SIZE: usize = 10;

/// A call that reached the engine / 引擎调用记录
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    IndexExists(String),
    CreateIndex(String),
    Bulk { index: String, count: usize, refresh: bool },
    DeleteByMatch { index: String, values: Vec<Value> },
    Search { indexes: Vec<String>, size: Option<usize> },
}

#[derive(Default)]
struct Inner {
    /// index name -> documents in insertion order / 索引 -> 文档
    indexes: HashMap<String, Vec<Document>>,
    calls: Vec<EngineCall>,
    /// Remaining successful deletes before failing / 剩余可成功删除次数
    delete_budget: Option<usize>,
    offline: bool,
}

pub struct MemoryEngine {
    inner: Mutex<Inner>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Calls received so far / 已收到的调用
    pub fn calls(&self) -> Vec<EngineCall> {
        self.inner.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// Stored documents of `index` (empty if it does not exist) / 索引中的文档
    pub fn documents(&self, index: &str) -> Vec<Document> {
        self.inner
            .lock()
            .indexes
            .get(index)
            .cloned()
            .unwrap_or_default()
    }

    /// Let `n` more delete calls succeed, then fail every following one / 删除故障注入
    pub fn fail_deletes_after(&self, n: usize) {
        self.inner.lock().delete_budget = Some(n);
    }

    /// Refuse every call, as an unreachable cluster would / 模拟集群不可达
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn record(&mut self, call: EngineCall) -> EngineResult<()> {
        self.calls.push(call);
        if self.offline {
            return Err(EngineError::Unavailable("memory engine is offline".to_string()));
        }
        Ok(())
    }
}

/// Lowercased alphanumeric tokens / 分词（小写、按非字母数字切分）
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Searchable text of a field value / 字段文本
fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items.iter().map(field_text).collect::<Vec<_>>().join(" "),
        Value::Null | Value::Object(_) => String::new(),
    }
}

/// Best-field score: most query tokens found in a single field / 最佳字段得分
fn score(doc: &Document, fields: &[String], query_tokens: &[String]) -> usize {
    fields
        .iter()
        .filter_map(|field| doc.get(field))
        .map(|value| {
            let tokens = tokenize(&field_text(value));
            query_tokens.iter().filter(|q| tokens.contains(q)).count()
        })
        .max()
        .unwrap_or(0)
}

/// Term equality as the store applies it: numbers compare numerically / 精确比较
fn term_eq(stored: &Value, wanted: &Value) -> bool {
    match (stored, wanted) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => stored == wanted,
    }
}

#[async_trait]
impl SearchEngine for MemoryEngine {
    fn name(&self) -> &str {
        "memory"
    }

    async fn index_exists(&self, index: &str) -> EngineResult<bool> {
        let mut inner = self.inner.lock();
        inner.record(EngineCall::IndexExists(index.to_string()))?;
        Ok(inner.indexes.contains_key(index))
    }

    async fn create_index(&self, index: &str) -> EngineResult<()> {
        let mut inner = self.inner.lock();
        inner.record(EngineCall::CreateIndex(index.to_string()))?;
        inner.indexes.entry(index.to_string()).or_default();
        Ok(())
    }

    async fn bulk_index(
        &self,
        index: &str,
        docs: &[Document],
        refresh: bool,
    ) -> EngineResult<BulkSummary> {
        let mut inner = self.inner.lock();
        inner.record(EngineCall::Bulk {
            index: index.to_string(),
            count: docs.len(),
            refresh,
        })?;

        let stored = inner.indexes.entry(index.to_string()).or_default();
        let mut failed = 0;
        for doc in docs {
            // Elasticsearch rejects non-object sources per item / 非对象文档逐条失败
            if doc.is_object() {
                stored.push(doc.clone());
            } else {
                failed += 1;
            }
        }

        Ok(BulkSummary {
            items: docs.len(),
            failed,
        })
    }

    async fn delete_by_match(
        &self,
        index: &str,
        field: &str,
        values: &[Value],
    ) -> EngineResult<u64> {
        let mut inner = self.inner.lock();
        inner.record(EngineCall::DeleteByMatch {
            index: index.to_string(),
            values: values.to_vec(),
        })?;

        if let Some(budget) = inner.delete_budget.as_mut() {
            if *budget == 0 {
                return Err(EngineError::Unavailable("injected delete failure".to_string()));
            }
            *budget -= 1;
        }

        let stored = inner.indexes.get_mut(index).ok_or_else(|| EngineError::Status {
            status: 404,
            reason: format!("no such index [{}]", index),
        })?;

        let before = stored.len();
        stored.retain(|doc| match doc.get(field) {
            Some(current) => !values.iter().any(|v| term_eq(current, v)),
            None => true,
        });
        Ok((before - stored.len()) as u64)
    }

    async fn search(
        &self,
        indexes: &[String],
        query: &TextQuery,
        size: Option<usize>,
    ) -> EngineResult<Vec<SearchHit>> {
        let mut inner = self.inner.lock();
        inner.record(EngineCall::Search {
            indexes: indexes.to_vec(),
            size,
        })?;

        if let Some(missing) = indexes.iter().find(|i| !inner.indexes.contains_key(*i)) {
            return Err(EngineError::Status {
                status: 404,
                reason: format!("no such index [{}]", missing),
            });
        }

        let query_tokens = match query {
            TextQuery::MatchAll => Vec::new(),
            TextQuery::MultiMatch { query, .. } => tokenize(query),
        };

        let mut scored: Vec<(usize, SearchHit)> = Vec::new();
        for index in indexes {
            for doc in &inner.indexes[index] {
                let hit_score = match query {
                    TextQuery::MatchAll => 1,
                    TextQuery::MultiMatch { fields, .. } => score(doc, fields, &query_tokens),
                };
                if hit_score == 0 {
                    continue;
                }
                scored.push((
                    hit_score,
                    SearchHit {
                        index: index.clone(),
                        source: doc.clone(),
                    },
                ));
            }
        }

        // Stable sort keeps insertion order among equal scores / 稳定排序
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(size.unwrap_or(DEFAULT_SIZE))
            .map(|(_, hit)| hit)
            .collect())
    }
}
