//! Missing-document reconciliation / 缺失文档对账
//!
//! Given the previous snapshot (`old`) and the current one (`new`) of a
//! collection, every document of `old` whose `name` does not appear in `new`
//! is removed from the store with a delete-by-query on that name.
//!
//! Name equality is exact: strings are compared byte for byte (case
//! sensitive, no trimming), numbers numerically, an absent `name` equals
//! another absent `name`, and object/array names never equal anything.
//! / 名称比较为精确比较，不做任何归一化

use serde_json::Value;
use std::collections::HashSet;

use crate::config::DeleteMode;
use crate::engine::{EngineResult, SearchEngine};
use crate::models::{Document, NAME_FIELD};

/// Comparable form of a document's `name` / 名称比较键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameKey {
    Absent,
    Null,
    Bool(bool),
    /// f64 bit pattern, with -0.0 folded into 0.0
    Number(u64),
    Text(String),
}

impl NameKey {
    /// Key of `doc`, or `None` when its name is an object or array / 提取名称键
    pub fn of(doc: &Document) -> Option<NameKey> {
        match doc.get(NAME_FIELD) {
            None => Some(NameKey::Absent),
            Some(Value::Null) => Some(NameKey::Null),
            Some(Value::Bool(b)) => Some(NameKey::Bool(*b)),
            Some(Value::Number(n)) => {
                let f = n.as_f64()?;
                let f = if f == 0.0 { 0.0 } else { f };
                Some(NameKey::Number(f.to_bits()))
            }
            Some(Value::String(s)) => Some(NameKey::Text(s.clone())),
            Some(Value::Array(_)) | Some(Value::Object(_)) => None,
        }
    }
}

/// Value to delete by, if the name can be expressed as a store query / 可用于删除的名称值
pub fn delete_value(doc: &Document) -> Option<Value> {
    match doc.get(NAME_FIELD)? {
        v @ (Value::String(_) | Value::Number(_) | Value::Bool(_)) => Some(v.clone()),
        _ => None,
    }
}

/// Documents of `old` with no same-named document in `new` / 计算缺失文档
///
/// Order of `old` is kept and duplicates in `old` are each reported.
pub fn find_missing(old: &[Document], new: &[Document]) -> Vec<Document> {
    let present: HashSet<NameKey> = new.iter().filter_map(NameKey::of).collect();

    old.iter()
        .filter(|doc| match NameKey::of(doc) {
            Some(key) => !present.contains(&key),
            None => true,
        })
        .cloned()
        .collect()
}

/// Result of one reconciliation / 对账结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileOutcome {
    /// Documents classified as missing (intent, computed before deleting) / 计划删除的文档
    pub deleted: Vec<Document>,
    /// Documents the store reported as removed / 存储实际删除数
    pub removed: u64,
    /// Missing documents whose name could not be turned into a query / 跳过的文档数
    pub skipped: usize,
}

/// Applies the difference between two snapshots to one collection / 对账执行器
pub struct Reconciler<'a> {
    engine: &'a dyn SearchEngine,
    mode: DeleteMode,
}

impl<'a> Reconciler<'a> {
    pub fn new(engine: &'a dyn SearchEngine, mode: DeleteMode) -> Self {
        Self { engine, mode }
    }

    /// Delete from `index` every document of `old` missing from `new` / 执行对账
    ///
    /// The first store error aborts the run; deletions already issued stay
    /// applied.
    pub async fn reconcile(
        &self,
        index: &str,
        old: &[Document],
        new: &[Document],
    ) -> EngineResult<ReconcileOutcome> {
        let deleted = find_missing(old, new);

        let mut values = Vec::with_capacity(deleted.len());
        let mut skipped = 0;
        for doc in &deleted {
            match delete_value(doc) {
                Some(value) => values.push(value),
                None => {
                    skipped += 1;
                    tracing::warn!(
                        "Skipping delete in {}: document has no usable name: {}",
                        index,
                        doc
                    );
                }
            }
        }

        let removed = match self.mode {
            DeleteMode::Sequential => {
                let mut removed = 0;
                for value in &values {
                    removed += self
                        .engine
                        .delete_by_match(index, NAME_FIELD, std::slice::from_ref(value))
                        .await?;
                }
                removed
            }
            DeleteMode::Batched if values.is_empty() => 0,
            DeleteMode::Batched => {
                let mut seen = HashSet::new();
                values.retain(|v| seen.insert(v.to_string()));
                self.engine.delete_by_match(index, NAME_FIELD, &values).await?
            }
        };

        tracing::info!(
            "Reconciled {}: {} missing, {} removed by store, {} skipped",
            index,
            deleted.len(),
            removed,
            skipped
        );

        Ok(ReconcileOutcome {
            deleted,
            removed,
            skipped,
        })
    }
}
