//! Index bootstrap - make sure the catalog collections exist / 索引初始化

use crate::engine::SearchEngine;

/// What happened to one index during bootstrap / 单个索引的初始化结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexStatus {
    Existing,
    Created,
    Failed(String),
}

/// Create every index in `indexes` that does not exist yet / 创建缺失的索引
///
/// Safe to run on every start. A failing index is logged and the remaining
/// ones are still attempted; the service keeps running either way.
pub async fn ensure_indexes(
    engine: &dyn SearchEngine,
    indexes: &[String],
) -> Vec<(String, IndexStatus)> {
    let mut report = Vec::with_capacity(indexes.len());

    for index in indexes {
        let status = match engine.index_exists(index).await {
            Ok(true) => IndexStatus::Existing,
            Ok(false) => match engine.create_index(index).await {
                Ok(()) => {
                    tracing::info!("Created '{}' index", index);
                    IndexStatus::Created
                }
                Err(e) => {
                    tracing::error!("Failed to create index {}: {}", index, e);
                    IndexStatus::Failed(e.to_string())
                }
            },
            Err(e) => {
                tracing::error!("Failed to check index {}: {}", index, e);
                IndexStatus::Failed(e.to_string())
            }
        };
        report.push((index.clone(), status));
    }

    report
}
