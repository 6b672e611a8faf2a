use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use super::json_body;
use crate::error::AppError;
use crate::models::{take_array, SyncResponse};
use crate::state::AppState;

/// POST /sync/:index - bulk upsert `docs` into one index / 批量写入文档
pub async fn sync_docs(
    State(state): State<Arc<AppState>>,
    Path(index): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SyncResponse>, AppError> {
    let mut body = json_body(body)?;
    let docs = take_array(&mut body, "docs")
        .ok_or_else(|| AppError::Validation("docs should be an array".to_string()))?;

    // Elasticsearch rejects an empty bulk body / 空批量请求无需发送
    if !docs.is_empty() {
        let summary = state.engine.bulk_index(&index, &docs, true).await?;
        if summary.failed > 0 {
            tracing::warn!(
                "Bulk sync to {}: {} of {} items rejected by the engine",
                index,
                summary.failed,
                summary.items
            );
        }
    }

    tracing::info!("Synced {} docs to {}", docs.len(), index);
    Ok(Json(SyncResponse {
        message: format!("Synced {} docs to {}", docs.len(), index),
    }))
}
