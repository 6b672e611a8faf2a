use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use super::json_body;
use crate::error::AppError;
use crate::models::{take_array, DeleteMissingResponse};
use crate::reconcile::Reconciler;
use crate::state::AppState;

/// POST /delete-missing/:index - delete documents dropped between two snapshots / 删除新数据集中缺失的文档
///
/// `deleted` lists every document classified as missing, computed before any
/// deletion is issued.
pub async fn delete_missing(
    State(state): State<Arc<AppState>>,
    Path(index): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DeleteMissingResponse>, AppError> {
    let mut body = json_body(body)?;
    let old_docs = take_array(&mut body, "oldDocs");
    let new_docs = take_array(&mut body, "newDocs");
    let (old_docs, new_docs) = match (old_docs, new_docs) {
        (Some(old), Some(new)) => (old, new),
        _ => {
            return Err(AppError::Validation(
                "oldDocs and newDocs must be arrays".to_string(),
            ))
        }
    };

    let outcome = Reconciler::new(state.engine.as_ref(), state.catalog.delete_mode)
        .reconcile(&index, &old_docs, &new_docs)
        .await?;

    Ok(Json(DeleteMissingResponse {
        message: format!("Deleted {} docs from {}", outcome.deleted.len(), index),
        deleted: outcome.deleted,
    }))
}
