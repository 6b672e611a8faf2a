use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::engine::TextQuery;
use crate::error::AppError;
use crate::models::{SearchHit, SearchParams};
use crate::state::AppState;

fn tagged(hits: Vec<SearchHit>) -> Vec<Value> {
    hits.into_iter().map(SearchHit::into_tagged).collect()
}

/// GET /search?q= - free-text search across the catalog / 跨索引全文搜索
///
/// Missing or empty `q` lists documents instead, with the engine's default
/// page size.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Value>>, AppError> {
    let text = params.q.unwrap_or_default();
    let query = TextQuery::from_text(&text, &state.catalog.search_fields);

    let hits = state
        .engine
        .search(&state.catalog.indexes, &query, None)
        .await?;

    tracing::debug!("Search {:?} returned {} hits", text, hits.len());
    Ok(Json(tagged(hits)))
}

/// GET /all - every document across the catalog, capped at `list_limit` / 全量列表
pub async fn list_all(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Value>>, AppError> {
    let hits = state
        .engine
        .search(
            &state.catalog.indexes,
            &TextQuery::MatchAll,
            Some(state.catalog.list_limit),
        )
        .await?;

    Ok(Json(tagged(hits)))
}
