pub mod query;
pub mod reconcile;
pub mod server;
pub mod sync;

use axum::{
    extract::rejection::JsonRejection,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::AppError;
use crate::state::AppState;

/// Build the HTTP router / 构建路由
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(server::health_check))
        .route("/sync/:index", post(sync::sync_docs))
        .route("/delete-missing/:index", post(reconcile::delete_missing))
        .route("/search", get(query::search))
        .route("/all", get(query::list_all))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Unwrap a JSON body, turning axum's rejection into a 400 / 解析 JSON 请求体
pub(crate) fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::engine::{MemoryEngine, SearchEngine};
    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Request, StatusCode},
    };
    use serde_json::json;
    use tower::ServiceExt;

    fn router(engine: Arc<MemoryEngine>) -> Router {
        build_router(Arc::new(AppState::new(engine, &AppConfig::default())))
    }

    async fn read_json(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_sync_empty_docs_skips_store() {
        let engine = Arc::new(MemoryEngine::new());
        let resp = router(engine.clone())
            .oneshot(
                Request::post("/sync/products")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"docs": []}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(read_json(resp).await, json!({"message": "Synced 0 docs to products"}));
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_content_type_is_validation_error() {
        let engine = Arc::new(MemoryEngine::new());
        let resp = router(engine.clone())
            .oneshot(
                Request::post("/delete-missing/products")
                    .body(Body::from(r#"{"oldDocs": [], "newDocs": []}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(read_json(resp).await["error"].is_string());
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_search_unknown_index_is_server_error() {
        // no bootstrap: the catalog indexes do not exist yet
        let engine = Arc::new(MemoryEngine::new());
        let resp = router(engine)
            .oneshot(Request::get("/search?q=bolt").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("no such index"));
    }

    #[tokio::test]
    async fn test_search_tags_hits_with_index() {
        let engine = Arc::new(MemoryEngine::new());
        for index in ["products", "inventory", "vendors"] {
            engine.create_index(index).await.unwrap();
        }
        engine
            .bulk_index("vendors", &[json!({"name": "Acme", "vendor": "Acme"})], true)
            .await
            .unwrap();

        let resp = router(engine)
            .oneshot(Request::get("/search?q=acme").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            read_json(resp).await,
            json!([{"index": "vendors", "name": "Acme", "vendor": "Acme"}])
        );
    }
}
