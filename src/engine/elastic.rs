//! Elasticsearch backend over the REST API / Elasticsearch 后端

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Method, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

use super::query::{bulk_body, delete_body, error_reason, parse_bulk, parse_hits, search_body};
use super::{EngineError, EngineResult, SearchEngine, TextQuery};
use crate::config::EngineConfig;
use crate::models::{BulkSummary, Document, SearchHit};

const NDJSON: &str = "application/x-ndjson";

pub struct ElasticsearchEngine {
    client: Client,
    /// Cluster base URL without trailing slash / 集群地址（去掉末尾斜杠）
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl ElasticsearchEngine {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let parsed = url::Url::parse(&config.url)
            .map_err(|e| anyhow!("Invalid engine url {}: {}", config.url, e))?;
        if parsed.cannot_be_a_base() {
            return Err(anyhow!("Engine url {} cannot be used as a base", config.url));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.client.request(method, format!("{}{}", self.base_url, path));
        match &self.username {
            Some(username) => req.basic_auth(username, self.password.as_ref()),
            None => req,
        }
    }

    /// Send and decode a JSON response, mapping error statuses / 发送请求并解析 JSON
    async fn send_json(&self, req: RequestBuilder) -> EngineResult<Value> {
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| EngineError::Decode(e.to_string()))
    }
}

fn status_error(status: StatusCode, text: &str) -> EngineError {
    let reason = serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|body| error_reason(&body))
        .unwrap_or_else(|| {
            if text.is_empty() {
                status.to_string()
            } else {
                text.to_string()
            }
        });
    EngineError::Status {
        status: status.as_u16(),
        reason,
    }
}

/// Encode one path segment (index names come from the URL path) / 编码路径片段
fn segment(name: &str) -> String {
    urlencoding::encode(name).into_owned()
}

#[async_trait]
impl SearchEngine for ElasticsearchEngine {
    fn name(&self) -> &str {
        "elasticsearch"
    }

    async fn index_exists(&self, index: &str) -> EngineResult<bool> {
        let resp = self
            .request(Method::HEAD, &format!("/{}", segment(index)))
            .send()
            .await?;
        match resp.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(status_error(status, "")),
        }
    }

    async fn create_index(&self, index: &str) -> EngineResult<()> {
        let req = self.request(Method::PUT, &format!("/{}", segment(index)));
        match self.send_json(req).await {
            Ok(_) => Ok(()),
            // Another instance created it in between / 其他实例已创建
            Err(EngineError::Status { status: 400, reason })
                if reason.contains("already exists") =>
            {
                tracing::debug!("Index {} already exists: {}", index, reason);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn bulk_index(
        &self,
        index: &str,
        docs: &[Document],
        refresh: bool,
    ) -> EngineResult<BulkSummary> {
        let body = bulk_body(index, docs).map_err(|e| EngineError::Encode(e.to_string()))?;
        let path = if refresh { "/_bulk?refresh=true" } else { "/_bulk" };
        let req = self
            .request(Method::POST, path)
            .header(CONTENT_TYPE, NDJSON)
            .body(body);

        let resp = self.send_json(req).await?;
        Ok(parse_bulk(&resp))
    }

    async fn delete_by_match(
        &self,
        index: &str,
        field: &str,
        values: &[Value],
    ) -> EngineResult<u64> {
        if values.is_empty() {
            return Ok(0);
        }
        let req = self
            .request(Method::POST, &format!("/{}/_delete_by_query", segment(index)))
            .json(&delete_body(field, values));

        let resp = self.send_json(req).await?;
        Ok(resp.get("deleted").and_then(|v| v.as_u64()).unwrap_or(0))
    }

    async fn search(
        &self,
        indexes: &[String],
        query: &TextQuery,
        size: Option<usize>,
    ) -> EngineResult<Vec<SearchHit>> {
        let targets: Vec<String> = indexes.iter().map(|i| segment(i)).collect();
        let req = self
            .request(Method::POST, &format!("/{}/_search", targets.join(",")))
            .json(&search_body(query, size));

        let resp = self.send_json(req).await?;
        parse_hits(&resp)
    }
}
