//! Application configuration module / 应用配置模块
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件
//!
//! The loaded [`AppConfig`] is handed to the engine and the router explicitly;
//! nothing here keeps process-wide state. / 配置显式传递，无全局状态

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Env var that overrides the config file location / 配置文件路径环境变量
pub const CONFIG_PATH_ENV: &str = "CATALOG_CONFIG";

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration / 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// Search engine connection / 搜索引擎连接配置
    #[serde(default)]
    pub engine: EngineConfig,
    /// Catalog (indexes, search fields, reconciliation) / 目录配置
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Server configuration / 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address / 服务器监听地址
    pub host: String,
    /// Server port / 服务器端口
    pub port: u16,
}

/// Which engine backend to talk to / 引擎类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Remote Elasticsearch cluster over REST / 远程 Elasticsearch
    Elasticsearch,
    /// In-process engine, nothing persisted / 进程内引擎（不持久化）
    Memory,
}

/// Search engine connection configuration / 搜索引擎连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_engine_kind")]
    pub kind: EngineKind,
    /// Base URL of the cluster / 集群地址
    #[serde(default = "default_engine_url")]
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Skip TLS certificate verification (self-signed dev clusters) / 跳过证书校验
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,
    /// Per-request timeout in seconds / 请求超时（秒）
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// How reconciliation issues its deletions / 对账删除模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    /// One delete-by-query per missing document, awaited in order / 逐条删除
    Sequential,
    /// One delete-by-query matching every missing name / 批量删除
    Batched,
}

/// Catalog configuration / 目录配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Collections ensured at startup and searched by /search and /all / 索引列表
    #[serde(default = "default_indexes")]
    pub indexes: Vec<String>,
    /// Fields matched by free-text search / 全文搜索字段
    #[serde(default = "default_search_fields")]
    pub search_fields: Vec<String>,
    /// Result cap for /all / 全量列表上限
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
    #[serde(default = "default_delete_mode")]
    pub delete_mode: DeleteMode,
}

fn default_engine_kind() -> EngineKind { EngineKind::Elasticsearch }
fn default_engine_url() -> String { "https://localhost:9200".to_string() }
fn default_true() -> bool { true }
fn default_timeout_secs() -> u64 { 30 }
fn default_indexes() -> Vec<String> {
    vec!["products".to_string(), "inventory".to_string(), "vendors".to_string()]
}
fn default_search_fields() -> Vec<String> {
    vec!["name".to_string(), "product".to_string(), "vendor".to_string()]
}
fn default_list_limit() -> usize { 1000 }
fn default_delete_mode() -> DeleteMode { DeleteMode::Sequential }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: default_engine_kind(),
            url: default_engine_url(),
            username: None,
            password: None,
            accept_invalid_certs: true,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            indexes: default_indexes(),
            search_fields: default_search_fields(),
            list_limit: default_list_limit(),
            delete_mode: default_delete_mode(),
        }
    }
}

impl AppConfig {
    /// Get the server bind address / 获取服务器绑定地址
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Apply `SEARCH_ENGINE_*` environment overrides / 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SEARCH_ENGINE_URL") {
            self.engine.url = url;
        }
        if let Some(username) = lookup("SEARCH_ENGINE_USERNAME") {
            self.engine.username = Some(username);
        }
        if let Some(password) = lookup("SEARCH_ENGINE_PASSWORD") {
            self.engine.password = Some(password);
        }
    }
}

/// Get the config file path / 获取配置文件路径
fn get_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("config.json")
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config() -> Result<AppConfig, String> {
    let config_path = get_config_path();

    let mut config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        config
    } else {
        let config = AppConfig::default();
        save_config(&config, &config_path)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        config
    };

    config.apply_env_overrides();
    Ok(config)
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(config: &AppConfig, path: &std::path::Path) -> Result<(), String> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    std::fs::write(path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_catalog() {
        let config = AppConfig::default();
        assert_eq!(config.get_bind_address(), "0.0.0.0:3000");
        assert_eq!(config.catalog.indexes, vec!["products", "inventory", "vendors"]);
        assert_eq!(config.catalog.search_fields, vec!["name", "product", "vendor"]);
        assert_eq!(config.catalog.list_limit, 1000);
        assert_eq!(config.catalog.delete_mode, DeleteMode::Sequential);
        assert_eq!(config.engine.kind, EngineKind::Elasticsearch);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"engine": {"kind": "memory"}, "catalog": {"delete_mode": "batched"}}"#,
        )
        .unwrap();
        assert_eq!(config.engine.kind, EngineKind::Memory);
        assert_eq!(config.engine.url, "https://localhost:9200");
        assert_eq!(config.engine.timeout_secs, 30);
        assert_eq!(config.catalog.delete_mode, DeleteMode::Batched);
        assert_eq!(config.catalog.list_limit, 1000);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| match key {
            "SEARCH_ENGINE_URL" => Some("http://es:9200".to_string()),
            "SEARCH_ENGINE_PASSWORD" => Some("secret".to_string()),
            _ => None,
        });
        assert_eq!(config.engine.url, "http://es:9200");
        assert_eq!(config.engine.username, None);
        assert_eq!(config.engine.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_save_then_reload() {
        let dir = std::env::temp_dir().join(format!("catalog-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        let mut config = AppConfig::default();
        config.server.port = 4100;
        save_config(&config, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: AppConfig = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.server.port, 4100);

        std::fs::remove_dir_all(&dir).ok();
    }
}
