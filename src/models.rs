//! Data models shared by the engine layer and the HTTP API / 数据模型

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A catalog record (product / inventory / vendor item) / 目录文档
///
/// Kept as raw JSON: the service forwards documents as-is and only ever reads
/// their `name` field. / 原样转发，仅读取 `name` 字段
pub type Document = Value;

/// Field that identifies a document during reconciliation / 对账标识字段
pub const NAME_FIELD: &str = "name";

/// Tag added to every search result / 搜索结果中的索引标记字段
pub const INDEX_TAG: &str = "index";

/// One hit returned by the engine / 搜索命中
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Index the hit came from / 来源索引
    pub index: String,
    pub source: Document,
}

impl SearchHit {
    /// Flatten into `{ "index": .., ...source }` / 展平为带索引标记的文档
    ///
    /// Source fields are written after the tag, so a source field called
    /// `index` wins.
    pub fn into_tagged(self) -> Value {
        let mut out = Map::new();
        out.insert(INDEX_TAG.to_string(), Value::String(self.index));
        if let Value::Object(fields) = self.source {
            out.extend(fields);
        }
        Value::Object(out)
    }
}

/// Outcome of a bulk upsert / 批量写入结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSummary {
    /// Number of actions the engine acknowledged / 条目数
    pub items: usize,
    /// Items the engine reported as failed / 失败条目数
    pub failed: usize,
}

/// GET /search query string / 搜索参数
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteMissingResponse {
    pub message: String,
    pub deleted: Vec<Document>,
}

/// Error body returned by every failing endpoint / 错误响应体
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Read `field` from a request body, requiring a JSON array / 读取数组字段
///
/// Returns `None` when the body is not an object, the field is missing, or
/// the field holds anything other than an array.
pub fn take_array(body: &mut Value, field: &str) -> Option<Vec<Document>> {
    match body.get_mut(field)?.take() {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_tagged_spreads_source() {
        let hit = SearchHit {
            index: "products".to_string(),
            source: json!({"name": "Widget", "price": 3}),
        };
        assert_eq!(
            hit.into_tagged(),
            json!({"index": "products", "name": "Widget", "price": 3})
        );
    }

    #[test]
    fn test_into_tagged_source_index_field_wins() {
        let hit = SearchHit {
            index: "vendors".to_string(),
            source: json!({"index": "legacy", "name": "Acme"}),
        };
        assert_eq!(hit.into_tagged(), json!({"index": "legacy", "name": "Acme"}));
    }

    #[test]
    fn test_take_array() {
        let mut body = json!({"docs": [{"name": "A"}], "other": "x"});
        assert_eq!(take_array(&mut body, "docs"), Some(vec![json!({"name": "A"})]));
        assert_eq!(take_array(&mut body, "other"), None);
        assert_eq!(take_array(&mut body, "missing"), None);

        let mut not_object = json!([1, 2]);
        assert_eq!(take_array(&mut not_object, "docs"), None);

        let mut empty = json!({"docs": []});
        assert_eq!(take_array(&mut empty, "docs"), Some(vec![]));
    }
}
