//! Elasticsearch request/response bodies / Elasticsearch 请求与响应体
//!
//! Pure functions, kept apart from the HTTP client so they can be tested
//! without a cluster. / 纯函数，便于脱离集群测试

use serde_json::{json, Value};

use super::{EngineError, EngineResult, TextQuery};
use crate::models::{BulkSummary, Document, SearchHit};

/// Sub-field dynamic mapping creates for exact string matching / 字符串精确匹配子字段
const KEYWORD_SUFFIX: &str = "keyword";

/// Query DSL for a [`TextQuery`] / 查询 DSL
pub fn query_clause(query: &TextQuery) -> Value {
    match query {
        TextQuery::MatchAll => json!({ "match_all": {} }),
        TextQuery::MultiMatch { query, fields } => json!({
            "multi_match": {
                "query": query,
                "fields": fields,
            }
        }),
    }
}

/// `_search` request body / 搜索请求体
pub fn search_body(query: &TextQuery, size: Option<usize>) -> Value {
    let mut body = json!({ "query": query_clause(query) });
    if let Some(size) = size {
        body["size"] = json!(size);
    }
    body
}

/// Longest string dynamic mapping still indexes into `.keyword` (`ignore_above`) / 关键字长度上限
const KEYWORD_IGNORE_ABOVE: usize = 256;

/// Clause matching documents whose `field` is exactly `value` / 精确匹配子句
///
/// Strings go through the `.keyword` sub-field so that "Widget" does not also
/// hit "Widget Pro" or "widget". Strings past `ignore_above` are never written
/// to `.keyword`, so those also accept a `match_phrase` on the text field.
pub fn exact_match_clause(field: &str, value: &Value) -> Value {
    match value {
        Value::String(text) => {
            let keyword = term_clause(&format!("{}.{}", field, KEYWORD_SUFFIX), value);
            if text.chars().count() <= KEYWORD_IGNORE_ABOVE {
                return keyword;
            }
            let mut phrase = serde_json::Map::new();
            phrase.insert(field.to_string(), value.clone());
            json!({
                "bool": {
                    "should": [keyword, { "match_phrase": phrase }],
                    "minimum_should_match": 1,
                }
            })
        }
        _ => term_clause(field, value),
    }
}

fn term_clause(field: &str, value: &Value) -> Value {
    let mut term = serde_json::Map::new();
    term.insert(field.to_string(), value.clone());
    json!({ "term": term })
}

/// `_delete_by_query` request body for one or many values / 按查询删除请求体
pub fn delete_body(field: &str, values: &[Value]) -> Value {
    match values {
        [single] => json!({ "query": exact_match_clause(field, single) }),
        many => {
            let should: Vec<Value> = many
                .iter()
                .map(|v| exact_match_clause(field, v))
                .collect();
            json!({
                "query": {
                    "bool": {
                        "should": should,
                        "minimum_should_match": 1,
                    }
                }
            })
        }
    }
}

/// NDJSON `_bulk` body: an `index` action line followed by the document / 批量请求体
pub fn bulk_body(index: &str, docs: &[Document]) -> Result<String, serde_json::Error> {
    let action = serde_json::to_string(&json!({ "index": { "_index": index } }))?;
    let mut body = String::new();
    for doc in docs {
        body.push_str(&action);
        body.push('\n');
        body.push_str(&serde_json::to_string(doc)?);
        body.push('\n');
    }
    Ok(body)
}

/// Count acknowledged and failed items in a `_bulk` response / 解析批量响应
pub fn parse_bulk(body: &Value) -> BulkSummary {
    let items = body
        .get("items")
        .and_then(|v| v.as_array())
        .map(|v| v.as_slice())
        .unwrap_or_default();

    let failed = items
        .iter()
        .filter(|item| {
            item.as_object()
                .and_then(|actions| actions.values().next())
                .map(|result| result.get("error").is_some())
                .unwrap_or(false)
        })
        .count();

    BulkSummary {
        items: items.len(),
        failed,
    }
}

/// Extract `hits.hits` from a `_search` response / 解析搜索结果
pub fn parse_hits(body: &Value) -> EngineResult<Vec<SearchHit>> {
    let hits = body
        .pointer("/hits/hits")
        .and_then(|v| v.as_array())
        .ok_or_else(|| EngineError::Decode("missing hits.hits".to_string()))?;

    hits.iter()
        .map(|hit| -> EngineResult<SearchHit> {
            let index = hit
                .get("_index")
                .and_then(|v| v.as_str())
                .ok_or_else(|| EngineError::Decode("hit without _index".to_string()))?;
            Ok(SearchHit {
                index: index.to_string(),
                source: hit.get("_source").cloned().unwrap_or_else(|| json!({})),
            })
        })
        .collect()
}

/// Human readable reason from an error response / 提取错误原因
pub fn error_reason(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::String(reason) => Some(reason.clone()),
        error => error
            .get("reason")
            .or_else(|| error.get("type"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_body() {
        let fields = vec!["name".to_string(), "product".to_string(), "vendor".to_string()];
        let body = search_body(&TextQuery::from_text("bolt", &fields), None);
        assert_eq!(
            body,
            json!({"query": {"multi_match": {"query": "bolt", "fields": ["name", "product", "vendor"]}}})
        );

        let body = search_body(&TextQuery::MatchAll, Some(1000));
        assert_eq!(body, json!({"query": {"match_all": {}}, "size": 1000}));
    }

    #[test]
    fn test_delete_body_single_string_uses_keyword() {
        let body = delete_body("name", &[json!("Widget")]);
        assert_eq!(body, json!({"query": {"term": {"name.keyword": "Widget"}}}));
    }

    #[test]
    fn test_delete_body_number_uses_field() {
        let body = delete_body("name", &[json!(42)]);
        assert_eq!(body, json!({"query": {"term": {"name": 42}}}));
    }

    #[test]
    fn test_delete_body_long_string_adds_phrase_match() {
        let long = "x".repeat(300);
        let body = delete_body("name", &[json!(long)]);
        assert_eq!(
            body,
            json!({"query": {"bool": {
                "should": [
                    {"term": {"name.keyword": long}},
                    {"match_phrase": {"name": long}}
                ],
                "minimum_should_match": 1
            }}})
        );

        let at_limit = "y".repeat(256);
        let body = delete_body("name", &[json!(at_limit)]);
        assert_eq!(body, json!({"query": {"term": {"name.keyword": at_limit}}}));
    }

    #[test]
    fn test_delete_body_batched() {
        let body = delete_body("name", &[json!("A"), json!("B")]);
        assert_eq!(
            body,
            json!({"query": {"bool": {
                "should": [
                    {"term": {"name.keyword": "A"}},
                    {"term": {"name.keyword": "B"}}
                ],
                "minimum_should_match": 1
            }}})
        );
    }

    #[test]
    fn test_bulk_body_is_ndjson() {
        let docs = vec![json!({"name": "A"}), json!({"name": "B", "qty": 2})];
        let body = bulk_body("inventory", &docs).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], r#"{"index":{"_index":"inventory"}}"#);
        assert_eq!(serde_json::from_str::<Value>(lines[3]).unwrap(), docs[1]);
        assert!(body.ends_with('\n'));
    }

    #[test]
    fn test_parse_bulk_counts_failures() {
        let body = json!({
            "errors": true,
            "items": [
                {"index": {"_index": "products", "status": 201}},
                {"index": {"_index": "products", "status": 400, "error": {"type": "mapper_parsing_exception"}}},
                {"index": {"_index": "products", "status": 201}}
            ]
        });
        assert_eq!(parse_bulk(&body), BulkSummary { items: 3, failed: 1 });
        assert_eq!(parse_bulk(&json!({})), BulkSummary::default());
    }

    #[test]
    fn test_parse_hits() {
        let body = json!({"hits": {"hits": [
            {"_index": "products", "_score": 1.5, "_source": {"name": "Widget"}},
            {"_index": "vendors", "_score": null, "_source": {"name": "Acme"}}
        ]}});
        let hits = parse_hits(&body).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].index, "products");
        assert_eq!(hits[1].source, json!({"name": "Acme"}));

        assert!(matches!(parse_hits(&json!({})), Err(EngineError::Decode(_))));
    }

    #[test]
    fn test_error_reason() {
        let body = json!({"error": {"type": "index_not_found_exception", "reason": "no such index [x]"}, "status": 404});
        assert_eq!(error_reason(&body).as_deref(), Some("no such index [x]"));
        let body = json!({"error": {"type": "security_exception"}});
        assert_eq!(error_reason(&body).as_deref(), Some("security_exception"));
        assert_eq!(error_reason(&json!({"error": "boom"})).as_deref(), Some("boom"));
        assert_eq!(error_reason(&json!({"ok": true})), None);
    }
}
