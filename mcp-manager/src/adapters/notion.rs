use std::collections::HashMap;

use serde_json::Value;
use serde_json::json;

use super::SourceAdapter;
use super::parse_json_or_empty;
use super::str_field;
use crate::config::SourceKind;
use crate::scoring::score;
use crate::search::SearchResult;

pub struct NotionAdapter;

impl SourceAdapter for NotionAdapter {
    fn build_query(&self, user_query: &str) -> (&'static str, HashMap<String, Value>) {
        ("notion-search", HashMap::from([("query".to_string(), json!(user_query))]))
    }

    fn parse(&self, raw_content: &str, user_query: &str) -> Vec<SearchResult> {
        let Some(root) = parse_json_or_empty(raw_content) else { return Vec::new() };
        let Some(results) = root.get("results").and_then(Value::as_array) else {
            return Vec::new();
        };

        results
            .iter()
            .filter_map(|item| {
                let title = str_field(item, "title")?.to_string();
                let content = str_field(item, "content").unwrap_or("");
                let url = str_field(item, "url").map(str::to_string);
                let relevance = score(user_query, &title, content);
                Some(SearchResult::new(
                    SourceKind::Notion,
                    title,
                    content,
                    url,
                    relevance,
                    HashMap::new(),
                ))
            })
            .collect()
    }
}
