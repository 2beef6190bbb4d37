use std::collections::HashMap;

use serde_json::Value;
use serde_json::json;

use super::SourceAdapter;
use super::parse_json_or_empty;
use super::str_field;
use crate::config::SourceKind;
use crate::scoring::score;
use crate::search::SearchResult;

pub struct ObsidianAdapter;

fn file_url(path: &str) -> String {
    if let Some(stripped) = path.strip_prefix('/') {
        format!("file:///{stripped}")
    } else {
        format!("file:///{path}")
    }
}

impl SourceAdapter for ObsidianAdapter {
    fn build_query(&self, user_query: &str) -> (&'static str, HashMap<String, Value>) {
        ("search", HashMap::from([("query".to_string(), json!(user_query))]))
    }

    fn parse(&self, raw_content: &str, user_query: &str) -> Vec<SearchResult> {
        let Some(root) = parse_json_or_empty(raw_content) else { return Vec::new() };
        let Some(items) = root.as_array() else { return Vec::new() };

        items
            .iter()
            .filter_map(|item| {
                let path = str_field(item, "path")?;
                let title = path.rsplit('/').next().unwrap_or(path).to_string();
                let content = str_field(item, "content").unwrap_or("");
                let relevance = score(user_query, &title, content);
                let mut metadata = HashMap::new();
                metadata.insert("path".to_string(), path.to_string());
                Some(SearchResult::new(
                    SourceKind::Obsidian,
                    title,
                    content,
                    Some(file_url(path)),
                    relevance,
                    metadata,
                ))
            })
            .collect()
    }
}
