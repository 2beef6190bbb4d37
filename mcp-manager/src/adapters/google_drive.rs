use std::collections::HashMap;

use serde_json::Value;
use serde_json::json;

use super::SourceAdapter;
use super::parse_json_or_empty;
use super::str_field;
use crate::config::SourceKind;
use crate::scoring::score;
use crate::search::SearchResult;

pub struct GoogleDriveAdapter;

impl SourceAdapter for GoogleDriveAdapter {
    fn build_query(&self, user_query: &str) -> (&'static str, HashMap<String, Value>) {
        ("search", HashMap::from([("query".to_string(), json!(user_query))]))
    }

    fn parse(&self, raw_content: &str, user_query: &str) -> Vec<SearchResult> {
        let Some(root) = parse_json_or_empty(raw_content) else { return Vec::new() };
        let Some(items) = root.as_array() else { return Vec::new() };

        items
            .iter()
            .filter_map(|item| {
                let name = str_field(item, "name")?.to_string();
                let url = str_field(item, "webViewLink").map(str::to_string);
                let relevance = score(user_query, &name, "");

                let mut metadata = HashMap::new();
                if let Some(mime) = str_field(item, "mimeType") {
                    metadata.insert("mime_type".to_string(), mime.to_string());
                }

                Some(SearchResult::new(SourceKind::GoogleDrive, name, "", url, relevance, metadata))
            })
            .collect()
    }
}
