use std::collections::HashMap;

use serde_json::Value;
use serde_json::json;

use super::SourceAdapter;
use super::parse_json_or_empty;
use super::str_field;
use crate::config::SourceKind;
use crate::scoring::score;
use crate::search::SearchResult;

pub struct GithubAdapter;

impl SourceAdapter for GithubAdapter {
    fn build_query(&self, user_query: &str) -> (&'static str, HashMap<String, Value>) {
        ("search_code", HashMap::from([("q".to_string(), json!(user_query))]))
    }

    fn parse(&self, raw_content: &str, user_query: &str) -> Vec<SearchResult> {
        let Some(root) = parse_json_or_empty(raw_content) else { return Vec::new() };
        let Some(items) = root.get("items").and_then(Value::as_array) else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| {
                let name = str_field(item, "name")?.to_string();
                let path = str_field(item, "path")?.to_string();
                let url = str_field(item, "html_url").map(str::to_string);
                let relevance = score(user_query, &name, &path);

                let mut metadata = HashMap::from([("path".to_string(), path.clone())]);
                if let Some(full_name) =
                    item.get("repository").and_then(|r| str_field(r, "full_name"))
                {
                    metadata.insert("repository".to_string(), full_name.to_string());
                }

                Some(SearchResult::new(SourceKind::Github, name, &path, url, relevance, metadata))
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_items_with_optional_repository_and_link() {
        let payload = json!({
            "items": [{
                "name": "lib.rs",
                "path": "src/lib.rs",
                "repository": {"full_name": "acme/widget"},
                "html_url": "https://github.com/acme/widget/blob/main/src/lib.rs",
            }]
        })
        .to_string();

        let results = GithubAdapter.parse(&payload, "lib");
        assert_eq!(results.len(), 1);
        pretty_assertions::assert_eq!(
            (
                results[0].title.as_str(),
                results[0].snippet.as_str(),
                results[0].metadata.get("repository"),
                results[0].metadata.get("path"),
            ),
            ("lib.rs", "src/lib.rs", Some(&"acme/widget".to_string()), Some(&"src/lib.rs".to_string()))
        );
    }

    #[test]
    fn item_missing_path_is_skipped() {
        let payload = json!({"items": [{"name": "lib.rs"}]}).to_string();
        assert!(GithubAdapter.parse(&payload, "q").is_empty());
    }
}
