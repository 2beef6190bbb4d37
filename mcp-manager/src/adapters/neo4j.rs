use std::collections::HashMap;

use serde_json::Value;
use serde_json::json;

use super::SourceAdapter;
use super::parse_json_or_empty;
use super::str_field;
use crate::config::SourceKind;
use crate::scoring::score;
use crate::search::SearchResult;

pub struct Neo4jAdapter;

/// Matches nodes whose `name` or `description` contains the query,
/// hard-limited to 10 (spec §4.5/§9: normative for parity with the source
/// this was distilled from).
const CYPHER: &str =
    "MATCH (n) WHERE n.name CONTAINS $query OR n.description CONTAINS $query RETURN n LIMIT 10";

impl SourceAdapter for Neo4jAdapter {
    fn build_query(&self, user_query: &str) -> (&'static str, HashMap<String, Value>) {
        let arguments = HashMap::from([
            ("query".to_string(), json!(CYPHER)),
            ("params".to_string(), json!({ "query": user_query })),
        ]);
        ("execute_query", arguments)
    }

    fn parse(&self, raw_content: &str, user_query: &str) -> Vec<SearchResult> {
        let Some(root) = parse_json_or_empty(raw_content) else { return Vec::new() };
        let Some(records) = root.get("records").and_then(Value::as_array) else {
            return Vec::new();
        };

        records
            .iter()
            .filter_map(|record| {
                let properties = record.get("n")?.get("properties")?;
                let name = str_field(properties, "name")?.to_string();
                let description = str_field(properties, "description").unwrap_or("");
                let relevance = score(user_query, &name, description);

                let mut metadata = HashMap::new();
                if let Some(labels) = record.get("n").and_then(|n| n.get("labels")).and_then(Value::as_array)
                {
                    let joined = labels.iter().filter_map(Value::as_str).collect::<Vec<_>>().join(",");
                    if !joined.is_empty() {
                        metadata.insert("labels".to_string(), joined);
                    }
                }

                Some(SearchResult::new(SourceKind::Neo4j, name, description, None, relevance, metadata))
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn node_missing_properties_is_skipped() {
        let payload = json!({
            "records": [
                {"n": {"properties": {"name": "X", "description": "desc"}, "labels": ["A"]}},
                {"n": {"properties": {}}},
            ]
        })
        .to_string();

        let results = Neo4jAdapter.parse(&payload, "x");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "X");
        assert_eq!(results[0].metadata.get("labels"), Some(&"A".to_string()));
    }

    #[test]
    fn cypher_query_has_a_bounded_limit() {
        let (tool, args) = Neo4jAdapter.build_query("x");
        assert_eq!(tool, "execute_query");
        assert!(args["query"].as_str().unwrap().contains("LIMIT 10"));
        assert_eq!(args["params"]["query"], json!("x"));
    }
}
