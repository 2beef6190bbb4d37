//! Per-source query shaping and payload parsing (spec §4.5).

mod github;
mod google_drive;
mod neo4j;
mod notion;
mod obsidian;

use std::collections::HashMap;

use serde_json::Value;

use crate::config::SourceKind;
use crate::search::SearchResult;

/// `buildQuery` / `parse` pair for one [`SourceKind`], per the adapter
/// contract table in spec §4.5.
pub trait SourceAdapter {
    /// Tool name and `{...}` arguments to send via `callTool`.
    fn build_query(&self, user_query: &str) -> (&'static str, HashMap<String, Value>);

    /// Parse a tool's flattened text content into ranked results. Items
    /// missing required fields are skipped silently; never aborts on a
    /// malformed element (spec invariant 8).
    fn parse(&self, raw_content: &str, user_query: &str) -> Vec<SearchResult>;
}

pub fn adapter_for(kind: SourceKind) -> Box<dyn SourceAdapter + Send + Sync> {
    match kind {
        SourceKind::Notion => Box::new(notion::NotionAdapter),
        SourceKind::Obsidian => Box::new(obsidian::ObsidianAdapter),
        SourceKind::Neo4j => Box::new(neo4j::Neo4jAdapter),
        SourceKind::GoogleDrive => Box::new(google_drive::GoogleDriveAdapter),
        SourceKind::Github => Box::new(github::GithubAdapter),
    }
}

/// Shared helper: parse `raw` as JSON, skipping silently (returning no
/// results) if it isn't valid JSON at all — the same best-effort policy
/// spec §4.5 asks individual fields to follow.
fn parse_json_or_empty(raw: &str) -> Option<Value> {
    serde_json::from_str(raw).ok()
}

fn str_field<'a>(obj: &'a Value, field: &str) -> Option<&'a str> {
    obj.get(field)?.as_str()
}
