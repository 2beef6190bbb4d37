//! The merged, ranked output of a fan-out search (spec §3, §4.6).

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use crate::config::SourceKind;

/// Snippets are truncated to this many characters (spec §4.5, normative).
pub const SNIPPET_LIMIT: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub source: SourceKind,
    pub title: String,
    pub snippet: String,
    pub url: Option<String>,
    pub relevance: f64,
    pub metadata: HashMap<String, String>,
}

impl SearchResult {
    /// Each result gets a fresh opaque id, independent of anything in the
    /// underlying payload (spec §3: "Identity is a fresh opaque id per
    /// construction").
    pub fn new(
        source: SourceKind,
        title: String,
        body: &str,
        url: Option<String>,
        relevance: f64,
        metadata: HashMap<String, String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source,
            title,
            snippet: truncate_snippet(body),
            url: url.filter(|u| is_well_formed_absolute_url(u)),
            relevance,
            metadata,
        }
    }
}

pub(crate) fn truncate_snippet(body: &str) -> String {
    body.chars().take(SNIPPET_LIMIT).collect()
}

pub(crate) fn is_well_formed_absolute_url(raw: &str) -> bool {
    url::Url::parse(raw).is_ok()
}
