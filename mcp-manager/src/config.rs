//! Source registry keys and per-source configuration (spec §3).

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Closed enumeration of supported backends. Acts as the key into every
/// per-source map the manager keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Notion,
    Obsidian,
    Neo4j,
    GoogleDrive,
    Github,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Notion,
        SourceKind::Obsidian,
        SourceKind::Neo4j,
        SourceKind::GoogleDrive,
        SourceKind::Github,
    ];
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Notion => "notion",
            SourceKind::Obsidian => "obsidian",
            SourceKind::Neo4j => "neo4j",
            SourceKind::GoogleDrive => "google_drive",
            SourceKind::Github => "github",
        };
        f.write_str(name)
    }
}

/// One record per [`SourceKind`]. Identity/display fields the UI collaborator
/// needs are opaque to the core and not modeled here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub enabled: bool,
    pub command: Option<String>,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

impl SourceConfig {
    /// `enabled ∧ command = null` ⇒ "Not configured". `args` is a plain
    /// (non-nullable) sequence in this model, so an empty `args` is just a
    /// command invoked with no extra flags — a legitimate configuration,
    /// not an unconfigured one.
    ///
    /// Per spec §9: a required env var set to the empty string is
    /// equivalent to an unset secret and must not be forwarded.
    pub fn is_armed(&self) -> bool {
        self.enabled
            && self.command.as_deref().is_some_and(|c| !c.is_empty())
            && self.env.values().all(|v| !v.is_empty())
    }
}
