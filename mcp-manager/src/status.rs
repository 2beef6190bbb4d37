//! Per-source connection status (spec §3, transition rules in §4.7).

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ServerStatus {
    Disconnected,
    Connecting,
    Connected { tool_count: u32 },
    Error { message: String },
}
