//! The server manager: registry, lifecycle, status publication, and the
//! fan-out search (spec §4.7).

use std::collections::HashMap;
use std::sync::Arc;

use mcp_client::McpClient;
use mcp_types::Implementation;
use mcp_types::Tool;
use tokio::sync::Mutex;

use crate::adapters::adapter_for;
use crate::config::SourceConfig;
use crate::config::SourceKind;
use crate::error::Error;
use crate::search::SearchResult;
use crate::status::ServerStatus;

/// All mutable manager state behind one lock, matching spec §5's "single
/// serialization domain" for the manager tier: every mutation of
/// `statuses`/`tools`/`clients`/`configs` happens under this one guard, and
/// the guard is never held across an `.await` that waits on a child process.
struct ManagerState {
    configs: HashMap<SourceKind, SourceConfig>,
    statuses: HashMap<SourceKind, ServerStatus>,
    clients: HashMap<SourceKind, Arc<McpClient>>,
    tools: HashMap<SourceKind, Vec<Tool>>,
}

impl ManagerState {
    fn new() -> Self {
        let statuses =
            SourceKind::ALL.into_iter().map(|k| (k, ServerStatus::Disconnected)).collect();
        Self { configs: HashMap::new(), statuses, clients: HashMap::new(), tools: HashMap::new() }
    }
}

pub struct ServerManager {
    state: Mutex<ManagerState>,
    client_info: Implementation,
}

impl ServerManager {
    pub fn new(client_info: Implementation) -> Self {
        Self { state: Mutex::new(ManagerState::new()), client_info }
    }

    /// Replace the config for `cfg.kind`. Does not touch a running client;
    /// the new config takes effect on the next [`Self::start_server`].
    pub async fn update_config(&self, cfg: SourceConfig) {
        self.state.lock().await.configs.insert(cfg.kind, cfg);
    }

    /// Snapshot of every source's current status.
    pub async fn statuses(&self) -> HashMap<SourceKind, ServerStatus> {
        self.state.lock().await.statuses.clone()
    }

    /// Snapshot of every connected source's cached tool catalog.
    pub async fn tools(&self) -> HashMap<SourceKind, Vec<Tool>> {
        self.state.lock().await.tools.clone()
    }

    /// `Disconnected|Error -- startServer --> Connecting -- handshake --> Connected(n)|Error(msg)`.
    /// Always resolves into a terminal status; never returns with `kind`
    /// left `Connecting` (invariant 3).
    pub async fn start_server(&self, kind: SourceKind) {
        let config = {
            let mut state = self.state.lock().await;
            let Some(config) = state.configs.get(&kind).cloned() else {
                state.statuses.insert(kind, ServerStatus::Error { message: "Not configured".to_string() });
                return;
            };
            if !config.is_armed() {
                state.statuses.insert(kind, ServerStatus::Error { message: "Not configured".to_string() });
                return;
            }
            state.statuses.insert(kind, ServerStatus::Connecting);
            config
        };

        match self.handshake(&config).await {
            Ok((client, tool_list)) => {
                let mut state = self.state.lock().await;
                // A racing stopServer may have already flipped this kind
                // back to Disconnected while we were handshaking; respect
                // that instead of resurrecting a client nobody asked for.
                if state.statuses.get(&kind) == Some(&ServerStatus::Connecting) {
                    let tool_count = tool_list.len() as u32;
                    state.clients.insert(kind, Arc::new(client));
                    state.tools.insert(kind, tool_list);
                    state.statuses.insert(kind, ServerStatus::Connected { tool_count });
                } else {
                    client.disconnect().await;
                }
            }
            Err(message) => {
                let mut state = self.state.lock().await;
                if state.statuses.get(&kind) == Some(&ServerStatus::Connecting) {
                    state.statuses.insert(kind, ServerStatus::Error { message });
                }
            }
        }
    }

    async fn handshake(&self, config: &SourceConfig) -> Result<(McpClient, Vec<Tool>), String> {
        let command = config.command.as_deref().unwrap_or_default();
        let client = McpClient::new_stdio_client(command, &config.args, &config.env)
            .await
            .map_err(|e| e.to_string())?;

        if let Err(e) = client.initialize(self.client_info.clone()).await {
            return Err(Self::describe_failure(&client, e).await);
        }
        let tool_list = match client.list_tools().await {
            Ok(tools) => tools,
            Err(e) => return Err(Self::describe_failure(&client, e).await),
        };
        Ok((client, tool_list))
    }

    /// Append the child's last stderr output to a failure, per spec §9's
    /// guidance for attaching diagnostics to a startup failure.
    async fn describe_failure(client: &McpClient, error: mcp_client::Error) -> String {
        let tail = client.stderr_tail().await;
        client.disconnect().await;
        if tail.is_empty() {
            error.to_string()
        } else {
            format!("{error} (stderr: {tail})")
        }
    }

    /// Disconnect and forget `kind`'s client, if any (invariant 4).
    pub async fn stop_server(&self, kind: SourceKind) {
        let client = {
            let mut state = self.state.lock().await;
            state.tools.remove(&kind);
            state.statuses.insert(kind, ServerStatus::Disconnected);
            state.clients.remove(&kind)
        };
        if let Some(client) = client {
            client.disconnect().await;
        }
    }

    /// Start every enabled, armed source concurrently. Ordering across
    /// kinds is not guaranteed.
    pub async fn start_all_enabled(&self) {
        let enabled: Vec<SourceKind> = {
            let state = self.state.lock().await;
            state.configs.values().filter(|c| c.enabled).map(|c| c.kind).collect()
        };
        let starts = enabled.into_iter().map(|kind| self.start_server(kind));
        futures::future::join_all(starts).await;
    }

    /// Disconnect every running client.
    pub async fn stop_all(&self) {
        let running: Vec<SourceKind> = {
            let state = self.state.lock().await;
            state.clients.keys().copied().collect()
        };
        let stops = running.into_iter().map(|kind| self.stop_server(kind));
        futures::future::join_all(stops).await;
    }

    pub async fn call_tool(
        &self,
        kind: SourceKind,
        name: &str,
        arguments: HashMap<String, serde_json::Value>,
    ) -> Result<mcp_client::ToolResult, Error> {
        let client = {
            let state = self.state.lock().await;
            state.clients.get(&kind).cloned().ok_or(Error::ServerNotFound(kind))?
        };
        client.call_tool(name, arguments).await.map_err(Error::from)
    }

    /// Fan out `query` to every connected source concurrently, parse each
    /// response with its source adapter, merge, and sort by relevance
    /// descending (stable; ties keep completion order, spec invariant 5).
    /// Per-source failures are logged and swallowed (spec §4.7/§7).
    pub async fn search_across_sources(&self, query: &str) -> Vec<SearchResult> {
        let connected: Vec<(SourceKind, Arc<McpClient>)> = {
            let state = self.state.lock().await;
            state.clients.iter().map(|(k, c)| (*k, c.clone())).collect()
        };

        let searches = connected.into_iter().map(|(kind, client)| {
            let query = query.to_string();
            async move { Self::search_one_source(kind, client, &query).await }
        });

        let mut merged: Vec<SearchResult> =
            futures::future::join_all(searches).await.into_iter().flatten().collect();
        merged.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        merged
    }

    async fn search_one_source(kind: SourceKind, client: Arc<McpClient>, query: &str) -> Vec<SearchResult> {
        let adapter = adapter_for(kind);
        let (tool_name, arguments) = adapter.build_query(query);
        match client.call_tool(tool_name, arguments).await {
            Ok(result) => adapter.parse(&result.content, query),
            Err(error) => {
                tracing::warn!(source = %kind, %error, "search failed for source, skipping");
                Vec::new()
            }
        }
    }
}
