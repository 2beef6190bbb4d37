//! Wire types for the Model Context Protocol (MCP): a JSON-RPC 2.0 dialect
//! exchanged as newline-delimited JSON over a child process's stdio.
//!
//! This crate only defines the *shapes*. It does not frame, transport, or
//! dispatch anything — see the `mcp-client` crate for that.

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// JSON-RPC version string carried on every frame.
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol version this client speaks during the handshake.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// A JSON-RPC request or response id. We only ever mint [`RequestId::Integer`]
/// ourselves, but a peer is free to echo back whatever shape it likes, so
/// both variants are accepted on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Integer(i64),
    String(String),
}

/// `{jsonrpc, id, method, params?}` — a request expecting a reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JSONRPCRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// `{jsonrpc, method, params?}` — fire-and-forget, no `id`, no reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JSONRPCNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// `{code, message, data?}` — the `error` field of a response frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JSONRPCErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// `{jsonrpc, id, result?, error?}` — a reply frame. `result` and `error`
/// are both optional so a non-compliant peer that sends neither still
/// decodes instead of being dropped as unparsable; callers treat that case
/// explicitly (see `McpClient::call_tool`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JSONRPCResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JSONRPCErrorObject>,
}

/// Any decoded frame read off a child's stdout. Variants are tried in this
/// order by `serde(untagged)`; the order matters because it is what lets a
/// request (`id` + `method`), a response (`id`, no `method`) and a
/// notification (`method`, no `id`) disambiguate without a tag field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JSONRPCMessage {
    Request(JSONRPCRequest),
    Response(JSONRPCResponse),
    Notification(JSONRPCNotification),
}

/// Binds a request method name to its typed params/result pair, the way
/// every MCP call site in this workspace uses it: `send_request::<R>(params)`.
pub trait ModelContextProtocolRequest {
    const METHOD: &'static str;
    type Params: Serialize + Send + Sync;
    type Result: DeserializeOwned + Send + Sync;
}

/// `{name, version}` — identifies either end of the handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    pub version: String,
}

/// Empty on the wire today; the client advertises no optional capabilities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCapabilities {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(default, rename = "listChanged", skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// The subset of server capabilities this workspace cares about. `tools` is
/// consumed by the manager; `resources`/`prompts` are retained opaquely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeRequestParams {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ClientCapabilities,
    #[serde(rename = "clientInfo")]
    pub client_info: Implementation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: Implementation,
}

pub struct InitializeRequest;

impl ModelContextProtocolRequest for InitializeRequest {
    const METHOD: &'static str = "initialize";
    type Params = InitializeRequestParams;
    type Result = InitializeResult;
}

/// Sent after a successful `initialize`; it is a notification, not a request,
/// so it has no associated [`ModelContextProtocolRequest`] impl.
pub const INITIALIZED_NOTIFICATION_METHOD: &str = "notifications/initialized";

/// A notification the manager silently ignores (spec's open question):
/// servers may emit this when their tool catalog changes mid-session.
pub const TOOLS_LIST_CHANGED_NOTIFICATION_METHOD: &str = "notifications/tools/list_changed";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "inputSchema", skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListToolsRequestParams {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListToolsResult {
    #[serde(default)]
    pub tools: Vec<Tool>,
}

pub struct ListToolsRequest;

impl ModelContextProtocolRequest for ListToolsRequest {
    const METHOD: &'static str = "tools/list";
    type Params = Option<ListToolsRequestParams>;
    type Result = ListToolsResult;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolRequestParams {
    pub name: String,
    pub arguments: HashMap<String, Value>,
}

/// One entry of a `tools/call` response's `content` array. Only `type ==
/// "text"` items carry anything this workspace consumes; everything else
/// (images, resource links, ...) round-trips through `extra` unused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(default, rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

pub struct CallToolRequest;

impl ModelContextProtocolRequest for CallToolRequest {
    const METHOD: &'static str = "tools/call";
    type Params = CallToolRequestParams;
    type Result = CallToolResult;
}
