//! The MCP client: handshake state machine, request multiplexer, and the
//! `tools/list` / `tools/call` convenience methods (spec §4.3, §4.4).
//!
//! Two background tasks do all the I/O: a writer draining an `mpsc` channel
//! onto the child's stdin, and a reader decoding line-delimited JSON off its
//! stdout and dispatching by request id. Callers never touch the pipes
//! directly; they go through `submit`/`send_request` and await a oneshot.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use mcp_types::CallToolRequest;
use mcp_types::CallToolRequestParams;
use mcp_types::ClientCapabilities;
use mcp_types::INITIALIZED_NOTIFICATION_METHOD;
use mcp_types::Implementation;
use mcp_types::InitializeRequest;
use mcp_types::InitializeRequestParams;
use mcp_types::InitializeResult;
use mcp_types::JSONRPC_VERSION;
use mcp_types::JSONRPCMessage;
use mcp_types::JSONRPCNotification;
use mcp_types::JSONRPCRequest;
use mcp_types::JSONRPCResponse;
use mcp_types::ListToolsRequest;
use mcp_types::MCP_PROTOCOL_VERSION;
use mcp_types::ModelContextProtocolRequest;
use mcp_types::RequestId;
use mcp_types::Tool;
use serde::de::Error as _;
use serde_json::Value;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio::sync::oneshot;

use crate::error::Error;
use crate::transport::ChildTransport;

/// Capacity of the bounded channel carrying outgoing frames to the writer task.
const CHANNEL_CAPACITY: usize = 128;

/// Bounded default applied to every RPC round-trip (spec §5: "implementations
/// should apply a bounded default").
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

type PendingSender = oneshot::Sender<Result<JSONRPCResponse, Error>>;
type PendingTable = Arc<Mutex<HashMap<i64, PendingSender>>>;

/// The flattened result of a `tools/call`, per spec §3: the concatenation
/// (with `\n`) of every `text`-typed content item; non-text items dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

/// A running MCP client session over one child process.
pub struct McpClient {
    outgoing_tx: mpsc::Sender<JSONRPCMessage>,
    pending: PendingTable,
    next_id: AtomicI64,
    ready: AtomicBool,
    closed: Arc<AtomicBool>,
    transport: Mutex<Option<ChildTransport>>,
}

impl McpClient {
    /// Spawn `command` with `args` and wire up the reader/writer tasks.
    /// Does not perform the MCP handshake; call [`Self::initialize`] next.
    pub async fn new_stdio_client(
        command: &str,
        args: &[String],
        env_overlay: &HashMap<String, String>,
    ) -> Result<Self, Error> {
        let mut transport = ChildTransport::spawn(command, args, env_overlay).await?;

        let stdin = transport.stdin.take().ok_or_else(|| Error::Process {
            message: "failed to capture child stdin".to_string(),
            source: None,
        })?;
        let stdout = transport.stdout.take().ok_or_else(|| Error::Process {
            message: "failed to capture child stdout".to_string(),
            source: None,
        })?;

        let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<JSONRPCMessage>(CHANNEL_CAPACITY);
        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));

        tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(msg) = outgoing_rx.recv().await {
                let Ok(mut json) = serde_json::to_string(&msg) else {
                    tracing::error!("failed to serialize outgoing JSON-RPC frame");
                    continue;
                };
                json.push('\n');
                if let Err(e) = stdin.write_all(json.as_bytes()).await {
                    tracing::error!(error = %e, "failed to write frame to child stdin");
                    break;
                }
                if let Err(e) = stdin.flush().await {
                    tracing::error!(error = %e, "failed to flush child stdin");
                    break;
                }
            }
        });

        {
            let pending = pending.clone();
            let closed = closed.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                loop {
                    match lines.next_line().await {
                        Ok(Some(line)) => Self::handle_incoming_line(&line, &pending).await,
                        Ok(None) => break,
                        Err(e) => {
                            tracing::warn!(error = %e, "error reading child stdout, stopping reader");
                            break;
                        }
                    }
                }
                closed.store(true, Ordering::SeqCst);
                let mut pending = pending.lock().await;
                for (_, tx) in pending.drain() {
                    let _ = tx.send(Err(Error::ConnectionFailed("stream closed".to_string())));
                }
            });
        }

        Ok(Self {
            outgoing_tx,
            pending,
            next_id: AtomicI64::new(1),
            ready: AtomicBool::new(false),
            closed,
            transport: Mutex::new(Some(transport)),
        })
    }

    async fn handle_incoming_line(line: &str, pending: &PendingTable) {
        match serde_json::from_str::<JSONRPCMessage>(line) {
            Ok(JSONRPCMessage::Response(resp)) => {
                let RequestId::Integer(id) = resp.id else {
                    tracing::warn!("response with non-integer id, no matching pending request");
                    return;
                };
                if let Some(tx) = pending.lock().await.remove(&id) {
                    let _ = tx.send(Ok(resp));
                } else {
                    tracing::warn!(id, "no pending request found for response");
                }
            }
            Ok(JSONRPCMessage::Notification(JSONRPCNotification { method, .. })) => {
                // Spec open question: notifications (e.g.
                // notifications/tools/list_changed) are silently ignored.
                tracing::info!(method = %method, "<- notification (ignored)");
            }
            Ok(JSONRPCMessage::Request(req)) => {
                tracing::warn!(method = %req.method, "unexpected server-initiated request, ignored");
            }
            Err(e) => {
                tracing::warn!(error = %e, line, "failed to decode JSON-RPC frame, skipping");
            }
        }
    }

    /// Allocate an id, register an awaiter, write the frame, and await the
    /// reply (or a timeout/connection failure).
    async fn submit(&self, method: &str, params: Option<Value>) -> Result<JSONRPCResponse, Error> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::NotConnected);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let request = JSONRPCMessage::Request(JSONRPCRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: RequestId::Integer(id),
            method: method.to_string(),
            params,
        });

        if self.outgoing_tx.send(request).await.is_err() {
            self.pending.lock().await.remove(&id);
            return Err(Error::ConnectionFailed("writer task stopped".to_string()));
        }

        match tokio::time::timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionFailed(
                "response channel closed before a reply was received".to_string(),
            )),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(Error::ConnectionFailed("request timed out".to_string()))
            }
        }
    }

    async fn send_request<R>(&self, params: R::Params) -> Result<R::Result, Error>
    where
        R: ModelContextProtocolRequest,
    {
        let params_json = serde_json::to_value(&params)
            .map_err(|source| Error::ResponseParse { method: R::METHOD, source })?;
        let params_field = if params_json.is_null() { None } else { Some(params_json) };

        let response = self.submit(R::METHOD, params_field).await?;
        if let Some(err) = response.error {
            return Err(Error::ServerError { code: err.code, message: err.message });
        }
        let result_value = response.result.ok_or_else(|| Error::ResponseParse {
            method: R::METHOD,
            source: serde_json::Error::custom("response carried neither result nor error"),
        })?;
        serde_json::from_value(result_value)
            .map_err(|source| Error::ResponseParse { method: R::METHOD, source })
    }

    async fn send_notification(&self, method: &str) -> Result<(), Error> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::NotConnected);
        }
        let notification = JSONRPCMessage::Notification(JSONRPCNotification {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.to_string(),
            params: None,
        });
        self.outgoing_tx
            .send(notification)
            .await
            .map_err(|_| Error::ConnectionFailed("writer task stopped".to_string()))
    }

    fn require_ready(&self) -> Result<(), Error> {
        if self.closed.load(Ordering::SeqCst) || !self.ready.load(Ordering::SeqCst) {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    /// Perform the MCP handshake exactly once. On success, sends
    /// `notifications/initialized` and marks the client ready.
    pub async fn initialize(
        &self,
        client_info: Implementation,
    ) -> Result<InitializeResult, Error> {
        let params = InitializeRequestParams {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities {},
            client_info,
        };
        let result = self.send_request::<InitializeRequest>(params).await?;
        self.send_notification(INITIALIZED_NOTIFICATION_METHOD).await?;
        self.ready.store(true, Ordering::SeqCst);
        Ok(result)
    }

    /// `tools/list`. Fails with [`Error::NotConnected`] before `initialize`
    /// completes or after disconnect.
    pub async fn list_tools(&self) -> Result<Vec<Tool>, Error> {
        self.require_ready()?;
        let result = self.send_request::<ListToolsRequest>(None).await?;
        Ok(result.tools)
    }

    /// `tools/call`. Flattens the response per spec §3/§4.4.
    pub async fn call_tool(
        &self,
        name: impl Into<String>,
        arguments: HashMap<String, Value>,
    ) -> Result<ToolResult, Error> {
        self.require_ready()?;

        let params = CallToolRequestParams { name: name.into(), arguments };
        let params_json = serde_json::to_value(&params).map_err(|source| Error::ResponseParse {
            method: CallToolRequest::METHOD,
            source,
        })?;
        let params_field = if params_json.is_null() { None } else { Some(params_json) };

        let response = self.submit(CallToolRequest::METHOD, params_field).await?;
        if let Some(err) = response.error {
            return Err(Error::ServerError { code: err.code, message: err.message });
        }
        let Some(result_value) = response.result else {
            return Ok(ToolResult { content: String::new(), is_error: true });
        };
        let result: mcp_types::CallToolResult = serde_json::from_value(result_value)
            .map_err(|source| Error::ResponseParse { method: CallToolRequest::METHOD, source })?;

        let content = result
            .content
            .iter()
            .filter(|item| item.kind == "text")
            .filter_map(|item| item.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ToolResult { content, is_error: result.is_error.unwrap_or(false) })
    }

    /// Terminate the child via the transport. Idempotent; after this call
    /// every other method fails with [`Error::NotConnected`] and the client
    /// cannot be re-initialized.
    pub async fn disconnect(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(mut transport) = self.transport.lock().await.take() {
            transport.shutdown().await;
        }

        let mut pending = self.pending.lock().await;
        for (_, tx) in pending.drain() {
            let _ = tx.send(Err(Error::ConnectionFailed("client disconnected".to_string())));
        }
    }

    /// The last few lines the child wrote to stderr, useful for attaching to
    /// a [`Error::Process`] message on startup failure.
    pub async fn stderr_tail(&self) -> String {
        match self.transport.lock().await.as_ref() {
            Some(t) => t.stderr_tail.snapshot().await,
            None => String::new(),
        }
    }
}
