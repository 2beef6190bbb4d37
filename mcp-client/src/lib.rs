//! A minimal async client for the Model Context Protocol (MCP).
//!
//! Spawns a subprocess speaking newline-delimited JSON-RPC 2.0 on its
//! stdio, performs the MCP handshake, and serializes concurrent
//! `tools/list` / `tools/call` requests over it.

mod error;
mod mcp_client;
mod transport;

pub use error::Error;
pub use mcp_client::McpClient;
pub use mcp_client::ToolResult;
pub use transport::ChildTransport;
