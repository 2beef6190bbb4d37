//! Error taxonomy for a single MCP client (spec §7).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// An RPC was issued before `initialize` completed, or after
    /// `disconnect`/stream-close.
    #[error("client is not connected")]
    NotConnected,

    /// Spawning the child, or an I/O failure before the handshake finished.
    #[error("failed to start child process: {message}")]
    Process {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The stdout stream closed, or an RPC timed out, while a request was
    /// still outstanding.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The peer replied with a JSON-RPC `error` object.
    #[error("server returned error {code}: {message}")]
    ServerError { code: i32, message: String },

    /// A reply decoded as valid JSON-RPC but its `result` did not match the
    /// shape expected for the request that was sent.
    #[error("failed to parse response for {method}: {source}")]
    ResponseParse {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
