//! Error taxonomy for the manager (spec §7), extending [`mcp_client::Error`]
//! with the one variant that only makes sense at the registry level.

use thiserror::Error;

use crate::config::SourceKind;

#[derive(Error, Debug)]
pub enum Error {
    /// `callTool` issued against a kind with no running client.
    #[error("no running server for source {0}")]
    ServerNotFound(SourceKind),

    /// Everything a single client can fail with, surfaced unchanged.
    #[error(transparent)]
    Client(#[from] mcp_client::Error),
}
