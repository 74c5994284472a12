//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to
//! `anyhow::Error` via the `?` operator at the command layer.

use thiserror::Error;

use crate::stage::Stage;

/// Errors raised while talking to the VPS over SSH.
#[derive(Debug, Error)]
pub enum SshError {
    #[error("cannot reach {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("SSH session setup failed")]
    Session(#[source] ssh2::Error),

    #[error("SSH handshake with {address} failed")]
    Handshake {
        address: String,
        #[source]
        source: ssh2::Error,
    },

    #[error("authentication failed for user '{user}' (check the password)")]
    Auth {
        user: String,
        #[source]
        source: Option<ssh2::Error>,
    },

    #[error("remote channel error")]
    Channel(#[source] ssh2::Error),

    #[error("uploading {path}")]
    Upload {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("streaming remote output")]
    Stream(#[source] std::io::Error),
}

/// A fatal deployment stage failure. Carries the stage so callers (and
/// tests) can tell which step aborted the run.
#[derive(Debug, Error)]
#[error("{stage} stage failed")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}
