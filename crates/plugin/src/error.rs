//! Plugin error types.
//!
//! Nothing in this crate lets an error reach the host runtime's hook
//! invocation; these types exist for logging and for the seams between the
//! connection manager and the remote clients.

use thiserror::Error;

/// Errors from the remote analytics clients and connection manager.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No usable credentials.
    #[error("missing credentials: {0}")]
    Credentials(String),

    /// Transport-level HTTP failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server rejected a control-plane request.
    #[error("server rejected request ({code}): {message}")]
    Server { code: u16, message: String },

    /// The write stream reported a non-zero append status.
    #[error("append rejected (status {code}): {message}")]
    Append { code: i64, message: String },

    /// The deployment schema did not resolve to a physical schema.
    #[error("schema resolution failed, ingestion unavailable")]
    SchemaUnavailable,

    /// Row-scoped encoding failure.
    #[error(transparent)]
    Encode(#[from] analytics_schema::EncodeError),
}
