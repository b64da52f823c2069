use thiserror::Error;

/// Client-side RPC error.
///
/// Server faults are classified by the exception name the server reports
/// (`odoo.exceptions.AccessError`, `openerp.exceptions.ValidationError`, ...),
/// so callers can match on the variant instead of parsing messages.
#[derive(Error, Debug)]
pub enum RpcError {
    /// Credentials rejected, either by `authenticate` or on an object call.
    #[error("auth: {0}")]
    Auth(String),

    /// Authenticated but lacks the permission for this operation.
    #[error("access denied: {0}")]
    Access(String),

    /// The server rejected a create/write payload.
    #[error("validation: {0}")]
    Validation(String),

    /// One or more referenced records do not exist (anymore).
    #[error("missing: {0}")]
    Missing(String),

    /// Network failure, timeout, or a non-success HTTP status.
    #[error("transport: {0}")]
    Transport(String),

    /// The response was not a well-formed RPC reply.
    #[error("decode: {0}")]
    Decode(String),

    /// Any other server-side exception.
    #[error("server fault {name}: {message}")]
    Fault { name: String, message: String },
}

impl RpcError {
    /// Map a server exception name and message onto the taxonomy.
    pub fn from_fault(name: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        // Exception names are dotted paths; only the class name matters.
        match name.rsplit('.').next().unwrap_or(name) {
            "AccessDenied" => RpcError::Auth(message),
            "AccessError" => RpcError::Access(message),
            "ValidationError" | "UserError" => RpcError::Validation(message),
            "MissingError" => RpcError::Missing(message),
            _ => RpcError::Fault {
                name: name.to_string(),
                message,
            },
        }
    }

    /// True for errors that say nothing about the remote data: the call
    /// never produced a server answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Transport(_))
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RpcError::Decode(e.to_string())
        } else {
            RpcError::Transport(e.to_string())
        }
    }
}
