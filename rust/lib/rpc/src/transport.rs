//! Request/response transport to the server's RPC services.
//!
//! [`Transport`] is the only seam between the record client and the wire.
//! [`JsonRpcTransport`] talks to the `/jsonrpc` endpoint, where every call
//! is routed by `service` (`common`, `object`) and `method`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::RpcError;

/// Blocking RPC call: `service.method(*args)`.
pub trait Transport: Send + Sync {
    fn call(&self, service: &str, method: &str, args: Vec<Value>) -> Result<Value, RpcError>;
}

/// HTTP settings for [`JsonRpcTransport`].
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Whole-request timeout.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("openerp-rpc/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

// ── Wire format ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: Params<'a>,
    id: u64,
}

#[derive(Serialize)]
struct Params<'a> {
    service: &'a str,
    method: &'a str,
    args: Vec<Value>,
}

/// `error` member of a JSON-RPC reply.
#[derive(Debug, Deserialize)]
struct Fault {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<FaultData>,
}

/// Server exception details carried in `error.data`.
#[derive(Debug, Deserialize)]
struct FaultData {
    #[serde(default)]
    name: String,
    #[serde(default)]
    message: String,
}

impl Fault {
    fn into_error(self) -> RpcError {
        match self.data {
            Some(data) if !data.name.is_empty() => {
                let message = if data.message.is_empty() { self.message } else { data.message };
                RpcError::from_fault(&data.name, message)
            }
            _ => RpcError::Fault {
                name: format!("jsonrpc {}", self.code),
                message: self.message,
            },
        }
    }
}

/// Extract `result` from a decoded reply, or map its `error`.
fn unwrap_reply(reply: Value) -> Result<Value, RpcError> {
    let Value::Object(mut obj) = reply else {
        return Err(RpcError::Decode("reply is not a JSON object".into()));
    };

    if let Some(error) = obj.remove("error").filter(|e| !e.is_null()) {
        let fault: Fault = serde_json::from_value(error)
            .map_err(|e| RpcError::Decode(format!("error member: {}", e)))?;
        return Err(fault.into_error());
    }

    obj.remove("result")
        .ok_or_else(|| RpcError::Decode("reply has neither result nor error".into()))
}

// ── JsonRpcTransport ────────────────────────────────────────────────

/// Blocking JSON-RPC transport over HTTP.
pub struct JsonRpcTransport {
    http: reqwest::blocking::Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcTransport {
    /// `endpoint` is the server base URL, e.g. `http://localhost:8069`.
    pub fn new(endpoint: &str, options: &TransportOptions) -> Result<Self, RpcError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            url: format!("{}/jsonrpc", endpoint.trim_end_matches('/')),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for JsonRpcTransport {
    fn call(&self, service: &str, method: &str, args: Vec<Value>) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        // args are never logged: they carry the credential.
        debug!(id, service, method, "rpc call");

        let body = Request {
            jsonrpc: "2.0",
            method: "call",
            params: Params { service, method, args },
            id,
        };

        let resp = self.http.post(&self.url).json(&body).send()?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(RpcError::Transport(format!("HTTP {}: {}", status, text)));
        }

        let reply: Value = resp
            .json()
            .map_err(|e| RpcError::Decode(format!("response body: {}", e)))?;

        unwrap_reply(reply).inspect_err(|e| warn!(id, service, method, error = %e, "rpc fault"))
    }
}
