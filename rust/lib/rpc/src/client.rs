//! Authenticated record access over `object.execute_kw`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::domain::Domain;
use crate::error::RpcError;
use crate::session::Session;
use crate::transport::{JsonRpcTransport, Transport, TransportOptions};
use crate::types::{FieldSet, Permission, RecordId, Uid};

/// Decode a call result into `T`, naming the call on failure.
fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, RpcError> {
    serde_json::from_value(value).map_err(|e| RpcError::Decode(format!("{}: {}", what, e)))
}

/// `{"fields": [...]}` when a field list is given, nothing otherwise.
fn fields_kwarg(kwargs: &mut Map<String, Value>, fields: &[&str]) {
    if !fields.is_empty() {
        kwargs.insert("fields".into(), json!(fields));
    }
}

/// `offset` when non-zero, `limit` when bounded.
fn page_kwargs(kwargs: &mut Map<String, Value>, offset: usize, limit: Option<usize>) {
    if offset > 0 {
        kwargs.insert("offset".into(), json!(offset));
    }
    if let Some(limit) = limit {
        kwargs.insert("limit".into(), json!(limit));
    }
}

/// Remote record client bound to one authenticated [`Session`].
///
/// Every method is a single blocking round trip. Nothing is cached between
/// calls: each read reflects the server state at call time.
///
/// Field lists are passed as slices; an empty slice asks for all fields.
pub struct RecordClient {
    transport: Arc<dyn Transport>,
    session: Session,
}

impl RecordClient {
    /// Log in over JSON-RPC with default transport options.
    pub fn authenticate(endpoint: &str, db: &str, login: &str, password: &str) -> Result<Self, RpcError> {
        let transport = JsonRpcTransport::new(endpoint, &TransportOptions::default())?;
        Self::authenticate_with(Arc::new(transport), endpoint, db, login, password)
    }

    /// Log in through an explicit transport.
    ///
    /// The server answers `false` for rejected credentials, which becomes
    /// [`RpcError::Auth`].
    pub fn authenticate_with(
        transport: Arc<dyn Transport>,
        endpoint: &str,
        db: &str,
        login: &str,
        password: &str,
    ) -> Result<Self, RpcError> {
        let result = transport.call(
            "common",
            "authenticate",
            vec![json!(db), json!(login), json!(password), json!({})],
        )?;

        let uid = match result {
            Value::Number(n) => n
                .as_i64()
                .filter(|uid| *uid >= 0)
                .ok_or_else(|| RpcError::Decode(format!("authenticate: invalid uid {}", n)))?,
            Value::Bool(false) | Value::Null => {
                return Err(RpcError::Auth(format!("login rejected for {}@{}", login, db)));
            }
            other => return Err(RpcError::Decode(format!("authenticate: unexpected {}", other))),
        };

        info!(db, login, uid, "authenticated");
        Ok(Self {
            transport,
            session: Session {
                endpoint: endpoint.to_string(),
                db: db.to_string(),
                login: login.to_string(),
                password: password.to_string(),
                uid: Uid(uid),
            },
        })
    }

    /// Resume a session whose uid was obtained earlier.
    pub fn from_session(transport: Arc<dyn Transport>, session: Session) -> Self {
        Self { transport, session }
    }

    /// Server version info (`common.version`). Needs no credentials.
    pub fn version(transport: &dyn Transport) -> Result<Map<String, Value>, RpcError> {
        let v = transport.call("common", "version", Vec::new())?;
        decode(v, "version")
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn uid(&self) -> Uid {
        self.session.uid
    }

    /// Raw call: `model.method(*args, **kwargs)` as the session user.
    pub fn execute_kw(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Option<Map<String, Value>>,
    ) -> Result<Value, RpcError> {
        debug!(model, method, "execute_kw");

        let s = &self.session;
        let mut envelope = vec![
            json!(s.db),
            json!(s.uid),
            json!(s.password),
            json!(model),
            json!(method),
            Value::Array(args),
        ];
        if let Some(kwargs) = kwargs {
            envelope.push(Value::Object(kwargs));
        }

        self.transport.call("object", "execute_kw", envelope)
    }

    /// Whether the session user holds `perm` on `model`. A missing right is
    /// `Ok(false)`, never an error.
    pub fn check_access(&self, model: &str, perm: Permission) -> Result<bool, RpcError> {
        let mut kwargs = Map::new();
        kwargs.insert("raise_exception".into(), json!(false));
        let v = self.execute_kw(model, "check_access_rights", vec![json!(perm.as_str())], Some(kwargs))?;
        decode(v, "check_access_rights")
    }

    /// Ids of records matching `domain`. `limit = None` is unbounded.
    pub fn search(
        &self,
        model: &str,
        domain: &Domain,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<Vec<RecordId>, RpcError> {
        let mut kwargs = Map::new();
        page_kwargs(&mut kwargs, offset, limit);
        let kwargs = (!kwargs.is_empty()).then_some(kwargs);
        let v = self.execute_kw(model, "search", vec![json!(domain)], kwargs)?;
        decode(v, "search")
    }

    /// Number of records matching `domain`, without fetching them.
    pub fn count(&self, model: &str, domain: &Domain) -> Result<u64, RpcError> {
        let v = self.execute_kw(model, "search_count", vec![json!(domain)], None)?;
        decode(v, "search_count")
    }

    /// Read `fields` of the given records. The server always includes `id`.
    pub fn read(&self, model: &str, ids: &[RecordId], fields: &[&str]) -> Result<Vec<FieldSet>, RpcError> {
        let mut kwargs = Map::new();
        fields_kwarg(&mut kwargs, fields);
        let kwargs = (!kwargs.is_empty()).then_some(kwargs);
        let v = self.execute_kw(model, "read", vec![json!(ids)], kwargs)?;
        decode(v, "read")
    }

    /// `search` + `read` in one round trip.
    pub fn search_read(
        &self,
        model: &str,
        domain: &Domain,
        fields: &[&str],
        offset: usize,
        limit: Option<usize>,
    ) -> Result<Vec<FieldSet>, RpcError> {
        let mut kwargs = Map::new();
        fields_kwarg(&mut kwargs, fields);
        page_kwargs(&mut kwargs, offset, limit);
        let kwargs = (!kwargs.is_empty()).then_some(kwargs);
        let v = self.execute_kw(model, "search_read", vec![json!(domain)], kwargs)?;
        decode(v, "search_read")
    }

    /// Create one record; returns its id.
    pub fn create(&self, model: &str, fields: &FieldSet) -> Result<RecordId, RpcError> {
        let v = self.execute_kw(model, "create", vec![json!(fields)], None)?;
        decode(v, "create")
    }

    /// Apply `fields` to every record in `ids` (`write`).
    pub fn update(&self, model: &str, ids: &[RecordId], fields: &FieldSet) -> Result<bool, RpcError> {
        let v = self.execute_kw(model, "write", vec![json!(ids), json!(fields)], None)?;
        decode(v, "write")
    }

    /// Delete the given records (`unlink`).
    pub fn delete(&self, model: &str, ids: &[RecordId]) -> Result<bool, RpcError> {
        let v = self.execute_kw(model, "unlink", vec![json!(ids)], None)?;
        decode(v, "unlink")
    }

    /// Field definitions of `model`, keyed by field name.
    ///
    /// `fields` restricts which fields are described, `attributes` which
    /// properties (`string`, `help`, `type`, ...) each description carries.
    pub fn fields_get(
        &self,
        model: &str,
        fields: &[&str],
        attributes: &[&str],
    ) -> Result<Map<String, Value>, RpcError> {
        let args = if fields.is_empty() { Vec::new() } else { vec![json!(fields)] };
        let kwargs = (!attributes.is_empty()).then(|| {
            let mut kwargs = Map::new();
            kwargs.insert("attributes".into(), json!(attributes));
            kwargs
        });
        let v = self.execute_kw(model, "fields_get", args, kwargs)?;
        decode(v, "fields_get")
    }
}
