//! In-process stand-in for an OpenERP/Odoo JSON-RPC endpoint.
//!
//! Serves `/jsonrpc` from an axum router on a random port, with one model
//! (`united_medical.patients`), two users and the server's fault format.
//! The router runs on its own tokio runtime in a background thread so the
//! blocking client can be driven from plain `#[test]` functions.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use openerp_rpc::{Domain, Term};
use serde_json::{json, Map, Value};

pub const DB: &str = "odoo_17_db";
pub const MODEL: &str = "united_medical.patients";
pub const ADMIN: (&str, &str) = ("admin", "admin");
pub const PORTAL: (&str, &str) = ("portal", "portal");

struct User {
    uid: i64,
    login: &'static str,
    password: &'static str,
    can_read: bool,
    can_write: bool,
}

struct Backend {
    users: Vec<User>,
    records: BTreeMap<i64, Map<String, Value>>,
    next_id: i64,
}

type Shared = Arc<Mutex<Backend>>;

/// Server fault, serialized like the server's `error.data`.
struct Fault {
    name: &'static str,
    message: String,
}

fn fault(name: &'static str, message: impl Into<String>) -> Fault {
    Fault { name, message: message.into() }
}

impl Backend {
    fn seeded() -> Self {
        let mut backend = Backend {
            users: vec![
                User { uid: 2, login: ADMIN.0, password: ADMIN.1, can_read: true, can_write: true },
                User { uid: 6, login: PORTAL.0, password: PORTAL.1, can_read: false, can_write: false },
            ],
            records: BTreeMap::new(),
            next_id: 1,
        };
        let seed = [
            ("Alice Martin", "female", 34),
            ("Bob Stone", "male", 51),
            ("Carla Diaz", "female", 27),
            ("Dan Wu", "male", 45),
            ("Eve Kim", "female", 38),
            ("Frank Ode", "male", 62),
            ("Gina Rossi", "female", 19),
        ];
        for (name, gender, age) in seed {
            let mut rec = Map::new();
            rec.insert("name".into(), json!(name));
            rec.insert("gender".into(), json!(gender));
            rec.insert("age".into(), json!(age));
            backend.insert(rec);
        }
        backend
    }

    fn insert(&mut self, vals: Map<String, Value>) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.records.insert(id, vals);
        id
    }

    fn field_defs() -> Value {
        json!({
            "name": {"string": "Name", "help": "Full name", "type": "char", "required": true},
            "gender": {"string": "Gender", "help": "", "type": "selection", "required": false},
            "age": {"string": "Age", "help": "Age in years", "type": "integer", "required": false},
        })
    }

    fn authenticate(&self, args: &[Value]) -> Value {
        let (db, login, password) = (args.first(), args.get(1), args.get(2));
        if db != Some(&json!(DB)) {
            return json!(false);
        }
        self.users
            .iter()
            .find(|u| Some(&json!(u.login)) == login && Some(&json!(u.password)) == password)
            .map(|u| json!(u.uid))
            .unwrap_or(json!(false))
    }

    fn execute_kw(&mut self, args: &[Value]) -> Result<Value, Fault> {
        if args.len() < 6 {
            return Err(fault("builtins.TypeError", "execute_kw() missing arguments"));
        }
        let uid = args[1].as_i64();
        let password = args[2].as_str();
        let user = self
            .users
            .iter()
            .find(|u| args[0] == json!(DB) && Some(u.uid) == uid && Some(u.password) == password)
            .ok_or_else(|| fault("odoo.exceptions.AccessDenied", "Access Denied"))?;
        let (can_read, can_write) = (user.can_read, user.can_write);

        let model = args[3].as_str().unwrap_or_default();
        if model != MODEL {
            return Err(fault("builtins.KeyError", model.to_string()));
        }
        let method = args[4].as_str().unwrap_or_default().to_string();
        let params = args[5].as_array().cloned().unwrap_or_default();
        let kwargs = args.get(6).and_then(Value::as_object).cloned().unwrap_or_default();

        let needs_write = matches!(method.as_str(), "create" | "write" | "unlink");
        if method != "check_access_rights" && (!can_read || (needs_write && !can_write)) {
            return Err(fault(
                "odoo.exceptions.AccessError",
                format!("You are not allowed to access '{}' records.", MODEL),
            ));
        }

        match method.as_str() {
            "check_access_rights" => {
                let perm = params.first().and_then(Value::as_str).unwrap_or("read");
                let allowed = if perm == "read" { can_read } else { can_write };
                let raise = kwargs.get("raise_exception").and_then(Value::as_bool).unwrap_or(true);
                if !allowed && raise {
                    return Err(fault("odoo.exceptions.AccessError", "access denied"));
                }
                Ok(json!(allowed))
            }
            "search" => {
                let ids = self.search(&params, &kwargs)?;
                Ok(json!(ids))
            }
            "search_count" => {
                let ids = self.search(&params, &Map::new())?;
                Ok(json!(ids.len()))
            }
            "read" => {
                let ids = id_list(params.first())?;
                self.read(&ids, kwargs.get("fields"))
            }
            "search_read" => {
                let ids = self.search(&params, &kwargs)?;
                self.read(&ids, kwargs.get("fields"))
            }
            "create" => {
                let vals = params
                    .first()
                    .and_then(Value::as_object)
                    .cloned()
                    .ok_or_else(|| fault("builtins.TypeError", "create() expects a dict"))?;
                let has_name = vals.get("name").and_then(Value::as_str).is_some_and(|n| !n.is_empty());
                if !has_name {
                    return Err(fault(
                        "odoo.exceptions.ValidationError",
                        "The following fields are invalid: Name",
                    ));
                }
                validate(&vals)?;
                Ok(json!(self.insert(vals)))
            }
            "write" => {
                let ids = id_list(params.first())?;
                let vals = params.get(1).and_then(Value::as_object).cloned().unwrap_or_default();
                validate(&vals)?;
                self.ensure_exist(&ids)?;
                for id in ids {
                    if let Some(rec) = self.records.get_mut(&id) {
                        for (k, v) in &vals {
                            rec.insert(k.clone(), v.clone());
                        }
                    }
                }
                Ok(json!(true))
            }
            "unlink" => {
                let ids = id_list(params.first())?;
                self.ensure_exist(&ids)?;
                for id in ids {
                    self.records.remove(&id);
                }
                Ok(json!(true))
            }
            "fields_get" => {
                let defs = Self::field_defs();
                let wanted: Option<Vec<String>> = params.first().and_then(|v| serde_json::from_value(v.clone()).ok());
                let attrs: Option<Vec<String>> =
                    kwargs.get("attributes").and_then(|v| serde_json::from_value(v.clone()).ok());
                let mut out = Map::new();
                for (name, def) in defs.as_object().into_iter().flatten() {
                    if wanted.as_ref().is_some_and(|w| !w.contains(name)) {
                        continue;
                    }
                    let def = match &attrs {
                        Some(attrs) => Value::Object(
                            def.as_object()
                                .into_iter()
                                .flatten()
                                .filter(|(k, _)| attrs.contains(k))
                                .map(|(k, v)| (k.clone(), v.clone()))
                                .collect(),
                        ),
                        None => def.clone(),
                    };
                    out.insert(name.clone(), def);
                }
                Ok(Value::Object(out))
            }
            other => Err(fault(
                "builtins.AttributeError",
                format!("The method '{}' does not exist on the model '{}'", other, MODEL),
            )),
        }
    }

    fn search(&self, params: &[Value], kwargs: &Map<String, Value>) -> Result<Vec<i64>, Fault> {
        let domain: Domain = match params.first() {
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|e| fault("builtins.ValueError", format!("Invalid domain: {}", e)))?,
            None => Domain::new(),
        };
        let offset = kwargs.get("offset").and_then(Value::as_u64).unwrap_or(0) as usize;
        let limit = kwargs.get("limit").and_then(Value::as_u64).map(|l| l as usize);

        let matched = self
            .records
            .iter()
            .filter(|(id, rec)| matches_domain(domain.terms(), **id, rec))
            .map(|(id, _)| *id)
            .skip(offset);
        Ok(match limit {
            Some(limit) => matched.take(limit).collect(),
            None => matched.collect(),
        })
    }

    /// Missing ids are skipped, as Odoo 17 does.
    fn read(&self, ids: &[i64], fields: Option<&Value>) -> Result<Value, Fault> {
        let fields: Vec<String> = fields
            .and_then(|f| serde_json::from_value(f.clone()).ok())
            .unwrap_or_default();
        let rows: Vec<Value> = ids
            .iter()
            .filter_map(|id| self.records.get(id).map(|rec| (id, rec)))
            .map(|(id, rec)| {
                let mut row = Map::new();
                row.insert("id".into(), json!(id));
                for (k, v) in rec {
                    if fields.is_empty() || fields.contains(k) {
                        row.insert(k.clone(), v.clone());
                    }
                }
                Value::Object(row)
            })
            .collect();
        Ok(Value::Array(rows))
    }

    fn ensure_exist(&self, ids: &[i64]) -> Result<(), Fault> {
        match ids.iter().find(|id| !self.records.contains_key(id)) {
            Some(id) => Err(fault(
                "odoo.exceptions.MissingError",
                format!("Record does not exist or has been deleted.\n(Record: {}({},))", MODEL, id),
            )),
            None => Ok(()),
        }
    }
}

fn validate(vals: &Map<String, Value>) -> Result<(), Fault> {
    match vals.get("gender").and_then(Value::as_str) {
        Some("male") | Some("female") | None => Ok(()),
        Some(other) => Err(fault(
            "odoo.exceptions.ValidationError",
            format!("Wrong value for {}.gender: '{}'", MODEL, other),
        )),
    }
}

fn id_list(v: Option<&Value>) -> Result<Vec<i64>, Fault> {
    match v {
        Some(Value::Array(items)) => Ok(items.iter().filter_map(Value::as_i64).collect()),
        Some(Value::Number(n)) => Ok(n.as_i64().into_iter().collect()),
        _ => Err(fault("builtins.TypeError", "expected a list of ids")),
    }
}

/// Prefix-notation evaluation; top-level terms are ANDed.
fn matches_domain(terms: &[Term], id: i64, rec: &Map<String, Value>) -> bool {
    fn eval(terms: &[Term], pos: &mut usize, id: i64, rec: &Map<String, Value>) -> bool {
        let term = &terms[*pos];
        *pos += 1;
        match term {
            Term::And => {
                let a = eval(terms, pos, id, rec);
                let b = eval(terms, pos, id, rec);
                a && b
            }
            Term::Or => {
                let a = eval(terms, pos, id, rec);
                let b = eval(terms, pos, id, rec);
                a || b
            }
            Term::Not => !eval(terms, pos, id, rec),
            Term::True => true,
            Term::False => false,
            Term::Condition { field, op, value } => {
                let actual = if field == "id" { json!(id) } else { rec.get(field).cloned().unwrap_or(Value::Null) };
                match op.as_str() {
                    "=" => &actual == value,
                    "=?" => matches!(value, Value::Null | Value::Bool(false)) || &actual == value,
                    "!=" => &actual != value,
                    "in" => value.as_array().is_some_and(|vs| vs.contains(&actual)),
                    "ilike" => match (actual.as_str(), value.as_str()) {
                        (Some(a), Some(v)) => a.to_lowercase().contains(&v.to_lowercase()),
                        _ => false,
                    },
                    _ => false,
                }
            }
        }
    }

    let mut pos = 0;
    let mut all = true;
    while pos < terms.len() {
        all &= eval(terms, &mut pos, id, rec);
    }
    all
}

async fn rpc(State(state): State<Shared>, Json(req): Json<Value>) -> Json<Value> {
    let id = req.get("id").cloned().unwrap_or(Value::Null);
    let params = &req["params"];
    let service = params["service"].as_str().unwrap_or_default();
    let method = params["method"].as_str().unwrap_or_default();
    let args = params["args"].as_array().cloned().unwrap_or_default();

    let result = {
        let mut backend = state.lock().unwrap();
        match (service, method) {
            ("common", "authenticate") => Ok(backend.authenticate(&args)),
            ("common", "version") => Ok(json!({
                "server_version": "17.0",
                "server_version_info": [17, 0, 0, "final", 0, ""],
                "server_serie": "17.0",
                "protocol_version": 1,
            })),
            ("object", "execute_kw") => backend.execute_kw(&args),
            _ => Err(fault("builtins.NameError", format!("unknown service method {}.{}", service, method))),
        }
    };

    Json(match result {
        Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
        Err(f) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {
                "code": 200,
                "message": "Odoo Server Error",
                "data": {"name": f.name, "message": f.message, "debug": "", "arguments": [f.message]},
            },
        }),
    })
}

pub struct FakeServer {
    pub base_url: String,
    state: Shared,
}

impl FakeServer {
    /// Number of records currently stored.
    pub fn record_count(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }

    /// Endpoint whose `/jsonrpc` answers 200 with a non-JSON body.
    pub fn broken_url(&self) -> String {
        format!("{}/broken", self.base_url)
    }

    /// Endpoint whose `/jsonrpc` answers 503.
    pub fn down_url(&self) -> String {
        format!("{}/down", self.base_url)
    }
}

pub fn start() -> FakeServer {
    let state: Shared = Arc::new(Mutex::new(Backend::seeded()));
    let app = Router::new()
        .route("/jsonrpc", post(rpc))
        .route("/broken/jsonrpc", post(|| async { "<html>Internal Server Error</html>" }))
        .route(
            "/down/jsonrpc",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        )
        .with_state(state.clone());

    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });

    let addr = rx.recv().unwrap();
    FakeServer {
        base_url: format!("http://{}", addr),
        state,
    }
}
