//! OpenERP/Odoo external RPC client.
//!
//! Authenticates once against the `common` service, then reaches the
//! server's models through `object.execute_kw` with the fixed envelope
//! `(db, uid, password, model, method, args, kwargs?)`.
//!
//! # Usage
//!
//! ```ignore
//! use openerp_rpc::{Domain, Operator, Permission, RecordClient};
//!
//! let client = RecordClient::authenticate("http://localhost:8069", "odoo_17_db", "admin", "admin")?;
//! if client.check_access("res.partner", Permission::Read)? {
//!     let companies = Domain::new().filter("is_company", Operator::Eq, true);
//!     let rows = client.search_read("res.partner", &companies, &["name"], 0, Some(5))?;
//! }
//! ```

pub mod client;
pub mod domain;
pub mod error;
pub mod session;
pub mod transport;
pub mod types;

pub use client::RecordClient;
pub use domain::{Domain, Operator, Term};
pub use error::RpcError;
pub use session::Session;
pub use transport::{JsonRpcTransport, Transport, TransportOptions};
pub use types::{FieldSet, Permission, RecordId, Uid};
