//! `openerp tour`: walk one model through every record operation.
//!
//! Access check, search, counts, reads, field definitions, search-read,
//! then create / read / write / read / unlink / read on a scratch record.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use openerp_rpc::{Domain, FieldSet, Operator, Permission, RecordClient, RpcError};
use serde_json::{json, Value};

const FIELDS: &[&str] = &["name", "gender"];

fn record(name: &str, gender: &str) -> FieldSet {
    let mut fields = FieldSet::new();
    fields.insert("name".into(), json!(name));
    fields.insert("gender".into(), json!(gender));
    fields
}

fn compact(rows: &[FieldSet]) -> String {
    serde_json::to_string(rows).unwrap_or_default()
}

/// Run the tour against an authenticated client, reporting to `out`.
pub fn run(client: &RecordClient, model: &str, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Connected user id : {}", client.uid())?;

    if !client.check_access(model, Permission::Read)? {
        writeln!(out, "No read access to the model")?;
        return Ok(());
    }
    writeln!(out, "User has read access to the model")?;

    let all = Domain::new();
    let ids = client.search(model, &all, 0, Some(5))?;
    writeln!(out, "Record ids : {}", json!(ids))?;

    writeln!(out, "Record count : {}", client.count(model, &all)?)?;
    for gender in ["male", "female"] {
        let domain = Domain::new().filter("gender", Operator::Eq, gender);
        writeln!(out, "Count (gender = {}) : {}", gender, client.count(model, &domain)?)?;
    }

    let rows = client.read(model, &ids, &[])?;
    writeln!(out, "Read {} records with all fields", rows.len())?;
    let rows = client.read(model, &ids, FIELDS)?;
    writeln!(out, "Records : {}", compact(&rows))?;

    let defs = client.fields_get(model, &["name"], &["string", "help", "type"])?;
    writeln!(out, "Field definitions : {}", Value::Object(defs))?;

    let rows = client.search_read(model, &all, FIELDS, 0, Some(5))?;
    writeln!(out, "Search-read : {}", compact(&rows))?;

    let id = client.create(model, &record("John Doe", "male"))?;
    writeln!(out, "New record id : {}", id)?;
    let rows = client.read(model, &[id], FIELDS)?;
    writeln!(out, "New record : {}", compact(&rows))?;

    let updated = client.update(model, &[id], &record("John desela", "female"))?;
    writeln!(out, "Updated : {}", updated)?;
    let rows = client.read(model, &[id], FIELDS)?;
    writeln!(out, "Updated record : {}", compact(&rows))?;

    let deleted = client.delete(model, &[id])?;
    writeln!(out, "Deleted record {} : {}", id, deleted)?;
    match client.read(model, &[id], FIELDS) {
        Ok(rows) => writeln!(out, "After delete : {}", compact(&rows))?,
        Err(RpcError::Missing(_)) => writeln!(out, "After delete : record {} no longer exists", id)?,
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

pub fn tour(model: &str, client_config_path: &Path) -> Result<()> {
    let client = super::connect(client_config_path)?;
    let stdout = std::io::stdout();
    run(&client, model, &mut stdout.lock())
}
