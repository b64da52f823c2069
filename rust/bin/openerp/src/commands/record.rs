//! Record commands: one per remote model method.
//!
//! `openerp search res.partner --where "is_company = true"`,
//! `openerp update res.partner 7 --set name=Acme`, etc.

use std::path::Path;

use anyhow::Result;
use openerp_rpc::{Domain, FieldSet, Permission, RecordId};
use serde_json::{json, Value};

use crate::input::field_names;
use crate::output::{self, Format};

fn to_ids(ids: &[i64]) -> Vec<RecordId> {
    ids.iter().copied().map(RecordId).collect()
}

/// ACCESS: does the logged-in user hold `perm` on `model`?
pub fn access(model: &str, perm: Permission, format: Format, client_config_path: &Path) -> Result<()> {
    let client = super::connect(client_config_path)?;
    let allowed = client.check_access(model, perm)?;
    match format {
        Format::Json => output::print_value(&json!(allowed), format)?,
        Format::Table if allowed => println!("User has {} access to {}.", perm, model),
        Format::Table => println!("No {} access to {}.", perm, model),
    }
    Ok(())
}

/// SEARCH: matching ids.
pub fn search(
    model: &str,
    domain: &Domain,
    offset: usize,
    limit: Option<usize>,
    format: Format,
    client_config_path: &Path,
) -> Result<()> {
    let client = super::connect(client_config_path)?;
    let ids = client.search(model, domain, offset, limit)?;
    match format {
        Format::Json => output::print_value(&json!(ids), format)?,
        Format::Table => {
            for id in ids {
                println!("{}", id);
            }
        }
    }
    Ok(())
}

/// COUNT: size of the matching set.
pub fn count(model: &str, domain: &Domain, format: Format, client_config_path: &Path) -> Result<()> {
    let client = super::connect(client_config_path)?;
    let n = client.count(model, domain)?;
    output::print_value(&json!(n), format)
}

/// READ records by id.
pub fn read(model: &str, ids: &[i64], fields: &[String], format: Format, client_config_path: &Path) -> Result<()> {
    let client = super::connect(client_config_path)?;
    let rows = client.read(model, &to_ids(ids), &field_names(fields))?;
    output::print_records(&rows, format)
}

/// SEARCH-READ in one round trip.
pub fn search_read(
    model: &str,
    domain: &Domain,
    fields: &[String],
    offset: usize,
    limit: Option<usize>,
    format: Format,
    client_config_path: &Path,
) -> Result<()> {
    let client = super::connect(client_config_path)?;
    let rows = client.search_read(model, domain, &field_names(fields), offset, limit)?;
    output::print_records(&rows, format)
}

/// FIELDS: model field definitions.
pub fn fields(
    model: &str,
    fields: &[String],
    attributes: &[String],
    format: Format,
    client_config_path: &Path,
) -> Result<()> {
    let client = super::connect(client_config_path)?;
    let defs = client.fields_get(model, &field_names(fields), &field_names(attributes))?;
    match format {
        Format::Json => output::print_value(&Value::Object(defs), format),
        Format::Table => {
            // One row per field, its name first.
            let rows: Vec<FieldSet> = defs
                .into_iter()
                .map(|(name, def)| {
                    let mut row = FieldSet::new();
                    row.insert("field".into(), json!(name));
                    if let Value::Object(attrs) = def {
                        row.extend(attrs);
                    }
                    row
                })
                .collect();
            output::print_records(&rows, format)
        }
    }
}

/// CREATE a record.
pub fn create(model: &str, fields: &FieldSet, format: Format, client_config_path: &Path) -> Result<()> {
    let client = super::connect(client_config_path)?;
    let id = client.create(model, fields)?;
    match format {
        Format::Json => output::print_value(&json!({ "id": id }), format)?,
        Format::Table => println!("{} {} created.", model, id),
    }
    Ok(())
}

/// UPDATE records (write).
pub fn update(model: &str, ids: &[i64], fields: &FieldSet, format: Format, client_config_path: &Path) -> Result<()> {
    let client = super::connect(client_config_path)?;
    let ok = client.update(model, &to_ids(ids), fields)?;
    match format {
        Format::Json => output::print_value(&json!(ok), format)?,
        Format::Table => println!("{} {} updated.", model, join_ids(ids)),
    }
    Ok(())
}

/// DELETE records (unlink).
pub fn delete(model: &str, ids: &[i64], format: Format, client_config_path: &Path) -> Result<()> {
    let client = super::connect(client_config_path)?;
    let ok = client.delete(model, &to_ids(ids))?;
    match format {
        Format::Json => output::print_value(&json!(ok), format)?,
        Format::Table => println!("{} {} deleted.", model, join_ids(ids)),
    }
    Ok(())
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}
