//! Result rendering: aligned tables or pretty JSON.

use clap::ValueEnum;
use openerp_rpc::FieldSet;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
}

/// One table cell. Relational pairs `[id, "display name"]` show the name.
fn cell(v: &Value) -> String {
    match v {
        Value::Null | Value::Bool(false) => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.len() == 2 && items[0].is_i64() && items[1].is_string() => {
            cell(&items[1])
        }
        other => other.to_string(),
    }
}

/// Render records as columns. Column order follows first appearance.
pub fn render_table(rows: &[FieldSet]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| row.get(*c).map(cell).unwrap_or_default()).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| cells.iter().map(|r| r[i].chars().count()).chain([c.len()]).max().unwrap_or(0))
        .collect();

    let mut out = String::new();
    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:w$}", c.to_uppercase(), w = *w))
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');
    for row in &cells {
        let line: Vec<String> = row.iter().zip(&widths).map(|(v, w)| format!("{:w$}", v, w = *w)).collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

pub fn print_records(rows: &[FieldSet], format: Format) -> anyhow::Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        Format::Table if rows.is_empty() => println!("No records."),
        Format::Table => print!("{}", render_table(rows)),
    }
    Ok(())
}

/// Scalars print bare in table mode; anything else as JSON.
pub fn print_value(value: &Value, format: Format) -> anyhow::Result<()> {
    match (format, value) {
        (Format::Table, Value::String(s)) => println!("{}", s),
        (Format::Table, Value::Number(_) | Value::Bool(_)) => println!("{}", value),
        _ => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
