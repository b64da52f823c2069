//! Parsing of `--where`, `--set` and `--domain` arguments.

use anyhow::{anyhow, bail, Result};
use openerp_rpc::{Domain, FieldSet, Operator, Term};
use serde_json::Value;

/// A literal from the command line: JSON when it parses, a plain string otherwise.
///
/// `30` is a number, `true` a bool, `[1,2]` a list, `John Doe` a string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// `"field op value"`, e.g. `gender = male` or `name not ilike doe`.
pub fn parse_condition(raw: &str) -> Result<Term> {
    let usage = || anyhow!("expected \"field operator value\", got {:?}", raw);

    let (field, rest) = raw.trim().split_once(char::is_whitespace).ok_or_else(usage)?;
    let (op, value) = rest.trim_start().split_once(char::is_whitespace).ok_or_else(usage)?;
    let (op, value) = if op.eq_ignore_ascii_case("not") {
        let (negated, value) = value.trim_start().split_once(char::is_whitespace).ok_or_else(usage)?;
        (format!("not {}", negated), value)
    } else {
        (op.to_string(), value)
    };

    let value = value.trim();
    if value.is_empty() {
        return Err(usage());
    }

    Ok(Term::Condition {
        field: field.to_string(),
        op: op.parse::<Operator>().map_err(|e| anyhow!(e))?,
        value: parse_value(value),
    })
}

/// Combine a raw JSON domain with `--where` conditions (all ANDed).
pub fn build_domain(conditions: &[String], json: Option<&str>) -> Result<Domain> {
    let mut domain = match json {
        Some(raw) => serde_json::from_str::<Domain>(raw).map_err(|e| anyhow!("Invalid domain: {}", e))?,
        None => Domain::new(),
    };
    for raw in conditions {
        domain.push(parse_condition(raw)?);
    }
    Ok(domain)
}

/// `key=value` pairs, then an optional JSON object on top.
pub fn build_fields(assignments: &[String], json: Option<&str>) -> Result<FieldSet> {
    let mut fields = match json {
        Some(raw) => match serde_json::from_str::<Value>(raw).map_err(|e| anyhow!("Invalid JSON: {}", e))? {
            Value::Object(map) => map,
            _ => bail!("JSON body must be an object"),
        },
        None => FieldSet::new(),
    };
    for raw in assignments {
        let (key, value) = raw
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got {:?}", raw))?;
        let key = key.trim();
        if key.is_empty() {
            bail!("empty field name in {:?}", raw);
        }
        fields.insert(key.to_string(), parse_value(value));
    }
    if fields.is_empty() {
        bail!("No fields given. Use --set key=value, --json or -f <file>.");
    }
    Ok(fields)
}

/// Comma-separated list flags arrive already split; drop empties.
pub fn field_names(fields: &[String]) -> Vec<&str> {
    fields.iter().map(|f| f.trim()).filter(|f| !f.is_empty()).collect()
}
