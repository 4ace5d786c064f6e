//! Query filter matching
//!
//! Filters are documents mapping a dot-separated field path to either a
//! literal (equality) or an operator object:
//!
//! ```text
//! { "status": "published", "meta.views": { "$gte": 10 } }
//! ```
//!
//! Supported operators: `$eq`, `$ne`, `$in`, `$nin`, `$gt`, `$gte`, `$lt`,
//! `$lte`, `$exists`. An empty filter matches everything.

use std::cmp::Ordering;

use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::Document;

/// Resolve a dot-separated path inside a document
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Check whether a document passes every condition of a filter
pub fn matches(doc: &Document, filter: &Document) -> StoreResult<bool> {
    for (path, condition) in filter {
        if path.starts_with('$') {
            return Err(StoreError::invalid_query(format!(
                "top-level operator {} is not supported",
                path
            )));
        }
        if !matches_condition(get_path(doc, path), condition)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn is_operator(value: &Value) -> bool {
    match value.as_object() {
        Some(obj) if !obj.is_empty() => obj.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn matches_condition(actual: Option<&Value>, condition: &Value) -> StoreResult<bool> {
    if !is_operator(condition) {
        return Ok(actual == Some(condition));
    }

    // is_operator guarantees an object
    let ops = match condition.as_object() {
        Some(ops) => ops,
        None => return Ok(false),
    };

    for (op, operand) in ops {
        let ok = match op.as_str() {
            "$eq" => actual == Some(operand),
            "$ne" => actual != Some(operand),
            "$in" => list_operand(op, operand)?.iter().any(|v| Some(v) == actual),
            "$nin" => !list_operand(op, operand)?.iter().any(|v| Some(v) == actual),
            "$gt" => compare(actual, operand) == Some(Ordering::Greater),
            "$gte" => matches!(
                compare(actual, operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            "$lt" => compare(actual, operand) == Some(Ordering::Less),
            "$lte" => matches!(
                compare(actual, operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            "$exists" => match operand.as_bool() {
                Some(want) => actual.is_some() == want,
                None => return Err(StoreError::invalid_query("$exists expects a boolean")),
            },
            other => {
                return Err(StoreError::invalid_query(format!(
                    "unsupported operator {}",
                    other
                )))
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn list_operand<'a>(op: &str, operand: &'a Value) -> StoreResult<&'a Vec<Value>> {
    operand
        .as_array()
        .ok_or_else(|| StoreError::invalid_query(format!("{} expects an array", op)))
}

/// Ordering between values of the same kind; cross-kind comparisons never match
fn compare(actual: Option<&Value>, operand: &Value) -> Option<Ordering> {
    match (actual?, operand) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
