//! Update document application
//!
//! An update document is a document of `$set`, `$unset` and `$inc` operators.
//! Top-level fields that are not operators are treated as `$set`.

use serde_json::{Map, Value};

use super::errors::{StoreError, StoreResult};
use super::Document;
use crate::identity::ID_FIELD;

/// Apply an update document to a document in place
pub fn apply_update(doc: &mut Document, update: &Document) -> StoreResult<()> {
    for (key, value) in update {
        match key.as_str() {
            "$set" => {
                for (path, v) in operator_fields(key, value)? {
                    set_path(doc, path, v.clone())?;
                }
            }
            "$unset" => {
                for (path, _) in operator_fields(key, value)? {
                    guard_id(path)?;
                    remove_path(doc, path);
                }
            }
            "$inc" => {
                for (path, amount) in operator_fields(key, value)? {
                    increment_path(doc, path, amount)?;
                }
            }
            op if op.starts_with('$') => {
                return Err(StoreError::invalid_query(format!(
                    "unsupported update operator {}",
                    op
                )))
            }
            field => set_path(doc, field, value.clone())?,
        }
    }
    Ok(())
}

fn operator_fields<'a>(op: &str, value: &'a Value) -> StoreResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| StoreError::invalid_query(format!("{} expects an object", op)))
}

fn guard_id(path: &str) -> StoreResult<()> {
    if path == ID_FIELD || path.starts_with("_id.") {
        return Err(StoreError::InvalidDocument(format!(
            "{} is immutable",
            ID_FIELD
        )));
    }
    Ok(())
}

/// Walk to the parent object of `path`, creating intermediate objects
fn parent_mut<'a>(doc: &'a mut Document, path: &'a str) -> StoreResult<(&'a mut Document, &'a str)> {
    let mut parts: Vec<&str> = path.split('.').collect();
    let leaf = parts.pop().unwrap_or(path);
    let mut current = doc;
    for part in parts {
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = entry.as_object_mut().ok_or_else(|| {
            StoreError::InvalidDocument(format!("cannot descend into non-object at {}", part))
        })?;
    }
    Ok((current, leaf))
}

fn set_path(doc: &mut Document, path: &str, value: Value) -> StoreResult<()> {
    guard_id(path)?;
    let (parent, leaf) = parent_mut(doc, path)?;
    parent.insert(leaf.to_string(), value);
    Ok(())
}

fn remove_path(doc: &mut Document, path: &str) {
    let mut parts: Vec<&str> = path.split('.').collect();
    let leaf = match parts.pop() {
        Some(leaf) => leaf,
        None => return,
    };
    let mut current = doc;
    for part in parts {
        match current.get_mut(part).and_then(Value::as_object_mut) {
            Some(next) => current = next,
            None => return,
        }
    }
    current.remove(leaf);
}

fn increment_path(doc: &mut Document, path: &str, amount: &Value) -> StoreResult<()> {
    guard_id(path)?;
    if !amount.is_number() {
        return Err(StoreError::invalid_query(format!(
            "$inc amount for {} must be a number",
            path
        )));
    }
    let (parent, leaf) = parent_mut(doc, path)?;
    let next = match parent.get(leaf) {
        None | Some(Value::Null) => amount.clone(),
        Some(current) => add_numbers(current, amount).ok_or_else(|| {
            StoreError::InvalidDocument(format!("cannot $inc non-numeric field {}", path))
        })?,
    };
    parent.insert(leaf.to_string(), next);
    Ok(())
}

fn add_numbers(a: &Value, b: &Value) -> Option<Value> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x.checked_add(y).map(Value::from);
    }
    let sum = a.as_f64()? + b.as_f64()?;
    serde_json::Number::from_f64(sum).map(Value::Number)
}
