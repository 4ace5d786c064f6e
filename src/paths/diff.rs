use serde_json::{Map, Value};

use super::PathSet;
use crate::identity::{ID_FIELD, VERSION_FIELD};
use crate::store::Document;

const MAX_DIFF_DEPTH: usize = 64;

/// Leaf paths whose values differ between two images of a document.
///
/// Added, removed and changed fields all count. Nested objects are walked
/// and reported as dotted leaf paths; arrays and scalars are compared whole.
/// `_id` and `_version` are never reported.
pub fn changed_paths(before: &Document, after: &Document) -> PathSet {
    let mut changes = PathSet::new();
    let mut path = Vec::new();
    diff_objects(before, after, &mut path, &mut changes, 0);
    changes.remove(ID_FIELD);
    changes.remove(VERSION_FIELD);
    changes
}

fn diff_objects(
    before: &Map<String, Value>,
    after: &Map<String, Value>,
    path: &mut Vec<String>,
    changes: &mut PathSet,
    depth: usize,
) {
    for (key, old) in before {
        path.push(key.clone());
        match after.get(key) {
            Some(new) => diff_values(old, new, path, changes, depth),
            None => {
                changes.insert(path.join("."));
            }
        }
        path.pop();
    }
    for key in after.keys() {
        if !before.contains_key(key) {
            path.push(key.clone());
            changes.insert(path.join("."));
            path.pop();
        }
    }
}

fn diff_values(
    old: &Value,
    new: &Value,
    path: &mut Vec<String>,
    changes: &mut PathSet,
    depth: usize,
) {
    match (old, new) {
        (Value::Object(a), Value::Object(b)) if depth < MAX_DIFF_DEPTH => {
            diff_objects(a, b, path, changes, depth + 1)
        }
        _ if old != new => {
            changes.insert(path.join("."));
        }
        _ => {}
    }
}
