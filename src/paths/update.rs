use serde_json::Value;

use super::PathSet;
use crate::store::Document;

/// Field paths named by an update document.
///
/// The union of the fields under every `$operator` plus every top-level
/// field given directly.
pub fn update_paths(update: &Document) -> PathSet {
    let mut paths = PathSet::new();
    for (key, value) in update {
        if key.starts_with('$') {
            if let Value::Object(fields) = value {
                paths.extend(fields.keys().cloned());
            }
        } else {
            paths.insert(key.clone());
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_and_plain_fields() {
        let update = json!({
            "$set": {"title": "x", "meta.tags": []},
            "$inc": {"views": 1},
            "content": "y"
        });
        let paths = update_paths(update.as_object().unwrap());
        let expected: Vec<&str> = vec!["content", "meta.tags", "title", "views"];
        assert_eq!(paths.iter().map(String::as_str).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_empty_update() {
        assert!(update_paths(&Document::new()).is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        let update = json!({"$set": {"a": 1}, "$unset": {"a": ""}});
        assert_eq!(update_paths(update.as_object().unwrap()).len(), 1);
    }
}
