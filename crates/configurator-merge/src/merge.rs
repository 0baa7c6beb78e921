//! Configuration merge logic
//!
//! Implements the recursive merge used both for applying updates and for
//! cloning trees:
//! - Objects: deep-merge by key
//! - Arrays: index-aligned merge (no concatenation)
//! - Scalars: override (last wins)

use serde_json::{Map, Value};
use tracing::trace;

/// Returns true for values that a merge will walk into (objects and arrays).
pub fn is_mergeable(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Deep merge `source` into `target` in place.
///
/// Merge semantics:
/// - Objects: every source key is written into the target, recursively
/// - Arrays: position `i` of the source merges into position `i` of the
///   target, extra source positions are appended
/// - Scalars (including null): override at that key
/// - A non-container `source` is a no-op
///
/// A nested source container replaces a target slot holding a different kind
/// of value with a fresh empty container before recursing, so the result never
/// aliases anything reachable from `source`.
pub fn merge_into(target: &mut Value, source: &Value) {
    if !is_mergeable(source) {
        return;
    }

    if !is_mergeable(target) {
        *target = Value::Object(Map::new());
    }

    // Object into array: the array is re-keyed by index first
    if target.is_array() && source.is_object() {
        rekey_by_index(target);
    }

    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, incoming) in source_map {
                let slot = target_map.entry(key.clone()).or_insert(Value::Null);
                merge_slot(slot, incoming);
            }
        }

        (Value::Array(target_items), Value::Array(source_items)) => {
            for (index, incoming) in source_items.iter().enumerate() {
                if let Some(slot) = target_items.get_mut(index) {
                    merge_slot(slot, incoming);
                } else {
                    let mut slot = Value::Null;
                    merge_slot(&mut slot, incoming);
                    target_items.push(slot);
                }
            }
        }

        // Array into object: indices become string keys
        (Value::Object(target_map), Value::Array(source_items)) => {
            for (index, incoming) in source_items.iter().enumerate() {
                let slot = target_map.entry(index.to_string()).or_insert(Value::Null);
                merge_slot(slot, incoming);
            }
        }

        _ => {}
    }
}

fn rekey_by_index(target: &mut Value) {
    if let Value::Array(items) = std::mem::take(target) {
        let rekeyed: Map<String, Value> = items
            .into_iter()
            .enumerate()
            .map(|(index, value)| (index.to_string(), value))
            .collect();
        *target = Value::Object(rekeyed);
    }
}

/// Write one incoming value into an existing slot.
fn merge_slot(slot: &mut Value, incoming: &Value) {
    match incoming {
        Value::Object(_) => {
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            merge_into(slot, incoming);
        }
        Value::Array(_) => {
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            merge_into(slot, incoming);
        }
        scalar => *slot = scalar.clone(),
    }
}

/// Deep merge two values, returning the merged base.
pub fn deep_merge(mut base: Value, overlay: &Value) -> Value {
    merge_into(&mut base, overlay);
    base
}

/// Produce a fully independent copy of a tree.
///
/// Equivalent to merging `tree` into an empty object, so an array root comes
/// back index-keyed and a scalar root comes back as `{}`.
pub fn clone_tree(tree: &Value) -> Value {
    trace!("cloning config tree");
    deep_merge(Value::Object(Map::new()), tree)
}

/// Merge multiple config layers in order (first is base, last has highest precedence)
pub fn merge_layers<I>(layers: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    layers
        .into_iter()
        .fold(Value::Object(Map::new()), |acc, layer| deep_merge(acc, &layer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let mut base = json!({"tagName": "article"});
        merge_into(&mut base, &json!({"tagName": "section"}));
        assert_eq!(base["tagName"], "section");
    }

    #[test]
    fn test_object_deep_merge() {
        let mut base = json!({
            "itemView": {
                "tagName": "article",
                "className": null
            }
        });
        merge_into(&mut base, &json!({"itemView": {"className": "card"}}));

        assert_eq!(base["itemView"]["className"], "card");
        assert_eq!(base["itemView"]["tagName"], "article");
    }

    #[test]
    fn test_empty_update_is_identity() {
        let original = json!({"a": {"x": 1}, "b": [1, 2]});
        let mut tree = original.clone();
        merge_into(&mut tree, &json!({}));
        assert_eq!(tree, original);
    }

    #[test]
    fn test_non_container_source_is_noop() {
        let original = json!({"a": 1});
        let mut tree = original.clone();
        merge_into(&mut tree, &Value::Null);
        merge_into(&mut tree, &json!("text"));
        merge_into(&mut tree, &json!(42));
        assert_eq!(tree, original);
    }

    #[test]
    fn test_array_index_aligned() {
        let mut base = json!({"order": ["a", "b", "c"]});
        merge_into(&mut base, &json!({"order": ["x"]}));
        assert_eq!(base["order"], json!(["x", "b", "c"]));

        merge_into(&mut base, &json!({"order": ["1", "2", "3", "4"]}));
        assert_eq!(base["order"], json!(["1", "2", "3", "4"]));
    }

    #[test]
    fn test_nested_array_of_objects_merges_per_index() {
        let mut base = json!({"cols": [{"w": 1, "h": 2}]});
        merge_into(&mut base, &json!({"cols": [{"w": 5}]}));
        assert_eq!(base["cols"][0], json!({"w": 5, "h": 2}));
    }

    #[test]
    fn test_container_replaces_scalar_slot() {
        let mut base = json!({"css": null, "list": "none"});
        merge_into(&mut base, &json!({"css": {"color": "red"}, "list": [1]}));
        assert_eq!(base["css"], json!({"color": "red"}));
        assert_eq!(base["list"], json!([1]));
    }

    #[test]
    fn test_scalar_replaces_container_slot() {
        let mut base = json!({"events": {"click": "open"}});
        merge_into(&mut base, &json!({"events": false}));
        assert_eq!(base["events"], json!(false));
    }

    #[test]
    fn test_null_override() {
        let mut base = json!({"value": 100});
        merge_into(&mut base, &json!({"value": null}));
        assert!(base["value"].is_null());
    }

    #[test]
    fn test_array_into_object_uses_index_keys() {
        let mut base = json!({"a": 1});
        merge_into(&mut base, &json!(["zero", "one"]));
        assert_eq!(base, json!({"a": 1, "0": "zero", "1": "one"}));
    }

    #[test]
    fn test_object_into_array_rekeys() {
        let mut base = json!(["zero"]);
        merge_into(&mut base, &json!({"extra": true}));
        assert_eq!(base, json!({"0": "zero", "extra": true}));
    }

    #[test]
    fn test_clone_is_independent() {
        let source = json!({"router": {"routes": {"": "index"}}});
        let mut copy = clone_tree(&source);
        copy["router"]["routes"][""] = json!("home");

        assert_eq!(source["router"]["routes"][""], "index");
        assert_eq!(copy["router"]["routes"][""], "home");
    }

    #[test]
    fn test_clone_of_scalar_is_empty_object() {
        assert_eq!(clone_tree(&json!("text")), json!({}));
    }

    #[test]
    fn test_new_keys_keep_insertion_order() {
        let mut base = json!({"b": 1});
        merge_into(&mut base, &json!({"a": 2, "c": 3}));
        let keys: Vec<&String> = base.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_merge_layers() {
        let builtin = json!({
            "history": {"root": "/", "pushState": true},
            "item": {"urlRoot": "/"}
        });
        let file = json!({"history": {"pushState": false}});
        let cli = json!({"item": {"urlRoot": "/api"}});

        let result = merge_layers(vec![builtin, file, cli]);

        assert_eq!(result["history"]["root"], "/");
        assert_eq!(result["history"]["pushState"], false);
        assert_eq!(result["item"]["urlRoot"], "/api");
    }
}
