//! Key resolution over a configuration tree
//!
//! A key resolves to the first of:
//! 1. the exact top-level entry
//! 2. the whole tree, when the key is empty
//! 3. an entry of that name one level down, scanning top-level subtrees in
//!    insertion order

use serde_json::Value;
use tracing::trace;

/// Key that addresses the entire tree.
pub const WHOLE_TREE_KEY: &str = "";

/// Resolve `key` against `tree`, returning the first match.
pub fn resolve<'a>(tree: &'a Value, key: &str) -> Option<&'a Value> {
    if let Some(value) = child(tree, key) {
        trace!(key, "resolved at top level");
        return Some(value);
    }

    if key == WHOLE_TREE_KEY {
        return Some(tree);
    }

    let nested = subtrees(tree).find_map(|subtree| child(subtree, key));
    if nested.is_some() {
        trace!(key, "resolved one level down");
    }
    nested
}

/// Returns true if `resolve` would find a match for `key`.
pub fn contains(tree: &Value, key: &str) -> bool {
    resolve(tree, key).is_some()
}

/// Direct child of a container by key (array positions use their decimal index).
fn child<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key
            .parse::<usize>()
            .ok()
            .filter(|index| index.to_string() == key)
            .and_then(|index| items.get(index)),
        _ => None,
    }
}

fn subtrees(tree: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match tree {
        Value::Object(map) => Box::new(map.values()),
        Value::Array(items) => Box::new(items.iter()),
        _ => Box::new(std::iter::empty()),
    }
}
