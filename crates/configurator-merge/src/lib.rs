//! Deep structural merge and key lookup for JSON configuration trees.
//!
//! Every tree copy in the configurator goes through [`merge_into`]: cloning is
//! a merge into an empty object, and updates are a merge into the live tree.

mod lookup;
mod merge;
mod truthy;

pub use lookup::{contains, resolve, WHOLE_TREE_KEY};
pub use merge::{clone_tree, deep_merge, is_mergeable, merge_into, merge_layers};
pub use truthy::is_truthy;
