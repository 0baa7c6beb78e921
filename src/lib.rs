//! Configurator - hierarchical configuration for component type trees
//!
//! Types carry their own deep-copied default configuration. Deriving a type
//! clones the parent's defaults and layers overrides on top; constructing an
//! instance clones the type's defaults again. Behavior is inherited through an
//! explicit delegation chain, while configuration data is never shared.
//!
//! ```
//! use configurator::{Announce, ConfigType, Extension};
//! use serde_json::json;
//!
//! let base = ConfigType::root();
//! let list = base.derive(
//!     "ListConfig",
//!     Extension::new().with_config(json!({"collectionView": {"tagName": "ul"}})),
//! );
//!
//! let mut config = list.instance();
//! config.add(&json!({"itemView": {"tagName": "li"}}), Announce::Change);
//!
//! assert_eq!(config.get("collectionView").unwrap()["tagName"], "ul");
//! assert_eq!(base.defaults_ref()["collectionView"]["tagName"], "section");
//! ```

pub mod config;
pub mod instance;
pub mod logging;
pub mod store;
pub mod types;

pub use config::{builtin_defaults, ConfigError, EffectiveConfig, LayeredConfig};
pub use configurator_events::{Event, EventChannel, ListenerId, ALL_EVENTS};
pub use configurator_merge::{clone_tree, merge_into, WHOLE_TREE_KEY};
pub use instance::{Configurable, ConstructOptions};
pub use store::{Announce, ConfigStore, CHANGE_EVENT, RESET_EVENT};
pub use types::{Behavior, ConfigType, Construction, Extension, StaticProps};
