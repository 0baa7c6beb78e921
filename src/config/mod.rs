//! Configuration sources
//!
//! The built-in default schema carried by the root type, and the layered
//! loading of override files and CLI assignments on top of a type's defaults.

mod defaults;
mod effective;

pub use defaults::{builtin_defaults, SECTIONS};
pub use effective::{
    load_file, parse_overrides, ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig,
    LayeredConfig, SCHEMA_ID, SCHEMA_VERSION,
};
