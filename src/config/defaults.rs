//! Built-in default schema
//!
//! Advisory skeleton for the sections a component tree usually needs. Nothing
//! validates against it; consumers add sections freely.

use serde_json::{json, Value};

/// Top-level sections of the built-in schema
pub const SECTIONS: &[&str] = &[
    "app",
    "router",
    "item",
    "itemView",
    "collection",
    "collectionView",
    "history",
];

/// The built-in default tree carried by the root type
pub fn builtin_defaults() -> Value {
    json!({
        "app": {
            "bootStrapData": null,
            "pager": false,
            "filter": false,
            "css": {},
            "selectors": {
                "domAttachClass": "",
                "rootPageElem": "body"
            },
            "klassNames": {}
        },
        "router": {
            "routes": {
                "": "index"
            },
            // reverse of `routes`, for navigation by name
            "paths": {
                "index": ""
            }
        },
        "item": {
            "urlRoot": "/"
        },
        "itemView": {
            "tagName": "article",
            "className": null,
            "id": null,
            "templateId": null,
            "css": {},
            "events": {},
            "html": {},
            "selectors": {},
            "text": {}
        },
        "collection": {
            "url": "/"
        },
        "collectionView": {
            "tagName": "section",
            "className": null,
            "id": null,
            "templateId": null,
            "itemView": null,
            "css": {},
            "events": {},
            "html": {},
            "selectors": {},
            "text": {}
        },
        "history": {
            "root": "/",
            "pushState": true
        }
    })
}
