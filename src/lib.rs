//! yamlstamp - locate fields in YAML document trees and stamp values into them.
//!
//! The crate is organised leaves first:
//!
//! - [`document`] - the node model and YAML 1.1 scalar resolution
//! - [`setter`] - scalar and map-entry setters, plus the callback decorator
//! - [`fieldpath`] - path specifications, their textual parser, and the matcher
//! - [`batch`] - applies a sorted key/value batch through the matcher
//! - [`file`] - `serde_yaml` adapters used by the command-line front end
//! - [`config`] - TOML configuration for the command-line front end
//!
//! # Example
//!
//! ```
//! use yamlstamp::batch::{BatchApplier, KeyValueBatch};
//! use yamlstamp::document::node::{NodeKind, Tag, YamlNode};
//! use yamlstamp::fieldpath::FieldSpec;
//!
//! let mut nodes = vec![YamlNode::mapping()];
//! let mut batch = KeyValueBatch::new(Tag::Str);
//! batch.insert("team", "infra");
//!
//! let specs = vec!["metadata.annotations".parse::<FieldSpec>().unwrap()];
//! BatchApplier::new(&batch, &specs)
//!     .with_default_create(NodeKind::Mapping)
//!     .apply(&mut nodes)
//!     .unwrap();
//!
//! let team = nodes[0]
//!     .get("metadata")
//!     .and_then(|m| m.get("annotations"))
//!     .and_then(|a| a.get("team"))
//!     .and_then(|t| t.as_scalar())
//!     .unwrap();
//! assert_eq!(team.text(), "infra");
//! ```

pub mod batch;
pub mod config;
pub mod document;
pub mod error;
pub mod fieldpath;
pub mod file;
pub mod setter;

pub use error::{Error, Result};
