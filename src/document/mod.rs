//! The document tree: nodes, their metadata, and YAML 1.1 scalar resolution.

pub mod node;
pub mod resolve;

pub use node::{NodeKind, ScalarStyle, Tag, YamlNode, YamlScalar, YamlValue};
