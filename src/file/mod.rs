//! File I/O operations for YAML documents.
//!
//! This module loads YAML from disk or stdin into `YamlNode` trees, and saves
//! trees back to files with atomic write operations and optional backups.

pub mod loader;
pub mod saver;
