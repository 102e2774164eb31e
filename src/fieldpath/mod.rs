//! Path specifications over YAML node trees.
//!
//! A path names where a setter should be applied. Besides building
//! [`FieldSpec`] values directly, paths can be written as strings:
//!
//! - `$` - Root node (optional, the empty string means the same)
//! - `name` or `.name` - Named mapping entry
//! - `['any.text']` or `["any.text"]` - Entry whose name is not a plain identifier
//! - `*`, `.*`, `[*]` or `[]` - Every element of a sequence
//! - `{*}` or `.{*}` - Every value of a mapping
//!
//! # Examples
//!
//! ```
//! // metadata.annotations            - the annotations mapping
//! // spec.template.metadata.labels   - labels of a pod template
//! // items[*].metadata.labels        - labels of every listed item
//! // data{*}                         - every value under data
//! ```

pub mod ast;
pub mod matcher;
pub mod parser;

pub use ast::{FieldSpec, PathSegment};
pub use matcher::PathMatcher;
pub use parser::Parser;
