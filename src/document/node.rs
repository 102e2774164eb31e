//! YAML node representation with metadata tracking.
//!
//! This module provides the core data structures the matcher and setters
//! operate on. Each YAML value is wrapped in a `YamlNode` that tracks whether
//! the node has been changed since it was loaded, so callers can tell which
//! parts of a document a batch actually touched.
//!
//! # Example
//!
//! ```
//! use yamlstamp::document::node::{Tag, YamlNode, YamlValue};
//!
//! // Create a simple string node
//! let node = YamlNode::string("hello");
//! assert!(node.is_modified()); // New nodes are marked as modified
//!
//! // Create a nested mapping
//! let mut root = YamlNode::mapping();
//! if let YamlValue::Mapping(entries) = root.value_mut() {
//!     entries.insert("name".to_string(), YamlNode::string("yamlstamp"));
//!     entries.insert("replicas".to_string(), YamlNode::scalar("3", Tag::Int));
//! }
//! assert_eq!(root.get("name").and_then(|n| n.as_scalar()).unwrap().text(), "yamlstamp");
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// The four structural kinds a node can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Document,
    Sequence,
    Mapping,
    Scalar,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Document => "document",
            NodeKind::Sequence => "sequence",
            NodeKind::Mapping => "mapping",
            NodeKind::Scalar => "scalar",
        };
        f.write_str(name)
    }
}

/// The type tag of a scalar.
///
/// Only the tags of the YAML 1.1 type repository that this crate resolves are
/// named. Anything else is kept in `Custom` in the form it is written in:
/// `!name`, `!!name`, or `!<uri>` for a full URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Str,
    Int,
    Float,
    Bool,
    Null,
    Timestamp,
    Binary,
    Custom(String),
}

impl Tag {
    /// Returns the shorthand form of the tag, e.g. `!!str`.
    pub fn as_str(&self) -> &str {
        match self {
            Tag::Str => "!!str",
            Tag::Int => "!!int",
            Tag::Float => "!!float",
            Tag::Bool => "!!bool",
            Tag::Null => "!!null",
            Tag::Timestamp => "!!timestamp",
            Tag::Binary => "!!binary",
            Tag::Custom(tag) => tag,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Tag::Str)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = Infallible;

    /// Accepts bare names (`str`), shorthand (`!!str`) and the full
    /// `tag:yaml.org,2002:` form. Unknown names become `Tag::Custom`: a bare
    /// name gets a `!` prefix and any other URI is written verbatim, so
    /// `foo` becomes `!foo` and `tag:example.com,2000:app` becomes
    /// `!<tag:example.com,2000:app>`. The non-specific `!` means `!!str`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s
            .strip_prefix("tag:yaml.org,2002:")
            .or_else(|| s.strip_prefix("!!"))
            .unwrap_or(s);
        Ok(match name {
            "str" | "" | "!" => Tag::Str,
            "int" => Tag::Int,
            "float" => Tag::Float,
            "bool" => Tag::Bool,
            "null" => Tag::Null,
            "timestamp" => Tag::Timestamp,
            "binary" => Tag::Binary,
            _ => Tag::Custom(normalize_custom_tag(s)),
        })
    }
}

/// Rewrites a custom tag into a form a YAML parser reads back as a tag.
///
/// Already valid `!name`, `!!name` and `!<uri>` forms are returned unchanged,
/// so the function is idempotent.
pub(crate) fn normalize_custom_tag(tag: &str) -> String {
    if let Some(suffix) = tag.strip_prefix("tag:yaml.org,2002:") {
        if !suffix.is_empty() && suffix.chars().all(is_shorthand_char) {
            return format!("!!{}", suffix);
        }
    }
    if let Some(uri) = tag.strip_prefix("!<").and_then(|t| t.strip_suffix('>')) {
        if !uri.is_empty() && uri.chars().all(|c| c == '%' || is_uri_char(c)) {
            return tag.to_string();
        }
        return verbatim_tag(uri);
    }
    match tag.strip_prefix("!!").or_else(|| tag.strip_prefix('!')) {
        Some(name) if name.chars().all(is_shorthand_char) => tag.to_string(),
        Some(_) => verbatim_tag(tag),
        None if !tag.contains(':') && tag.chars().all(is_shorthand_char) => format!("!{}", tag),
        None => verbatim_tag(tag),
    }
}

fn verbatim_tag(uri: &str) -> String {
    let mut out = String::from("!<");
    for c in uri.chars() {
        if is_uri_char(c) {
            out.push(c);
        } else {
            let mut buf = [0; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    out.push('>');
    out
}

fn is_shorthand_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-;/?:@&=+$_.~*()".contains(c)
}

// '%' is left out: it is always escaped so decoded tags encode the same way
fn is_uri_char(c: char) -> bool {
    is_shorthand_char(c) || "#,[]!'".contains(c)
}

/// Presentation style of a scalar. Affects serialization, never the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalarStyle {
    #[default]
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

impl ScalarStyle {
    pub fn is_quoted(&self) -> bool {
        matches!(self, ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted)
    }
}

/// A scalar: its text, its type tag and its presentation style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlScalar {
    text: String,
    tag: Tag,
    style: ScalarStyle,
}

impl YamlScalar {
    /// Creates a plain-style scalar.
    pub fn new(text: impl Into<String>, tag: Tag) -> Self {
        Self {
            text: text.into(),
            tag,
            style: ScalarStyle::Plain,
        }
    }

    pub fn with_style(mut self, style: ScalarStyle) -> Self {
        self.style = style;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn style(&self) -> ScalarStyle {
        self.style
    }

    pub fn is_null(&self) -> bool {
        self.tag == Tag::Null
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
    }

    pub(crate) fn set_tag(&mut self, tag: Tag) {
        self.tag = tag;
    }

    pub(crate) fn set_style(&mut self, style: ScalarStyle) {
        self.style = style;
    }
}

/// A YAML value without metadata.
///
/// Containers hold `YamlNode`s so metadata is tracked throughout the tree.
#[derive(Debug, Clone)]
pub enum YamlValue {
    /// A document wrapping exactly one root node
    Document(Box<YamlNode>),
    /// An ordered list of nodes
    Sequence(Vec<YamlNode>),
    /// Key/value pairs in insertion order; keys are unique
    Mapping(IndexMap<String, YamlNode>),
    /// A tagged, styled scalar
    Scalar(YamlScalar),
}

// Mapping equality is order-sensitive: insertion order is visible in output.
impl PartialEq for YamlValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (YamlValue::Document(a), YamlValue::Document(b)) => a == b,
            (YamlValue::Sequence(a), YamlValue::Sequence(b)) => a == b,
            (YamlValue::Mapping(a), YamlValue::Mapping(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
            }
            (YamlValue::Scalar(a), YamlValue::Scalar(b)) => a == b,
            _ => false,
        }
    }
}

impl YamlValue {
    pub fn kind(&self) -> NodeKind {
        match self {
            YamlValue::Document(_) => NodeKind::Document,
            YamlValue::Sequence(_) => NodeKind::Sequence,
            YamlValue::Mapping(_) => NodeKind::Mapping,
            YamlValue::Scalar(_) => NodeKind::Scalar,
        }
    }

    /// Returns true if this value is a mapping.
    ///
    /// # Example
    ///
    /// ```
    /// use yamlstamp::document::node::{YamlValue, YamlScalar, Tag};
    /// use indexmap::IndexMap;
    ///
    /// assert!(YamlValue::Mapping(IndexMap::new()).is_mapping());
    /// assert!(!YamlValue::Scalar(YamlScalar::new("42", Tag::Int)).is_mapping());
    /// ```
    pub fn is_mapping(&self) -> bool {
        matches!(self, YamlValue::Mapping(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, YamlValue::Sequence(_))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, YamlValue::Scalar(_))
    }

    /// Returns true for sequences, mappings and documents.
    pub fn is_container(&self) -> bool {
        !self.is_scalar()
    }
}

/// A YAML value wrapped with metadata.
///
/// Equality compares values only; the `modified` flag is bookkeeping.
#[derive(Debug, Clone)]
pub struct YamlNode {
    pub(crate) value: YamlValue,
    pub(crate) metadata: NodeMetadata,
}

/// Metadata associated with a YAML node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMetadata {
    /// Whether this node has been modified since it was loaded
    pub modified: bool,
    /// Style of the mapping key this node was loaded under, if any
    pub key_style: Option<ScalarStyle>,
}

impl PartialEq for YamlNode {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl YamlNode {
    /// Creates a new `YamlNode` with the given value.
    ///
    /// The node is marked as modified since it's newly created.
    ///
    /// # Example
    ///
    /// ```
    /// use yamlstamp::document::node::{YamlNode, YamlValue, YamlScalar, Tag};
    ///
    /// let node = YamlNode::new(YamlValue::Scalar(YamlScalar::new("42", Tag::Int)));
    /// assert!(node.is_modified());
    /// ```
    pub fn new(value: YamlValue) -> Self {
        Self {
            value,
            metadata: NodeMetadata {
                modified: true,
                key_style: None,
            },
        }
    }

    /// Creates a node that is not marked as modified, for trees built from
    /// parsed input.
    pub fn unmodified(value: YamlValue) -> Self {
        Self {
            value,
            metadata: NodeMetadata {
                modified: false,
                key_style: None,
            },
        }
    }

    /// Creates an empty mapping node.
    pub fn mapping() -> Self {
        Self::new(YamlValue::Mapping(IndexMap::new()))
    }

    /// Creates a mapping node from key/value pairs, keeping their order.
    /// A repeated key keeps its first position and its last value.
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, YamlNode)>,
    {
        Self::new(YamlValue::Mapping(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn sequence(items: Vec<YamlNode>) -> Self {
        Self::new(YamlValue::Sequence(items))
    }

    pub fn scalar(text: impl Into<String>, tag: Tag) -> Self {
        Self::new(YamlValue::Scalar(YamlScalar::new(text, tag)))
    }

    /// Creates a plain `!!str` scalar. No quoting is applied; use the setters
    /// when the text may be ambiguous.
    pub fn string(text: impl Into<String>) -> Self {
        Self::scalar(text, Tag::Str)
    }

    pub fn null() -> Self {
        Self::scalar("null", Tag::Null)
    }

    pub fn document(root: YamlNode) -> Self {
        Self::new(YamlValue::Document(Box::new(root)))
    }

    pub fn kind(&self) -> NodeKind {
        self.value.kind()
    }

    /// Returns an immutable reference to the node's value.
    pub fn value(&self) -> &YamlValue {
        &self.value
    }

    /// Returns a mutable reference to the node's value.
    ///
    /// Calling this method marks the node as modified, even if the value is
    /// not actually changed.
    pub fn value_mut(&mut self) -> &mut YamlValue {
        self.metadata.modified = true;
        &mut self.value
    }

    /// Returns whether this node has been modified.
    ///
    /// # Example
    ///
    /// ```
    /// use yamlstamp::document::node::{YamlNode, YamlValue};
    ///
    /// let node = YamlNode::unmodified(YamlValue::Sequence(vec![]));
    /// assert!(!node.is_modified());
    /// ```
    pub fn is_modified(&self) -> bool {
        self.metadata.modified
    }

    pub(crate) fn mark_modified(&mut self) {
        self.metadata.modified = true;
    }

    /// Style the key of this entry was written in when it was loaded.
    pub fn key_style(&self) -> Option<ScalarStyle> {
        self.metadata.key_style
    }

    pub(crate) fn with_key_style(mut self, style: Option<ScalarStyle>) -> Self {
        self.metadata.key_style = style;
        self
    }

    /// Returns the node a document wraps, or the node itself.
    pub fn content(&self) -> &YamlNode {
        match &self.value {
            YamlValue::Document(root) => root.content(),
            _ => self,
        }
    }

    /// Mutable counterpart of [`YamlNode::content`]. Does not mark anything
    /// as modified.
    pub fn content_mut(&mut self) -> &mut YamlNode {
        match self.value {
            YamlValue::Document(ref mut root) => root.content_mut(),
            _ => self,
        }
    }

    /// Looks up a mapping entry, looking through a document wrapper.
    pub fn get(&self, key: &str) -> Option<&YamlNode> {
        self.content().as_mapping()?.get(key)
    }

    pub fn as_scalar(&self) -> Option<&YamlScalar> {
        match &self.value {
            YamlValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, YamlNode>> {
        match &self.value {
            YamlValue::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[YamlNode]> {
        match &self.value {
            YamlValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns true for a `!!null` scalar.
    pub fn is_null(&self) -> bool {
        self.as_scalar().is_some_and(YamlScalar::is_null)
    }
}

/// Inserts `node` under `key`, keeping the key style of an entry it replaces.
pub(crate) fn replace_entry(entries: &mut IndexMap<String, YamlNode>, key: &str, node: YamlNode) {
    let key_style = entries.get(key).and_then(YamlNode::key_style);
    entries.insert(key.to_string(), node.with_key_style(key_style));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_nodes_are_modified() {
        assert!(YamlNode::mapping().is_modified());
        assert!(YamlNode::string("x").is_modified());
    }

    #[test]
    fn test_value_mut_marks_modified() {
        let mut node = YamlNode::unmodified(YamlValue::Sequence(vec![]));
        assert!(!node.is_modified());
        let _ = node.value_mut();
        assert!(node.is_modified());
    }

    #[test]
    fn test_mapping_equality_is_order_sensitive() {
        let ab = YamlNode::from_entries([("a", YamlNode::string("1")), ("b", YamlNode::string("2"))]);
        let ba = YamlNode::from_entries([("b", YamlNode::string("2")), ("a", YamlNode::string("1"))]);
        assert_ne!(ab, ba);
        assert_eq!(ab, ab.clone());
    }

    #[test]
    fn test_equality_ignores_modified_flag() {
        let fresh = YamlNode::string("x");
        let loaded = YamlNode::unmodified(YamlValue::Scalar(YamlScalar::new("x", Tag::Str)));
        assert_eq!(fresh, loaded);
    }

    #[test]
    fn test_get_looks_through_document() {
        let doc = YamlNode::document(YamlNode::from_entries([("kind", YamlNode::string("Pod"))]));
        assert_eq!(doc.get("kind").unwrap().as_scalar().unwrap().text(), "Pod");
        assert_eq!(doc.kind(), NodeKind::Document);
        assert_eq!(doc.content().kind(), NodeKind::Mapping);
    }

    #[test]
    fn test_tag_from_str_forms() {
        assert_eq!("str".parse::<Tag>().unwrap(), Tag::Str);
        assert_eq!("!!int".parse::<Tag>().unwrap(), Tag::Int);
        assert_eq!("tag:yaml.org,2002:bool".parse::<Tag>().unwrap(), Tag::Bool);
        assert_eq!(
            "!custom".parse::<Tag>().unwrap(),
            Tag::Custom("!custom".to_string())
        );
        assert_eq!("!".parse::<Tag>().unwrap(), Tag::Str);
    }

    #[test]
    fn test_custom_tag_names_are_normalized() {
        let parse = |s: &str| s.parse::<Tag>().unwrap().to_string();
        assert_eq!(parse("foo"), "!foo");
        assert_eq!(parse("!!set"), "!!set");
        assert_eq!(parse("tag:yaml.org,2002:set"), "!!set");
        assert_eq!(
            parse("tag:example.com,2000:app"),
            "!<tag:example.com,2000:app>"
        );
        assert_eq!(parse("!<tag:example.com,2000:app>"), "!<tag:example.com,2000:app>");
        assert_eq!(parse("my tag"), "!<my%20tag>");
        assert_eq!(parse("100%"), "!<100%25>");
    }

    #[test]
    fn test_normalize_custom_tag_is_idempotent() {
        for tag in ["foo", "!vault", "a:b", "{x}", "caf\u{e9}"] {
            let once = normalize_custom_tag(tag);
            assert_eq!(normalize_custom_tag(&once), once, "{}", tag);
        }
    }

    #[test]
    fn test_replace_entry_keeps_key_style() {
        let mut entries = IndexMap::new();
        let loaded = YamlNode::unmodified(YamlValue::Scalar(YamlScalar::new("push", Tag::Str)))
            .with_key_style(Some(ScalarStyle::DoubleQuoted));
        entries.insert("on".to_string(), loaded);

        replace_entry(&mut entries, "on", YamlNode::string("pull"));
        replace_entry(&mut entries, "new", YamlNode::string("x"));

        assert_eq!(entries["on"].key_style(), Some(ScalarStyle::DoubleQuoted));
        assert_eq!(entries["on"].as_scalar().unwrap().text(), "pull");
        assert_eq!(entries["new"].key_style(), None);
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(Tag::Str.to_string(), "!!str");
        assert_eq!(Tag::Timestamp.to_string(), "!!timestamp");
    }

    #[test]
    fn test_null_detection() {
        assert!(YamlNode::null().is_null());
        assert!(!YamlNode::string("null").is_null());
        assert!(!YamlNode::mapping().is_null());
    }

    #[test]
    fn test_scalar_style_quoted() {
        assert!(ScalarStyle::DoubleQuoted.is_quoted());
        assert!(ScalarStyle::SingleQuoted.is_quoted());
        assert!(!ScalarStyle::Plain.is_quoted());
        assert!(!ScalarStyle::Literal.is_quoted());
    }
}
