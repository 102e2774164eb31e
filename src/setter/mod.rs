//! Setters that write a scalar value or a single mapping entry onto a node.
//!
//! A setter is a [`SetFn`]: a boxed closure the matcher calls on every node a
//! path specification resolves to. `set_entry` enforces the one rule that
//! matters most for round trips: a `!!str` value whose text a YAML 1.1 parser
//! would read as something else (`true`, `123`, `null`, `2020-01-01`) is
//! written quoted.
//!
//! # Example
//!
//! ```
//! use yamlstamp::document::node::{ScalarStyle, Tag, YamlNode};
//! use yamlstamp::setter::set_entry;
//!
//! let mut node = YamlNode::mapping();
//! set_entry("enabled", "true", Tag::Str)(&mut node).unwrap();
//!
//! let enabled = node.get("enabled").and_then(|n| n.as_scalar()).unwrap();
//! assert_eq!(enabled.style(), ScalarStyle::DoubleQuoted);
//! ```

mod callbacks;

pub use callbacks::{EntryCallback, MutationEvent, ScalarCallback, Setter};

use crate::document::node::{replace_entry, ScalarStyle, Tag, YamlNode, YamlScalar, YamlValue};
use crate::document::resolve::is_yaml11_non_string;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A mutation applied to one matched node.
pub type SetFn<'s> = Box<dyn FnMut(&mut YamlNode) -> Result<()> + 's>;

/// The quoting used when a string value has to be protected from a type
/// change on reparse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    #[default]
    Double,
    Single,
}

impl QuoteStyle {
    pub fn scalar_style(self) -> ScalarStyle {
        match self {
            QuoteStyle::Double => ScalarStyle::DoubleQuoted,
            QuoteStyle::Single => ScalarStyle::SingleQuoted,
        }
    }
}

/// Returns a [`SetFn`] that overwrites a scalar's text.
///
/// The scalar keeps its tag. A `!!null` scalar given non-empty text becomes a
/// `!!str`. A string scalar whose new text is ambiguous is switched to double
/// quotes unless it is already quoted.
pub fn set_scalar(value: impl Into<String>) -> SetFn<'static> {
    let value = value.into();
    Box::new(move |node: &mut YamlNode| assign_scalar(node, &value, ScalarStyle::DoubleQuoted))
}

/// Returns a [`SetFn`] that inserts or overwrites `key` in a mapping with a
/// new scalar of `value` and `tag`.
///
/// An existing key keeps its position; a new key is appended.
pub fn set_entry(key: impl Into<String>, value: impl Into<String>, tag: Tag) -> SetFn<'static> {
    let key = key.into();
    let entry = entry_node(value.into(), tag, ScalarStyle::DoubleQuoted);
    Box::new(move |node: &mut YamlNode| insert_entry(node, &key, &entry))
}

/// Builds the scalar `set_entry` writes, quoting ambiguous string text.
pub(crate) fn entry_node(value: String, tag: Tag, quote: ScalarStyle) -> YamlNode {
    let ambiguous = tag.is_string() && is_yaml11_non_string(&value);
    let mut scalar = YamlScalar::new(value, tag);
    if ambiguous {
        scalar = scalar.with_style(quote);
    }
    YamlNode::new(YamlValue::Scalar(scalar))
}

pub(crate) fn assign_scalar(node: &mut YamlNode, value: &str, quote: ScalarStyle) -> Result<()> {
    let node = node.content_mut();
    let found = node.kind();
    let YamlValue::Scalar(scalar) = &mut node.value else {
        return Err(Error::TargetNotScalar { found });
    };

    if scalar.is_null() && !value.is_empty() {
        scalar.set_tag(Tag::Str);
    }
    if scalar.tag().is_string() && !scalar.style().is_quoted() && is_yaml11_non_string(value) {
        scalar.set_style(quote);
    }
    scalar.set_text(value.to_string());
    node.mark_modified();
    log::trace!("set scalar value {:?}", value);
    Ok(())
}

pub(crate) fn insert_entry(node: &mut YamlNode, key: &str, entry: &YamlNode) -> Result<()> {
    let node = node.content_mut();
    let found = node.kind();
    let YamlValue::Mapping(entries) = &mut node.value else {
        return Err(Error::TargetNotMapping {
            key: key.to_string(),
            found,
        });
    };

    if entries.get(key) == Some(entry) {
        return Ok(());
    }
    replace_entry(entries, key, entry.clone());
    node.mark_modified();
    log::trace!("set entry {:?}", key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry<'n>(node: &'n YamlNode, key: &str) -> &'n YamlScalar {
        node.get(key).and_then(YamlNode::as_scalar).unwrap()
    }

    #[test]
    fn test_set_entry_quotes_ambiguous_strings() {
        let mut node = YamlNode::mapping();
        for text in ["true", "123", "null", "2020-01-01", "on", "1e3"] {
            set_entry(text, text, Tag::Str)(&mut node).unwrap();
            let scalar = entry(&node, text);
            assert_eq!(scalar.style(), ScalarStyle::DoubleQuoted, "{}", text);
            assert_eq!(scalar.tag(), &Tag::Str);
            assert_eq!(scalar.text(), text);
        }
    }

    #[test]
    fn test_set_entry_leaves_plain_strings_plain() {
        let mut node = YamlNode::mapping();
        set_entry("owner", "platform-team", Tag::Str)(&mut node).unwrap();
        assert_eq!(entry(&node, "owner").style(), ScalarStyle::Plain);
    }

    #[test]
    fn test_set_entry_never_quotes_non_string_tags() {
        let mut node = YamlNode::mapping();
        set_entry("replicas", "123", Tag::Int)(&mut node).unwrap();
        set_entry("enabled", "true", Tag::Bool)(&mut node).unwrap();
        assert_eq!(entry(&node, "replicas").style(), ScalarStyle::Plain);
        assert_eq!(entry(&node, "enabled").style(), ScalarStyle::Plain);
    }

    #[test]
    fn test_set_entry_overwrites_in_place() {
        let mut node = YamlNode::from_entries([
            ("a", YamlNode::string("1")),
            ("b", YamlNode::string("2")),
            ("c", YamlNode::string("3")),
        ]);
        set_entry("b", "two", Tag::Str)(&mut node).unwrap();
        let keys: Vec<&str> = node.as_mapping().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(entry(&node, "b").text(), "two");
    }

    #[test]
    fn test_set_entry_on_non_mapping_fails() {
        let mut node = YamlNode::sequence(vec![]);
        let err = set_entry("k", "v", Tag::Str)(&mut node).unwrap_err();
        assert_eq!(
            err,
            Error::TargetNotMapping {
                key: "k".to_string(),
                found: crate::document::node::NodeKind::Sequence,
            }
        );
    }

    #[test]
    fn test_set_entry_looks_through_document() {
        let mut doc = YamlNode::document(YamlNode::mapping());
        set_entry("k", "v", Tag::Str)(&mut doc).unwrap();
        assert_eq!(entry(&doc, "k").text(), "v");
    }

    #[test]
    fn test_set_scalar_keeps_tag() {
        let mut node = YamlNode::scalar("1", Tag::Int);
        set_scalar("2")(&mut node).unwrap();
        let scalar = node.as_scalar().unwrap();
        assert_eq!(scalar.text(), "2");
        assert_eq!(scalar.tag(), &Tag::Int);
        assert_eq!(scalar.style(), ScalarStyle::Plain);
    }

    #[test]
    fn test_set_scalar_quotes_ambiguous_string() {
        let mut node = YamlNode::string("hello");
        set_scalar("no")(&mut node).unwrap();
        assert_eq!(node.as_scalar().unwrap().style(), ScalarStyle::DoubleQuoted);
    }

    #[test]
    fn test_set_scalar_keeps_existing_quotes() {
        let mut node = YamlNode::new(YamlValue::Scalar(
            YamlScalar::new("x", Tag::Str).with_style(ScalarStyle::SingleQuoted),
        ));
        set_scalar("yes")(&mut node).unwrap();
        assert_eq!(node.as_scalar().unwrap().style(), ScalarStyle::SingleQuoted);
    }

    #[test]
    fn test_set_scalar_retags_null() {
        let mut node = YamlNode::null();
        set_scalar("value")(&mut node).unwrap();
        assert_eq!(node.as_scalar().unwrap().tag(), &Tag::Str);
    }

    #[test]
    fn test_set_scalar_on_mapping_fails() {
        let mut node = YamlNode::mapping();
        assert!(matches!(
            set_scalar("x")(&mut node),
            Err(Error::TargetNotScalar { .. })
        ));
    }

    #[test]
    fn test_quote_style_maps_to_scalar_style() {
        assert_eq!(QuoteStyle::Double.scalar_style(), ScalarStyle::DoubleQuoted);
        assert_eq!(QuoteStyle::Single.scalar_style(), ScalarStyle::SingleQuoted);
    }
}
