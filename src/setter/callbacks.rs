//! The `Setter` decorator: base setters plus optional observation callbacks.

use super::{assign_scalar, entry_node, insert_entry, QuoteStyle, SetFn};
use crate::document::node::{Tag, YamlNode};
use crate::error::Error;
use std::fmt;

/// Describes one entry write, handed to the entry callback just before the
/// write happens.
#[derive(Debug, Clone, Copy)]
pub struct MutationEvent<'e> {
    pub key: &'e str,
    pub value: &'e str,
    pub tag: &'e Tag,
    /// The mapping about to receive the entry, in its pre-write state
    pub node: &'e YamlNode,
}

pub type ScalarCallback<'a> = Box<dyn FnMut(&str, &YamlNode) + 'a>;
pub type EntryCallback<'a> = Box<dyn FnMut(&MutationEvent<'_>) + 'a>;

/// Wraps `set_scalar` and `set_entry` with callbacks.
///
/// Each callback fires once per successful write, before the write, and
/// never when the target has the wrong kind.
///
/// # Example
///
/// ```
/// use yamlstamp::document::node::{Tag, YamlNode};
/// use yamlstamp::setter::Setter;
///
/// let mut touched = Vec::new();
/// let mut setter = Setter::new().on_entry_set(|event| touched.push(event.key.to_string()));
///
/// let mut node = YamlNode::mapping();
/// setter.set_entry("team", "infra", &Tag::Str)(&mut node).unwrap();
/// drop(setter);
///
/// assert_eq!(touched, vec!["team".to_string()]);
/// ```
#[derive(Default)]
pub struct Setter<'a> {
    on_scalar_set: Option<ScalarCallback<'a>>,
    on_entry_set: Option<EntryCallback<'a>>,
    quote_style: QuoteStyle,
}

impl fmt::Debug for Setter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter")
            .field("on_scalar_set", &self.on_scalar_set.is_some())
            .field("on_entry_set", &self.on_entry_set.is_some())
            .field("quote_style", &self.quote_style)
            .finish()
    }
}

impl<'a> Setter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the callback invoked with `(value, node)` for every scalar write.
    pub fn on_scalar_set(mut self, callback: impl FnMut(&str, &YamlNode) + 'a) -> Self {
        self.on_scalar_set = Some(Box::new(callback));
        self
    }

    /// Sets the callback invoked for every entry write.
    pub fn on_entry_set(mut self, callback: impl FnMut(&MutationEvent<'_>) + 'a) -> Self {
        self.on_entry_set = Some(Box::new(callback));
        self
    }

    pub fn with_quote_style(mut self, quote_style: QuoteStyle) -> Self {
        self.quote_style = quote_style;
        self
    }

    pub fn quote_style(&self) -> QuoteStyle {
        self.quote_style
    }

    /// Like [`super::set_scalar`], firing the scalar callback first.
    pub fn set_scalar<'s>(&'s mut self, value: &'s str) -> SetFn<'s> {
        let quote = self.quote_style.scalar_style();
        Box::new(move |node: &mut YamlNode| {
            let target = node.content_mut();
            if !target.value().is_scalar() {
                return Err(Error::TargetNotScalar {
                    found: target.kind(),
                });
            }
            if let Some(callback) = self.on_scalar_set.as_mut() {
                callback(value, target);
            }
            assign_scalar(target, value, quote)
        })
    }

    /// Like [`super::set_entry`], firing the entry callback first.
    pub fn set_entry<'s>(&'s mut self, key: &'s str, value: &'s str, tag: &'s Tag) -> SetFn<'s> {
        let entry = entry_node(value.to_string(), tag.clone(), self.quote_style.scalar_style());
        Box::new(move |node: &mut YamlNode| {
            let target = node.content_mut();
            if !target.value().is_mapping() {
                return Err(Error::TargetNotMapping {
                    key: key.to_string(),
                    found: target.kind(),
                });
            }
            if let Some(callback) = self.on_entry_set.as_mut() {
                callback(&MutationEvent {
                    key,
                    value,
                    tag,
                    node: target,
                });
            }
            insert_entry(target, key, &entry)
        })
    }
}
