//! Keyed batches: a set of key/value pairs written as mapping entries at
//! every location a list of path specifications resolves to.

use crate::document::node::{NodeKind, Tag, YamlNode};
use crate::error::Result;
use crate::fieldpath::{FieldSpec, PathMatcher};
use crate::setter::Setter;
use indexmap::IndexMap;

/// Unique keys with their values, all sharing one value tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueBatch {
    entries: IndexMap<String, String>,
    tag: Tag,
}

impl KeyValueBatch {
    pub fn new(tag: Tag) -> Self {
        Self {
            entries: IndexMap::new(),
            tag,
        }
    }

    /// Inserts a pair, replacing the value of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the pairs in lexicographic key order, whatever order they
    /// were inserted in.
    pub fn sorted_entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for KeyValueBatch {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KeyValueBatch {
    /// Collects `!!str` pairs.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut batch = KeyValueBatch::new(Tag::Str);
        batch.extend(iter);
        batch
    }
}

/// Applies a [`KeyValueBatch`] through a list of path specifications.
///
/// Nodes are visited in slice order; within a node keys are applied in
/// sorted order, and for each key every specification is walked once.
#[derive(Debug)]
pub struct BatchApplier<'b, 'h> {
    batch: &'b KeyValueBatch,
    specs: &'b [FieldSpec],
    setter: Setter<'h>,
    default_create: Option<NodeKind>,
}

impl<'b, 'h> BatchApplier<'b, 'h> {
    pub fn new(batch: &'b KeyValueBatch, specs: &'b [FieldSpec]) -> Self {
        BatchApplier {
            batch,
            specs,
            setter: Setter::new(),
            default_create: None,
        }
    }

    /// Uses `setter` (and its callbacks) for every entry write.
    pub fn with_setter(mut self, setter: Setter<'h>) -> Self {
        self.setter = setter;
        self
    }

    /// Creation kind for specifications that do not declare one.
    pub fn with_default_create(mut self, kind: NodeKind) -> Self {
        self.default_create = Some(kind);
        self
    }

    /// Gives the setter back, releasing whatever its callbacks borrow.
    pub fn into_setter(self) -> Setter<'h> {
        self.setter
    }

    /// Applies the batch to every node in place.
    ///
    /// Every specification is validated before the first write. The first
    /// traversal or setter error aborts the whole batch; writes made before
    /// it are kept.
    pub fn apply(&mut self, nodes: &mut [YamlNode]) -> Result<()> {
        let batch = self.batch;
        let specs = self.specs;
        if batch.is_empty() || specs.is_empty() {
            return Ok(());
        }

        let matchers: Vec<PathMatcher<'_>> = specs
            .iter()
            .map(|spec| PathMatcher::new(spec).with_create(spec.create.or(self.default_create)))
            .collect();
        for matcher in &matchers {
            matcher.validate()?;
        }

        let entries = batch.sorted_entries();
        log::debug!(
            "applying {} keys through {} paths to {} nodes",
            entries.len(),
            matchers.len(),
            nodes.len()
        );
        for node in nodes.iter_mut() {
            for &(key, value) in &entries {
                let mut set = self.setter.set_entry(key, value, batch.tag());
                for matcher in &matchers {
                    matcher.apply(node, &mut set)?;
                }
            }
        }
        Ok(())
    }
}
