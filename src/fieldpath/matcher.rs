//! Walks a node tree along a `FieldSpec`, creating missing fields on the way
//! and handing every match to a mutator.

use super::ast::{format_segments, validate_parts, FieldSpec, PathSegment};
use crate::document::node::{replace_entry, NodeKind, YamlNode, YamlValue};
use crate::error::{Error, Result};

pub struct PathMatcher<'s> {
    spec: &'s FieldSpec,
    create: Option<NodeKind>,
}

impl<'s> PathMatcher<'s> {
    pub fn new(spec: &'s FieldSpec) -> Self {
        PathMatcher {
            spec,
            create: spec.create,
        }
    }

    /// Overrides the creation kind of the specification.
    pub fn with_create(mut self, create: Option<NodeKind>) -> Self {
        self.create = create;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_parts(&self.spec.segments, self.create)
    }

    /// Applies `set` to every node the specification resolves to, in
    /// depth-first document order.
    ///
    /// The specification is validated before anything is touched. After
    /// that the first error aborts the walk; mutations already made stay.
    ///
    /// # Example
    ///
    /// ```
    /// use yamlstamp::document::node::{NodeKind, Tag, YamlNode};
    /// use yamlstamp::fieldpath::{FieldSpec, PathMatcher};
    /// use yamlstamp::setter::set_entry;
    ///
    /// let spec = FieldSpec::parse("a.b").unwrap().with_create(NodeKind::Mapping);
    /// let mut root = YamlNode::mapping();
    /// PathMatcher::new(&spec)
    ///     .apply(&mut root, &mut set_entry("c", "v", Tag::Str))
    ///     .unwrap();
    ///
    /// let c = root.get("a").and_then(|a| a.get("b")).and_then(|b| b.get("c"));
    /// assert_eq!(c.and_then(|c| c.as_scalar()).map(|s| s.text()), Some("v"));
    /// ```
    pub fn apply<F>(&self, root: &mut YamlNode, set: &mut F) -> Result<()>
    where
        F: FnMut(&mut YamlNode) -> Result<()> + ?Sized,
    {
        self.validate()?;
        self.walk(root, 0, set)
    }

    /// Counts the nodes the specification currently resolves to, without
    /// creating anything.
    pub fn matches(&self, root: &YamlNode) -> Result<usize> {
        self.validate()?;
        self.count(root, 0)
    }

    fn walk<F>(&self, node: &mut YamlNode, depth: usize, set: &mut F) -> Result<()>
    where
        F: FnMut(&mut YamlNode) -> Result<()> + ?Sized,
    {
        let node = node.content_mut();
        let Some(segment) = self.spec.segments.get(depth) else {
            log::trace!("matched {}", format_segments(&self.spec.segments));
            return set(node);
        };

        let found = node.kind();
        match segment {
            PathSegment::Field(name) => {
                let YamlValue::Mapping(entries) = &mut node.value else {
                    return Err(self.mismatch(depth, NodeKind::Mapping, found));
                };
                if entries.get(name).map_or(true, YamlNode::is_null) {
                    let Some(kind) = self.kind_to_create(depth) else {
                        return Ok(());
                    };
                    replace_entry(entries, name, empty_node(kind));
                    node.metadata.modified = true;
                    log::debug!(
                        "created {} at {}",
                        kind,
                        format_segments(&self.spec.segments[..=depth])
                    );
                }
                match entries.get_mut(name) {
                    Some(child) => self.walk(child, depth + 1, set),
                    None => Ok(()),
                }
            }
            PathSegment::EachElement => {
                let YamlValue::Sequence(items) = &mut node.value else {
                    return Err(self.mismatch(depth, NodeKind::Sequence, found));
                };
                for item in items.iter_mut() {
                    self.walk(item, depth + 1, set)?;
                }
                Ok(())
            }
            PathSegment::EachValue => {
                let YamlValue::Mapping(entries) = &mut node.value else {
                    return Err(self.mismatch(depth, NodeKind::Mapping, found));
                };
                for value in entries.values_mut() {
                    self.walk(value, depth + 1, set)?;
                }
                Ok(())
            }
        }
    }

    fn count(&self, node: &YamlNode, depth: usize) -> Result<usize> {
        let node = node.content();
        let Some(segment) = self.spec.segments.get(depth) else {
            return Ok(1);
        };

        let found = node.kind();
        match (segment, node.value()) {
            (PathSegment::Field(name), YamlValue::Mapping(entries)) => match entries.get(name) {
                Some(child) if !child.is_null() => self.count(child, depth + 1),
                _ => Ok(0),
            },
            (PathSegment::EachElement, YamlValue::Sequence(items)) => {
                let mut total = 0;
                for item in items {
                    total += self.count(item, depth + 1)?;
                }
                Ok(total)
            }
            (PathSegment::EachValue, YamlValue::Mapping(entries)) => {
                let mut total = 0;
                for value in entries.values() {
                    total += self.count(value, depth + 1)?;
                }
                Ok(total)
            }
            (PathSegment::EachElement, _) => Err(self.mismatch(depth, NodeKind::Sequence, found)),
            (_, _) => Err(self.mismatch(depth, NodeKind::Mapping, found)),
        }
    }

    /// Kind of node to create for a missing field at `depth`: the configured
    /// kind for the last segment, otherwise whatever the next segment walks.
    fn kind_to_create(&self, depth: usize) -> Option<NodeKind> {
        let create = self.create?;
        match self.spec.segments.get(depth + 1) {
            None => Some(create),
            Some(PathSegment::EachElement) => Some(NodeKind::Sequence),
            Some(_) => Some(NodeKind::Mapping),
        }
    }

    fn mismatch(&self, depth: usize, expected: NodeKind, found: NodeKind) -> Error {
        Error::PathTypeMismatch {
            path: format_segments(&self.spec.segments[..depth]),
            expected,
            found,
        }
    }
}

fn empty_node(kind: NodeKind) -> YamlNode {
    match kind {
        NodeKind::Mapping => YamlNode::mapping(),
        NodeKind::Sequence => YamlNode::sequence(Vec::new()),
        NodeKind::Scalar => YamlNode::string(""),
        NodeKind::Document => YamlNode::document(YamlNode::mapping()),
    }
}
