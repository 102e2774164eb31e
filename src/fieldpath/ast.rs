//! Path specification types.

use crate::document::node::NodeKind;
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A segment in a path specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Named mapping entry (`.name` or `['name']`)
    Field(String),
    /// Every element of a sequence (`*`, `[*]` or `[]`)
    EachElement,
    /// Every value of a mapping (`{*}`)
    EachValue,
}

/// A path specification: where to look, and what to create when a field on
/// the way is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Segments that make up the path.
    pub segments: Vec<PathSegment>,
    /// Kind of node to create for a missing final field. `None` disables
    /// creation altogether: missing fields produce no match.
    pub create: Option<NodeKind>,
}

impl FieldSpec {
    /// Creates a specification that does not create missing fields.
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self {
            segments,
            create: None,
        }
    }

    /// Parses the textual form, e.g. `spec.template.metadata.annotations`.
    pub fn parse(path: &str) -> Result<Self> {
        super::parser::Parser::parse(path)
    }

    pub fn with_create(mut self, kind: NodeKind) -> Self {
        self.create = Some(kind);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Checks the specification without touching any document.
    ///
    /// # Example
    ///
    /// ```
    /// use yamlstamp::document::node::NodeKind;
    /// use yamlstamp::fieldpath::{FieldSpec, PathSegment};
    ///
    /// let spec = FieldSpec::new(vec![PathSegment::Field(String::new())]);
    /// assert!(spec.validate().is_err());
    ///
    /// let spec = FieldSpec::parse("metadata").unwrap().with_create(NodeKind::Document);
    /// assert!(spec.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        validate_parts(&self.segments, self.create)
    }
}

pub(crate) fn validate_parts(segments: &[PathSegment], create: Option<NodeKind>) -> Result<()> {
    let invalid = |message: &str| Error::InvalidPathSpecification {
        path: format_segments(segments),
        message: message.to_string(),
    };
    if segments
        .iter()
        .any(|segment| matches!(segment, PathSegment::Field(name) if name.is_empty()))
    {
        return Err(invalid("empty field name"));
    }
    if create == Some(NodeKind::Document) {
        return Err(invalid("a document cannot be created inside a document"));
    }
    Ok(())
}

impl FromStr for FieldSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_segments(&self.segments))
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// Formats segments in the syntax `Parser` accepts. The empty path is `$`.
pub(crate) fn format_segments(segments: &[PathSegment]) -> String {
    if segments.is_empty() {
        return "$".to_string();
    }
    let mut out = String::new();
    for segment in segments {
        match segment {
            PathSegment::Field(name) if is_identifier(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            PathSegment::Field(name) => {
                out.push_str("['");
                for c in name.chars() {
                    if c == '\'' || c == '\\' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push_str("']");
            }
            PathSegment::EachElement => out.push_str("[*]"),
            PathSegment::EachValue => out.push_str("{*}"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> PathSegment {
        PathSegment::Field(name.to_string())
    }

    #[test]
    fn test_display_plain_fields() {
        let spec = FieldSpec::new(vec![field("metadata"), field("annotations")]);
        assert_eq!(spec.to_string(), "metadata.annotations");
    }

    #[test]
    fn test_display_wildcards_and_quoted() {
        let spec = FieldSpec::new(vec![
            field("spec"),
            field("containers"),
            PathSegment::EachElement,
            field("env"),
            PathSegment::EachValue,
            field("app.kubernetes.io/name"),
        ]);
        assert_eq!(
            spec.to_string(),
            "spec.containers[*].env{*}['app.kubernetes.io/name']"
        );
    }

    #[test]
    fn test_display_empty_path() {
        assert_eq!(FieldSpec::new(vec![]).to_string(), "$");
    }

    #[test]
    fn test_validate_accepts_well_formed() {
        let spec = FieldSpec::new(vec![field("a"), PathSegment::EachElement]).with_create(NodeKind::Mapping);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_field() {
        let spec = FieldSpec::new(vec![field("a"), field("")]);
        assert!(matches!(
            spec.validate(),
            Err(Error::InvalidPathSpecification { .. })
        ));
    }
}
