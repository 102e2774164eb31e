//! YAML file loading functionality.
//!
//! This module reads YAML text from files or stdin and converts every
//! document in it into a `YamlNode` tree the matcher can walk.
//!
//! Trees are built from the parser's event stream, so every scalar keeps the
//! text and quoting it was written with. A plain scalar gets the tag YAML 1.1
//! resolution gives its text; quoted and block scalars are strings unless
//! they carry an explicit tag.

use crate::document::node::{ScalarStyle, Tag, YamlNode, YamlScalar, YamlValue};
use crate::document::resolve::resolve_plain;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, ScanError, TScalarStyle};

/// Parses every `---` separated document in `content`.
///
/// Each document becomes a `Document` node. Nothing in the returned trees is
/// marked as modified. Aliases are expanded into copies of the node they
/// refer to.
///
/// # Examples
///
/// ```
/// use yamlstamp::document::node::{ScalarStyle, Tag};
/// use yamlstamp::file::loader::parse_yaml_documents;
///
/// let docs = parse_yaml_documents("a: 0x1F\n---\nb: 'yes'\n").unwrap();
/// assert_eq!(docs.len(), 2);
///
/// let a = docs[0].get("a").and_then(|a| a.as_scalar()).unwrap();
/// assert_eq!((a.text(), a.tag()), ("0x1F", &Tag::Int));
/// let b = docs[1].get("b").and_then(|b| b.as_scalar()).unwrap();
/// assert_eq!(b.style(), ScalarStyle::SingleQuoted);
/// ```
pub fn parse_yaml_documents(content: &str) -> Result<Vec<YamlNode>> {
    let mut builder = TreeBuilder::new(content);
    let result = Parser::new_from_str(content)
        .load(&mut builder, true)
        .and_then(|()| builder.error.take().map_or(Ok(()), Err));

    match result {
        Ok(()) => {
            log::debug!("parsed {} YAML documents", builder.documents.len());
            Ok(builder.documents)
        }
        Err(err) => Err(anyhow::Error::new(err).context(format!(
            "Failed to parse YAML document {}",
            builder.documents.len() + 1
        ))),
    }
}

/// Loads and parses a YAML file from the filesystem.
///
/// # Examples
///
/// ```no_run
/// use yamlstamp::file::loader::load_yaml_file;
///
/// let docs = load_yaml_file("deployment.yaml").unwrap();
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - The file cannot be read (missing, permissions, not UTF-8)
/// - Any document in the file is not valid YAML
pub fn load_yaml_file<P: AsRef<Path>>(path: P) -> Result<Vec<YamlNode>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file {}", path.display()))?;
    parse_yaml_documents(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Loads YAML documents from stdin.
pub fn load_yaml_from_stdin() -> Result<Vec<YamlNode>> {
    let mut content = String::new();
    std::io::stdin()
        .read_to_string(&mut content)
        .context("Failed to read from stdin")?;
    parse_yaml_documents(&content)
}

/// A collection that is still receiving children.
enum Frame {
    Sequence(Vec<YamlNode>),
    Mapping {
        entries: IndexMap<String, YamlNode>,
        /// Text and style of a key still waiting for its value
        key: Option<(String, ScalarStyle)>,
    },
}

/// Assembles node trees from parser events, one document at a time.
struct TreeBuilder<'a> {
    source: &'a str,
    documents: Vec<YamlNode>,
    /// Open collections with their anchor ids, innermost last
    stack: Vec<(Frame, usize)>,
    root: Option<YamlNode>,
    anchors: HashMap<usize, YamlNode>,
    error: Option<ScanError>,
}

impl MarkedEventReceiver for TreeBuilder<'_> {
    fn on_event(&mut self, event: Event, mark: Marker) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.handle(event, mark) {
            self.error = Some(err);
        }
    }
}

impl<'a> TreeBuilder<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            documents: Vec::new(),
            stack: Vec::new(),
            root: None,
            anchors: HashMap::new(),
            error: None,
        }
    }

    fn handle(&mut self, event: Event, mark: Marker) -> Result<(), ScanError> {
        match event {
            Event::DocumentEnd => {
                let root = self.root.take().unwrap_or_else(|| {
                    YamlNode::unmodified(YamlValue::Scalar(YamlScalar::new("", Tag::Null)))
                });
                self.documents
                    .push(YamlNode::unmodified(YamlValue::Document(Box::new(root))));
            }
            // Collection tags are not kept
            Event::SequenceStart(anchor, _) => {
                self.stack.push((Frame::Sequence(Vec::new()), anchor));
            }
            Event::MappingStart(anchor, _) => {
                let frame = Frame::Mapping {
                    entries: IndexMap::new(),
                    key: None,
                };
                self.stack.push((frame, anchor));
            }
            Event::SequenceEnd | Event::MappingEnd => {
                let Some((frame, anchor)) = self.stack.pop() else {
                    return Err(ScanError::new(mark, "collection end without a start"));
                };
                let value = match frame {
                    Frame::Sequence(items) => YamlValue::Sequence(items),
                    Frame::Mapping { entries, .. } => YamlValue::Mapping(entries),
                };
                self.insert(YamlNode::unmodified(value), anchor, mark)?;
            }
            Event::Scalar(text, style, anchor, tag) => {
                let tag = tag.map(|tag| format!("{}{}", tag.handle, tag.suffix));
                let scalar = self.scalar(text, style, tag.as_deref(), mark);
                self.insert(YamlNode::unmodified(YamlValue::Scalar(scalar)), anchor, mark)?;
            }
            Event::Alias(id) => {
                let node = self
                    .anchors
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| ScanError::new(mark, "alias to an unknown anchor"))?;
                self.insert(node, 0, mark)?;
            }
            Event::DocumentStart | Event::StreamStart | Event::StreamEnd | Event::Nothing => {}
        }
        Ok(())
    }

    fn scalar(
        &self,
        text: String,
        style: TScalarStyle,
        tag: Option<&str>,
        mark: Marker,
    ) -> YamlScalar {
        let style = match style {
            TScalarStyle::Plain => ScalarStyle::Plain,
            TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
            TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
            TScalarStyle::Literal => ScalarStyle::Literal,
            TScalarStyle::Folded => ScalarStyle::Folded,
        };
        // The parser reports a missing value as "~"; the source tells them apart
        let text = if style == ScalarStyle::Plain
            && text == "~"
            && self.source.chars().nth(mark.index()) != Some('~')
        {
            String::new()
        } else {
            text
        };
        let tag = match tag {
            Some(tag) => tag.parse::<Tag>().unwrap_or_else(|never| match never {}),
            None if style == ScalarStyle::Plain => resolve_plain(&text),
            None => Tag::Str,
        };
        YamlScalar::new(text, tag).with_style(style)
    }

    fn insert(&mut self, node: YamlNode, anchor: usize, mark: Marker) -> Result<(), ScanError> {
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
        match self.stack.last_mut() {
            None => self.root = Some(node),
            Some((Frame::Sequence(items), _)) => items.push(node.with_key_style(None)),
            Some((Frame::Mapping { entries, key }, _)) => match key.take() {
                None => *key = Some(mapping_key(node, mark)?),
                Some((name, style)) => {
                    if entries.contains_key(&name) {
                        return Err(ScanError::new_string(
                            mark,
                            format!("duplicate mapping key {:?}", name),
                        ));
                    }
                    entries.insert(name, node.with_key_style(Some(style)));
                }
            },
        }
        Ok(())
    }
}

/// Mapping keys are kept as text, so only scalar keys are accepted.
fn mapping_key(node: YamlNode, mark: Marker) -> Result<(String, ScalarStyle), ScanError> {
    match node.value {
        YamlValue::Scalar(scalar) => Ok((scalar.text().to_string(), scalar.style())),
        other => Err(ScanError::new_string(
            mark,
            format!("a {} cannot be used as a mapping key", other.kind()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::node::NodeKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn scalar<'n>(node: &'n YamlNode, key: &str) -> &'n YamlScalar {
        node.get(key).and_then(YamlNode::as_scalar).unwrap()
    }

    #[test]
    fn test_parse_keeps_mapping_order() {
        let docs = parse_yaml_documents("zeta: 1\nalpha: 2\nmid: 3\n").unwrap();
        let keys: Vec<&str> = docs[0]
            .content()
            .as_mapping()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_parse_scalar_tags() {
        let docs =
            parse_yaml_documents("i: 3\nf: 1.5\nb: true\nn: ~\ns: hello\nq: 'yes'\n").unwrap();
        let doc = &docs[0];
        assert_eq!(scalar(doc, "i").tag(), &Tag::Int);
        assert_eq!(scalar(doc, "f").tag(), &Tag::Float);
        assert_eq!(scalar(doc, "b").tag(), &Tag::Bool);
        assert_eq!(scalar(doc, "n").tag(), &Tag::Null);
        assert_eq!(scalar(doc, "s").style(), ScalarStyle::Plain);
        assert_eq!(scalar(doc, "q").tag(), &Tag::Str);
        assert_eq!(scalar(doc, "q").style(), ScalarStyle::SingleQuoted);
    }

    #[test]
    fn test_parse_keeps_original_spelling() {
        let docs =
            parse_yaml_documents("replicas: 0x1F\nversion: 1.10\nwhen: 2020-01-01\non: push\n")
                .unwrap();
        let doc = &docs[0];
        assert_eq!(scalar(doc, "replicas").text(), "0x1F");
        assert_eq!(scalar(doc, "replicas").tag(), &Tag::Int);
        assert_eq!(scalar(doc, "version").text(), "1.10");
        assert_eq!(scalar(doc, "version").tag(), &Tag::Float);
        assert_eq!(scalar(doc, "when").tag(), &Tag::Timestamp);
        assert_eq!(scalar(doc, "on").text(), "push");
        assert_eq!(doc.get("on").unwrap().key_style(), Some(ScalarStyle::Plain));
    }

    #[test]
    fn test_parse_quoted_and_block_scalars_are_strings() {
        let docs = parse_yaml_documents("a: \"123\"\nb: |\n  true\nc: !!int \"7\"\n").unwrap();
        let doc = &docs[0];
        assert_eq!(scalar(doc, "a").tag(), &Tag::Str);
        assert_eq!(scalar(doc, "a").style(), ScalarStyle::DoubleQuoted);
        assert_eq!(scalar(doc, "b").text(), "true\n");
        assert_eq!(scalar(doc, "b").tag(), &Tag::Str);
        assert_eq!(scalar(doc, "c").tag(), &Tag::Int);
    }

    #[test]
    fn test_parse_empty_value_is_empty_null() {
        let docs = parse_yaml_documents("labels:\nexplicit: ~\n").unwrap();
        let empty = scalar(&docs[0], "labels");
        assert_eq!((empty.text(), empty.tag()), ("", &Tag::Null));
        let explicit = scalar(&docs[0], "explicit");
        assert_eq!((explicit.text(), explicit.tag()), ("~", &Tag::Null));
    }

    #[test]
    fn test_parse_expands_aliases() {
        let docs = parse_yaml_documents("base: &base\n  app: web\ncopy: *base\n").unwrap();
        assert_eq!(docs[0].get("copy"), docs[0].get("base"));
    }

    #[test]
    fn test_parse_rejects_duplicate_keys() {
        let err = parse_yaml_documents("a: 1\na: 2\n").unwrap_err();
        assert!(format!("{:#}", err).contains("duplicate mapping key"));
    }

    #[test]
    fn test_parse_rejects_collection_keys() {
        assert!(parse_yaml_documents("? [a, b]\n: v\n").is_err());
    }

    #[test]
    fn test_parse_wraps_each_document() {
        let docs = parse_yaml_documents("- a\n- b\n---\nkey: value\n").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].kind(), NodeKind::Document);
        assert_eq!(docs[0].content().kind(), NodeKind::Sequence);
        assert!(!docs[0].is_modified());
        assert!(!docs[1].content().is_modified());
    }

    #[test]
    fn test_parse_custom_scalar_tag() {
        let docs = parse_yaml_documents(
            "secret: !vault abc\nuri: !<tag:example.com,2000:app> x\nforced: ! 12\n",
        )
        .unwrap();
        assert_eq!(
            scalar(&docs[0], "secret").tag(),
            &Tag::Custom("!vault".to_string())
        );
        assert_eq!(
            scalar(&docs[0], "uri").tag(),
            &Tag::Custom("!<tag:example.com,2000:app>".to_string())
        );
        assert_eq!(scalar(&docs[0], "forced").tag(), &Tag::Str);
    }

    #[test]
    fn test_parse_invalid_yaml_fails() {
        assert!(parse_yaml_documents("a: [1, 2\n").is_err());
    }

    #[test]
    fn test_load_yaml_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "metadata:\n  name: web\n").unwrap();
        let docs = load_yaml_file(file.path()).unwrap();
        let name = docs[0].get("metadata").and_then(|m| m.get("name")).unwrap();
        assert_eq!(name.as_scalar().unwrap().text(), "web");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_yaml_file(dir.path().join("missing.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }
}
