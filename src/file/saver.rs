//! YAML file saving functionality.
//!
//! This module turns `YamlNode` trees back into block-style YAML and writes
//! them to disk with atomic write operations and optional backups.

use crate::config::Config;
use crate::document::node::{normalize_custom_tag, ScalarStyle, Tag, YamlNode, YamlScalar, YamlValue};
use crate::document::resolve::{is_yaml11_non_string, resolve_plain};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Saves YAML documents to a file with optional backup creation.
///
/// The documents are serialized with [`serialize_documents`], the output is
/// parsed again as a sanity check, and the result is written atomically
/// (temp file then rename) so the target is never left half written.
///
/// # Examples
///
/// ```no_run
/// use yamlstamp::config::Config;
/// use yamlstamp::document::node::YamlNode;
/// use yamlstamp::file::saver::save_yaml_file;
///
/// let docs = vec![YamlNode::document(YamlNode::mapping())];
/// save_yaml_file("output.yaml", &docs, &Config::default()).unwrap();
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - Backup creation fails (if requested)
/// - The generated YAML does not parse
/// - Writing or renaming the temp file fails
pub fn save_yaml_file<P: AsRef<Path>>(path: P, docs: &[YamlNode], config: &Config) -> Result<()> {
    let path = path.as_ref();

    if config.create_backup && path.exists() {
        create_backup(path)?;
    }

    let yaml = serialize_documents(docs, config.indent_size);

    // Catch emitter bugs before they reach the user's file
    for document in serde_yaml::Deserializer::from_str(&yaml) {
        serde_yaml::Value::deserialize(document)
            .context("Generated invalid YAML - this is a bug in yamlstamp's serialization")?;
    }

    write_file_atomic(path, yaml.as_bytes())?;
    log::debug!("saved {} documents to {}", docs.len(), path.display());
    Ok(())
}

/// Creates a backup of a file by copying it with a .bak extension.
fn create_backup<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let mut backup_path = path.to_path_buf();
    let original_name = backup_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name"))?;
    backup_path.set_file_name(format!("{}.bak", original_name));
    fs::copy(path, backup_path).context("Failed to create backup")?;
    Ok(())
}

/// Writes data to a temporary file, then renames it over the target.
fn write_file_atomic<P: AsRef<Path>>(path: P, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let temp_path = path.with_extension("tmp");

    fs::write(&temp_path, data).context("Failed to write temp file")?;
    fs::rename(&temp_path, path).context("Failed to rename temp file")?;

    Ok(())
}

/// Serializes documents, separating them with `---` lines.
pub fn serialize_documents(docs: &[YamlNode], indent_size: usize) -> String {
    docs.iter()
        .map(|doc| serialize_node(doc, indent_size))
        .collect::<Vec<_>>()
        .join("---\n")
}

/// Serializes a node as block-style YAML, ending with a newline.
///
/// Mappings are written as `key: value` lines and sequences as `- item`
/// lines; empty containers are written as `{}` and `[]`.
///
/// # Examples
///
/// ```
/// use yamlstamp::document::node::{Tag, YamlNode};
/// use yamlstamp::file::saver::serialize_node;
///
/// let node = YamlNode::from_entries([
///     ("name", YamlNode::string("web")),
///     ("replicas", YamlNode::scalar("3", Tag::Int)),
///     ("ports", YamlNode::sequence(vec![YamlNode::scalar("80", Tag::Int)])),
/// ]);
/// assert_eq!(serialize_node(&node, 2), "name: web\nreplicas: 3\nports:\n  - 80\n");
/// ```
pub fn serialize_node(node: &YamlNode, indent_size: usize) -> String {
    let indent = indent_size.max(1);
    let node = node.content();
    let mut out = String::new();
    if is_block_container(node) {
        write_block(&mut out, node, 0, indent, false);
    } else if let Some(scalar) = block_scalar(node) {
        write_literal(&mut out, scalar.text(), indent);
    } else {
        out.push_str(&inline_value(node));
        out.push('\n');
    }
    out
}

fn is_block_container(node: &YamlNode) -> bool {
    match node.value() {
        YamlValue::Mapping(entries) => !entries.is_empty(),
        YamlValue::Sequence(items) => !items.is_empty(),
        _ => false,
    }
}

/// Writes a non-empty mapping or sequence starting at column `col`. With
/// `inline` set the first line's indentation has already been written.
fn write_block(out: &mut String, node: &YamlNode, col: usize, indent: usize, inline: bool) {
    match node.value() {
        YamlValue::Mapping(entries) => {
            for (i, (key, value)) in entries.iter().enumerate() {
                if !(inline && i == 0) {
                    push_indent(out, col);
                }
                out.push_str(&format_key(key, value.key_style()));
                out.push(':');
                write_child(out, value.content(), col, indent);
            }
        }
        YamlValue::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                if !(inline && i == 0) {
                    push_indent(out, col);
                }
                out.push('-');
                let item = item.content();
                if is_block_container(item) {
                    // Nested entries line up after "- "
                    out.push(' ');
                    write_block(out, item, col + 2, indent, true);
                } else {
                    write_child(out, item, col, indent);
                }
            }
        }
        _ => {}
    }
}

/// Writes what follows a `key:` or `-` indicator at column `col`.
fn write_child(out: &mut String, node: &YamlNode, col: usize, indent: usize) {
    if node.as_scalar().is_some_and(|s| s.is_null() && s.text().is_empty()) {
        // A value that was left empty stays empty
        out.push('\n');
    } else if is_block_container(node) {
        out.push('\n');
        write_block(out, node, col + indent, indent, false);
    } else if let Some(scalar) = block_scalar(node) {
        out.push(' ');
        write_literal(out, scalar.text(), col + indent);
    } else {
        out.push(' ');
        out.push_str(&inline_value(node));
        out.push('\n');
    }
}

/// Returns the scalar when it should be written as a `|` block.
fn block_scalar(node: &YamlNode) -> Option<&YamlScalar> {
    let scalar = node.as_scalar()?;
    let wanted = matches!(scalar.style(), ScalarStyle::Literal | ScalarStyle::Folded);
    (wanted && scalar.tag().is_string() && is_block_safe(scalar.text())).then_some(scalar)
}

fn is_block_safe(text: &str) -> bool {
    text.contains('\n')
        && !text
            .chars()
            .any(|c| c.is_control() && c != '\n' && c != '\t')
        && text
            .lines()
            .find(|line| !line.is_empty())
            .is_some_and(|line| !line.starts_with([' ', '\t']))
}

/// Writes a literal block header and its lines indented to `col`.
fn write_literal(out: &mut String, text: &str, col: usize) {
    let (header, body) = if text.ends_with("\n\n") {
        ("|+", &text[..text.len() - 1])
    } else if let Some(body) = text.strip_suffix('\n') {
        ("|", body)
    } else {
        ("|-", text)
    };
    out.push_str(header);
    out.push('\n');
    for line in body.split('\n') {
        if !line.is_empty() {
            push_indent(out, col);
            out.push_str(line);
        }
        out.push('\n');
    }
}

fn push_indent(out: &mut String, col: usize) {
    out.extend(std::iter::repeat(' ').take(col));
}

fn inline_value(node: &YamlNode) -> String {
    match node.content().value() {
        YamlValue::Mapping(_) => "{}".to_string(),
        YamlValue::Sequence(_) => "[]".to_string(),
        YamlValue::Scalar(scalar) => format_scalar(scalar),
        YamlValue::Document(root) => inline_value(root),
    }
}

fn format_scalar(scalar: &YamlScalar) -> String {
    let text = scalar.text();
    match scalar.tag() {
        Tag::Str => format_string(text, scalar.style()),
        Tag::Null if resolve_plain(text) == Tag::Null && !text.is_empty() => text.to_string(),
        Tag::Null => "null".to_string(),
        Tag::Custom(tag) => format!(
            "{} {}",
            normalize_custom_tag(tag),
            format_string(text, scalar.style())
        ),
        Tag::Binary => format!("!!binary {}", format_string(text, scalar.style())),
        // Typed scalars are written as their text when that is safe
        _ if is_plain_safe(text) => text.to_string(),
        _ => double_quote(text),
    }
}

fn format_string(text: &str, style: ScalarStyle) -> String {
    match style {
        ScalarStyle::SingleQuoted if !text.contains('\n') => single_quote(text),
        ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted => double_quote(text),
        _ if needs_quotes(text) => double_quote(text),
        _ => text.to_string(),
    }
}

/// Keys read from a file keep their quoting; a plain key stays plain while
/// that is structurally safe. New keys are quoted like new string values.
fn format_key(key: &str, style: Option<ScalarStyle>) -> String {
    match style {
        Some(ScalarStyle::SingleQuoted) if !key.contains('\n') => single_quote(key),
        Some(ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted) => double_quote(key),
        Some(_) if is_plain_safe(key) => key.to_string(),
        _ if needs_quotes(key) => double_quote(key),
        _ => key.to_string(),
    }
}

/// True when text written plain would not read back as the same string.
fn needs_quotes(text: &str) -> bool {
    !is_plain_safe(text) || is_yaml11_non_string(text)
}

/// Checks the structural rules for a plain scalar in block context.
fn is_plain_safe(text: &str) -> bool {
    let Some(first) = text.chars().next() else {
        return false;
    };
    if text.trim() != text || text.chars().any(char::is_control) {
        return false;
    }
    if "?:,[]{}#&*!|>'\"%@`".contains(first) {
        return false;
    }
    if first == '-' && text.chars().nth(1).map_or(true, |c| c == ' ') {
        return false;
    }
    if text.starts_with("---") || text.starts_with("...") {
        return false;
    }
    !(text.contains(": ") || text.contains(" #") || text.ends_with(':'))
}

fn double_quote(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('"');
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => result.push_str("\\0"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

fn single_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
