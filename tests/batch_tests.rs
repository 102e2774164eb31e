//! Integration tests for applying key/value batches.

use yamlstamp::batch::{BatchApplier, KeyValueBatch};
use yamlstamp::document::node::{NodeKind, ScalarStyle, Tag, YamlNode};
use yamlstamp::fieldpath::FieldSpec;
use yamlstamp::file::loader::parse_yaml_documents;
use yamlstamp::setter::Setter;
use yamlstamp::Error;

fn annotations_spec() -> Vec<FieldSpec> {
    vec![FieldSpec::parse("metadata.annotations")
        .unwrap()
        .with_create(NodeKind::Mapping)]
}

fn keys(node: &YamlNode) -> Vec<String> {
    node.content().as_mapping().unwrap().keys().cloned().collect()
}

#[test]
fn test_batch_is_deterministic_across_insertion_order() {
    let specs = annotations_spec();
    let forward: KeyValueBatch = [("b", "2"), ("a", "1"), ("c", "3")].into_iter().collect();
    let backward: KeyValueBatch = [("c", "3"), ("a", "1"), ("b", "2")].into_iter().collect();

    let mut first = vec![YamlNode::mapping()];
    let mut second = vec![YamlNode::mapping()];
    BatchApplier::new(&forward, &specs).apply(&mut first).unwrap();
    BatchApplier::new(&backward, &specs).apply(&mut second).unwrap();

    assert_eq!(first, second);
    let annotations = first[0].get("metadata").and_then(|m| m.get("annotations")).unwrap();
    assert_eq!(keys(annotations), vec!["a", "b", "c"]);
}

#[test]
fn test_batch_is_idempotent() {
    let specs = annotations_spec();
    let batch: KeyValueBatch = [("team", "infra"), ("tier", "1")].into_iter().collect();

    let mut nodes = parse_yaml_documents("kind: Pod\nmetadata:\n  name: web\n").unwrap();
    BatchApplier::new(&batch, &specs).apply(&mut nodes).unwrap();
    let once = nodes.clone();
    BatchApplier::new(&batch, &specs).apply(&mut nodes).unwrap();

    assert_eq!(nodes, once);
}

#[test]
fn test_batch_quotes_ambiguous_strings_only_for_str_tag() {
    let specs = vec![FieldSpec::parse("$").unwrap()];
    let values = [("a", "true"), ("b", "123"), ("c", "null"), ("d", "2020-01-01")];

    let strings: KeyValueBatch = values.into_iter().collect();
    let mut nodes = vec![YamlNode::mapping()];
    BatchApplier::new(&strings, &specs).apply(&mut nodes).unwrap();
    for (key, _) in values {
        let scalar = nodes[0].get(key).and_then(YamlNode::as_scalar).unwrap();
        assert_eq!(scalar.style(), ScalarStyle::DoubleQuoted, "{}", key);
    }

    let mut ints = KeyValueBatch::new(Tag::Int);
    ints.insert("replicas", "123");
    let mut nodes = vec![YamlNode::mapping()];
    BatchApplier::new(&ints, &specs).apply(&mut nodes).unwrap();
    let scalar = nodes[0].get("replicas").and_then(YamlNode::as_scalar).unwrap();
    assert_eq!(scalar.style(), ScalarStyle::Plain);
    assert_eq!(scalar.tag(), &Tag::Int);
}

#[test]
fn test_batch_creates_missing_path() {
    let specs = vec![FieldSpec::parse("a.b").unwrap().with_create(NodeKind::Mapping)];
    let batch: KeyValueBatch = [("c", "v")].into_iter().collect();
    let mut nodes = vec![YamlNode::mapping()];

    BatchApplier::new(&batch, &specs).apply(&mut nodes).unwrap();

    let expected = YamlNode::from_entries([(
        "a",
        YamlNode::from_entries([("b", YamlNode::from_entries([("c", YamlNode::string("v"))]))]),
    )]);
    assert_eq!(nodes[0], expected);
}

#[test]
fn test_batch_fans_out_over_wildcard() {
    let specs = vec![FieldSpec::parse("*.label").unwrap().with_create(NodeKind::Mapping)];
    let batch: KeyValueBatch = [("k", "v")].into_iter().collect();
    let mut nodes = vec![YamlNode::sequence(vec![
        YamlNode::mapping(),
        YamlNode::mapping(),
        YamlNode::mapping(),
    ])];

    let mut calls = 0;
    {
        let setter = Setter::new().on_entry_set(|_| calls += 1);
        BatchApplier::new(&batch, &specs)
            .with_setter(setter)
            .apply(&mut nodes)
            .unwrap();
    }

    assert_eq!(calls, 3);
    for item in nodes[0].as_sequence().unwrap() {
        let value = item.get("label").and_then(|l| l.get("k")).unwrap();
        assert_eq!(value.as_scalar().unwrap().text(), "v");
    }
}

#[test]
fn test_batch_mismatch_leaves_scalar_unchanged() {
    let specs = vec![FieldSpec::parse("a.b").unwrap().with_create(NodeKind::Mapping)];
    let batch: KeyValueBatch = [("k", "v")].into_iter().collect();
    let mut nodes = vec![YamlNode::string("just text")];

    let err = BatchApplier::new(&batch, &specs).apply(&mut nodes).unwrap_err();

    assert_eq!(
        err,
        Error::PathTypeMismatch {
            path: "$".to_string(),
            expected: NodeKind::Mapping,
            found: NodeKind::Scalar,
        }
    );
    assert_eq!(nodes[0], YamlNode::string("just text"));
}

#[test]
fn test_batch_callback_fidelity() {
    let specs = annotations_spec();
    let mut batch = KeyValueBatch::new(Tag::Str);
    batch.insert("zone", "eu-1");
    batch.insert("app", "web");
    let mut nodes = vec![YamlNode::mapping()];

    let mut events = Vec::new();
    {
        let setter = Setter::new().on_entry_set(|event| {
            events.push((
                event.key.to_string(),
                event.value.to_string(),
                event.tag.clone(),
                event.node.as_mapping().map(|m| m.len()),
            ));
        });
        BatchApplier::new(&batch, &specs)
            .with_setter(setter)
            .apply(&mut nodes)
            .unwrap();
    }

    assert_eq!(
        events,
        vec![
            ("app".to_string(), "web".to_string(), Tag::Str, Some(0)),
            ("zone".to_string(), "eu-1".to_string(), Tag::Str, Some(1)),
        ]
    );
}

#[test]
fn test_batch_first_error_keeps_earlier_writes() {
    let specs = vec![FieldSpec::parse("meta").unwrap().with_create(NodeKind::Mapping)];
    let batch: KeyValueBatch = [("k", "v")].into_iter().collect();
    let mut nodes = vec![
        YamlNode::mapping(),
        YamlNode::from_entries([("meta", YamlNode::string("taken"))]),
        YamlNode::mapping(),
    ];

    let err = BatchApplier::new(&batch, &specs).apply(&mut nodes).unwrap_err();

    assert!(matches!(err, Error::TargetNotMapping { .. }));
    assert!(nodes[0].get("meta").and_then(|m| m.get("k")).is_some());
    assert!(nodes[2].get("meta").is_none());
}

#[test]
fn test_batch_without_create_skips_missing_fields() {
    let specs = vec![FieldSpec::parse("metadata.labels").unwrap()];
    let batch: KeyValueBatch = [("k", "v")].into_iter().collect();
    let mut nodes =
        parse_yaml_documents("metadata:\n  labels:\n    a: b\n---\nmetadata:\n  name: x\n").unwrap();

    let mut calls = 0;
    {
        let setter = Setter::new().on_entry_set(|_| calls += 1);
        BatchApplier::new(&batch, &specs)
            .with_setter(setter)
            .apply(&mut nodes)
            .unwrap();
    }

    assert_eq!(calls, 1);
    let labels = nodes[0].get("metadata").and_then(|m| m.get("labels")).unwrap();
    assert_eq!(keys(labels), vec!["a", "k"]);
    assert!(nodes[1].get("metadata").and_then(|m| m.get("labels")).is_none());
    assert!(!nodes[1].content().is_modified());
}
