//! Override, append and patch pipeline tests
//!
//! These drive the same sequence a structured file uses at synthesis time:
//! resolve the base object, merge the override tree, then apply patch batches.

use std::collections::BTreeMap;

use confsynth_content::merge::deep_merge;
use confsynth_content::patch::{JsonPatch, TestFailureBehavior, apply_batches};
use confsynth_content::path::{append_override, set_override, split_key_path};
use confsynth_content::{Error, ResolveOptions, Resolver, Value};
use pretty_assertions::assert_eq;
use serde_json::{Value as JsonValue, json};

struct Pipeline {
    obj: Value,
    overrides: BTreeMap<String, Value>,
    patches: Vec<Vec<JsonPatch>>,
}

impl Pipeline {
    fn new(obj: JsonValue) -> Self {
        Self {
            obj: Value::from(obj),
            overrides: BTreeMap::new(),
            patches: Vec::new(),
        }
    }

    fn set(&mut self, path: &str, value: impl Into<Value>) -> &mut Self {
        set_override(&mut self.overrides, &split_key_path(path).unwrap(), value.into());
        self
    }

    fn append(&mut self, path: &str, values: Vec<Value>) -> &mut Self {
        append_override(&mut self.overrides, &split_key_path(path).unwrap(), values);
        self
    }

    fn run(&self) -> confsynth_content::Result<JsonValue> {
        let resolver = Resolver::new();
        let mut doc = resolver
            .resolve(&self.obj, ResolveOptions::default())?
            .unwrap_or_else(|| json!({}));
        deep_merge(&mut doc, &self.overrides, &resolver)?;
        apply_batches(&mut doc, &self.patches)?;
        Ok(doc)
    }
}

#[test]
fn test_override_on_nested_path() {
    let mut p = Pipeline::new(json!({"a": {"b": 3}}));
    p.set("a.c", 4);
    assert_eq!(p.run().unwrap(), json!({"a": {"b": 3, "c": 4}}));
}

#[test]
fn test_deletion_override_prunes_empty_parent() {
    let mut p = Pipeline::new(json!({"a": {"b": 3}, "keep": 1}));
    p.set("a.b", Value::Undefined);
    assert_eq!(p.run().unwrap(), json!({"keep": 1}));
}

#[test]
fn test_escaped_dot_targets_literal_key() {
    let mut p = Pipeline::new(json!({"files": {}}));
    p.set(r"files.exclude.\.git", true);
    assert_eq!(
        p.run().unwrap(),
        json!({"files": {"exclude": {".git": true}}})
    );
}

#[test]
fn test_append_after_base_array() {
    let mut p = Pipeline::new(json!({"x": {"y": ["m"]}}));
    p.append("x.y", vec![Value::from("n")]);
    assert_eq!(p.run().unwrap(), json!({"x": {"y": ["m", "n"]}}));
}

#[test]
fn test_append_before_base_array_is_known() {
    // The override tree is built first; the base value is only set later.
    let mut p = Pipeline::new(json!({}));
    p.append("x.y", vec![Value::from("n")]);
    p.obj = Value::from(json!({"x": {"y": ["m"]}}));
    assert_eq!(p.run().unwrap(), json!({"x": {"y": ["m", "n"]}}));
}

#[test]
fn test_repeated_appends_keep_call_order() {
    let mut p = Pipeline::new(json!({"list": ["a"]}));
    p.append("list", vec![Value::from("b")]);
    p.append("list", vec![Value::from("c"), Value::from("d")]);
    assert_eq!(p.run().unwrap(), json!({"list": ["a", "b", "c", "d"]}));
}

#[test]
fn test_patch_applies_after_override() {
    let mut p = Pipeline::new(json!({}));
    p.set("a", 1);
    p.patches.push(vec![JsonPatch::replace("/a", 2)]);
    assert_eq!(p.run().unwrap(), json!({"a": 2}));
}

#[test]
fn test_patch_batches_apply_in_call_order() {
    let mut p = Pipeline::new(json!({"list": []}));
    p.patches.push(vec![JsonPatch::add("/list/-", 1)]);
    p.patches.push(vec![JsonPatch::add("/list/0", 0)]);
    assert_eq!(p.run().unwrap(), json!({"list": [0, 1]}));
}

#[test]
fn test_abort_test_fails_the_pipeline() {
    let mut p = Pipeline::new(json!({"version": 1}));
    p.patches.push(vec![JsonPatch::add("/ok", true)]);
    p.patches.push(vec![JsonPatch::test_with(
        "/version",
        2,
        TestFailureBehavior::Abort,
    )]);
    let err = p.run().unwrap_err();
    assert!(matches!(
        err,
        Error::PatchTestFailed { batch: 1, index: 0, .. }
    ));
}

#[test]
fn test_deferred_override_value_is_resolved() {
    let mut p = Pipeline::new(json!({}));
    p.set("lazy", Value::deferred(|| vec!["x"]));
    assert_eq!(p.run().unwrap(), json!({"lazy": ["x"]}));
}
