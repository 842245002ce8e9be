//! Rendering tests for the format handlers

use confsynth_content::format::{Format, FormatHandler, handler_for};
use confsynth_content::handlers::{IniHandler, JsonHandler, TomlHandler, YamlHandler};
use confsynth_content::Error;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn config_doc() -> Value {
    json!({
        "root": "true",
        "tags": ["a", "b"],
        "core": {"editor": "vim", "autocrlf": false},
        "remote": {"origin": {"url": "https://example.com/r.git"}},
        "a.b": {"c": 1}
    })
}

#[test]
fn test_ini_layout() {
    let out = IniHandler::new().render(&config_doc(), None).unwrap();
    insta::assert_snapshot!(out, @r###"
    root = true
    tags[] = a
    tags[] = b

    [a\.b]
    c = 1

    [core]
    autocrlf = false
    editor = vim

    [remote.origin]
    url = https://example.com/r.git
    "###);
}

#[test]
fn test_ini_marker_header() {
    let out = IniHandler::new()
        .render(&json!({"s": {"k": "v"}}), Some("generated"))
        .unwrap();
    assert_eq!(out, "# generated\n\n[s]\nk = v\n");
}

#[test]
fn test_ini_rejects_nested_arrays() {
    let err = IniHandler::new()
        .render(&json!({"matrix": [[1, 2], [3]]}), None)
        .unwrap_err();
    assert!(err.is_format_error());
    match err {
        Error::Unrepresentable { path, .. } => assert_eq!(path, "matrix[0]"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_ini_rejects_empty_containers() {
    let handler = IniHandler::new();
    for (doc, expected) in [
        (json!({"keep": 1, "plugins": []}), "plugins"),
        (json!({"keep": 1, "s": {}}), "s"),
        (json!({"outer": {"inner": {}}}), "outer.inner"),
    ] {
        let err = handler.render(&doc, None).unwrap_err();
        assert!(err.is_format_error());
        match err {
            Error::Unrepresentable { path, .. } => assert_eq!(path, expected),
            other => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(handler.render(&json!({}), None).unwrap(), "");
}

#[test]
fn test_ini_rejects_objects_in_arrays() {
    let err = IniHandler::new()
        .render(&json!({"list": [{"a": 1}]}), None)
        .unwrap_err();
    assert!(err.is_format_error());
}

#[test]
fn test_yaml_workflow_snapshot() {
    let doc = json!({
        "name": "build",
        "on": {"push": {"branches": ["main"]}},
        "jobs": {"build": {"runs-on": "ubuntu-latest", "steps": [{"run": "make"}]}}
    });
    let out = YamlHandler::new().render(&doc, Some("generated")).unwrap();
    assert!(out.starts_with("# generated\n\n"));

    let parsed: Value = serde_yaml::from_str(&out).unwrap();
    assert_eq!(parsed, doc);

    let jobs = out.find("jobs:").unwrap();
    let name = out.find("name:").unwrap();
    assert!(jobs < name, "keys must be sorted");
}

#[test]
fn test_toml_nested_tables() {
    let doc = json!({
        "tool": {"black": {"line-length": 88}},
        "project": {"name": "demo", "dependencies": ["requests>=2"]}
    });
    let out = TomlHandler::new().render(&doc, None).unwrap();
    let parsed: toml::Table = toml::from_str(&out).unwrap();
    assert_eq!(parsed["project"]["name"].as_str(), Some("demo"));
    assert_eq!(
        parsed["project"]["dependencies"][0].as_str(),
        Some("requests>=2")
    );
    assert_eq!(parsed["tool"]["black"]["line-length"].as_integer(), Some(88));
}

#[test]
fn test_json_differently_ordered_input_is_byte_identical() {
    let handler = JsonHandler::new();
    let a: Value = serde_json::from_str(r#"{"b":1,"a":{"y":2,"x":[3,{"q":1,"p":2}]}}"#).unwrap();
    let b: Value = serde_json::from_str(r#"{"a":{"x":[3,{"p":2,"q":1}],"y":2},"b":1}"#).unwrap();
    assert_eq!(
        handler.render(&a, Some("m")).unwrap(),
        handler.render(&b, Some("m")).unwrap()
    );
}

#[test]
fn test_json_render_is_stable_on_reparse() {
    let handler = JsonHandler::new();
    let first = handler.render(&json!({"z": 1, "a": [1, 2]}), None).unwrap();
    let reparsed: Value = serde_json::from_str(&first).unwrap();
    let second = handler.render(&reparsed, None).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_every_format_is_deterministic() {
    let doc = json!({"section": {"b": "x", "a": "y"}, "top": "z"});
    for format in [Format::Json, Format::Yaml, Format::Toml, Format::Ini] {
        let handler = handler_for(format);
        assert_eq!(
            handler.render(&doc, Some("m")).unwrap(),
            handler.render(&doc, Some("m")).unwrap(),
            "{format} output differs between runs"
        );
    }
}
