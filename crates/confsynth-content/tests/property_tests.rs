use confsynth_content::path::split_key_path;
use confsynth_content::{ResolveOptions, Resolver, Value};
use proptest::prelude::*;
use serde_json::Value as JsonValue;

fn json_strategy() -> impl Strategy<Value = JsonValue> {
    let leaf = prop_oneof![
        Just(JsonValue::Null),
        any::<bool>().prop_map(JsonValue::from),
        any::<i64>().prop_map(JsonValue::from),
        "[a-z]{0,8}".prop_map(JsonValue::from),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(JsonValue::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| JsonValue::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn test_literal_trees_resolve_to_themselves(doc in json_strategy()) {
        let resolved = Resolver::new()
            .resolve(&Value::from(doc.clone()), ResolveOptions::default())
            .unwrap();
        prop_assert_eq!(resolved, Some(doc));
    }

    #[test]
    fn test_omit_empty_is_idempotent(doc in json_strategy()) {
        let resolver = Resolver::new();
        let once = resolver.resolve(&Value::from(doc), ResolveOptions::omit_empty()).unwrap();
        if let Some(once) = once {
            let twice = resolver
                .resolve(&Value::from(once.clone()), ResolveOptions::omit_empty())
                .unwrap();
            prop_assert_eq!(twice, Some(once));
        }
    }

    #[test]
    fn test_plain_segments_split_back(segments in prop::collection::vec("[a-z0-9_-]{1,8}", 1..6)) {
        let joined = segments.join(".");
        prop_assert_eq!(split_key_path(&joined).unwrap(), segments);
    }

    #[test]
    fn test_escaped_dots_survive(segments in prop::collection::vec("[a-z]{1,4}(\\.[a-z]{1,4})?", 1..5)) {
        let joined = segments
            .iter()
            .map(|s| s.replace('.', "\\."))
            .collect::<Vec<_>>()
            .join(".");
        prop_assert_eq!(split_key_path(&joined).unwrap(), segments);
    }
}
