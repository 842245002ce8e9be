//! Resolution of object graphs into plain JSON
//!
//! The resolver walks a [`Value`] depth-first, evaluates deferred thunks and
//! recursively resolves what they return. Literal data passes through; the
//! omit-empty policy drops keys whose resolved value is an empty container.

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::value::Value;

/// Default bound on nested deferred evaluations.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Per-call resolution policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Drop keys resolving to `{}`, `[]` or undefined, and trailing array holes.
    pub omit_empty: bool,
}

impl ResolveOptions {
    pub fn omit_empty() -> Self {
        Self { omit_empty: true }
    }
}

/// Flattens [`Value`] trees into `serde_json::Value`.
///
/// Carries named arguments that deferred thunks can read through
/// [`ResolveContext::arg`]. Resolution has no side effects: resolving the
/// same tree twice with the same arguments yields the same result.
///
/// The depth bound counts nested deferred evaluations only. Literal object
/// and array nesting is walked without limit.
#[derive(Debug, Clone)]
pub struct Resolver {
    max_depth: usize,
    args: BTreeMap<String, JsonValue>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            args: BTreeMap::new(),
        }
    }
}

/// What a deferred thunk sees when it is evaluated.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    resolver: &'a Resolver,
    depth: usize,
}

impl<'a> ResolveContext<'a> {
    /// A named argument supplied to the resolver.
    pub fn arg(&self, key: &str) -> Option<&'a JsonValue> {
        self.resolver.args.get(key)
    }

    /// How many deferred evaluations enclose this one (1 for the outermost).
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Attach a named argument readable by deferred thunks.
    pub fn with_arg(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.args.insert(key.into(), value);
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn arg(&self, key: &str) -> Option<&JsonValue> {
        self.args.get(key)
    }

    /// Resolve a value tree.
    ///
    /// Returns `None` when the value is undefined, or when `omit_empty` is set
    /// and the whole tree resolves to an empty container.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DepthExceeded`] when deferred values keep producing
    /// deferred values beyond the configured depth.
    pub fn resolve(&self, value: &Value, options: ResolveOptions) -> Result<Option<JsonValue>> {
        let resolved = self.resolve_at(value, options, 0)?;
        if options.omit_empty && resolved.as_ref().is_some_and(is_empty_container) {
            return Ok(None);
        }
        Ok(resolved)
    }

    fn resolve_at(
        &self,
        value: &Value,
        options: ResolveOptions,
        depth: usize,
    ) -> Result<Option<JsonValue>> {
        match value {
            Value::Undefined => Ok(None),
            Value::Null => Ok(Some(JsonValue::Null)),
            Value::Bool(b) => Ok(Some(JsonValue::Bool(*b))),
            Value::Number(n) => Ok(Some(JsonValue::Number(n.clone()))),
            Value::String(s) => Ok(Some(JsonValue::String(s.clone()))),
            Value::Array(items) => {
                let mut resolved = items
                    .iter()
                    .map(|item| self.resolve_at(item, options, depth))
                    .collect::<Result<Vec<_>>>()?;
                if options.omit_empty {
                    while matches!(resolved.last(), Some(None)) {
                        resolved.pop();
                    }
                }
                Ok(Some(JsonValue::Array(
                    resolved
                        .into_iter()
                        .map(|item| item.unwrap_or(JsonValue::Null))
                        .collect(),
                )))
            }
            Value::Object(map) => {
                let mut resolved = Map::new();
                for (key, item) in map {
                    match self.resolve_at(item, options, depth)? {
                        None => {}
                        Some(v) if options.omit_empty && is_empty_container(&v) => {}
                        Some(v) => {
                            resolved.insert(key.clone(), v);
                        }
                    }
                }
                Ok(Some(JsonValue::Object(resolved)))
            }
            Value::Deferred(produce) => {
                if depth >= self.max_depth {
                    return Err(Error::DepthExceeded {
                        max_depth: self.max_depth,
                    });
                }
                let ctx = ResolveContext {
                    resolver: self,
                    depth: depth + 1,
                };
                let produced = produce(&ctx);
                self.resolve_at(&produced, options, depth + 1)
            }
        }
    }
}

fn is_empty_container(value: &JsonValue) -> bool {
    match value {
        JsonValue::Object(map) => map.is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_literals_pass_through() {
        let resolver = Resolver::new();
        let value = Value::from(json!({"a": [1, 2], "b": {"c": null}}));
        let resolved = resolver.resolve(&value, ResolveOptions::default()).unwrap();
        assert_eq!(resolved, Some(json!({"a": [1, 2], "b": {"c": null}})));
    }

    #[test]
    fn test_deferred_is_evaluated() {
        let resolver = Resolver::new();
        let value: Value = [("name".to_string(), Value::deferred(|| "lazy"))]
            .into_iter()
            .collect();
        let resolved = resolver.resolve(&value, ResolveOptions::default()).unwrap();
        assert_eq!(resolved, Some(json!({"name": "lazy"})));
    }

    #[test]
    fn test_deferred_returning_deferred_is_resolved_recursively() {
        let resolver = Resolver::new();
        let value = Value::deferred(|| Value::deferred(|| vec![Value::deferred(|| 3)]));
        let resolved = resolver.resolve(&value, ResolveOptions::default()).unwrap();
        assert_eq!(resolved, Some(json!([3])));
    }

    #[test]
    fn test_context_args_are_visible() {
        let resolver = Resolver::new().with_arg("version", json!("1.2.3"));
        let value = Value::deferred_with(|ctx: &ResolveContext<'_>| {
            Value::from(ctx.arg("version").cloned())
        });
        let resolved = resolver.resolve(&value, ResolveOptions::default()).unwrap();
        assert_eq!(resolved, Some(json!("1.2.3")));
    }

    #[test]
    fn test_undefined_keys_always_dropped() {
        let resolver = Resolver::new();
        let mut map = BTreeMap::new();
        map.insert("gone".to_string(), Value::Undefined);
        map.insert("kept".to_string(), Value::object());
        let resolved = resolver
            .resolve(&Value::Object(map), ResolveOptions::default())
            .unwrap();
        assert_eq!(resolved, Some(json!({"kept": {}})));
    }

    #[test]
    fn test_omit_empty_drops_empty_containers() {
        let resolver = Resolver::new();
        let value = Value::from(json!({"a": {}, "b": [], "c": {"d": {}}, "e": 0}));
        let resolved = resolver.resolve(&value, ResolveOptions::omit_empty()).unwrap();
        assert_eq!(resolved, Some(json!({"e": 0})));
    }

    #[test]
    fn test_omit_empty_top_level_empty_is_none() {
        let resolver = Resolver::new();
        let value = Value::from(json!({"a": {"b": []}}));
        assert_eq!(
            resolver.resolve(&value, ResolveOptions::omit_empty()).unwrap(),
            None
        );
    }

    #[test]
    fn test_array_holes() {
        let resolver = Resolver::new();
        let value = Value::Array(vec![
            Value::from(1),
            Value::Undefined,
            Value::from(2),
            Value::Undefined,
        ]);
        assert_eq!(
            resolver.resolve(&value, ResolveOptions::omit_empty()).unwrap(),
            Some(json!([1, null, 2]))
        );
        assert_eq!(
            resolver.resolve(&value, ResolveOptions::default()).unwrap(),
            Some(json!([1, null, 2, null]))
        );
    }

    fn chain(levels: usize) -> Value {
        (0..levels).fold(Value::from("leaf"), |inner, _| {
            Value::deferred(move || inner.clone())
        })
    }

    #[test]
    fn test_depth_bound_allows_chain_at_limit() {
        let resolver = Resolver::new();
        let resolved = resolver
            .resolve(&chain(DEFAULT_MAX_DEPTH), ResolveOptions::default())
            .unwrap();
        assert_eq!(resolved, Some(json!("leaf")));
    }

    #[test]
    fn test_depth_bound_rejects_longer_chain() {
        let resolver = Resolver::new();
        let err = resolver
            .resolve(&chain(DEFAULT_MAX_DEPTH + 1), ResolveOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::DepthExceeded { max_depth: 10 }));
        assert!(err.to_string().contains("resolution too deep"));
    }

    #[test]
    fn test_self_producing_thunk_is_rejected() {
        fn forever() -> Value {
            Value::deferred(forever)
        }
        let resolver = Resolver::new().with_max_depth(3);
        let err = resolver
            .resolve(&forever(), ResolveOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::DepthExceeded { max_depth: 3 }));
    }

    #[test]
    fn test_literal_nesting_is_not_depth_bounded() {
        let mut value = Value::from("leaf");
        let mut expected = json!("leaf");
        for _ in 0..32 {
            value = [("n".to_string(), value)].into_iter().collect();
            expected = json!({ "n": expected });
        }
        let resolver = Resolver::new().with_max_depth(1);
        let resolved = resolver.resolve(&value, ResolveOptions::default()).unwrap();
        assert_eq!(resolved, Some(expected));
    }
}
