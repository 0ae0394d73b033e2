//! Document processing against a configuration schema
//!
//! Processing runs in three passes, the same way for every node kind:
//! each raw document is normalized, the normalized documents are merged in
//! order, and the merged value is finalized (defaults, required and
//! constraint checks).

use crate::schema::{ConfigurationSchema, NodeKind, OptionNode, ENABLED_KEY};
use serde_json::{Map, Value};
use tracing::debug;
use types::{describe_value, SchemaError};

type Result<T> = std::result::Result<T, SchemaError>;

/// Validates and merges configuration documents against a schema
pub struct Processor;

impl Processor {
    /// Process documents in order; later documents override earlier ones.
    /// With no documents the result holds only the defaults.
    pub fn process(schema: &ConfigurationSchema, documents: &[Value]) -> Result<Value> {
        let root = schema.root();
        let path = root.name.clone();

        let mut merged: Option<Value> = None;
        for document in documents {
            let normalized = normalize(root, document, &path)?;
            merged = Some(match merged {
                Some(previous) => merge(root, previous, normalized),
                None => normalized,
            });
        }

        debug!(
            root = %path,
            documents = documents.len(),
            "finalizing configuration"
        );

        Ok(finalize(root, merged, &path)?.unwrap_or_else(|| Value::Object(Map::new())))
    }

    /// Process a single document
    pub fn process_one(schema: &ConfigurationSchema, document: &Value) -> Result<Value> {
        Self::process(schema, std::slice::from_ref(document))
    }
}

fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn invalid_type(path: &str, expected: &str, value: &Value) -> SchemaError {
    SchemaError::InvalidType {
        path: path.to_string(),
        expected: expected.to_string(),
        actual: describe_value(value),
    }
}

/// Rewrite `-` to `_` in keys, unless the underscored key is also present
fn normalize_key<'a>(key: &'a str, map: &Map<String, Value>) -> std::borrow::Cow<'a, str> {
    if key.contains('-') {
        let underscored = key.replace('-', "_");
        if !map.contains_key(&underscored) {
            return std::borrow::Cow::Owned(underscored);
        }
    }
    std::borrow::Cow::Borrowed(key)
}

fn normalize(node: &OptionNode, value: &Value, path: &str) -> Result<Value> {
    match &node.kind {
        NodeKind::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::Null if node.nullable => Ok(Value::Null),
            _ => Err(invalid_type(path, "bool", value)),
        },
        NodeKind::Scalar | NodeKind::Enum { .. } => match value {
            Value::Array(_) | Value::Object(_) => Err(invalid_type(path, "scalar", value)),
            _ => Ok(value.clone()),
        },
        NodeKind::Variable => Ok(value.clone()),
        NodeKind::Object {
            children,
            toggle,
            normalize_keys,
            ..
        } => {
            let expanded;
            let value = match (toggle, value) {
                (Some(_), Value::Bool(enabled)) => {
                    expanded = toggle_shorthand(*enabled);
                    &expanded
                }
                (Some(_), Value::Null) => {
                    expanded = toggle_shorthand(true);
                    &expanded
                }
                _ => value,
            };

            let input = match value {
                Value::Object(map) => map,
                Value::Null => return Ok(Value::Object(Map::new())),
                _ => return Err(invalid_type(path, "array", value)),
            };

            let mut output = Map::new();
            for (raw_key, child_value) in input {
                let key = if *normalize_keys {
                    normalize_key(raw_key, input)
                } else {
                    std::borrow::Cow::Borrowed(raw_key.as_str())
                };
                let child = children.iter().find(|c| c.name == key).ok_or_else(|| {
                    SchemaError::UnrecognizedOption {
                        path: path.to_string(),
                        key: key.to_string(),
                        known: children.iter().map(|c| format!("\"{}\"", c.name)).collect(),
                    }
                })?;
                let normalized = normalize(child, child_value, &child_path(path, &key))?;
                output.insert(key.into_owned(), normalized);
            }

            // A present section switches a toggled object on
            if toggle.is_some() && !output.contains_key(ENABLED_KEY) {
                output.insert(ENABLED_KEY.to_string(), Value::Bool(true));
            }

            Ok(Value::Object(output))
        }
        NodeKind::Prototyped {
            prototype,
            key_attribute,
            normalize_keys,
        } => {
            let mut output = Map::new();
            match value {
                Value::Null => {}
                Value::Object(map) => {
                    for (raw_key, item) in map {
                        let key = if *normalize_keys {
                            normalize_key(raw_key, map).into_owned()
                        } else {
                            raw_key.clone()
                        };
                        let normalized = normalize(prototype, item, &child_path(path, &key))?;
                        output.insert(key, normalized);
                    }
                }
                Value::Array(items) => {
                    let attribute = key_attribute
                        .as_deref()
                        .ok_or_else(|| invalid_type(path, "map", value))?;
                    let unwrap_value = !matches!(prototype.kind, NodeKind::Object { .. });
                    for (index, item) in items.iter().enumerate() {
                        let item_path = child_path(path, &index.to_string());
                        let (key, rest) = split_key_attribute(item, attribute, unwrap_value, &item_path)?;
                        let normalized = normalize(prototype, &rest, &child_path(path, &key))?;
                        output.insert(key, normalized);
                    }
                }
                _ => return Err(invalid_type(path, "array", value)),
            }
            Ok(Value::Object(output))
        }
        NodeKind::List { prototype } => match value {
            Value::Null => Ok(Value::Array(Vec::new())),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| normalize(prototype, item, &child_path(path, &index.to_string())))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Value::Object(_) => Err(invalid_type(path, "array", value)),
            scalar => Ok(Value::Array(vec![normalize(prototype, scalar, &child_path(path, "0"))?])),
        },
    }
}

fn toggle_shorthand(enabled: bool) -> Value {
    let mut map = Map::new();
    map.insert(ENABLED_KEY.to_string(), Value::Bool(enabled));
    Value::Object(map)
}

/// Pull the key attribute out of a list entry of a keyed map.
/// With `unwrap_value`, an entry left with a single `value` key yields that value.
fn split_key_attribute(item: &Value, attribute: &str, unwrap_value: bool, path: &str) -> Result<(String, Value)> {
    let map = match item {
        Value::Object(map) => map,
        _ => return Err(invalid_type(path, "array", item)),
    };

    let key = match map.get(attribute) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            return Err(SchemaError::MissingKeyAttribute {
                path: path.to_string(),
                attribute: attribute.to_string(),
            })
        }
    };

    let mut rest: Map<String, Value> = map
        .iter()
        .filter(|(k, _)| k.as_str() != attribute)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if unwrap_value && rest.len() == 1 {
        if let Some(value) = rest.remove("value") {
            return Ok((key, value));
        }
    }

    Ok((key, Value::Object(rest)))
}

fn merge(node: &OptionNode, left: Value, right: Value) -> Value {
    match (&node.kind, left, right) {
        (NodeKind::Object { children, .. }, Value::Object(mut left), Value::Object(right)) => {
            for (key, value) in right {
                let merged = match (left.remove_entry_in_place(&key), children.iter().find(|c| c.name == key)) {
                    (Some(previous), Some(child)) => merge(child, previous, value),
                    _ => value,
                };
                left.insert(key, merged);
            }
            Value::Object(left)
        }
        (NodeKind::Prototyped { prototype, .. }, Value::Object(mut left), Value::Object(right)) => {
            for (key, value) in right {
                let merged = match left.remove_entry_in_place(&key) {
                    Some(previous) => merge(prototype, previous, value),
                    None => value,
                };
                left.insert(key, merged);
            }
            Value::Object(left)
        }
        (NodeKind::List { .. }, Value::Array(mut left), Value::Array(right)) => {
            left.extend(right);
            Value::Array(left)
        }
        (_, _, right) => right,
    }
}

/// Take a value out of an ordered map while keeping the key's slot, so that
/// the following insert lands at the original position.
trait TakeInPlace {
    fn remove_entry_in_place(&mut self, key: &str) -> Option<Value>;
}

impl TakeInPlace for Map<String, Value> {
    fn remove_entry_in_place(&mut self, key: &str) -> Option<Value> {
        self.get_mut(key).map(Value::take)
    }
}

fn finalize(node: &OptionNode, value: Option<Value>, path: &str) -> Result<Option<Value>> {
    match &node.kind {
        NodeKind::Object {
            children,
            defaults_if_unset,
            ..
        } => {
            let mut input = match value {
                Some(Value::Object(map)) => map,
                Some(other) => return Err(invalid_type(path, "array", &other)),
                None if *defaults_if_unset => Map::new(),
                None => return Ok(None),
            };

            let mut output = Map::new();
            for child in children {
                let child_value = input.remove(&child.name);
                if child_value.is_none() && child.required {
                    return Err(SchemaError::MissingRequired {
                        path: path.to_string(),
                        name: child.name.clone(),
                    });
                }
                if let Some(finalized) = finalize(child, child_value, &child_path(path, &child.name))? {
                    output.insert(child.name.clone(), finalized);
                }
            }
            Ok(Some(Value::Object(output)))
        }
        NodeKind::Prototyped { prototype, .. } => {
            let input = match value {
                Some(Value::Object(map)) => map,
                Some(other) => return Err(invalid_type(path, "array", &other)),
                None => Map::new(),
            };
            if node.cannot_be_empty && input.is_empty() {
                return Err(empty_value(path, &Value::Object(input)));
            }

            let mut output = Map::new();
            for (key, item) in input {
                let item_path = child_path(path, &key);
                if let Some(finalized) = finalize(prototype, Some(item), &item_path)? {
                    output.insert(key, finalized);
                }
            }
            Ok(Some(Value::Object(output)))
        }
        NodeKind::List { prototype } => {
            let input = match value {
                Some(Value::Array(items)) => items,
                Some(other) => return Err(invalid_type(path, "array", &other)),
                None => Vec::new(),
            };
            if node.cannot_be_empty && input.is_empty() {
                return Err(empty_value(path, &Value::Array(input)));
            }

            let mut output = Vec::with_capacity(input.len());
            for (index, item) in input.into_iter().enumerate() {
                if let Some(finalized) = finalize(prototype, Some(item), &child_path(path, &index.to_string()))? {
                    output.push(finalized);
                }
            }
            Ok(Some(Value::Array(output)))
        }
        NodeKind::Boolean | NodeKind::Scalar | NodeKind::Enum { .. } | NodeKind::Variable => {
            // Defaults are taken as declared, without validation
            let value = match value {
                Some(value) => value,
                None => return Ok(node.default.clone()),
            };

            if node.cannot_be_empty && is_empty(&value) {
                return Err(empty_value(path, &value));
            }

            if let NodeKind::Enum { values } = &node.kind {
                let allowed = match &value {
                    Value::String(s) => values.iter().any(|v| v == s),
                    Value::Null => node.nullable,
                    _ => false,
                };
                if !allowed {
                    return Err(SchemaError::InvalidEnumValue {
                        path: path.to_string(),
                        value: value.to_string(),
                        allowed: values.iter().map(|v| format!("\"{}\"", v)).collect(),
                    });
                }
            }

            Ok(Some(value))
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn empty_value(path: &str, value: &Value) -> SchemaError {
    SchemaError::EmptyValue {
        path: path.to_string(),
        value: describe_value(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ROOT_NAME;
    use serde_json::json;

    fn schema() -> ConfigurationSchema {
        ConfigurationSchema::new(
            OptionNode::object(ROOT_NAME)
                .defaults_if_unset()
                .child(OptionNode::scalar("output_prefix").default_value("assets"))
                .child(OptionNode::boolean("native_npm").default_true())
                .child(OptionNode::scalar("fallback_locale").default_null())
                .child(
                    OptionNode::object("webpack")
                        .can_be_enabled()
                        .child(
                            OptionNode::enumeration("adapter", ["auto", "manifest", "assets"])
                                .default_value("auto")
                                .cannot_be_empty(),
                        )
                        .child(
                            OptionNode::object("cache")
                                .defaults_if_unset()
                                .child(OptionNode::boolean("enabled").default_null()),
                        ),
                )
                .child(
                    OptionNode::map("output_rewrites", OptionNode::variable(""))
                        .use_attribute_as_key("name")
                        .normalize_keys(false),
                )
                .child(OptionNode::map("asset_replacement", OptionNode::scalar("")).normalize_keys(false))
                .child(
                    OptionNode::map(
                        "packages",
                        OptionNode::object("")
                            .child(OptionNode::scalar("source_path").required())
                            .child(OptionNode::scalar_list("patterns")),
                    )
                    .use_attribute_as_key("name"),
                ),
        )
    }

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = Processor::process(&schema(), &[json!({})]).unwrap();
        assert_eq!(config["output_prefix"], "assets");
        assert_eq!(config["native_npm"], true);
        assert_eq!(config["fallback_locale"], Value::Null);
        assert_eq!(config["webpack"]["enabled"], false);
        assert_eq!(config["webpack"]["adapter"], "auto");
        assert_eq!(config["webpack"]["cache"]["enabled"], Value::Null);
        assert_eq!(config["output_rewrites"], json!({}));
        assert_eq!(config["packages"], json!({}));
    }

    #[test]
    fn test_no_documents_equals_empty_document() {
        let s = schema();
        assert_eq!(
            Processor::process(&s, &[]).unwrap(),
            Processor::process(&s, &[json!({})]).unwrap()
        );
    }

    #[test]
    fn test_toggle_shorthands() {
        let s = schema();
        let config = Processor::process_one(&s, &json!({"webpack": true})).unwrap();
        assert_eq!(config["webpack"]["enabled"], true);

        let config = Processor::process_one(&s, &json!({"webpack": null})).unwrap();
        assert_eq!(config["webpack"]["enabled"], true);

        let config = Processor::process_one(&s, &json!({"webpack": {"adapter": "assets"}})).unwrap();
        assert_eq!(config["webpack"]["enabled"], true);
        assert_eq!(config["webpack"]["adapter"], "assets");

        let config = Processor::process_one(&s, &json!({"webpack": {"enabled": false}})).unwrap();
        assert_eq!(config["webpack"]["enabled"], false);
    }

    #[test]
    fn test_enum_rejects_unknown_value() {
        let err = Processor::process_one(&schema(), &json!({"webpack": {"adapter": "bogus"}})).unwrap_err();
        match err {
            SchemaError::InvalidEnumValue { path, value, allowed } => {
                assert_eq!(path, "fxp_require_asset.webpack.adapter");
                assert_eq!(value, "\"bogus\"");
                assert_eq!(allowed.len(), 3);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_enum_cannot_be_empty() {
        let err = Processor::process_one(&schema(), &json!({"webpack": {"adapter": ""}})).unwrap_err();
        assert!(matches!(err, SchemaError::EmptyValue { .. }));
    }

    #[test]
    fn test_boolean_type_check() {
        let err = Processor::process_one(&schema(), &json!({"native_npm": "yes"})).unwrap_err();
        assert_eq!(
            err,
            SchemaError::InvalidType {
                path: "fxp_require_asset.native_npm".to_string(),
                expected: "bool".to_string(),
                actual: "string \"yes\"".to_string(),
            }
        );

        let err = Processor::process_one(&schema(), &json!({"native_npm": null})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidType { .. }));

        let config = Processor::process_one(&schema(), &json!({"webpack": {"cache": {"enabled": null}}})).unwrap();
        assert_eq!(config["webpack"]["cache"]["enabled"], Value::Null);
    }

    #[test]
    fn test_scalar_rejects_collections() {
        let err = Processor::process_one(&schema(), &json!({"output_prefix": ["a"]})).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidType { .. }));
    }

    #[test]
    fn test_unrecognized_option() {
        let err = Processor::process_one(&schema(), &json!({"unknown": 1})).unwrap_err();
        match err {
            SchemaError::UnrecognizedOption { path, key, known } => {
                assert_eq!(path, "fxp_require_asset");
                assert_eq!(key, "unknown");
                assert!(known.contains(&"\"output_prefix\"".to_string()));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_object_keys_are_normalized() {
        let config = Processor::process_one(&schema(), &json!({"output-prefix": "public"})).unwrap();
        assert_eq!(config["output_prefix"], "public");
    }

    #[test]
    fn test_output_rewrites_keep_keys_and_order() {
        let first = json!({"output_rewrites": {"B": "one", "a-b": {"x": 1}}});
        let second = json!({"output_rewrites": {"a": [1, 2], "B": "two"}});
        let config = Processor::process(&schema(), &[first, second]).unwrap();

        let rewrites = config["output_rewrites"].as_object().unwrap();
        let keys: Vec<_> = rewrites.keys().map(String::as_str).collect();
        assert_eq!(keys, ["B", "a-b", "a"]);
        assert_eq!(rewrites["B"], "two");
        assert_eq!(rewrites["a-b"], json!({"x": 1}));
    }

    #[test]
    fn test_output_rewrites_duplicate_key_keeps_first_position() {
        let document: Value =
            serde_json::from_str(r#"{"output_rewrites": {"B": "first", "a": "x", "B": "last"}}"#).unwrap();
        let config = Processor::process_one(&schema(), &document).unwrap();

        let rewrites = config["output_rewrites"].as_object().unwrap();
        let keys: Vec<_> = rewrites.keys().map(String::as_str).collect();
        assert_eq!(keys, ["B", "a"]);
        assert_eq!(rewrites["B"], "last");
    }

    #[test]
    fn test_keyed_prototype_accepts_list_form() {
        let document = json!({
            "packages": [
                {"name": "foo", "source_path": "vendor/foo"},
                {"name": "bar", "source_path": "vendor/bar", "patterns": "*.js"}
            ]
        });
        let config = Processor::process_one(&schema(), &document).unwrap();
        assert_eq!(config["packages"]["foo"]["source_path"], "vendor/foo");
        assert_eq!(config["packages"]["foo"]["patterns"], json!([]));
        assert_eq!(config["packages"]["bar"]["patterns"], json!(["*.js"]));
    }

    #[test]
    fn test_keyed_list_entry_unwraps_lone_value() {
        let document = json!({
            "output_rewrites": [
                {"name": "foo.js", "value": "bar.js"},
                {"name": "Baz.css", "value": "qux.css", "media": "print"}
            ]
        });
        let config = Processor::process_one(&schema(), &document).unwrap();
        assert_eq!(config["output_rewrites"]["foo.js"], "bar.js");
        assert_eq!(config["output_rewrites"]["Baz.css"], json!({"value": "qux.css", "media": "print"}));
    }

    #[test]
    fn test_unkeyed_map_rejects_list_form() {
        let document = json!({"asset_replacement": [{"name": "a.js", "value": "b.js"}]});
        let err = Processor::process_one(&schema(), &document).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid type for path \"fxp_require_asset.asset_replacement\". Expected map, but got array"
        );
    }

    #[test]
    fn test_keyed_prototype_missing_attribute() {
        let document = json!({"packages": [{"source_path": "vendor/foo"}]});
        let err = Processor::process_one(&schema(), &document).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingKeyAttribute {
                path: "fxp_require_asset.packages.0".to_string(),
                attribute: "name".to_string(),
            }
        );
    }

    #[test]
    fn test_required_child() {
        let document = json!({"packages": {"foo": {"patterns": ["*.css"]}}});
        let err = Processor::process_one(&schema(), &document).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingRequired {
                path: "fxp_require_asset.packages.foo".to_string(),
                name: "source_path".to_string(),
            }
        );
    }

    #[test]
    fn test_documents_merge_in_order() {
        let first = json!({
            "output_prefix": "first",
            "packages": {"foo": {"source_path": "a", "patterns": ["*.js"]}}
        });
        let second = json!({
            "packages": {"foo": {"patterns": ["*.css"]}, "bar": {"source_path": "b"}}
        });
        let config = Processor::process(&schema(), &[first, second]).unwrap();
        assert_eq!(config["output_prefix"], "first");
        assert_eq!(config["packages"]["foo"]["source_path"], "a");
        assert_eq!(config["packages"]["foo"]["patterns"], json!(["*.js", "*.css"]));
        assert_eq!(config["packages"]["bar"]["source_path"], "b");
    }

    #[test]
    fn test_later_document_can_disable_toggle() {
        let first = json!({"webpack": {"adapter": "manifest"}});
        let second = json!({"webpack": false});
        let config = Processor::process(&schema(), &[first, second]).unwrap();
        assert_eq!(config["webpack"]["enabled"], false);
        assert_eq!(config["webpack"]["adapter"], "manifest");
    }
}
