//! Configuration schema definitions
//!
//! A schema is a plain tree of [`OptionNode`]s. Nodes are declared with the
//! builder-style constructors below and consumed by the
//! [`Processor`](crate::processor::Processor), which normalizes, merges and
//! finalizes raw configuration documents against the tree.

use serde::Serialize;
use serde_json::{Map, Value};

/// Root key of the require asset configuration
pub const ROOT_NAME: &str = "fxp_require_asset";

/// Name of the implicit child added to toggled objects
pub const ENABLED_KEY: &str = "enabled";

/// Kind of value a node accepts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// Boolean value
    Boolean,
    /// Any scalar: string, number, boolean or null
    Scalar,
    /// One of a fixed set of string values
    Enum { values: Vec<String> },
    /// Object with declared children
    Object {
        children: Vec<OptionNode>,
        defaults_if_unset: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        toggle: Option<Toggle>,
        normalize_keys: bool,
    },
    /// String-keyed map whose values all follow the prototype
    Prototyped {
        prototype: Box<OptionNode>,
        #[serde(skip_serializing_if = "Option::is_none")]
        key_attribute: Option<String>,
        normalize_keys: bool,
    },
    /// List whose items all follow the prototype
    List { prototype: Box<OptionNode> },
    /// Anything structurally valid
    Variable,
}

/// Switch behavior of an object that carries an `enabled` child
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Toggle {
    pub enabled_by_default: bool,
}

/// One named, typed and defaulted entry of the schema tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionNode {
    pub name: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub nullable: bool,
    pub required: bool,
    pub cannot_be_empty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl OptionNode {
    fn with_kind(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            nullable: false,
            required: false,
            cannot_be_empty: false,
            info: None,
        }
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Boolean)
    }

    pub fn scalar(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Scalar)
    }

    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(
            name,
            NodeKind::Enum {
                values: values.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Variable)
    }

    /// Object node without children; add them with [`OptionNode::child`]
    pub fn object(name: impl Into<String>) -> Self {
        Self::with_kind(
            name,
            NodeKind::Object {
                children: Vec::new(),
                defaults_if_unset: false,
                toggle: None,
                normalize_keys: true,
            },
        )
    }

    /// String-keyed map of prototype values
    pub fn map(name: impl Into<String>, prototype: OptionNode) -> Self {
        Self::with_kind(
            name,
            NodeKind::Prototyped {
                prototype: Box::new(prototype.renamed("")),
                key_attribute: None,
                normalize_keys: true,
            },
        )
    }

    /// List of prototype values
    pub fn list(name: impl Into<String>, prototype: OptionNode) -> Self {
        Self::with_kind(
            name,
            NodeKind::List {
                prototype: Box::new(prototype.renamed("")),
            },
        )
    }

    /// List of scalar values, the most common list shape
    pub fn scalar_list(name: impl Into<String>) -> Self {
        Self::list(name, OptionNode::scalar(""))
    }

    fn renamed(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        let value = value.into();
        if value.is_null() {
            self.nullable = true;
        }
        self.default = Some(value);
        self
    }

    pub fn default_true(self) -> Self {
        self.default_value(true)
    }

    pub fn default_false(self) -> Self {
        self.default_value(false)
    }

    pub fn default_null(self) -> Self {
        self.default_value(Value::Null)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn cannot_be_empty(mut self) -> Self {
        self.cannot_be_empty = true;
        self
    }

    pub fn info(mut self, text: impl Into<String>) -> Self {
        self.info = Some(text.into());
        self
    }

    /// Materialize the object with its defaults when it is absent
    pub fn defaults_if_unset(mut self) -> Self {
        if let NodeKind::Object {
            defaults_if_unset, ..
        } = &mut self.kind
        {
            *defaults_if_unset = true;
        }
        self
    }

    /// Object is disabled unless its section is present or enabled explicitly
    pub fn can_be_enabled(self) -> Self {
        self.with_toggle(false)
    }

    /// Object is enabled unless disabled explicitly
    pub fn can_be_disabled(self) -> Self {
        self.with_toggle(true)
    }

    fn with_toggle(self, enabled_by_default: bool) -> Self {
        let mut node = self
            .defaults_if_unset()
            .child(OptionNode::boolean(ENABLED_KEY).default_value(enabled_by_default));
        if let NodeKind::Object { toggle, .. } = &mut node.kind {
            *toggle = Some(Toggle { enabled_by_default });
        }
        node
    }

    /// Use an attribute of each list entry as the map key
    pub fn use_attribute_as_key(mut self, attribute: impl Into<String>) -> Self {
        if let NodeKind::Prototyped { key_attribute, .. } = &mut self.kind {
            *key_attribute = Some(attribute.into());
        }
        self
    }

    /// Toggle the `-` to `_` rewriting of keys for objects and maps
    pub fn normalize_keys(mut self, enabled: bool) -> Self {
        match &mut self.kind {
            NodeKind::Object { normalize_keys, .. } | NodeKind::Prototyped { normalize_keys, .. } => {
                *normalize_keys = enabled;
            }
            _ => {}
        }
        self
    }

    /// Append a child to an object node. A child with the same name is
    /// replaced in place, so sibling names stay unique.
    pub fn child(mut self, node: OptionNode) -> Self {
        if let NodeKind::Object { children, .. } = &mut self.kind {
            match children.iter_mut().find(|c| c.name == node.name) {
                Some(existing) => *existing = node,
                None => children.push(node),
            }
        }
        self
    }

    pub fn children<I>(self, nodes: I) -> Self
    where
        I: IntoIterator<Item = OptionNode>,
    {
        nodes.into_iter().fold(self, OptionNode::child)
    }

    /// Declared children of an object node
    pub fn child_nodes(&self) -> &[OptionNode] {
        match &self.kind {
            NodeKind::Object { children, .. } => children,
            _ => &[],
        }
    }

    pub fn find_child(&self, name: &str) -> Option<&OptionNode> {
        self.child_nodes().iter().find(|c| c.name == name)
    }

    /// Reference value used when dumping the schema: defaults for leaves,
    /// one placeholder entry for maps and lists of objects.
    pub fn reference_value(&self) -> Value {
        match &self.kind {
            NodeKind::Object { children, .. } => Value::Object(
                children
                    .iter()
                    .map(|c| (c.name.clone(), c.reference_value()))
                    .collect(),
            ),
            NodeKind::Prototyped {
                prototype,
                key_attribute,
                ..
            } => {
                let mut map = Map::new();
                let placeholder = key_attribute.as_deref().unwrap_or("key");
                map.insert(format!("<{}>", placeholder), prototype.reference_value());
                Value::Object(map)
            }
            NodeKind::List { prototype } => match prototype.kind {
                NodeKind::Object { .. } => Value::Array(vec![prototype.reference_value()]),
                _ => Value::Array(Vec::new()),
            },
            _ => self.default.clone().unwrap_or(Value::Null),
        }
    }
}

/// Immutable schema tree rooted at a named object node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationSchema {
    root: OptionNode,
}

impl ConfigurationSchema {
    pub fn new(root: OptionNode) -> Self {
        Self { root }
    }

    pub fn name(&self) -> &str {
        &self.root.name
    }

    pub fn root(&self) -> &OptionNode {
        &self.root
    }

    /// Look up a node by dotted path relative to the root,
    /// e.g. `webpack.assets_adapter.cache.key`. Map and list segments
    /// match any key and resolve to the prototype.
    pub fn find(&self, path: &str) -> Option<&OptionNode> {
        let mut node = &self.root;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            node = match &node.kind {
                NodeKind::Object { .. } => node.find_child(segment)?,
                NodeKind::Prototyped { prototype, .. } | NodeKind::List { prototype } => prototype,
                _ => return None,
            };
        }
        Some(node)
    }

    /// Reference document listing every key with its default
    pub fn reference(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.root.name.clone(), self.root.reference_value());
        Value::Object(map)
    }

    /// Reference document rendered as YAML
    pub fn dump_reference(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.reference())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ConfigurationSchema {
        ConfigurationSchema::new(
            OptionNode::object(ROOT_NAME)
                .defaults_if_unset()
                .child(OptionNode::scalar("output_prefix").default_value("assets"))
                .child(
                    OptionNode::object("webpack")
                        .can_be_enabled()
                        .child(OptionNode::enumeration("adapter", ["auto", "manifest"]).default_value("auto")),
                )
                .child(OptionNode::map("output_rewrites", OptionNode::variable("")).normalize_keys(false)),
        )
    }

    #[test]
    fn test_child_names_stay_unique() {
        let node = OptionNode::object("root")
            .child(OptionNode::scalar("a").default_value("first"))
            .child(OptionNode::boolean("b"))
            .child(OptionNode::scalar("a").default_value("second"));

        let names: Vec<_> = node.child_nodes().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(node.find_child("a").unwrap().default, Some(json!("second")));
    }

    #[test]
    fn test_toggle_adds_enabled_child() {
        let schema = sample();
        let enabled = schema.find("webpack.enabled").unwrap();
        assert_eq!(enabled.kind, NodeKind::Boolean);
        assert_eq!(enabled.default, Some(json!(false)));
        match &schema.find("webpack").unwrap().kind {
            NodeKind::Object {
                toggle,
                defaults_if_unset,
                ..
            } => {
                assert_eq!(*toggle, Some(Toggle { enabled_by_default: false }));
                assert!(*defaults_if_unset);
            }
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_default_null_marks_nullable() {
        let node = OptionNode::boolean("enabled").default_null();
        assert!(node.nullable);
        assert_eq!(node.default, Some(Value::Null));
    }

    #[test]
    fn test_find_through_prototype() {
        let schema = sample();
        assert_eq!(schema.find("output_rewrites.anything").unwrap().kind, NodeKind::Variable);
        assert!(schema.find("output_prefix.nested").is_none());
        assert!(schema.find("missing").is_none());
        assert_eq!(schema.find("").unwrap().name, ROOT_NAME);
    }

    #[test]
    fn test_dump_reference() {
        let yaml = sample().dump_reference().unwrap();
        assert!(yaml.starts_with("fxp_require_asset:"));
        assert!(yaml.contains("output_prefix: assets"));
        assert!(yaml.contains("adapter: auto"));
        assert!(yaml.contains("enabled: false"));
    }
}
