use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::theme::path::is_token_reference;

pub type PropMap = IndexMap<String, PropValue>;
pub type ResolvedPropMap = IndexMap<String, ResolvedValue>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {message}")]
pub struct NodeError {
    pub path: String,
    pub message: String,
}

impl NodeError {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Primitive {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

/// An authored prop. Token references keep their own variant; [`ResolvedValue`]
/// has none, so a resolved tree cannot hold an unresolved reference.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Primitive(Primitive),
    /// Raw `$theme.*` string, validated when the tree is resolved.
    TokenRef(String),
    StyleMap(PropMap),
    NodeList(Vec<ComponentNode>),
    List(Vec<PropValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Node(ComponentNode),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct ComponentNode {
    pub node_type: String,
    pub props: PropMap,
    pub children: Vec<Child>,
    pub content: Option<String>,
}

impl ComponentNode {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            props: PropMap::new(),
            children: Vec::new(),
            content: None,
        }
    }

    pub fn from_value(value: &Value) -> Result<Self, NodeError> {
        parse_node(value, "node")
    }
}

impl TryFrom<Value> for ComponentNode {
    type Error = NodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value)
    }
}

const NODE_FIELDS: [&str; 4] = ["type", "props", "children", "content"];

fn parse_node(value: &Value, path: &str) -> Result<ComponentNode, NodeError> {
    let Value::Object(fields) = value else {
        return Err(NodeError::new(path, "component node must be an object"));
    };
    if let Some(unknown) = fields.keys().find(|key| !NODE_FIELDS.contains(&key.as_str())) {
        return Err(NodeError::new(
            format!("{path}.{unknown}"),
            "unknown component node field",
        ));
    }

    let node_type = match fields.get("type") {
        Some(Value::String(node_type)) if !node_type.is_empty() => node_type.clone(),
        Some(_) => return Err(NodeError::new(format!("{path}.type"), "type must be a non-empty string")),
        None => return Err(NodeError::new(format!("{path}.type"), "component node requires a type")),
    };
    let path = format!("{path}<{node_type}>");

    let props = match fields.get("props") {
        None | Some(Value::Null) => PropMap::new(),
        Some(Value::Object(props)) => parse_props(props, &format!("{path}.props"))?,
        Some(_) => return Err(NodeError::new(format!("{path}.props"), "props must be an object")),
    };

    let children: Vec<Child> = match fields.get("children") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(children)) => children
            .iter()
            .enumerate()
            .map(|(index, child)| match child {
                Value::String(text) => Ok(Child::Text(text.clone())),
                other => parse_node(other, &format!("{path}.children[{index}]")).map(Child::Node),
            })
            .collect::<Result<_, _>>()?,
        Some(_) => return Err(NodeError::new(format!("{path}.children"), "children must be an array")),
    };

    let content = match fields.get("content") {
        None | Some(Value::Null) => None,
        Some(Value::String(content)) => Some(content.clone()),
        Some(_) => return Err(NodeError::new(format!("{path}.content"), "content must be a string")),
    };

    Ok(ComponentNode {
        node_type,
        props,
        children,
        content,
    })
}

fn parse_props(props: &Map<String, Value>, path: &str) -> Result<PropMap, NodeError> {
    let mut parsed = PropMap::with_capacity(props.len());
    for (key, value) in props {
        parsed.insert(key.clone(), parse_prop(value, &format!("{path}.{key}"))?);
    }
    Ok(parsed)
}

fn looks_like_node(value: &Value) -> bool {
    value
        .as_object()
        .and_then(|fields| fields.get("type"))
        .is_some_and(Value::is_string)
}

fn parse_prop(value: &Value, path: &str) -> Result<PropValue, NodeError> {
    Ok(match value {
        Value::Null => PropValue::Primitive(Primitive::Null),
        Value::Bool(flag) => PropValue::Primitive(Primitive::Bool(*flag)),
        Value::Number(number) => PropValue::Primitive(Primitive::Number(number.clone())),
        Value::String(text) if is_token_reference(text) => PropValue::TokenRef(text.clone()),
        Value::String(text) => PropValue::Primitive(Primitive::Text(text.clone())),
        Value::Object(map) => PropValue::StyleMap(parse_props(map, path)?),
        Value::Array(items) if !items.is_empty() && items.iter().all(looks_like_node) => {
            match parse_nodes(items, path) {
                Ok(nodes) => PropValue::NodeList(nodes),
                Err(err) => {
                    tracing::trace!(%err, "array of typed objects is not a node list; keeping it as data");
                    PropValue::List(parse_list(items, path)?)
                }
            }
        }
        Value::Array(items) => PropValue::List(parse_list(items, path)?),
    })
}

fn parse_nodes(items: &[Value], path: &str) -> Result<Vec<ComponentNode>, NodeError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_node(item, &format!("{path}[{index}]")))
        .collect()
}

fn parse_list(items: &[Value], path: &str) -> Result<Vec<PropValue>, NodeError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_prop(item, &format!("{path}[{index}]")))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedValue {
    Primitive(Primitive),
    StyleMap(ResolvedPropMap),
    NodeList(Vec<ResolvedComponentNode>),
    List(Vec<ResolvedValue>),
}

impl ResolvedValue {
    pub fn text(value: impl Into<String>) -> Self {
        ResolvedValue::Primitive(Primitive::Text(value.into()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ResolvedValue::Primitive(Primitive::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn as_style_map(&self) -> Option<&ResolvedPropMap> {
        match self {
            ResolvedValue::StyleMap(map) => Some(map),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedChild {
    Node(ResolvedComponentNode),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedComponentNode {
    #[serde(rename = "type")]
    pub node_type: String,
    pub props: ResolvedPropMap,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ResolvedChild>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ResolvedComponentNode {
    pub fn prop(&self, key: &str) -> Option<&ResolvedValue> {
        self.props.get(key)
    }

    /// Entry of the `style` prop, when it is a style map.
    pub fn style(&self, property: &str) -> Option<&ResolvedValue> {
        self.prop("style")
            .and_then(ResolvedValue::as_style_map)
            .and_then(|style| style.get(property))
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = &ResolvedComponentNode> {
        self.children.iter().filter_map(|child| match child {
            ResolvedChild::Node(node) => Some(node),
            ResolvedChild::Text(_) => None,
        })
    }

    pub fn to_json(&self) -> Value {
        // Only string keys and JSON scalars; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
