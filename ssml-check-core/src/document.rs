//! Document Model - the element tree being checked
//!
//! Mirrors the non-compact JSON layout produced by `xml-js`: every node carries
//! a `type`, elements carry a `name`, optional `attributes` and optional child
//! `elements`, text nodes carry `text`. The document itself is a nameless
//! container whose `elements` hold the top-level `speak`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type Attributes = BTreeMap<String, String>;

/// `null` or a non-object reads as no attributes. Numbers and booleans are
/// kept as their text; nested values have no attribute form and are dropped.
fn lenient_attributes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Attributes, D::Error> {
    let Value::Object(entries) = Value::deserialize(deserializer)? else {
        return Ok(Attributes::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|(name, value)| match value {
            Value::String(text) => Some((name, text)),
            Value::Number(number) => Some((name, number.to_string())),
            Value::Bool(flag) => Some((name, flag.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        })
        .collect())
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Element,
    Text,
    Cdata,
    Comment,
    Instruction,
    Doctype,
    Declaration,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Element {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_attributes", skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<Element>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            kind: Some(NodeKind::Element),
            name: name.into(),
            ..Self::default()
        }
    }

    /// A text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: Some(NodeKind::Text),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// The nameless container that holds a document's top-level nodes.
    pub fn document(elements: Vec<Element>) -> Self {
        Self {
            elements: Some(elements),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Element>) -> Self {
        self.elements = Some(children);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn children(&self) -> &[Element] {
        self.elements.as_deref().unwrap_or(&[])
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, Some(NodeKind::Text) | Some(NodeKind::Cdata))
    }
}
