//! Violation Records
//!
//! Rules repair what they can and describe every repair with one record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute name reported when a required attribute was missing or when the
/// whole element was rejected in its locale.
pub const NO_ATTRIBUTE: &str = "none";

/// Reported in place of a tag name for a disallowed text child.
pub const TEXT_NODE: &str = "#text";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    #[default]
    Tag,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Violation {
    fn new(tag: &str, attribute: Option<&str>, value: Option<&str>) -> Self {
        Self {
            kind: ViolationKind::Tag,
            tag: tag.to_string(),
            attribute: attribute.map(str::to_string),
            value: value.map(str::to_string),
        }
    }

    /// The attribute is not recognized for this tag and platform.
    pub fn unknown_attribute(tag: &str, attribute: &str) -> Self {
        Self::new(tag, Some(attribute), None)
    }

    /// The attribute is recognized but `value` is outside its domain.
    pub fn invalid_value(tag: &str, attribute: &str, value: &str) -> Self {
        Self::new(tag, Some(attribute), Some(value))
    }

    /// Required attributes were missing, or the element is not allowed in
    /// the active locale.
    pub fn missing_required(tag: &str) -> Self {
        Self::new(tag, Some(NO_ATTRIBUTE), None)
    }

    /// The element is not allowed where it appears.
    pub fn misplaced(tag: &str) -> Self {
        Self::new(tag, None, None)
    }

    /// A container held a child it does not accept. Unnamed children are
    /// reported by node name, `#text` when nothing more specific is given.
    pub fn disallowed_child(tag: &str, child: &str) -> Self {
        let child = if child.is_empty() { TEXT_NODE } else { child };
        Self::new(tag, None, Some(child))
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.attribute, &self.value) {
            (Some(attribute), _) if attribute == NO_ATTRIBUTE => {
                write!(f, "<{}>: required attribute missing or tag unsupported", self.tag)
            }
            (Some(attribute), Some(value)) => {
                write!(f, "<{}>: invalid value {:?} for {}", self.tag, value, attribute)
            }
            (Some(attribute), None) => write!(f, "<{}>: unsupported attribute {}", self.tag, attribute),
            (None, Some(child)) => match child.strip_prefix('#') {
                Some(node) => write!(f, "<{}>: {} content not allowed", self.tag, node),
                None => write!(f, "<{}>: child <{}> not allowed", self.tag, child),
            },
            (None, None) => write!(f, "<{}>: not allowed here", self.tag),
        }
    }
}
