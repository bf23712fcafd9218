//! Checker - single entry point for document checks
//!
//! [`check_element`] runs the rule for one child slot and applies its action
//! to the parent. [`Checker`] drives it over a whole document and turns the
//! collected violations into a [`CheckReport`] under the configured policy.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::config::{CheckConfig, FailureMode};
use crate::document::Element;
use crate::rules::{Action, RuleContext, Tag};
use crate::target::{Locale, Platform};
use crate::violation::Violation;

const LOG_TARGET: &str = "ssml_check::checker";

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Invalid document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    #[error("Unsupported locale: {0}")]
    UnsupportedLocale(String),

    #[error("Failed to read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", .path.display())]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckReport {
    pub valid: bool,
    pub violations: Vec<Violation>,
    pub platform: Platform,
    pub locale: Locale,
}

impl CheckReport {
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// Apply a rule's action to slot `index` of `children`.
///
/// Returns whether the element that was at `index` is gone, in which case the
/// slot now holds its successor or its spliced children.
pub fn apply_action(children: &mut Vec<Element>, index: usize, action: Action) -> bool {
    if action == Action::Keep || index >= children.len() {
        return false;
    }
    let element = children.remove(index);
    if action == Action::ReplaceWithChildren {
        let grandchildren = element.elements.unwrap_or_default();
        children.splice(index..index, grandchildren);
    }
    true
}

/// Check the element at `parent.elements[index]`, correcting its attributes
/// and appending violations.
///
/// Returns `true` iff the element was removed or replaced, so the caller must
/// look at `index` again instead of advancing. Unknown tags are left alone.
pub fn check_element(
    parent: &mut Element,
    index: usize,
    violations: &mut Vec<Violation>,
    platform: Platform,
    locale: Locale,
) -> bool {
    let parent_name = parent.name.as_str();
    let Some(children) = parent.elements.as_mut() else {
        return false;
    };
    let Some(element) = children.get_mut(index) else {
        return false;
    };
    let Some(tag) = Tag::from_name(&element.name) else {
        return false;
    };

    let mut context = RuleContext::new(platform, locale).at_index(index);
    if !parent_name.is_empty() {
        context = context.with_parent(parent_name);
    }

    let outcome = tag.check(element, &context);
    violations.extend(outcome.violations);
    if outcome.action.removes_element() {
        debug!(target: LOG_TARGET, "{:?} <{}> at index {}", outcome.action, tag.as_str(), index);
    }
    apply_action(children, index, outcome.action)
}

pub struct Checker {
    config: CheckConfig,
}

impl Checker {
    pub fn new(platform: Platform, locale: Locale) -> Self {
        Self::with_config(CheckConfig::new(platform, locale))
    }

    pub fn with_config(config: CheckConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Check and repair a document in place.
    ///
    /// `document` is the nameless container whose children are the top-level
    /// nodes; a bare element passed here only has its descendants checked.
    pub fn check_document(&self, document: &mut Element) -> CheckReport {
        let mut violations = Vec::new();
        self.walk(document, &mut violations);

        info!(
            target: LOG_TARGET,
            "checked document for {}/{}: {} violation(s)",
            self.config.platform,
            self.config.locale,
            violations.len()
        );
        self.apply_policy(violations)
    }

    /// Parse a JSON document, check it and return the repaired tree.
    pub fn check_json(&self, json: &str) -> Result<(Element, CheckReport), CheckError> {
        let mut document: Element = serde_json::from_str(json)?;
        let report = self.check_document(&mut document);
        Ok((document, report))
    }

    fn walk(&self, parent: &mut Element, violations: &mut Vec<Violation>) {
        let mut index = 0;
        while index < parent.children().len() {
            if check_element(parent, index, violations, self.config.platform, self.config.locale) {
                continue;
            }
            if let Some(child) = parent.elements.as_mut().and_then(|c| c.get_mut(index)) {
                self.walk(child, violations);
            }
            index += 1;
        }
    }

    fn apply_policy(&self, violations: Vec<Violation>) -> CheckReport {
        let valid = match self.config.failure_mode {
            FailureMode::Block => violations.is_empty(),
            FailureMode::Warn => {
                for violation in &violations {
                    warn!(target: LOG_TARGET, "{}", violation);
                }
                true
            }
            FailureMode::Log => true,
        };

        CheckReport {
            valid,
            violations,
            platform: self.config.platform,
            locale: self.config.locale,
        }
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::with_config(CheckConfig::default())
    }
}
