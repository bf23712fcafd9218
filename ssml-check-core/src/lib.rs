//! SSML Check Core - Platform-Aware Speech Markup Sanitizer
//!
//! # Ground Rules
//! 1. Repair, Don't Reject: every bad value gets a safe default
//! 2. Every Repair Is Reported
//! 3. Rules Decide, The Checker Edits The Tree
//! 4. Platform And Locale Gate The Grammar

pub mod checker;
pub mod config;
pub mod document;
pub mod rules;
pub mod target;
pub mod units;
pub mod violation;

pub use checker::{apply_action, check_element, CheckError, CheckReport, Checker};
pub use config::{CheckConfig, FailureMode};
pub use document::{Element, NodeKind};
pub use rules::{Action, Outcome, RuleContext, Tag};
pub use target::{Locale, Platform};
pub use units::{number_in_range, parse_duration, Bounded, Duration, UnitError};
pub use violation::Violation;

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
