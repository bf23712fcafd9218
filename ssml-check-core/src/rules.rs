//! Tag Rules - one validator per supported tag
//!
//! A rule corrects the element's attributes in place and returns an
//! [`Outcome`]: the violations it repaired plus the [`Action`] the caller must
//! apply to the element's slot in its parent. Rules never touch the parent
//! themselves, so each one can be exercised on a detached element.

use log::debug;

use crate::document::{Element, NodeKind};
use crate::target::{Locale, Platform};
use crate::units::{
    format_number, format_signed, is_identifier, is_time_format, number_in_range, parse_decibels,
    parse_duration, parse_percent, parse_repeat_count, parse_semitones, parse_time_offset, Sign,
};
use crate::violation::Violation;

const LOG_TARGET: &str = "ssml_check::rules";

/// Largest integer an f64 holds exactly; the open upper bound for rates.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

const BREAK_CEILING_MS: u64 = 10_000;

const EFFECT_NAMES: &[&str] = &["whispered"];
const EMOTION_NAMES: &[&str] = &["excited", "disappointed"];
const EMOTION_INTENSITIES: &[&str] = &["low", "medium", "high"];
const DOMAIN_NAMES_US: &[&str] = &["news", "music"];
const DOMAIN_NAMES_AU: &[&str] = &["news"];
const BREAK_STRENGTHS: &[&str] = &["none", "x-weak", "weak", "medium", "strong", "x-strong"];
const EMPHASIS_LEVELS: &[&str] = &["strong", "moderate", "reduced"];
const ALPHABETS: &[&str] = &["ipa", "x-sampa"];
const RATES: &[&str] = &["x-slow", "slow", "medium", "fast", "x-fast"];
const PITCHES: &[&str] = &["x-low", "low", "medium", "high", "x-high"];
const VOLUMES: &[&str] = &["silent", "x-soft", "soft", "medium", "loud", "x-loud"];
const INTERPRETATIONS: &[&str] = &[
    "characters", "spell-out", "cardinal", "ordinal", "fraction", "unit", "date", "time",
    "telephone", "expletive",
];
const AMAZON_INTERPRETATIONS: &[&str] = &["number", "digits", "address", "interjection"];
const GOOGLE_INTERPRETATIONS: &[&str] = &["bleep", "verbatim"];
const DATE_FORMATS: &[&str] = &["mdy", "dmy", "ymd", "md", "dm", "ym", "my", "d", "m", "y"];
const DETAILS: &[&str] = &["1", "2"];
const WORD_ROLES: &[&str] = &["amazon:VB", "amazon:VBD", "amazon:NN", "amazon:SENSE_1"];
const TIMED_CHILDREN: &[&str] = &["par", "seq", "media"];

/// What the caller must do with the element's slot in its parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Action {
    #[default]
    Keep,
    Remove,
    /// Splice the element's children into its place. Only produced for
    /// elements that have children; childless elements get `Remove`.
    ReplaceWithChildren,
}

impl Action {
    pub fn removes_element(self) -> bool {
        self != Action::Keep
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub action: Action,
    pub violations: Vec<Violation>,
}

impl Outcome {
    pub fn keep() -> Self {
        Self::default()
    }

    pub fn is_clean(&self) -> bool {
        self.action == Action::Keep && self.violations.is_empty()
    }
}

/// Where the element sits and what it is being checked for.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Tag name of the parent, `None` at the document root.
    pub parent: Option<&'a str>,
    /// Position of the element among its parent's children.
    pub index: usize,
    pub platform: Platform,
    pub locale: Locale,
}

impl<'a> RuleContext<'a> {
    pub fn new(platform: Platform, locale: Locale) -> Self {
        Self {
            parent: None,
            index: 0,
            platform,
            locale,
        }
    }

    pub fn with_parent(mut self, parent: &'a str) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn at_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    AmazonEffect,
    AmazonEmotion,
    AmazonDomain,
    Audio,
    Break,
    Desc,
    Emphasis,
    Lang,
    Media,
    P,
    Par,
    Phoneme,
    Prosody,
    S,
    SayAs,
    Seq,
    Speak,
    Sub,
    Voice,
    W,
}

impl Tag {
    pub const ALL: [Tag; 20] = [
        Tag::AmazonEffect,
        Tag::AmazonEmotion,
        Tag::AmazonDomain,
        Tag::Audio,
        Tag::Break,
        Tag::Desc,
        Tag::Emphasis,
        Tag::Lang,
        Tag::Media,
        Tag::P,
        Tag::Par,
        Tag::Phoneme,
        Tag::Prosody,
        Tag::S,
        Tag::SayAs,
        Tag::Seq,
        Tag::Speak,
        Tag::Sub,
        Tag::Voice,
        Tag::W,
    ];

    /// Look a tag up by element name. Amazon extensions match both as written
    /// (`amazon:effect`) and hyphenated (`amazon-effect`).
    pub fn from_name(name: &str) -> Option<Self> {
        let tag = match name {
            "amazon:effect" | "amazon-effect" => Tag::AmazonEffect,
            "amazon:emotion" | "amazon-emotion" => Tag::AmazonEmotion,
            "amazon:domain" | "amazon-domain" => Tag::AmazonDomain,
            "audio" => Tag::Audio,
            "break" => Tag::Break,
            "desc" => Tag::Desc,
            "emphasis" => Tag::Emphasis,
            "lang" => Tag::Lang,
            "media" => Tag::Media,
            "p" => Tag::P,
            "par" => Tag::Par,
            "phoneme" => Tag::Phoneme,
            "prosody" => Tag::Prosody,
            "s" => Tag::S,
            "say-as" => Tag::SayAs,
            "seq" => Tag::Seq,
            "speak" => Tag::Speak,
            "sub" => Tag::Sub,
            "voice" => Tag::Voice,
            "w" => Tag::W,
            _ => return None,
        };
        Some(tag)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tag::AmazonEffect => "amazon:effect",
            Tag::AmazonEmotion => "amazon:emotion",
            Tag::AmazonDomain => "amazon:domain",
            Tag::Audio => "audio",
            Tag::Break => "break",
            Tag::Desc => "desc",
            Tag::Emphasis => "emphasis",
            Tag::Lang => "lang",
            Tag::Media => "media",
            Tag::P => "p",
            Tag::Par => "par",
            Tag::Phoneme => "phoneme",
            Tag::Prosody => "prosody",
            Tag::S => "s",
            Tag::SayAs => "say-as",
            Tag::Seq => "seq",
            Tag::Speak => "speak",
            Tag::Sub => "sub",
            Tag::Voice => "voice",
            Tag::W => "w",
        }
    }

    /// Attributes the tag keeps on `platform`, or `None` when the tag places
    /// no restriction on its attributes.
    pub fn allowed_attributes(self, platform: Platform) -> Option<&'static [&'static str]> {
        let google = platform == Platform::Google;
        let attributes: &'static [&'static str] = match self {
            Tag::AmazonEffect | Tag::AmazonDomain | Tag::Voice => &["name"],
            Tag::AmazonEmotion => &["intensity", "name"],
            Tag::Audio if google => &[
                "clipBegin", "clipEnd", "fadeInDur", "fadeOutDur", "repeatCount", "repeatDur",
                "soundLevel", "speed", "src",
            ],
            Tag::Audio => &["src"],
            Tag::Break => &["strength", "time"],
            Tag::Emphasis => &["level"],
            Tag::Lang => &["xml:lang"],
            Tag::Media => &[
                "begin", "end", "fadeInDur", "fadeOutDur", "repeatCount", "repeatDur",
                "soundLevel", "xml:id",
            ],
            Tag::P | Tag::S => &[],
            Tag::Phoneme => &["alphabet", "ph"],
            Tag::Prosody => &["pitch", "rate", "volume"],
            Tag::SayAs if google => &["detail", "format", "interpret-as"],
            Tag::SayAs => &["format", "interpret-as"],
            Tag::Sub => &["alias"],
            Tag::W => &["role"],
            Tag::Desc | Tag::Par | Tag::Seq | Tag::Speak => return None,
        };
        Some(attributes)
    }

    pub fn check(self, element: &mut Element, context: &RuleContext<'_>) -> Outcome {
        match self {
            Tag::AmazonEffect => check_amazon_effect(element),
            Tag::AmazonEmotion => check_amazon_emotion(element, context),
            Tag::AmazonDomain => check_amazon_domain(element, context),
            Tag::Audio => check_audio(element, context),
            Tag::Break => check_break(element, context),
            Tag::Desc => check_desc(element, context),
            Tag::Emphasis => check_emphasis(element, context),
            Tag::Lang => check_lang(element),
            Tag::Media => check_media(element, context),
            Tag::P | Tag::S => check_no_attributes(element),
            Tag::Par | Tag::Seq => check_timed_container(element),
            Tag::Phoneme => check_phoneme(element),
            Tag::Prosody => check_prosody(element, context),
            Tag::SayAs => check_say_as(element, context),
            Tag::Speak => Outcome::keep(),
            Tag::Sub => check_only(element, "alias"),
            Tag::Voice => check_only(element, "name"),
            Tag::W => check_w(element),
        }
    }
}

/// Attribute-level edits on one element, recording a violation for each.
struct Repair<'e> {
    element: &'e mut Element,
    violations: Vec<Violation>,
}

impl<'e> Repair<'e> {
    fn new(element: &'e mut Element) -> Self {
        Self {
            element,
            violations: Vec::new(),
        }
    }

    /// Snapshot of the present attributes in key order.
    fn attributes(&self) -> Vec<(String, String)> {
        self.element
            .attributes
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    fn value(&self, name: &str) -> Option<String> {
        self.element.attributes.get(name).cloned()
    }

    fn has(&self, name: &str) -> bool {
        self.element.attributes.contains_key(name)
    }

    /// Remove an attribute the tag does not recognize.
    fn strip(&mut self, name: &str) {
        debug!(target: LOG_TARGET, "<{}> drops unsupported attribute {}", self.element.name, name);
        self.element.attributes.remove(name);
        self.violations.push(Violation::unknown_attribute(&self.element.name, name));
    }

    /// Overwrite an invalid value with a safe one.
    fn replace(&mut self, name: &str, replacement: impl Into<String>) {
        let replacement = replacement.into();
        debug!(target: LOG_TARGET, "<{}> {} -> {:?}", self.element.name, name, replacement);
        if let Some(old) = self.element.attributes.insert(name.to_string(), replacement) {
            self.violations.push(Violation::invalid_value(&self.element.name, name, &old));
        }
    }

    /// Remove an invalid value that has no safe replacement.
    fn discard(&mut self, name: &str) {
        if let Some(old) = self.element.attributes.remove(name) {
            debug!(target: LOG_TARGET, "<{}> drops invalid {}={:?}", self.element.name, name, old);
            self.violations.push(Violation::invalid_value(&self.element.name, name, &old));
        }
    }

    fn one_of(&mut self, name: &str, value: &str, allowed: &[&str], default: &str) {
        if !allowed.contains(&value) {
            self.replace(name, default);
        }
    }

    fn report_missing(&mut self) {
        debug!(target: LOG_TARGET, "<{}> lacks required attributes", self.element.name);
        self.violations.push(Violation::missing_required(&self.element.name));
    }

    /// Backfill required attributes, reporting once if any was missing.
    fn require(&mut self, defaults: &[(&str, &str)]) {
        if defaults.iter().all(|(name, _)| self.has(name)) {
            return;
        }
        self.report_missing();
        for (name, value) in defaults {
            self.element
                .attributes
                .entry(name.to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    fn finish(self, action: Action) -> Outcome {
        Outcome {
            action,
            violations: self.violations,
        }
    }

    fn keep(self) -> Outcome {
        self.finish(Action::Keep)
    }
}

/// The element's tag is not available in the active locale: its content
/// stays, the element goes.
fn unsupported_in_locale(element: &Element, locale: Locale) -> Outcome {
    debug!(target: LOG_TARGET, "<{}> is not supported in {}", element.name, locale);
    let action = if element.children().is_empty() {
        Action::Remove
    } else {
        Action::ReplaceWithChildren
    };
    Outcome {
        action,
        violations: vec![Violation::missing_required(&element.name)],
    }
}

fn check_amazon_effect(element: &mut Element) -> Outcome {
    let mut repair = Repair::new(element);
    for (name, value) in repair.attributes() {
        match name.as_str() {
            "name" => repair.one_of(&name, &value, EFFECT_NAMES, "whispered"),
            _ => repair.strip(&name),
        }
    }
    repair.require(&[("name", "whispered")]);
    repair.keep()
}

fn check_amazon_emotion(element: &mut Element, context: &RuleContext<'_>) -> Outcome {
    if context.locale != Locale::EnUs {
        return unsupported_in_locale(element, context.locale);
    }

    let mut repair = Repair::new(element);
    for (name, value) in repair.attributes() {
        match name.as_str() {
            "name" => repair.one_of(&name, &value, EMOTION_NAMES, "excited"),
            "intensity" => repair.one_of(&name, &value, EMOTION_INTENSITIES, "medium"),
            _ => repair.strip(&name),
        }
    }
    repair.require(&[("name", "excited"), ("intensity", "medium")]);
    repair.keep()
}

fn check_amazon_domain(element: &mut Element, context: &RuleContext<'_>) -> Outcome {
    let names = match context.locale {
        Locale::EnUs => DOMAIN_NAMES_US,
        Locale::EnAu => DOMAIN_NAMES_AU,
        locale => return unsupported_in_locale(element, locale),
    };

    let mut repair = Repair::new(element);
    for (name, value) in repair.attributes() {
        match name.as_str() {
            "name" => repair.one_of(&name, &value, names, "news"),
            _ => repair.strip(&name),
        }
    }
    repair.require(&[("name", "news")]);
    repair.keep()
}

fn check_audio(element: &mut Element, context: &RuleContext<'_>) -> Outcome {
    let google = context.platform == Platform::Google;
    let mut repair = Repair::new(element);
    for (name, value) in repair.attributes() {
        match name.as_str() {
            "src" => {}
            "clipBegin" | "clipEnd" | "repeatDur" | "fadeInDur" | "fadeOutDur" if google => {
                if parse_duration(&value, context.platform, None).is_err() {
                    repair.discard(&name);
                }
            }
            "speed" if google => {
                let speed = number_in_range(&value, 50.0, 200.0, 100.0);
                if parse_percent(&value, Sign::PlusOnly).is_err() || !speed.in_range {
                    repair.replace(&name, format!("{}%", format_number(speed.value)));
                }
            }
            "repeatCount" if google => {
                if parse_repeat_count(&value).is_err() {
                    repair.replace(&name, "1");
                }
            }
            "soundLevel" if google => {
                let level = number_in_range(&value, -40.0, 40.0, 0.0);
                if parse_decibels(&value, Sign::Required).is_err() || !level.in_range {
                    repair.replace(&name, format_signed(level.value, "dB"));
                }
            }
            _ => repair.strip(&name),
        }
    }

    // Nothing to play without a source
    if !repair.has("src") {
        repair.report_missing();
        return repair.finish(Action::Remove);
    }
    repair.keep()
}

fn check_break(element: &mut Element, context: &RuleContext<'_>) -> Outcome {
    let mut repair = Repair::new(element);
    for (name, value) in repair.attributes() {
        match name.as_str() {
            "strength" => repair.one_of(&name, &value, BREAK_STRENGTHS, "medium"),
            "time" => {
                if parse_duration(&value, context.platform, Some(BREAK_CEILING_MS)).is_err() {
                    repair.replace(&name, "10s");
                }
            }
            _ => repair.strip(&name),
        }
    }

    if !repair.has("strength") && !repair.has("time") {
        repair.element.attributes.insert("strength".to_string(), "medium".to_string());
    }
    repair.keep()
}

fn check_desc(element: &mut Element, context: &RuleContext<'_>) -> Outcome {
    if context.parent == Some("audio") {
        return Outcome::keep();
    }
    debug!(target: LOG_TARGET, "<{}> outside <audio> removed", element.name);
    Outcome {
        action: Action::Remove,
        violations: vec![Violation::misplaced(&element.name)],
    }
}

fn check_emphasis(element: &mut Element, context: &RuleContext<'_>) -> Outcome {
    let mut repair = Repair::new(element);
    for (name, value) in repair.attributes() {
        match name.as_str() {
            "level" => {
                let google_none = context.platform == Platform::Google && value == "none";
                if !google_none {
                    repair.one_of(&name, &value, EMPHASIS_LEVELS, "moderate");
                }
            }
            _ => repair.strip(&name),
        }
    }
    repair.require(&[("level", "moderate")]);
    repair.keep()
}

fn check_lang(element: &mut Element) -> Outcome {
    let mut repair = Repair::new(element);
    for (name, value) in repair.attributes() {
        match name.as_str() {
            "xml:lang" => {
                if Locale::from_tag(&value).is_none() {
                    repair.replace(&name, Locale::EnUs.as_str());
                }
            }
            _ => repair.strip(&name),
        }
    }
    repair.require(&[("xml:lang", Locale::EnUs.as_str())]);
    repair.keep()
}

fn check_media(element: &mut Element, context: &RuleContext<'_>) -> Outcome {
    let mut repair = Repair::new(element);
    for (name, value) in repair.attributes() {
        match name.as_str() {
            "xml:id" => {
                if !is_identifier(&value) {
                    repair.replace(&name, format!("id_{}", context.index));
                }
            }
            "begin" => {
                if parse_time_offset(&value).is_err() {
                    repair.replace(&name, "0s");
                }
            }
            "end" => {
                if parse_time_offset(&value).is_err() {
                    repair.discard(&name);
                }
            }
            "repeatCount" => {
                if parse_repeat_count(&value).is_err() {
                    repair.replace(&name, "1");
                }
            }
            "repeatDur" | "fadeInDur" | "fadeOutDur" => {
                if parse_duration(&value, context.platform, None).is_err() {
                    repair.replace(&name, "0s");
                }
            }
            "soundLevel" => {
                if parse_decibels(&value, Sign::Optional).is_err() {
                    repair.replace(&name, "+0dB");
                }
            }
            _ => repair.strip(&name),
        }
    }
    repair.keep()
}

fn check_no_attributes(element: &mut Element) -> Outcome {
    let mut repair = Repair::new(element);
    for (name, _) in repair.attributes() {
        repair.strip(&name);
    }
    repair.keep()
}

/// `par` and `seq` only hold timed children.
fn check_timed_container(element: &mut Element) -> Outcome {
    let tag = element.name.clone();
    let mut violations = Vec::new();
    if let Some(children) = element.elements.as_mut() {
        children.retain(|child| {
            let allowed = TIMED_CHILDREN.contains(&child.name.as_str());
            if !allowed {
                let label = match child.kind {
                    Some(NodeKind::Comment) => "#comment",
                    _ => child.name.as_str(),
                };
                debug!(target: LOG_TARGET, "<{}> drops child <{}>", tag, label);
                violations.push(Violation::disallowed_child(&tag, label));
            }
            allowed
        });
    }
    Outcome {
        action: Action::Keep,
        violations,
    }
}

fn check_phoneme(element: &mut Element) -> Outcome {
    let mut repair = Repair::new(element);
    for (name, value) in repair.attributes() {
        match name.as_str() {
            "alphabet" => repair.one_of(&name, &value, ALPHABETS, "ipa"),
            "ph" => {}
            _ => repair.strip(&name),
        }
    }
    repair.keep()
}

fn check_prosody(element: &mut Element, context: &RuleContext<'_>) -> Outcome {
    let mut repair = Repair::new(element);
    for (name, value) in repair.attributes() {
        match name.as_str() {
            "rate" if !RATES.contains(&value.as_str()) => {
                let rate = number_in_range(&value, 20.0, MAX_SAFE_INTEGER, 100.0);
                if parse_percent(&value, Sign::Forbidden).is_err() || !rate.in_range {
                    repair.replace(&name, format!("{}%", format_number(rate.value)));
                }
            }
            "pitch" if !PITCHES.contains(&value.as_str()) => {
                let pitch = number_in_range(&value, -33.3, 50.0, 0.0);
                let percent = parse_percent(&value, Sign::Required).is_ok() && pitch.in_range;
                let semitone =
                    context.platform == Platform::Google && parse_semitones(&value).is_ok();
                if !percent && !semitone {
                    repair.replace(&name, format_signed(pitch.value, "%"));
                }
            }
            "volume" if !VOLUMES.contains(&value.as_str()) => {
                if parse_decibels(&value, Sign::Required).is_err() {
                    repair.replace(&name, "+0dB");
                }
            }
            "rate" | "pitch" | "volume" => {}
            _ => repair.strip(&name),
        }
    }
    repair.keep()
}

fn supports_interpretation(value: &str, platform: Platform) -> bool {
    let extras: &[&str] = match platform {
        Platform::Amazon => AMAZON_INTERPRETATIONS,
        Platform::Google => GOOGLE_INTERPRETATIONS,
        Platform::Generic => &[],
    };
    INTERPRETATIONS.contains(&value) || extras.contains(&value)
}

fn check_say_as(element: &mut Element, context: &RuleContext<'_>) -> Outcome {
    let google = context.platform == Platform::Google;
    let mut repair = Repair::new(element);

    // format depends on the corrected interpret-as
    if let Some(value) = repair.value("interpret-as") {
        if !supports_interpretation(&value, context.platform) {
            repair.replace("interpret-as", "cardinal");
        }
    }
    let is_date = repair.value("interpret-as").as_deref() == Some("date");

    for (name, value) in repair.attributes() {
        match name.as_str() {
            "interpret-as" => {}
            "format" if is_date => repair.one_of(&name, &value, DATE_FORMATS, "mdy"),
            "format" if google => {
                if !is_time_format(&value) {
                    repair.replace(&name, "hms12");
                }
            }
            "format" => repair.discard(&name),
            "detail" if google => repair.one_of(&name, &value, DETAILS, "1"),
            _ => repair.strip(&name),
        }
    }
    repair.keep()
}

/// Tags whose single optional attribute is passed through unchecked.
fn check_only(element: &mut Element, allowed: &str) -> Outcome {
    let mut repair = Repair::new(element);
    for (name, _) in repair.attributes() {
        if name != allowed {
            repair.strip(&name);
        }
    }
    repair.keep()
}

fn check_w(element: &mut Element) -> Outcome {
    let mut repair = Repair::new(element);
    for (name, value) in repair.attributes() {
        match name.as_str() {
            "role" => repair.one_of(&name, &value, WORD_ROLES, "amazon:VB"),
            _ => repair.strip(&name),
        }
    }
    repair.keep()
}
