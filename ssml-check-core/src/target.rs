//! Synthesis Targets - platform and locale

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::checker::CheckError;

/// Voice platform whose attribute grammar applies.
///
/// Any name other than `amazon` or `google` selects the generic baseline,
/// both when parsed from a string and when deserialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Platform {
    #[default]
    Generic,
    Amazon,
    Google,
}

impl Platform {
    pub fn from_name(name: &str) -> Self {
        match name {
            "amazon" => Self::Amazon,
            "google" => Self::Google,
            _ => Self::Generic,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Amazon => "amazon",
            Self::Google => "google",
        }
    }
}

impl From<String> for Platform {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "en-GB")]
    EnGb,
    #[serde(rename = "en-IN")]
    EnIn,
    #[serde(rename = "en-AU")]
    EnAu,
    #[serde(rename = "en-CA")]
    EnCa,
    #[serde(rename = "de-DE")]
    DeDe,
    #[serde(rename = "es-ES")]
    EsEs,
    #[serde(rename = "it-IT")]
    ItIt,
    #[serde(rename = "ja-JP")]
    JaJp,
    #[serde(rename = "fr-FR")]
    FrFr,
}

impl Locale {
    pub const ALL: [Locale; 10] = [
        Self::EnUs,
        Self::EnGb,
        Self::EnIn,
        Self::EnAu,
        Self::EnCa,
        Self::DeDe,
        Self::EsEs,
        Self::ItIt,
        Self::JaJp,
        Self::FrFr,
    ];

    /// Exact, case-sensitive lookup of a locale tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|locale| locale.as_str() == tag)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::EnGb => "en-GB",
            Self::EnIn => "en-IN",
            Self::EnAu => "en-AU",
            Self::EnCa => "en-CA",
            Self::DeDe => "de-DE",
            Self::EsEs => "es-ES",
            Self::ItIt => "it-IT",
            Self::JaJp => "ja-JP",
            Self::FrFr => "fr-FR",
        }
    }
}

impl FromStr for Locale {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| CheckError::UnsupportedLocale(s.to_string()))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
