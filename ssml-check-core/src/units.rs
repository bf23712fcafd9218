//! Unit Parsers - typed grammars for attribute values
//!
//! Each parser accepts exactly one textual family (durations, signed
//! percentages, decibels, semitones, repeat counts, identifiers, SMIL time
//! offsets, say-as time formats) and returns a typed value or a [`UnitError`].
//! [`number_in_range`] is the odd one out: it never checks syntax, it only
//! extracts a leading number and clamps it.

use thiserror::Error;

use crate::target::Platform;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("malformed value {0:?}")]
    Malformed(String),

    #[error("infinity is not allowed where a ceiling applies")]
    InfinityNotAllowed,

    #[error("{value}ms exceeds the {ceiling}ms ceiling")]
    ExceedsCeiling { value: u64, ceiling: u64 },
}

fn malformed(text: &str) -> UnitError {
    UnitError::Malformed(text.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Duration {
    Millis(u64),
    Infinite,
}

/// Parse `<n>ms`, `<n>[.<n>]s`, bare `<n>[.<n>]` (google only) or `infinity`.
///
/// Fractional seconds keep millisecond precision rather than being cut to
/// whole seconds: `2.5s` is 2500 ms, digits past the third are dropped, and
/// `10.5s` exceeds a 10000 ms ceiling. With a ceiling, `infinity` and any value
/// above the ceiling are rejected.
pub fn parse_duration(
    text: &str,
    platform: Platform,
    ceiling_ms: Option<u64>,
) -> Result<Duration, UnitError> {
    if text == "infinity" {
        return match ceiling_ms {
            None => Ok(Duration::Infinite),
            Some(_) => Err(UnitError::InfinityNotAllowed),
        };
    }

    let millis = if let Some(count) = text.strip_suffix("ms") {
        if !is_digits(count) {
            return Err(malformed(text));
        }
        count.parse::<u64>().map_err(|_| malformed(text))?
    } else if let Some(seconds) = text.strip_suffix('s') {
        seconds_to_millis(seconds).ok_or_else(|| malformed(text))?
    } else if platform == Platform::Google {
        seconds_to_millis(text).ok_or_else(|| malformed(text))?
    } else {
        return Err(malformed(text));
    };

    match ceiling_ms {
        Some(ceiling) if millis > ceiling => Err(UnitError::ExceedsCeiling { value: millis, ceiling }),
        _ => Ok(Duration::Millis(millis)),
    }
}

fn seconds_to_millis(text: &str) -> Option<u64> {
    let (whole, fraction) = split_decimal(text)?;
    let mut millis = whole.parse::<u64>().ok()?.checked_mul(1000)?;
    let mut scale = 100;
    for digit in fraction.bytes().take(3) {
        millis = millis.checked_add(u64::from(digit - b'0') * scale)?;
        scale /= 10;
    }
    Some(millis)
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Split `<digits>[.<digits>]` into its whole and fractional digits.
fn split_decimal(text: &str) -> Option<(&str, &str)> {
    match text.split_once('.') {
        Some((whole, fraction)) if is_digits(whole) && is_digits(fraction) => Some((whole, fraction)),
        None if is_digits(text) => Some((text, "")),
        _ => None,
    }
}

fn decimal_value(text: &str) -> Option<f64> {
    split_decimal(text)?;
    text.parse().ok()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounded {
    pub in_range: bool,
    pub value: f64,
}

/// Extract a leading number from `text` and clamp it to `[min, max]`.
///
/// Unparseable text yields `default`; clamped or defaulted results report
/// `in_range: false`.
pub fn number_in_range(text: &str, min: f64, max: f64, default: f64) -> Bounded {
    match leading_number(text) {
        None => Bounded { in_range: false, value: default },
        Some(value) if value < min => Bounded { in_range: false, value: min },
        Some(value) if value > max => Bounded { in_range: false, value: max },
        Some(value) => Bounded { in_range: true, value },
    }
}

fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let scan_digits = |mut at: usize| {
        while at < bytes.len() && bytes[at].is_ascii_digit() {
            at += 1;
        }
        at
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let whole_start = end;
    end = scan_digits(end);
    let mut digits = end - whole_start;

    if bytes.get(end) == Some(&b'.') {
        let fraction_end = scan_digits(end + 1);
        let fraction = fraction_end - end - 1;
        if fraction > 0 {
            digits += fraction;
            end = fraction_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut probe = end + 1;
        if matches!(bytes.get(probe), Some(b'+' | b'-')) {
            probe += 1;
        }
        let exponent_end = scan_digits(probe);
        if exponent_end > probe {
            end = exponent_end;
        }
    }

    text[..end].parse().ok()
}

/// Where a leading sign may appear on a signed quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Forbidden,
    PlusOnly,
    Optional,
    Required,
}

/// Parse `[sign]<digits>[.<digits>]<suffix>` under the given sign policy.
pub fn parse_signed(text: &str, suffix: &str, sign: Sign) -> Result<f64, UnitError> {
    let body = text.strip_suffix(suffix).ok_or_else(|| malformed(text))?;
    let (negative, magnitude) = match body.as_bytes().first() {
        Some(b'+') => (false, &body[1..]),
        Some(b'-') => (true, &body[1..]),
        _ => (false, body),
    };
    let signed = magnitude.len() != body.len();

    let allowed = match sign {
        Sign::Forbidden => !signed,
        Sign::PlusOnly => !negative,
        Sign::Optional => true,
        Sign::Required => signed,
    };
    if !allowed {
        return Err(malformed(text));
    }

    let value = decimal_value(magnitude).ok_or_else(|| malformed(text))?;
    Ok(if negative { -value } else { value })
}

pub fn parse_percent(text: &str, sign: Sign) -> Result<f64, UnitError> {
    parse_signed(text, "%", sign)
}

pub fn parse_decibels(text: &str, sign: Sign) -> Result<f64, UnitError> {
    parse_signed(text, "dB", sign)
}

pub fn parse_semitones(text: &str) -> Result<f64, UnitError> {
    parse_signed(text, "st", Sign::Required)
}

pub fn parse_repeat_count(text: &str) -> Result<f64, UnitError> {
    parse_signed(text, "", Sign::PlusOnly)
}

/// Letters and digits of any script plus `-`, `_` and `#`.
pub fn is_identifier(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '#'))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEdge {
    Begin,
    End,
}

/// A SMIL `begin`/`end` value.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeOffset {
    Clock { millis: f64 },
    Syncbase { id: String, edge: SyncEdge, offset_millis: f64 },
}

const CLOCK_UNITS: [(&str, f64); 4] = [
    ("ms", 1.0),
    ("min", 60_000.0),
    ("h", 3_600_000.0),
    ("s", 1_000.0),
];

fn clock_value(text: &str, sign: Sign) -> Option<f64> {
    CLOCK_UNITS
        .iter()
        .find_map(|(unit, scale)| parse_signed(text, unit, sign).ok().map(|v| v * scale))
}

/// Parse `[±]<n>(h|min|s|ms)` or `<id>.(begin|end)±<n>(h|min|s|ms)`.
pub fn parse_time_offset(text: &str) -> Result<TimeOffset, UnitError> {
    if let Some(millis) = clock_value(text, Sign::Optional) {
        return Ok(TimeOffset::Clock { millis });
    }

    let (id, rest) = text.split_once('.').ok_or_else(|| malformed(text))?;
    if !is_identifier(id) {
        return Err(malformed(text));
    }
    let (edge, offset) = if let Some(offset) = rest.strip_prefix("begin") {
        (SyncEdge::Begin, offset)
    } else if let Some(offset) = rest.strip_prefix("end") {
        (SyncEdge::End, offset)
    } else {
        return Err(malformed(text));
    };
    let offset_millis = clock_value(offset, Sign::Required).ok_or_else(|| malformed(text))?;

    Ok(TimeOffset::Syncbase {
        id: id.to_string(),
        edge,
        offset_millis,
    })
}

/// A say-as time format: fields `h m s Z`, the `^` marker, the clock markers
/// `12`/`24` and the separators `. ! ? : ;` or whitespace. Empty is allowed.
pub fn is_time_format(text: &str) -> bool {
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        if let Some(tail) = rest.strip_prefix("12").or_else(|| rest.strip_prefix("24")) {
            rest = tail;
        } else if c.is_whitespace()
            || matches!(c, 'h' | 'm' | 's' | 'Z' | '^' | '.' | '!' | '?' | ':' | ';')
        {
            rest = &rest[c.len_utf8()..];
        } else {
            return false;
        }
    }
    true
}

/// Render a number the way markup expects it: no trailing `.0`, no `-0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{value}")
}

/// Render a number with an explicit sign, e.g. `+0dB` or `-33.3%`.
pub fn format_signed(value: f64, suffix: &str) -> String {
    if value < 0.0 {
        format!("{}{suffix}", format_number(value))
    } else {
        format!("+{}{suffix}", format_number(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_infinity_needs_no_ceiling() {
        assert_eq!(parse_duration("infinity", Platform::Generic, None), Ok(Duration::Infinite));
        assert_eq!(
            parse_duration("infinity", Platform::Generic, Some(10_000)),
            Err(UnitError::InfinityNotAllowed)
        );
    }

    #[test]
    fn test_duration_units() {
        assert_eq!(parse_duration("5000ms", Platform::Generic, None), Ok(Duration::Millis(5000)));
        assert_eq!(parse_duration("3s", Platform::Amazon, None), Ok(Duration::Millis(3000)));
        assert_eq!(parse_duration("2.5s", Platform::Generic, None), Ok(Duration::Millis(2500)));
        assert_eq!(parse_duration("1.0005s", Platform::Generic, None), Ok(Duration::Millis(1000)));
        assert!(parse_duration("1.5ms", Platform::Generic, None).is_err());
        assert!(parse_duration("x10ms", Platform::Generic, None).is_err());
        assert!(parse_duration("-3s", Platform::Generic, None).is_err());
        assert!(parse_duration("", Platform::Google, None).is_err());
    }

    #[test]
    fn test_duration_bare_number_google_only() {
        assert_eq!(parse_duration("3", Platform::Google, None), Ok(Duration::Millis(3000)));
        assert!(parse_duration("3", Platform::Amazon, None).is_err());
        assert!(parse_duration("3", Platform::Generic, None).is_err());
    }

    #[test]
    fn test_duration_ceiling() {
        assert_eq!(
            parse_duration("20s", Platform::Generic, Some(10_000)),
            Err(UnitError::ExceedsCeiling { value: 20_000, ceiling: 10_000 })
        );
        assert_eq!(parse_duration("10s", Platform::Generic, Some(10_000)), Ok(Duration::Millis(10_000)));
        assert_eq!(
            parse_duration("10.5s", Platform::Generic, Some(10_000)),
            Err(UnitError::ExceedsCeiling { value: 10_500, ceiling: 10_000 })
        );
        assert_eq!(parse_duration("9.999s", Platform::Amazon, Some(10_000)), Ok(Duration::Millis(9_999)));
    }

    #[test]
    fn test_number_in_range() {
        assert_eq!(number_in_range("300", 50.0, 200.0, 100.0), Bounded { in_range: false, value: 200.0 });
        assert_eq!(number_in_range("abc", 50.0, 200.0, 100.0), Bounded { in_range: false, value: 100.0 });
        assert_eq!(number_in_range("10", 50.0, 200.0, 100.0), Bounded { in_range: false, value: 50.0 });
        assert_eq!(number_in_range("+75.5%", 50.0, 200.0, 100.0), Bounded { in_range: true, value: 75.5 });
        assert_eq!(number_in_range("-12dB", -40.0, 40.0, 0.0), Bounded { in_range: true, value: -12.0 });
        assert_eq!(number_in_range("  1e2x", 0.0, 1000.0, 0.0), Bounded { in_range: true, value: 100.0 });
        assert_eq!(number_in_range(".5", 0.0, 1.0, 0.0), Bounded { in_range: true, value: 0.5 });
    }

    #[test]
    fn test_sign_policies() {
        assert_eq!(parse_percent("20%", Sign::Forbidden), Ok(20.0));
        assert!(parse_percent("+20%", Sign::Forbidden).is_err());
        assert_eq!(parse_percent("+20%", Sign::PlusOnly), Ok(20.0));
        assert!(parse_percent("-20%", Sign::PlusOnly).is_err());
        assert_eq!(parse_decibels("-6.5dB", Sign::Required), Ok(-6.5));
        assert!(parse_decibels("6dB", Sign::Required).is_err());
        assert_eq!(parse_decibels("6dB", Sign::Optional), Ok(6.0));
        assert!(parse_decibels("+6db", Sign::Optional).is_err());
        assert_eq!(parse_semitones("-2st"), Ok(-2.0));
        assert!(parse_semitones("2st").is_err());
        assert_eq!(parse_repeat_count("+2.5"), Ok(2.5));
        assert!(parse_repeat_count("two").is_err());
    }

    #[test]
    fn test_identifier_accepts_any_script() {
        assert!(is_identifier("track_1"));
        assert!(is_identifier("Überblick#2"));
        assert!(is_identifier("曲目"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a b"));
        assert!(!is_identifier("a.b"));
    }

    #[test]
    fn test_time_offsets() {
        assert_eq!(parse_time_offset("-1.5s"), Ok(TimeOffset::Clock { millis: -1500.0 }));
        assert_eq!(parse_time_offset("2min"), Ok(TimeOffset::Clock { millis: 120_000.0 }));
        assert_eq!(parse_time_offset("250ms"), Ok(TimeOffset::Clock { millis: 250.0 }));
        assert_eq!(
            parse_time_offset("intro.end+0.5s"),
            Ok(TimeOffset::Syncbase {
                id: "intro".to_string(),
                edge: SyncEdge::End,
                offset_millis: 500.0,
            })
        );
        assert!(parse_time_offset("intro.end").is_err());
        assert!(parse_time_offset("intro.middle+1s").is_err());
        assert!(parse_time_offset("0").is_err());
    }

    #[test]
    fn test_time_format() {
        assert!(is_time_format("hms12"));
        assert!(is_time_format("hm24"));
        assert!(is_time_format("h:m:s"));
        assert!(is_time_format(""));
        assert!(!is_time_format("mdy"));
        assert!(!is_time_format("hms13"));
        assert!(!is_time_format("hms1"));
        assert!(!is_time_format("h42"));
    }

    #[test]
    fn test_format_signed() {
        assert_eq!(format_signed(0.0, "dB"), "+0dB");
        assert_eq!(format_signed(-0.0, "%"), "+0%");
        assert_eq!(format_signed(-33.3, "%"), "-33.3%");
        assert_eq!(format_signed(40.0, "dB"), "+40dB");
        assert_eq!(format_number(200.0), "200");
    }
}
