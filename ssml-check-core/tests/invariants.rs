//! Contract Invariant Tests
//!
//! These tests pin the guarantees callers rely on: repairs are reported,
//! repaired output is stable, and tree edits keep the walk correct.

use proptest::prelude::*;
use ssml_check_core::{
    check_element, number_in_range, parse_duration, Action, Bounded, CheckConfig, Checker, Duration,
    Element, FailureMode, Locale, Platform, RuleContext, Tag, Violation,
};

fn speak(children: Vec<Element>) -> Element {
    Element::new("speak").with_children(children)
}

#[test]
fn invariant_duration_contract() {
    assert_eq!(parse_duration("infinity", Platform::Generic, None), Ok(Duration::Infinite));
    assert!(parse_duration("infinity", Platform::Generic, Some(10_000)).is_err());
    assert!(parse_duration("20s", Platform::Generic, Some(10_000)).is_err());
    assert_eq!(parse_duration("5000ms", Platform::Generic, None), Ok(Duration::Millis(5000)));
    assert_eq!(parse_duration("3", Platform::Google, None), Ok(Duration::Millis(3000)));
    assert!(parse_duration("3", Platform::Amazon, None).is_err());
}

#[test]
fn invariant_bounded_number_contract() {
    assert_eq!(number_in_range("300", 50.0, 200.0, 100.0), Bounded { in_range: false, value: 200.0 });
    assert_eq!(number_in_range("abc", 50.0, 200.0, 100.0), Bounded { in_range: false, value: 100.0 });
}

#[test]
fn invariant_break_time_over_ceiling_is_reset() {
    let mut parent = speak(vec![Element::new("break").with_attribute("time", "20s")]);
    let mut violations = Vec::new();

    let removed = check_element(&mut parent, 0, &mut violations, Platform::Generic, Locale::EnUs);

    assert!(!removed);
    assert_eq!(violations, vec![Violation::invalid_value("break", "time", "20s")]);
    assert_eq!(parent.children()[0].attribute("time"), Some("10s"));
}

#[test]
fn invariant_emotion_outside_en_us_is_unwrapped() {
    for attributes in [vec![], vec![("name", "excited"), ("intensity", "low")], vec![("bogus", "1")]] {
        let mut emotion = Element::new("amazon:emotion").with_children(vec![Element::text("Great news")]);
        for (name, value) in attributes {
            emotion = emotion.with_attribute(name, value);
        }
        let mut parent = speak(vec![Element::new("s"), emotion, Element::new("p")]);
        let mut violations = Vec::new();

        let removed = check_element(&mut parent, 1, &mut violations, Platform::Amazon, Locale::EnGb);

        assert!(removed);
        assert_eq!(violations, vec![Violation::missing_required("amazon:emotion")]);
        let children = parent.children();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].name, "s");
        assert_eq!(children[1].text.as_deref(), Some("Great news"));
        assert_eq!(children[2].name, "p");
    }

    let mut parent = speak(vec![Element::new("amazon:emotion")]);
    let mut violations = Vec::new();
    assert!(check_element(&mut parent, 0, &mut violations, Platform::Amazon, Locale::EnGb));
    assert!(parent.children().is_empty());
}

#[test]
fn invariant_par_keeps_timed_children_in_order() {
    let mut parent = speak(vec![Element::new("par").with_children(vec![
        Element::new("media").with_attribute("begin", "1s"),
        Element::new("foo"),
        Element::new("seq"),
    ])]);
    let mut violations = Vec::new();

    assert!(!check_element(&mut parent, 0, &mut violations, Platform::Generic, Locale::EnUs));

    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].value.as_deref(), Some("foo"));
    let par = &parent.children()[0];
    assert_eq!(par.children().len(), 2);
    assert_eq!(par.children()[0].name, "media");
    assert_eq!(par.children()[0].attribute("begin"), Some("1s"));
    assert_eq!(par.children()[1].name, "seq");
}

#[test]
fn invariant_audio_without_attributes_is_removed() {
    let mut parent = speak(vec![Element::new("audio"), Element::new("p")]);
    let mut violations = Vec::new();

    assert!(check_element(&mut parent, 0, &mut violations, Platform::Google, Locale::EnUs));

    assert_eq!(violations, vec![Violation::missing_required("audio")]);
    assert_eq!(parent.children().len(), 1);
    assert_eq!(parent.children()[0].name, "p");
}

#[test]
fn invariant_repaired_document_is_stable() {
    let json = r#"{"elements": [{"type": "element", "name": "speak", "elements": [
        {"type": "element", "name": "p", "attributes": {"class": "intro"}, "elements": [
            {"type": "element", "name": "prosody", "attributes": {"rate": "5%", "pitch": "high", "volume": "6"},
             "elements": [{"type": "text", "text": "Welcome"}]},
            {"type": "element", "name": "break", "attributes": {"time": "forever"}},
            {"type": "element", "name": "say-as", "attributes": {"interpret-as": "date", "format": "ddmmyyyy"},
             "elements": [{"type": "text", "text": "01012024"}]}
        ]},
        {"type": "element", "name": "audio", "attributes": {"src": "chime.mp3", "speed": "400%"},
         "elements": [{"type": "element", "name": "desc", "elements": [{"type": "text", "text": "chime"}]}]},
        {"type": "element", "name": "seq", "elements": [
            {"type": "element", "name": "media", "attributes": {"xml:id": "a b", "soundLevel": "loud"}},
            {"type": "text", "text": "stray"}
        ]}
    ]}]}"#;

    let checker = Checker::new(Platform::Google, Locale::EnUs);
    let (mut document, first) = checker.check_json(json).unwrap();
    assert!(!first.valid);
    assert_eq!(first.violations.len(), 9);

    let second = checker.check_document(&mut document);
    assert!(second.valid, "{:?}", second.violations);
    assert!(second.violations.is_empty());
}

#[test]
fn invariant_report_records_target() {
    let config = CheckConfig::new(Platform::Amazon, Locale::EnAu).with_failure_mode(FailureMode::Log);
    let mut document = Element::document(vec![speak(vec![Element::new("voice").with_attribute("gender", "x")])]);

    let report = Checker::with_config(config).check_document(&mut document);

    assert!(report.valid);
    assert_eq!(report.violations, vec![Violation::unknown_attribute("voice", "gender")]);
    assert_eq!(report.platform, Platform::Amazon);
    assert_eq!(report.locale, Locale::EnAu);
}

const ATTRIBUTE_NAMES: &[&str] = &[
    "name", "intensity", "src", "clipBegin", "clipEnd", "speed", "repeatCount", "repeatDur",
    "soundLevel", "fadeInDur", "fadeOutDur", "strength", "time", "level", "xml:lang", "xml:id",
    "begin", "end", "alphabet", "ph", "rate", "pitch", "volume", "interpret-as", "format",
    "detail", "alias", "role", "class",
];

const ATTRIBUTE_VALUES: &[&str] = &[
    "", "whispered", "excited", "disappointed", "low", "medium", "high", "news", "music",
    "infinity", "3", "3s", "2.5s", "20s", "500ms", "-1s", "120%", "+300%", "20%", "10%", "-40%",
    "+10%", "-2st", "+6dB", "-50dB", "6dB", "x-loud", "none", "moderate", "strong", "en-US",
    "pt-BR", "intro.begin+1s", "1min", "ipa", "x-sampa", "date", "time", "digits", "bleep", "mdy",
    "hms12", "1", "2", "amazon:VB", "amazon:JJ", "a b", "id_1", "1e3%", "-0x",
];

fn attributes() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(
        (
            prop::sample::select(ATTRIBUTE_NAMES).prop_map(str::to_string),
            prop_oneof![
                prop::sample::select(ATTRIBUTE_VALUES).prop_map(str::to_string),
                "[-+a-z0-9.%:]{0,6}",
            ],
        ),
        0..6,
    )
}

proptest! {
    #[test]
    fn corrected_attributes_are_fixed_points(
        tag in prop::sample::select(Tag::ALL.to_vec()),
        attributes in attributes(),
        platform in prop::sample::select(vec![Platform::Generic, Platform::Amazon, Platform::Google]),
        locale in prop::sample::select(Locale::ALL.to_vec()),
    ) {
        let mut element = Element::new(tag.as_str());
        for (name, value) in attributes {
            element.attributes.insert(name, value);
        }
        let context = RuleContext::new(platform, locale).with_parent("speak").at_index(1);

        let first = tag.check(&mut element, &context);
        if first.action == Action::Keep {
            if let Some(allowed) = tag.allowed_attributes(platform) {
                for name in element.attributes.keys() {
                    prop_assert!(allowed.contains(&name.as_str()), "<{}> kept {}", tag.as_str(), name);
                }
            }
            let second = tag.check(&mut element, &context);
            prop_assert!(second.is_clean(), "<{}> not stable: {:?}", tag.as_str(), second);
        }
    }

    #[test]
    fn millisecond_and_second_durations(count in 0u64..1_000_000) {
        let millis = format!("{}ms", count);
        prop_assert_eq!(parse_duration(&millis, Platform::Generic, None), Ok(Duration::Millis(count)));
        let seconds = format!("{}s", count);
        prop_assert_eq!(parse_duration(&seconds, Platform::Amazon, None), Ok(Duration::Millis(count * 1000)));
    }
}
