use std::collections::BTreeMap;

use cmdrun::exec::{CategorySignal, Classifier, ErrorCategoryMapping};
use cmdrun::types::ErrorCategory;

fn build_and_config() -> ErrorCategoryMapping {
    ErrorCategoryMapping::new()
        .with("config", ["config not found", "config error"])
        .with("build", ["build failed"])
}

#[test]
fn lines_update_the_signal_and_non_matches_keep_it() {
    let signal = CategorySignal::new();
    let classifier = Classifier::new(build_and_config(), signal.clone());

    // (line, expected signal after observing it, reset before observing)
    let cases: &[(&str, ErrorCategory, bool)] = &[
        ("all good", ErrorCategory::Undefined, false),
        ("error: config not found", ErrorCategory::Configuration, false),
        ("unrelated output", ErrorCategory::Configuration, false),
        ("step 3: build failed", ErrorCategory::Build, false),
        ("fine again", ErrorCategory::Build, false),
        ("fine again", ErrorCategory::Undefined, true),
        ("[config error] missing key", ErrorCategory::Configuration, true),
    ];

    for (line, expected, reset) in cases {
        if *reset {
            signal.reset();
        }
        classifier.observe_line(format!("{line}\n").as_bytes());
        assert_eq!(&signal.get(), expected, "after line {line:?}");
    }
}

#[test]
fn first_category_in_mapping_order_wins() {
    let mapping = ErrorCategoryMapping::new()
        .with("test", ["failed"])
        .with("build", ["build failed"]);

    assert_eq!(mapping.classify("build failed"), Some(&ErrorCategory::Test));

    let reversed = ErrorCategoryMapping::new()
        .with("build", ["build failed"])
        .with("test", ["failed"]);
    assert_eq!(reversed.classify("build failed"), Some(&ErrorCategory::Build));
}

#[test]
fn patterns_are_case_sensitive_substrings() {
    let mapping = ErrorCategoryMapping::new().with("service", ["Timeout"]);

    assert_eq!(
        mapping.classify("upstream Timeout after 30s"),
        Some(&ErrorCategory::Service)
    );
    assert_eq!(mapping.classify("upstream timeout after 30s"), None);
}

#[test]
fn empty_mapping_never_classifies() {
    let signal = CategorySignal::new();
    let classifier = Classifier::new(ErrorCategoryMapping::new(), signal.clone());

    assert!(ErrorCategoryMapping::new().is_empty());
    assert!(ErrorCategoryMapping::new().with("build", Vec::<String>::new()).is_empty());

    classifier.observe_line(b"anything at all\n");
    assert_eq!(signal.get(), ErrorCategory::Undefined);
}

#[test]
fn line_terminators_are_stripped_before_matching() {
    let signal = CategorySignal::new();
    let mapping = ErrorCategoryMapping::new().with("custom", ["ends here"]);
    let classifier = Classifier::new(mapping, signal.clone());

    classifier.observe_line(b"it ends here\r\n");
    assert_eq!(signal.get(), ErrorCategory::Custom);
}

#[test]
fn invalid_utf8_is_matched_lossily() {
    let signal = CategorySignal::new();
    let mapping = ErrorCategoryMapping::new().with("compliance", ["license check"]);
    let classifier = Classifier::new(mapping, signal.clone());

    classifier.observe_line(b"\xff\xfe license check failed\n");
    assert_eq!(signal.get(), ErrorCategory::Compliance);
}

#[test]
fn shared_signal_receives_every_match() {
    let own = CategorySignal::new();
    let shared = CategorySignal::new();
    let classifier =
        Classifier::new(build_and_config(), own.clone()).with_shared_signal(Some(shared.clone()));

    assert_eq!(classifier.classify("build failed"), Some(ErrorCategory::Build));
    assert_eq!(own.get(), ErrorCategory::Build);
    assert_eq!(shared.get(), ErrorCategory::Build);

    assert_eq!(classifier.classify("nothing"), None);
    assert_eq!(shared.get(), ErrorCategory::Build);
}

#[test]
fn mapping_from_config_table_uses_label_order() {
    let mut table = BTreeMap::new();
    table.insert("test".to_string(), vec!["error".to_string()]);
    table.insert("build".to_string(), vec!["error".to_string()]);

    let mapping = ErrorCategoryMapping::from(table);
    let labels: Vec<String> = mapping.iter().map(|(c, _)| c.to_string()).collect();

    assert_eq!(labels, ["build", "test"]);
    assert_eq!(mapping.classify("some error"), Some(&ErrorCategory::Build));
}

#[test]
fn category_labels_parse_case_insensitively() {
    let cases = [
        ("config", ErrorCategory::Configuration),
        ("Configuration", ErrorCategory::Configuration),
        ("BUILD", ErrorCategory::Build),
        ("infrastructure", ErrorCategory::Infrastructure),
        ("", ErrorCategory::Undefined),
        ("undefined", ErrorCategory::Undefined),
        (" flaky ", ErrorCategory::Other("flaky".to_string())),
    ];

    for (label, expected) in cases {
        assert_eq!(ErrorCategory::from(label), expected, "label {label:?}");
    }

    assert_eq!(ErrorCategory::Configuration.to_string(), "config");
    assert_eq!(ErrorCategory::Other("Flaky".into()).to_string(), "Flaky");
    assert!(ErrorCategory::default().is_undefined());
}
