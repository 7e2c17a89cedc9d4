//! Property-based tests for manifest scanning.
//!
//! Manifests are generated from random extension names and requirement
//! lists, written in either array syntax, and scanned back.

#[cfg(test)]
mod proptest_tests {
    use crate::manifest::{extract_dependency_names, extract_extension_name, Manifest};
    use proptest::prelude::*;

    fn extension_name() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9_]{0,15}"
    }

    fn constraint() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("*".to_string()),
            "(>=|<=|~|\\^)?[0-9]{1,2}\\.[0-9]{1,2}\\.[0-9]{1,2}",
        ]
    }

    fn array(entries: &[String], short_syntax: bool) -> String {
        if short_syntax {
            format!("[{}]", entries.join(", "))
        } else {
            format!("array({})", entries.join(", "))
        }
    }

    fn render(name: &str, requires: &[(String, String)], short_syntax: bool) -> String {
        let requires: Vec<String> = requires
            .iter()
            .map(|(dependency, version)| format!("'{}' => '{}'", dependency, version))
            .collect();
        let entries = vec![
            format!("'name' => '{}'", name),
            "'label' => 'Generated'".to_string(),
            format!("'requires' => {}", array(&requires, short_syntax)),
            "'constants' => ['DIR' => __DIR__ . '/views/']".to_string(),
        ];
        format!("<?php\n// generated\nreturn {};\n", array(&entries, short_syntax))
    }

    // ============================================================================
    // requires property tests
    // ============================================================================

    proptest! {
        /// Property: requirement keys come back in declaration order, duplicates kept
        #[test]
        fn requires_keep_declaration_order(
            name in extension_name(),
            requires in prop::collection::vec((extension_name(), constraint()), 0..12),
            short_syntax in any::<bool>(),
        ) {
            let manifest = Manifest::parse(&render(&name, &requires, short_syntax)).unwrap();
            let expected: Vec<String> = requires.into_iter().map(|(dependency, _)| dependency).collect();
            prop_assert_eq!(manifest.dependency_names, expected);
            prop_assert_eq!(manifest.extension_name, name);
        }

        /// Property: a scalar requires entry never yields dependencies
        #[test]
        fn scalar_requires_yields_nothing(value in "[a-zA-Z0-9 ._-]{0,20}") {
            let text = format!("<?php return ['requires' => '{}'];", value);
            prop_assert!(extract_dependency_names(&text).unwrap().is_empty());
        }
    }

    // ============================================================================
    // name property tests
    // ============================================================================

    proptest! {
        /// Property: with several name entries the first one wins
        #[test]
        fn first_name_wins(names in prop::collection::vec(extension_name(), 1..5)) {
            let entries: Vec<String> = names.iter().map(|name| format!("'name' => '{}'", name)).collect();
            let text = format!("<?php return [{}];", entries.join(", "));
            prop_assert_eq!(extract_extension_name(&text).unwrap(), names[0].clone());
        }

        /// Property: scanning is a pure function of the text
        #[test]
        fn scanning_is_deterministic(
            name in extension_name(),
            requires in prop::collection::vec((extension_name(), constraint()), 0..6),
        ) {
            let text = render(&name, &requires, true);
            prop_assert_eq!(Manifest::parse(&text).unwrap(), Manifest::parse(&text).unwrap());
        }

        /// Property: arbitrary input never panics the scanner
        #[test]
        fn arbitrary_input_does_not_panic(text in ".{0,200}") {
            let _ = Manifest::parse(&text);
        }
    }
}
