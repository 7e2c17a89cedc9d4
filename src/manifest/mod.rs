//! # Manifest Scanning
//!
//! Every TAO extension ships a `manifest.php` file that returns a literal
//! array describing the extension:
//!
//! ```php
//! <?php
//! return [
//!     'name' => 'taoBackOffice',
//!     'label' => 'Back Office',
//!     'requires' => [
//!         'tao' => '>=10.0.0',
//!         'generis' => '>=7.0.0',
//!     ],
//!     'constants' => ['DIR_VIEWS' => __DIR__ . '/views/'],
//! ];
//! ```
//!
//! Only two things are ever read from it: the extension's own short name and
//! the short names of the extensions it requires. Both are read from the
//! top level of the returned array.
//!
//! Scanning is a pure function of the input text. Each call tokenizes and
//! parses from scratch, so there is no state to reset between files.
//!
//! ```
//! use tao_dependency_resolver::manifest::Manifest;
//!
//! let manifest = Manifest::parse(
//!     "<?php return array('name' => 'taoBackOffice', 'requires' => array('tao' => '*', 'generis' => '*'));",
//! )
//! .unwrap();
//! assert_eq!(manifest.extension_name, "taoBackOffice");
//! assert_eq!(manifest.dependency_names, vec!["tao", "generis"]);
//! ```

mod lexer;
mod literal;

use crate::error::{Error, Result};
use literal::{Entry, Literal};

/// Top-level key holding the extension's short name.
pub const NAME_KEY: &str = "name";

/// Top-level key holding the required extensions.
pub const REQUIRES_KEY: &str = "requires";

const ANONYMOUS_ORIGIN: &str = "<manifest>";

/// The two facts extracted from a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Declared extension name, empty when the manifest declares none.
    pub extension_name: String,
    /// Required extension names in declaration order, duplicates preserved.
    pub dependency_names: Vec<String>,
}

impl Manifest {
    /// Parse manifest text.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_named(text, ANONYMOUS_ORIGIN)
    }

    /// Parse manifest text, naming `origin` in syntax diagnostics.
    pub fn parse_named(text: &str, origin: &str) -> Result<Self> {
        let entries = returned_entries(text, origin)?;
        Ok(Self {
            extension_name: extension_name_of(&entries),
            dependency_names: dependency_names_of(&entries),
        })
    }
}

/// The declared extension name, or an empty string.
///
/// The first top-level `'name'` entry with a string-literal value wins.
pub fn extract_extension_name(text: &str) -> Result<String> {
    Ok(extension_name_of(&returned_entries(text, ANONYMOUS_ORIGIN)?))
}

/// The keys of the first top-level `'requires'` entry whose value is an
/// array, in declaration order. Version constraints are ignored.
pub fn extract_dependency_names(text: &str) -> Result<Vec<String>> {
    Ok(dependency_names_of(&returned_entries(
        text,
        ANONYMOUS_ORIGIN,
    )?))
}

fn returned_entries(text: &str, origin: &str) -> Result<Vec<Entry>> {
    let tokens = lexer::tokenize(text).map_err(|e| Error::ManifestSyntax {
        origin: origin.to_string(),
        line: e.line,
        column: e.column,
        message: e.message,
    })?;

    let entries = literal::returned_array(&tokens).map_err(|e| Error::ManifestSyntax {
        origin: origin.to_string(),
        line: e.line,
        column: e.column,
        message: e.message,
    })?;

    Ok(entries.unwrap_or_default())
}

fn extension_name_of(entries: &[Entry]) -> String {
    entries
        .iter()
        .find_map(|entry| match (entry.key_str(), &entry.value) {
            (Some(NAME_KEY), Literal::Str(name)) => Some(name.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

fn dependency_names_of(entries: &[Entry]) -> Vec<String> {
    entries
        .iter()
        .find_map(|entry| match (entry.key_str(), &entry.value) {
            (Some(REQUIRES_KEY), Literal::Array(requires)) => Some(requires),
            _ => None,
        })
        .map(|requires| {
            requires
                .iter()
                .filter_map(|dependency| dependency.key_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKOFFICE_MANIFEST: &str = r#"<?php
/**
 * This program is free software; you can redistribute it and/or
 * modify it under the terms of the GNU General Public License.
 */

use oat\taoBackOffice\scripts\install\SetupBackOffice;

return array(
    'name' => 'taoBackOffice',
    'label' => 'Back Office',
    'description' => "Base for back-office extensions",
    'license' => 'GPL-2.0',
    'version' => '6.2.0',
    'author' => 'Open Assessment Technologies SA',
    'requires' => array(
        'tao' => '>=41.0.0',
        'generis' => '>=12.15.0',
    ),
    'managementRole' => 'http://www.tao.lu/Ontologies/TAO.rdf#BackOfficeRole',
    'install' => array(
        'php' => [SetupBackOffice::class],
    ),
    'routes' => array(
        '/taoBackOffice' => 'oat\\taoBackOffice\\controller'
    ),
    'constants' => array(
        # views directory
        "DIR_VIEWS" => dirname(__FILE__).DIRECTORY_SEPARATOR."views".DIRECTORY_SEPARATOR,
        'BASE_URL' => ROOT_URL.'taoBackOffice/',
    ),
);
"#;

    #[test]
    fn test_realistic_manifest() {
        let manifest = Manifest::parse(BACKOFFICE_MANIFEST).unwrap();
        assert_eq!(manifest.extension_name, "taoBackOffice");
        assert_eq!(manifest.dependency_names, vec!["tao", "generis"]);
    }

    #[test]
    fn test_requires_order_preserved() {
        let names = extract_dependency_names(
            "<?php return ['requires' => ['a' => '1.0', 'b' => '2.0']];",
        )
        .unwrap();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_missing_requires_yields_nothing() {
        let names = extract_dependency_names("<?php return ['name' => 'generis'];").unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_scalar_requires_yields_nothing() {
        let names =
            extract_dependency_names("<?php return ['requires' => 'tao', 'name' => 'x'];").unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_empty_requires() {
        let manifest = Manifest::parse("<?php return ['name' => 'generis', 'requires' => []];")
            .unwrap();
        assert_eq!(manifest.extension_name, "generis");
        assert!(manifest.dependency_names.is_empty());
    }

    #[test]
    fn test_first_name_wins() {
        let name = extract_extension_name(
            "<?php return ['name' => 'first', 'label' => 'L', 'name' => 'second'];",
        )
        .unwrap();
        assert_eq!(name, "first");
    }

    #[test]
    fn test_non_string_name_is_skipped() {
        let name = extract_extension_name(
            "<?php return ['name' => NAME_CONSTANT, 'name' => 'literal'];",
        )
        .unwrap();
        assert_eq!(name, "literal");

        let name = extract_extension_name("<?php return ['name' => 'pre' . 'fix'];").unwrap();
        assert_eq!(name, "");
    }

    #[test]
    fn test_nested_name_is_not_top_level() {
        let name = extract_extension_name(
            "<?php return ['extra' => ['name' => 'nested'], 'label' => 'x'];",
        )
        .unwrap();
        assert_eq!(name, "");
    }

    #[test]
    fn test_duplicate_requirements_preserved() {
        let names = extract_dependency_names(
            "<?php return ['requires' => ['tao' => '*', 'generis' => '*', 'tao' => '>=1']];",
        )
        .unwrap();
        assert_eq!(names, vec!["tao", "generis", "tao"]);
    }

    #[test]
    fn test_double_quoted_keys() {
        let manifest =
            Manifest::parse(r#"<?php return ["name" => "taoQtiItem", "requires" => ["taoItems" => "*"]];"#)
                .unwrap();
        assert_eq!(manifest.extension_name, "taoQtiItem");
        assert_eq!(manifest.dependency_names, vec!["taoItems"]);
    }

    #[test]
    fn test_statements_before_return() {
        let manifest = Manifest::parse(
            "<?php\nnamespace oat\\tao;\n$extpath = __DIR__ . DIRECTORY_SEPARATOR;\nreturn ['name' => 'tao', 'requires' => ['generis' => '>=1']];",
        )
        .unwrap();
        assert_eq!(manifest.extension_name, "tao");
        assert_eq!(manifest.dependency_names, vec!["generis"]);
    }

    #[test]
    fn test_no_return_is_empty_manifest() {
        let manifest = Manifest::parse("<?php\n// nothing to see\n").unwrap();
        assert_eq!(manifest, Manifest::default());
    }

    #[test]
    fn test_unterminated_string_is_syntax_error() {
        let error = Manifest::parse_named("<?php return ['name' => 'oops];", "oat-sa/x@develop")
            .unwrap_err();
        match error {
            Error::ManifestSyntax {
                origin,
                line,
                message,
                ..
            } => {
                assert_eq!(origin, "oat-sa/x@develop");
                assert_eq!(line, 1);
                assert!(message.contains("unterminated"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unbalanced_array_is_syntax_error() {
        let result = extract_dependency_names("<?php return array('requires' => array('tao' => '*');");
        assert!(matches!(result, Err(Error::ManifestSyntax { .. })));
    }

    #[test]
    fn test_heredoc_name() {
        let manifest = Manifest::parse(
            "<?php return [\n'description' => <<<EOT\n    Long text with 'quotes'\n    EOT,\n'name' => 'x'];",
        )
        .unwrap();
        assert_eq!(manifest.extension_name, "x");
    }

    #[test]
    fn test_repeated_scans_are_independent() {
        let first = Manifest::parse("<?php return ['requires' => ['a' => '*']];").unwrap();
        let second = Manifest::parse("<?php return ['name' => 'b'];").unwrap();
        assert_eq!(first.dependency_names, vec!["a"]);
        assert!(second.dependency_names.is_empty());
        assert_eq!(second.extension_name, "b");
    }
}
