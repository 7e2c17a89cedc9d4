//! # TAO Dependency Resolver Library
//!
//! This library computes the full set of TAO extensions a given extension
//! depends on, and maintains the repository map that tells which repository
//! hosts which extension. It is used by the `tao-dependency-resolver`
//! command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use tao_dependency_resolver::catalog::ExtensionCatalog;
//! use tao_dependency_resolver::manifest::Manifest;
//!
//! let manifest = Manifest::parse(
//!     "<?php return ['name' => 'tao', 'requires' => ['generis' => '>=12.0.0']];",
//! )
//! .unwrap();
//! assert_eq!(manifest.dependency_names, vec!["generis"]);
//!
//! let catalog = ExtensionCatalog::from_pairs([("generis", "oat-sa/generis")]);
//! assert_eq!(catalog.lookup("generis"), Some("oat-sa/generis"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Manifests (`manifest`)**: every extension ships a `manifest.php`
//!   returning an array literal; the scanner reads its `name` and the keys of
//!   its `requires` entry.
//! - **Extensions (`extension`)**: `ExtensionRef` names an extension, its
//!   repository and a branch; `ExtensionSet` is the ordered result of a
//!   resolution.
//! - **Repository access (`repository`, `github`, `packagist`)**: traits for
//!   the hosted git service and the package registry, with GitHub and
//!   Packagist implementations.
//! - **Repository map (`repository_map`, `catalog`)**: the persisted record
//!   of every repository of an organization, and the name lookup derived
//!   from it.
//! - **Resolution (`resolver`)**: the depth-first walk from a root extension
//!   through the manifests of everything it requires.
//!
//! ## Execution Flow
//!
//! 1. `map refresh` lists the organization's repositories into the map.
//! 2. `map analyze` reads each new repository's manifest and composer file
//!    to learn which extension it hosts.
//! 3. `resolve` builds the catalog from the map and walks the manifests from
//!    the requested root, printing a composer `require` document.

pub mod catalog;
pub mod composer;
pub mod config;
pub mod error;
pub mod extension;
pub mod github;
pub mod manifest;
pub mod output;
pub mod packagist;
pub mod repository;
pub mod repository_map;
pub mod resolver;
pub mod store;

#[cfg(test)]
mod manifest_proptest;
