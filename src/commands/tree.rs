//! # Tree Command Implementation
//!
//! This module implements the `tree` subcommand, which displays how the
//! dependencies of a repository were discovered. Each extension appears once,
//! under the extension whose manifest first required it.
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};

use super::ResolveInput;
use tao_dependency_resolver::config::Settings;
use tao_dependency_resolver::extension::{ExtensionRef, ExtensionSet};
use tao_dependency_resolver::output::{OutputConfig, Status};

/// Show the dependency tree of a repository
#[derive(Args, Debug)]
pub struct TreeArgs {
    #[command(flatten)]
    pub input: ResolveInput,

    /// Maximum depth to display in the tree.
    ///
    /// If not specified, displays the full tree.
    /// Use 0 to show only the root, 1 to show its direct dependencies, etc.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs, settings: &Settings, output: &OutputConfig) -> Result<()> {
    let resolution = super::resolve(&args.input, settings)?;
    println!(
        "{} Dependency tree of {}",
        output.marker(Status::Search),
        output.emphasis(&args.input.repository)
    );

    let tree_root = build_tree_node(
        &resolution.root,
        &resolution.extensions,
        args.depth.unwrap_or(usize::MAX),
        0,
    );
    print_tree(&tree_root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;

    Ok(())
}

/// Build the node for `extension` and, depth permitting, the extensions it
/// first required.
fn build_tree_node(
    extension: &ExtensionRef,
    extensions: &ExtensionSet,
    max_depth: usize,
    current_depth: usize,
) -> TreeNode {
    let label = extension.to_string();
    if current_depth >= max_depth {
        return TreeNode {
            label,
            children: vec![],
        };
    }

    let children = extensions
        .discovered_by(extension.extension_name())
        .map(|child| build_tree_node(child, extensions, max_depth, current_depth + 1))
        .collect();
    TreeNode { label, children }
}

/// Tree node structure for ptree visualization
#[derive(Clone, Debug)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}
