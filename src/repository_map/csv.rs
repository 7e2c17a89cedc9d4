//! CSV report of a repository map, one row per repository.

use std::fmt::Write as _;

use super::{BranchRecord, FileRecord, RepositoryMap, RepositoryRecord};

/// Branch blocks per row.
pub const BRANCH_BLOCKS: usize = 3;

const REPOSITORY_COLUMNS: [&str; 6] = [
    "repositoryName",
    "extensionName",
    "composerName",
    "privacy",
    "packagist",
    "defaultBranch",
];

const BRANCH_COLUMNS: [&str; 5] = [
    "branchName",
    "filename",
    "composerName",
    "extensionName",
    "requires",
];

/// Render `map` as CSV, records in stored order.
///
/// Each branch block describes the branch's manifest, or its composer file
/// when it has no manifest.
pub fn export(map: &RepositoryMap, manifest_file: &str) -> String {
    let mut out = String::new();
    let header: Vec<&str> = REPOSITORY_COLUMNS
        .iter()
        .copied()
        .chain((0..BRANCH_BLOCKS).flat_map(|_| BRANCH_COLUMNS))
        .collect();
    write_row(&mut out, header.iter().map(|column| column.to_string()));

    for record in map.iter() {
        write_row(&mut out, row(record, manifest_file));
    }
    out
}

fn row(record: &RepositoryRecord, manifest_file: &str) -> Vec<String> {
    let mut fields = vec![
        record.id(),
        record.extension_name.clone(),
        record.composer_package_name.clone(),
        if record.is_private { "private" } else { "public" }.to_string(),
        if record.on_package_registry { "yes" } else { "no" }.to_string(),
        record.default_branch.clone(),
    ];

    let branches = record.ordered_branches();
    for position in 0..BRANCH_BLOCKS {
        match branches.get(position) {
            Some(branch) => fields.extend(branch_block(branch, manifest_file)),
            None => fields.extend(std::iter::repeat(String::new()).take(BRANCH_COLUMNS.len())),
        }
    }
    fields
}

fn branch_block(branch: &BranchRecord, manifest_file: &str) -> Vec<String> {
    let file: Option<&FileRecord> = branch
        .file(manifest_file)
        .or_else(|| branch.files.values().next());
    let composer_name = branch
        .files
        .values()
        .map(|file| file.composer_package_name.as_str())
        .find(|name| !name.is_empty())
        .unwrap_or_default();

    match file {
        Some(file) => vec![
            branch.name.clone(),
            file.name.clone(),
            composer_name.to_string(),
            file.extension_name.clone(),
            file.requires.join("|"),
        ],
        None => vec![
            branch.name.clone(),
            String::new(),
            composer_name.to_string(),
            String::new(),
            String::new(),
        ],
    }
}

fn write_row(out: &mut String, fields: impl IntoIterator<Item = String>) {
    let line = fields
        .into_iter()
        .map(|field| quote(&field))
        .collect::<Vec<_>>()
        .join(",");
    let _ = writeln!(out, "{}", line);
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository_map::NOT_FOUND;

    fn file(name: &str, composer: &str, extension: &str, requires: &[&str]) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            composer_package_name: composer.to_string(),
            extension_name: extension.to_string(),
            requires: requires.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn sample_map() -> RepositoryMap {
        let mut tao = RepositoryRecord {
            owner: "oat-sa".to_string(),
            name: "tao-core".to_string(),
            default_branch: "develop".to_string(),
            extension_name: "tao".to_string(),
            composer_package_name: "oat-sa/tao-core".to_string(),
            on_package_registry: true,
            ..RepositoryRecord::default()
        };
        let mut develop = BranchRecord::new("develop");
        develop.add_file(file("manifest.php", "", "tao", &["generis", "taoBackOffice"]));
        develop.add_file(file("composer.json", "oat-sa/tao-core", "", &["oat-sa/generis"]));
        tao.branches.insert("develop".to_string(), develop);
        let mut master = BranchRecord::new("master");
        master.add_file(file("composer.json", "oat-sa/tao-core", "", &[]));
        tao.branches.insert("master".to_string(), master);

        let docs = RepositoryRecord {
            owner: "oat-sa".to_string(),
            name: "docs, guides".to_string(),
            is_private: true,
            default_branch: "main".to_string(),
            extension_name: NOT_FOUND.to_string(),
            ..RepositoryRecord::default()
        };

        let mut map = RepositoryMap::new();
        map.insert_new(tao);
        map.insert_new(docs);
        map
    }

    #[test]
    fn test_export() {
        let csv = export(&sample_map(), "manifest.php");
        insta::assert_snapshot!(csv, @r###"
        repositoryName,extensionName,composerName,privacy,packagist,defaultBranch,branchName,filename,composerName,extensionName,requires,branchName,filename,composerName,extensionName,requires,branchName,filename,composerName,extensionName,requires
        oat-sa/tao-core,tao,oat-sa/tao-core,public,yes,develop,develop,manifest.php,oat-sa/tao-core,tao,generis|taoBackOffice,master,composer.json,oat-sa/tao-core,,,,,,,
        "oat-sa/docs, guides",__NOT_FOUND__,,private,no,main,,,,,,,,,,,,,,,
        "###);
    }

    #[test]
    fn test_every_row_has_the_same_width() {
        let csv = export(&sample_map(), "manifest.php");
        let widths: Vec<usize> = csv
            .lines()
            .map(|line| line.replace("\"oat-sa/docs, guides\"", "x").split(',').count())
            .collect();
        assert_eq!(widths, vec![21, 21, 21]);
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("a,b"), "\"a,b\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
