//! `PackageRegistry` over the Packagist package listing API.

use serde::Deserialize;
use url::Url;

use crate::error::Result;
use crate::github::{agent, base_url, endpoint, read_json, send, unexpected_status, Reply};
use crate::repository::PackageRegistry;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageList {
    #[serde(default)]
    package_names: Vec<String>,
}

/// Packagist, or any registry exposing `/packages/list.json`.
pub struct Packagist {
    agent: ureq::Agent,
    base: Url,
}

impl Packagist {
    pub fn new(registry_url: &str) -> Result<Self> {
        Ok(Self {
            agent: agent(),
            base: base_url(registry_url)?,
        })
    }

    fn list_url(&self, vendor: &str) -> Url {
        let mut url = endpoint(&self.base, &["packages", "list.json"]);
        url.query_pairs_mut().append_pair("vendor", vendor);
        url
    }
}

impl PackageRegistry for Packagist {
    fn list_packages(&self, vendor: &str) -> Result<Vec<String>> {
        let url = self.list_url(vendor);
        match send(self.agent.get(url.as_str()), &url)? {
            Reply::Success(response) => {
                let list: PackageList = read_json(response, &url)?;
                Ok(list.package_names)
            }
            Reply::Status(status, body) => Err(unexpected_status(&url, status, &body)),
        }
    }
}
