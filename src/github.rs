//! # GitHub Source
//!
//! `RepositorySource` over the GitHub REST API, using blocking `ureq`
//! requests. One request is in flight at a time and nothing is retried.
//!
//! When a token is configured it is checked against `/user` before the first
//! real request; the resolved login is kept for the life of the source.

use std::cell::OnceCell;
use std::time::Duration;

use log::debug;
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::repository::{OrganizationInfo, RemoteRepository, RepositorySource};

/// Label used in authentication errors.
pub const API_NAME: &str = "GitHub API";

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";
const API_VERSION: &str = "2022-11-28";
const TIMEOUT: Duration = Duration::from_secs(30);

/// Build the blocking HTTP agent shared by the remote adapters.
pub(crate) fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(TIMEOUT)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Parse `value` as a base URL that path segments can be appended to.
pub(crate) fn base_url(value: &str) -> Result<Url> {
    let url = Url::parse(value)?;
    if url.cannot_be_a_base() {
        return Err(Error::Config {
            message: format!("{} cannot be used as an API base URL", value),
            hint: Some("Use an absolute http(s) URL such as https://api.github.com".to_string()),
        });
    }
    Ok(url)
}

/// `base` with `segments` appended; segments containing `/` are split.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty();
        for segment in segments {
            path.extend(segment.split('/').filter(|part| !part.is_empty()));
        }
    }
    url
}

/// A completed HTTP exchange.
pub(crate) enum Reply {
    Success(ureq::Response),
    Status(u16, String),
}

/// Send `request`, separating HTTP status failures from transport failures.
pub(crate) fn send(request: ureq::Request, url: &Url) -> Result<Reply> {
    debug!("GET {}", url);
    match request.call() {
        Ok(response) => Ok(Reply::Success(response)),
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            Ok(Reply::Status(status, body))
        }
        Err(ureq::Error::Transport(transport)) => Err(Error::Network {
            url: url.to_string(),
            message: transport.to_string(),
        }),
    }
}

pub(crate) fn unexpected_status(url: &Url, status: u16, body: &str) -> Error {
    Error::Network {
        url: url.to_string(),
        message: format!("HTTP {}: {}", status, api_message(body)),
    }
}

/// The `message` field of a GitHub error body, or the body itself.
fn api_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ApiError {
        message: String,
    }
    serde_json::from_str::<ApiError>(body)
        .map(|error| error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

pub(crate) fn read_json<T: serde::de::DeserializeOwned>(response: ureq::Response, url: &Url) -> Result<T> {
    response.into_json().map_err(|e| Error::Network {
        url: url.to_string(),
        message: format!("invalid response body: {}", e),
    })
}

#[derive(Deserialize)]
struct User {
    login: String,
}

#[derive(Deserialize)]
struct Organization {
    #[serde(default)]
    public_repos: usize,
    #[serde(default)]
    total_private_repos: usize,
}

#[derive(Deserialize)]
struct Repository {
    name: String,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    default_branch: String,
}

#[derive(Deserialize)]
struct Reference {
    object: ReferenceObject,
}

#[derive(Deserialize)]
struct ReferenceObject {
    sha: String,
}

/// `RepositorySource` backed by the GitHub REST API.
pub struct GitHubSource {
    agent: ureq::Agent,
    base: Url,
    token: Option<String>,
    identity: OnceCell<String>,
}

impl GitHubSource {
    pub fn new(api_url: &str, token: Option<String>) -> Result<Self> {
        Ok(Self {
            agent: agent(),
            base: base_url(api_url)?,
            token: token.filter(|token| !token.trim().is_empty()),
            identity: OnceCell::new(),
        })
    }

    fn request(&self, url: &Url, accept: &str) -> ureq::Request {
        let request = self
            .agent
            .get(url.as_str())
            .set("Accept", accept)
            .set("X-GitHub-Api-Version", API_VERSION);
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {}", token)),
            None => request,
        }
    }

    fn authenticate(&self) -> Result<()> {
        if self.token.is_none() || self.identity.get().is_some() {
            return Ok(());
        }
        let url = endpoint(&self.base, &["user"]);
        match send(self.request(&url, JSON_MEDIA_TYPE), &url)? {
            Reply::Success(response) => {
                let user: User = read_json(response, &url)?;
                debug!("Authenticated to {} as {}", API_NAME, user.login);
                let _ = self.identity.set(user.login);
                Ok(())
            }
            Reply::Status(status @ (401 | 403), body) => Err(Error::Authentication {
                api: API_NAME.to_string(),
                message: format!("HTTP {}: {}", status, api_message(&body)),
            }),
            Reply::Status(status, body) => Err(unexpected_status(&url, status, &body)),
        }
    }

    fn get(&self, segments: &[&str], query: &[(&str, String)], accept: &str) -> Result<(Url, Reply)> {
        self.authenticate()?;
        let mut url = endpoint(&self.base, segments);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        let reply = send(self.request(&url, accept), &url)?;
        Ok((url, reply))
    }
}

impl RepositorySource for GitHubSource {
    fn organization_info(&self, owner: &str) -> Result<OrganizationInfo> {
        match self.get(&["orgs", owner], &[], JSON_MEDIA_TYPE)? {
            (url, Reply::Success(response)) => {
                let organization: Organization = read_json(response, &url)?;
                Ok(OrganizationInfo {
                    public_repo_count: organization.public_repos,
                    private_repo_count: organization.total_private_repos,
                })
            }
            (url, Reply::Status(status, body)) => Err(unexpected_status(&url, status, &body)),
        }
    }

    fn list_repositories(&self, owner: &str, page: usize, page_size: usize) -> Result<Vec<RemoteRepository>> {
        let query = [("per_page", page_size.to_string()), ("page", page.to_string())];
        match self.get(&["orgs", owner, "repos"], &query, JSON_MEDIA_TYPE)? {
            (url, Reply::Success(response)) => {
                let listing: Vec<Repository> = read_json(response, &url)?;
                Ok(listing
                    .into_iter()
                    .map(|repository| RemoteRepository {
                        name: repository.name,
                        is_private: repository.private,
                        default_branch: repository.default_branch,
                    })
                    .collect())
            }
            (url, Reply::Status(status, body)) => Err(unexpected_status(&url, status, &body)),
        }
    }

    fn branch_reference(&self, owner: &str, repo: &str, branch: &str) -> Result<String> {
        let repository = format!("{}/{}", owner, repo);
        match self.get(
            &["repos", owner, repo, "git", "ref", "heads", branch],
            &[],
            JSON_MEDIA_TYPE,
        )? {
            (url, Reply::Success(response)) => {
                let reference: Reference = read_json(response, &url)?;
                Ok(reference.object.sha)
            }
            (_, Reply::Status(404, _)) => Err(Error::BranchNotFound {
                repository,
                branch: branch.to_string(),
            }),
            (_, Reply::Status(409, _)) => Err(Error::EmptyRepository { repository }),
            (url, Reply::Status(status, body)) => Err(unexpected_status(&url, status, &body)),
        }
    }

    fn file_content(&self, owner: &str, repo: &str, reference: &str, filename: &str) -> Result<String> {
        let query = [("ref", reference.to_string())];
        match self.get(&["repos", owner, repo, "contents", filename], &query, RAW_MEDIA_TYPE)? {
            (url, Reply::Success(response)) => response.into_string().map_err(|e| Error::Network {
                url: url.to_string(),
                message: e.to_string(),
            }),
            (_, Reply::Status(404, _)) => Err(Error::FileNotFound {
                repository: format!("{}/{}", owner, repo),
                branch: reference.to_string(),
                path: filename.to_string(),
            }),
            (url, Reply::Status(status, body)) => Err(unexpected_status(&url, status, &body)),
        }
    }
}
