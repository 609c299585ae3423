//! GitHub contents API backend

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use super::{Lookup, RemoteStore, Result, StoreError, WriteOutcome, WriteRequest};
use crate::config::GitHubConfig;

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";

/// Author/committer identity attached to commits
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Committer {
    pub name: String,
    pub email: String,
}

/// Repository accessed through `/repos/{owner}/{repo}/contents/{path}`
pub struct GitHubStore {
    client: Client,
    api_base: Url,
    owner: String,
    repo: String,
    branch: String,
    token: String,
    committer: Option<Committer>,
}

/// Body of a contents lookup: a listing for directories, an object for files
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Listing(Vec<serde_json::Value>),
    Entry(ContentEntry),
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    #[serde(rename = "type")]
    kind: String,
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: &'a str,
    content: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    committer: Option<&'a Committer>,
}

impl GitHubStore {
    /// Build a store from configuration; the token must be present.
    pub fn from_config(config: &GitHubConfig) -> Result<Self> {
        let token = config.token.clone().ok_or(StoreError::MissingToken)?;

        let api_base = Url::parse(&config.api_base)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| StoreError::InvalidApiBase(config.api_base.clone()))?;

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let committer = match (&config.committer_name, &config.committer_email) {
            (Some(name), Some(email)) => Some(Committer {
                name: name.clone(),
                email: email.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            client,
            api_base,
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            token,
            committer,
        })
    }

    fn contents_url(&self, path: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidApiBase(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(["repos", self.owner.as_str(), self.repo.as_str(), "contents"])
            .extend(path.split('/'));
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(API_VERSION_HEADER, API_VERSION)
    }
}

async fn rejected(path: &str, response: Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    StoreError::Rejected {
        path: path.to_string(),
        status,
        body,
    }
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

#[async_trait]
impl RemoteStore for GitHubStore {
    async fn read(&self, path: &str) -> Result<Lookup> {
        let url = self.contents_url(path)?;
        debug!(%url, "Looking up contents");

        let response = self
            .authorized(self.client.get(url))
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(Lookup::Missing),
            status if status.is_success() => {
                let body: ContentsResponse =
                    response
                        .json()
                        .await
                        .map_err(|e| StoreError::UnexpectedResponse {
                            path: path.to_string(),
                            reason: e.to_string(),
                        })?;

                Ok(match body {
                    ContentsResponse::Listing(_) => Lookup::Directory,
                    ContentsResponse::Entry(entry) if entry.kind == "dir" => Lookup::Directory,
                    ContentsResponse::Entry(entry) => Lookup::File { sha: entry.sha },
                })
            }
            _ => Err(rejected(path, response).await),
        }
    }

    async fn write(&self, request: WriteRequest) -> Result<WriteOutcome> {
        let url = self.contents_url(&request.path)?;
        let body = PutContents {
            message: &request.message,
            content: &request.content,
            branch: &self.branch,
            sha: request.sha.as_deref(),
            committer: self.committer.as_ref(),
        };

        debug!(%url, update = body.sha.is_some(), "Writing contents");

        let response = self
            .authorized(self.client.put(url))
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            StatusCode::CREATED => Ok(WriteOutcome::Created),
            StatusCode::OK => Ok(WriteOutcome::Updated),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                let err = rejected(&request.path, response).await;
                warn!(error = %err, "Write rejected as a revision conflict");
                Err(StoreError::Conflict { path: request.path })
            }
            _ => Err(rejected(&request.path, response).await),
        }
    }
}
