//! Publishing rendered images to a remote, versioned file store.
//!
//! The store is reached through the small [`RemoteStore`] capability: one
//! metadata read and one create-or-update write. [`Publisher`] drives the
//! sequence for a single asset:
//!
//! 1. read the target path
//! 2. if it is missing, make sure its directory exists (an empty `.gitkeep`
//!    marker is committed when it does not)
//! 3. write the target, passing the current revision when one exists
//!
//! A missing target costs up to four calls (two reads, two writes): the contents
//! API has no directory metadata, so the parent is read to learn whether the
//! marker is needed.
//!
//! Every call is attempted once. Two publishes of the same path can race between
//! the read and the write; the loser fails with a conflict or overwrites the
//! winner, and the store always ends up holding one complete file.

mod github;
pub mod memory;

pub use github::{Committer, GitHubStore};
pub use memory::MemoryStore;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::GitHubConfig;

const DIRECTORY_MARKER: &str = ".gitkeep";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("GitHub access token is not configured")]
    MissingToken,

    #[error("invalid API base URL '{0}'")]
    InvalidApiBase(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("revision conflict on {path}")]
    Conflict { path: String },

    #[error("store returned HTTP {status} for {path}: {body}")]
    Rejected {
        path: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response for {path}: {reason}")]
    UnexpectedResponse { path: String, reason: String },
}

/// Store result type
pub type Result<T> = std::result::Result<T, StoreError>;

/// What currently lives at a path in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    File { sha: String },
    Directory,
    Missing,
}

/// A create-or-update of one file
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub path: String,
    /// Base64-encoded file content
    pub content: String,
    pub message: String,
    /// Current revision of the file; required when overwriting
    pub sha: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
}

/// Remote file store capability
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Look up file metadata at `path`
    async fn read(&self, path: &str) -> Result<Lookup>;

    /// Create or update a single file
    async fn write(&self, request: WriteRequest) -> Result<WriteOutcome>;
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("reading {path} failed: {source}")]
    Read {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("creating directory {directory} failed: {source}")]
    CreateDirectory {
        directory: String,
        #[source]
        source: StoreError,
    },

    #[error("writing {path} failed: {source}")]
    Write {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("{0} is a directory")]
    PathIsDirectory(String),

    #[error("{0} is a file, expected a directory")]
    NotADirectory(String),
}

/// GitHub Pages site serving the repository contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagesSite {
    owner: String,
    repo: String,
}

impl PagesSite {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Public address of a committed file; no request is made.
    pub fn url(&self, path: &str) -> String {
        format!("https://{}.github.io/{}/{}", self.owner, self.repo, path)
    }
}

impl From<&GitHubConfig> for PagesSite {
    fn from(config: &GitHubConfig) -> Self {
        Self::new(&config.owner, &config.repo)
    }
}

/// Result of a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub path: String,
    pub public_url: String,
    pub outcome: WriteOutcome,
}

#[derive(Clone)]
pub struct Publisher {
    store: Arc<dyn RemoteStore>,
    site: PagesSite,
}

impl Publisher {
    pub fn new(store: Arc<dyn RemoteStore>, site: PagesSite) -> Self {
        Self { store, site }
    }

    /// Commit `content` at `path` and return its public URL
    pub async fn publish(
        &self,
        path: &str,
        content: &[u8],
    ) -> std::result::Result<Published, PublishError> {
        let lookup = self.store.read(path).await.map_err(|source| PublishError::Read {
            path: path.to_string(),
            source,
        })?;

        let sha = match lookup {
            Lookup::File { sha } => {
                debug!(path, %sha, "Target exists, updating");
                Some(sha)
            }
            Lookup::Directory => return Err(PublishError::PathIsDirectory(path.to_string())),
            Lookup::Missing => {
                if let Some((directory, _)) = path.rsplit_once('/') {
                    self.ensure_directory(directory).await?;
                }
                None
            }
        };

        let outcome = self
            .store
            .write(WriteRequest {
                path: path.to_string(),
                content: BASE64.encode(content),
                message: format!("Add QR code for {path}"),
                sha,
            })
            .await
            .map_err(|source| PublishError::Write {
                path: path.to_string(),
                source,
            })?;

        let public_url = self.site.url(path);
        info!(path, ?outcome, %public_url, "Published");

        Ok(Published {
            path: path.to_string(),
            public_url,
            outcome,
        })
    }

    async fn ensure_directory(&self, directory: &str) -> std::result::Result<(), PublishError> {
        let create_error = |source| PublishError::CreateDirectory {
            directory: directory.to_string(),
            source,
        };

        match self.store.read(directory).await.map_err(create_error)? {
            Lookup::Directory => Ok(()),
            Lookup::File { .. } => Err(PublishError::NotADirectory(directory.to_string())),
            Lookup::Missing => {
                info!(directory, "Directory missing, committing marker");
                let marker = self
                    .store
                    .write(WriteRequest {
                        path: format!("{directory}/{DIRECTORY_MARKER}"),
                        content: String::new(),
                        message: format!("Create {directory} directory"),
                        sha: None,
                    })
                    .await;

                match marker {
                    Ok(_) => Ok(()),
                    // Another publish committed the marker first
                    Err(StoreError::Conflict { .. }) => {
                        debug!(directory, "Marker already committed");
                        Ok(())
                    }
                    Err(source) => Err(create_error(source)),
                }
            }
        }
    }
}
