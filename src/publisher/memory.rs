//! In-process store with the same revision rules as the GitHub contents API.
//!
//! Used by the test suite and by `qrpages serve --in-memory-store` for local
//! development without a token.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tokio::sync::Mutex;

use super::{Lookup, RemoteStore, Result, StoreError, WriteOutcome, WriteRequest};

/// Most recent calls kept in the operation log; older entries are dropped.
pub const OPERATION_LOG_CAPACITY: usize = 1024;

/// A call recorded by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Read(String),
    Write { path: String, sha: Option<String> },
}

impl Operation {
    pub fn read(path: &str) -> Self {
        Self::Read(path.to_string())
    }

    pub fn write(path: &str, sha: Option<&str>) -> Self {
        Self::Write {
            path: path.to_string(),
            sha: sha.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub content: Vec<u8>,
    pub sha: String,
    pub message: String,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, StoredFile>,
    failures: HashMap<String, u16>,
    operations: VecDeque<Operation>,
    revision: u64,
}

impl State {
    fn next_sha(&mut self) -> String {
        self.revision += 1;
        format!("rev-{:08}", self.revision)
    }

    fn record(&mut self, operation: Operation) {
        if self.operations.len() == OPERATION_LOG_CAPACITY {
            self.operations.pop_front();
        }
        self.operations.push_back(operation);
    }

    fn is_directory(&self, path: &str) -> bool {
        let prefix = format!("{path}/");
        self.files
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(key, _)| key.starts_with(&prefix))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, returning its revision
    pub async fn insert(&self, path: &str, content: &[u8]) -> String {
        let mut state = self.state.lock().await;
        let sha = state.next_sha();
        state.files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_vec(),
                sha: sha.clone(),
                message: "seed".to_string(),
            },
        );
        sha
    }

    /// Make every write to `path` fail with the given HTTP status
    pub async fn fail_writes(&self, path: &str, status: u16) {
        self.state
            .lock()
            .await
            .failures
            .insert(path.to_string(), status);
    }

    pub async fn file(&self, path: &str) -> Option<StoredFile> {
        self.state.lock().await.files.get(path).cloned()
    }

    pub async fn paths(&self) -> Vec<String> {
        self.state.lock().await.files.keys().cloned().collect()
    }

    pub async fn operations(&self) -> Vec<Operation> {
        self.state.lock().await.operations.iter().cloned().collect()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<Lookup> {
        // Lets concurrent publishes interleave between steps
        tokio::task::yield_now().await;

        let mut state = self.state.lock().await;
        state.record(Operation::read(path));

        if let Some(file) = state.files.get(path) {
            return Ok(Lookup::File {
                sha: file.sha.clone(),
            });
        }
        if state.is_directory(path) {
            return Ok(Lookup::Directory);
        }
        Ok(Lookup::Missing)
    }

    async fn write(&self, request: WriteRequest) -> Result<WriteOutcome> {
        tokio::task::yield_now().await;

        let mut state = self.state.lock().await;
        state.record(Operation::write(&request.path, request.sha.as_deref()));

        let failure = state.failures.get(&request.path).copied();
        if let Some(status) = failure {
            return Err(StoreError::Rejected {
                path: request.path,
                status,
                body: "injected failure".to_string(),
            });
        }

        let content = BASE64
            .decode(&request.content)
            .map_err(|e| StoreError::Rejected {
                path: request.path.clone(),
                status: 422,
                body: format!("content is not valid base64: {e}"),
            })?;

        let current = state.files.get(&request.path).map(|file| file.sha.clone());
        let outcome = match (current, request.sha.as_deref()) {
            (None, None) => WriteOutcome::Created,
            (Some(current), Some(given)) if current == given => WriteOutcome::Updated,
            _ => return Err(StoreError::Conflict { path: request.path }),
        };

        let sha = state.next_sha();
        state.files.insert(
            request.path,
            StoredFile {
                content,
                sha,
                message: request.message,
            },
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &str, content: &[u8], sha: Option<&str>) -> WriteRequest {
        WriteRequest {
            path: path.to_string(),
            content: BASE64.encode(content),
            message: format!("write {path}"),
            sha: sha.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_read_distinguishes_file_directory_missing() {
        let store = MemoryStore::new();
        let sha = store.insert("a/b/c.png", b"png").await;

        assert_eq!(store.read("a/b/c.png").await.unwrap(), Lookup::File { sha });
        assert_eq!(store.read("a/b").await.unwrap(), Lookup::Directory);
        assert_eq!(store.read("a").await.unwrap(), Lookup::Directory);
        assert_eq!(store.read("a/b/c").await.unwrap(), Lookup::Missing);
        assert_eq!(store.read("a/bb").await.unwrap(), Lookup::Missing);
    }

    #[tokio::test]
    async fn test_create_then_update() {
        let store = MemoryStore::new();

        let outcome = store.write(write("x.png", b"one", None)).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Created);

        let sha = store.file("x.png").await.unwrap().sha;
        let outcome = store.write(write("x.png", b"two", Some(sha.as_str()))).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Updated);

        let file = store.file("x.png").await.unwrap();
        assert_eq!(file.content, b"two");
        assert_ne!(file.sha, sha);
    }

    #[tokio::test]
    async fn test_write_without_revision_conflicts() {
        let store = MemoryStore::new();
        store.insert("x.png", b"one").await;

        let err = store.write(write("x.png", b"two", None)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(store.file("x.png").await.unwrap().content, b"one");
    }

    #[tokio::test]
    async fn test_stale_revision_conflicts() {
        let store = MemoryStore::new();
        let stale = store.insert("x.png", b"one").await;
        store.write(write("x.png", b"two", Some(stale.as_str()))).await.unwrap();

        let err = store.write(write("x.png", b"three", Some(stale.as_str()))).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(store.file("x.png").await.unwrap().content, b"two");
    }

    #[tokio::test]
    async fn test_revision_for_missing_file_conflicts() {
        let store = MemoryStore::new();
        let err = store
            .write(write("x.png", b"one", Some("rev-00000042")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert!(store.paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_operation_log_is_bounded() {
        let store = MemoryStore::new();
        for i in 0..OPERATION_LOG_CAPACITY + 10 {
            store.read(&format!("file-{i}.png")).await.unwrap();
        }

        let operations = store.operations().await;
        assert_eq!(operations.len(), OPERATION_LOG_CAPACITY);
        assert_eq!(operations[0], Operation::read("file-10.png"));
        assert_eq!(
            operations.last(),
            Some(&Operation::read(&format!("file-{}.png", OPERATION_LOG_CAPACITY + 9)))
        );
    }

    #[tokio::test]
    async fn test_invalid_base64_rejected() {
        let store = MemoryStore::new();
        let request = WriteRequest {
            path: "x.png".to_string(),
            content: "***".to_string(),
            message: "bad".to_string(),
            sha: None,
        };
        let err = store.write(request).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 422, .. }));
    }
}
