//! Request and response bodies of the HTTP API.
//!
//! ```json
//! POST /generate-qr/
//! { "url": "https://example.com/page" }
//!
//! 200 OK
//! { "qr_code_url": "https://octocat.github.io/qr-codes-repo/qr_codes/example.com_page.png" }
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Clone)]
pub struct QrRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QrResponse {
    pub qr_code_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub version: String,
    pub counters: crate::observability::MetricsSnapshot,
}
