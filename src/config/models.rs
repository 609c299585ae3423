use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub qr: QrConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub validation: UrlRules,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Upper bound on the request body of `POST /generate-qr/`
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_max_body_bytes() -> usize {
    16 * 1024
}

/// GitHub repository that hosts the published images
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubConfig {
    #[serde(default)]
    pub owner: String,
    #[serde(default = "default_repo")]
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Access token (loaded from environment, never from the config file)
    #[serde(skip)]
    pub token: Option<String>,
    pub committer_name: Option<String>,
    pub committer_email: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: default_repo(),
            branch: default_branch(),
            api_base: default_api_base(),
            user_agent: default_user_agent(),
            token: None,
            committer_name: None,
            committer_email: None,
        }
    }
}

fn default_repo() -> String {
    "qr-codes-repo".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_user_agent() -> String {
    concat!("qrpages/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Where images land inside the repository
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublishConfig {
    #[serde(default = "default_directory")]
    pub directory: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
        }
    }
}

fn default_directory() -> String {
    "qr_codes".to_string()
}

/// QR error correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EcLevel {
    #[default]
    L,
    M,
    Q,
    H,
}

/// Rendering profile shared by every request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QrConfig {
    #[serde(default)]
    pub ec_level: EcLevel,
    /// Edge length of one module, in pixels
    #[serde(default = "default_module_size")]
    pub module_size: u32,
    /// Quiet zone width, in modules
    #[serde(default = "default_border")]
    pub border: u32,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            ec_level: EcLevel::default(),
            module_size: default_module_size(),
            border: default_border(),
        }
    }
}

fn default_module_size() -> u32 {
    10
}

fn default_border() -> u32 {
    4
}

/// Cross-origin policy for the HTTP surface
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

/// Acceptance rules for submitted URLs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UrlRules {
    #[serde(default = "default_allowed_schemes")]
    pub allowed_schemes: Vec<String>,
}

impl Default for UrlRules {
    fn default() -> Self {
        Self {
            allowed_schemes: default_allowed_schemes(),
        }
    }
}

fn default_allowed_schemes() -> Vec<String> {
    vec!["http".to_string(), "https".to_string()]
}
