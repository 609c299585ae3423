use super::models::Config;
use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

const MAX_MODULE_SIZE: u32 = 32;
const MAX_BORDER: u32 = 16;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("github.{field} must not be empty")]
    MissingGitHubField { field: &'static str },

    #[error("publish.directory '{0}' must be a relative path without empty segments")]
    InvalidDirectory(String),

    #[error("qr.module_size must be between 1 and {max}", max = MAX_MODULE_SIZE)]
    InvalidModuleSize,

    #[error("qr.border must be at most {max}", max = MAX_BORDER)]
    InvalidBorder,

    #[error("CORS origin '{0}' must look like scheme://host[:port]")]
    InvalidOrigin(String),

    #[error("validation.allowed_schemes must list at least one scheme")]
    NoAllowedSchemes,

    #[error("github.committer_name and github.committer_email must be set together")]
    IncompleteCommitter,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_github(config)?;
    validate_publish(config)?;
    validate_qr(config)?;
    validate_cors(config)?;
    validate_url_rules(config)?;
    Ok(())
}

fn validate_github(config: &Config) -> Result<(), ValidationError> {
    let github = &config.github;
    let required = [
        ("owner", &github.owner),
        ("repo", &github.repo),
        ("branch", &github.branch),
        ("api_base", &github.api_base),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(ValidationError::MissingGitHubField { field });
        }
    }

    if github.committer_name.is_some() != github.committer_email.is_some() {
        return Err(ValidationError::IncompleteCommitter);
    }

    Ok(())
}

fn validate_publish(config: &Config) -> Result<(), ValidationError> {
    let directory = &config.publish.directory;

    if directory.split('/').any(|segment| segment.is_empty() || segment == "..") {
        return Err(ValidationError::InvalidDirectory(directory.clone()));
    }

    Ok(())
}

fn validate_qr(config: &Config) -> Result<(), ValidationError> {
    if !(1..=MAX_MODULE_SIZE).contains(&config.qr.module_size) {
        return Err(ValidationError::InvalidModuleSize);
    }
    if config.qr.border > MAX_BORDER {
        return Err(ValidationError::InvalidBorder);
    }
    Ok(())
}

fn validate_cors(config: &Config) -> Result<(), ValidationError> {
    for origin in &config.cors.allowed_origins {
        if !is_origin(origin) {
            return Err(ValidationError::InvalidOrigin(origin.clone()));
        }
    }
    Ok(())
}

/// Browsers send `Origin` as bare `scheme://host[:port]`; `*` and anything with
/// a path, query or credentials can never match it.
fn is_origin(value: &str) -> bool {
    if HeaderValue::from_str(value).is_err() || value.ends_with('/') {
        return false;
    }

    Url::parse(value).is_ok_and(|url| {
        url.has_host()
            && url.path() == "/"
            && url.query().is_none()
            && url.fragment().is_none()
            && url.username().is_empty()
            && url.password().is_none()
    })
}

fn validate_url_rules(config: &Config) -> Result<(), ValidationError> {
    if config.validation.allowed_schemes.is_empty() {
        return Err(ValidationError::NoAllowedSchemes);
    }
    Ok(())
}
