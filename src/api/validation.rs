use thiserror::Error;
use url::{Host, Url};

use crate::config::UrlRules;

#[derive(Debug, Error)]
pub enum UrlError {
    #[error("url must not be empty")]
    Empty,
    #[error("url is not absolute: {0}")]
    Parse(#[from] url::ParseError),
    #[error("scheme '{0}' is not allowed")]
    SchemeNotAllowed(String),
    #[error("url has no host")]
    MissingHost,
    #[error("host '{0}' contains characters outside [a-zA-Z0-9.-]")]
    InvalidHost(String),
}

/// A submitted URL that passed validation, together with its file-safe name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrTarget {
    pub url: String,
    pub name: String,
}

impl QrTarget {
    /// Repository path of the PNG for this target, e.g. `qr_codes/example.com_page.png`.
    pub fn asset_path(&self, directory: &str) -> String {
        format!("{}/{}.png", directory, self.name)
    }
}

pub fn validate_url(raw: &str, rules: &UrlRules) -> Result<QrTarget, UrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = Url::parse(raw)?;

    if !rules
        .allowed_schemes
        .iter()
        .any(|scheme| scheme.eq_ignore_ascii_case(parsed.scheme()))
    {
        return Err(UrlError::SchemeNotAllowed(parsed.scheme().to_string()));
    }

    match parsed.host() {
        None => return Err(UrlError::MissingHost),
        Some(Host::Domain("")) => return Err(UrlError::MissingHost),
        Some(Host::Domain(domain)) if !is_allowed_host(domain) => {
            return Err(UrlError::InvalidHost(domain.to_string()));
        }
        Some(Host::Ipv6(addr)) => return Err(UrlError::InvalidHost(addr.to_string())),
        Some(_) => {}
    }

    Ok(QrTarget {
        url: raw.to_string(),
        name: sanitize(raw),
    })
}

fn is_allowed_host(host: &str) -> bool {
    !host.is_empty() && host.chars().all(is_name_char)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '-'
}

/// Derives a path-safe identifier from a URL.
///
/// Drops the leading `scheme:` and any `/` or `\` after it, trims trailing
/// `/`, then maps every character outside `[a-zA-Z0-9.-]` to `_`. The output is
/// a fixed point: `sanitize(sanitize(x)) == sanitize(x)`.
pub fn sanitize(raw: &str) -> String {
    strip_scheme(raw)
        .trim_end_matches('/')
        .chars()
        .map(|c| if is_name_char(c) { c } else { '_' })
        .collect()
}

/// `http:example.com`, `https:/example.com` and `http://example.com` all parse
/// to the same URL, so all of them lose the same prefix.
fn strip_scheme(raw: &str) -> &str {
    match raw.split_once(':') {
        Some((scheme, rest)) if is_scheme(scheme) => rest.trim_start_matches(['/', '\\']),
        _ => raw,
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
