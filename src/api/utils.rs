//! Request body helpers

use axum::body::Body;
use axum::http::{HeaderMap, header};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::de::DeserializeOwned;

use crate::api::error::ApiError;

/// Accepts `application/json`, optionally with parameters such as a charset
pub fn require_json(headers: &HeaderMap) -> Result<mime::Mime, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidPayload("missing Content-Type header".into()))?;

    let media_type: mime::Mime = content_type.parse().map_err(|_| {
        ApiError::InvalidPayload(format!("invalid Content-Type: {content_type}"))
    })?;

    if media_type.type_() != mime::APPLICATION || media_type.subtype() != mime::JSON {
        return Err(ApiError::InvalidPayload(format!(
            "Content-Type must be application/json, got: {}/{}",
            media_type.type_(),
            media_type.subtype()
        )));
    }

    Ok(media_type)
}

/// Reads at most `limit` bytes of body and deserializes them as JSON
pub async fn read_json<T: DeserializeOwned>(body: Body, limit: usize) -> Result<T, ApiError> {
    let bytes = Limited::new(body, limit)
        .collect()
        .await
        .map_err(|err| {
            if err.downcast_ref::<LengthLimitError>().is_some() {
                ApiError::PayloadTooLarge(limit)
            } else {
                ApiError::Internal(format!("failed to read body: {err}"))
            }
        })?
        .to_bytes();

    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn test_require_json_valid() {
        assert!(require_json(&headers("application/json")).is_ok());
        assert!(require_json(&headers("application/json; charset=utf-8")).is_ok());
    }

    #[test]
    fn test_require_json_invalid() {
        assert!(require_json(&headers("application/jsonp")).is_err());
        assert!(require_json(&headers("text/plain")).is_err());
        assert!(require_json(&headers("multipart/form-data; boundary=x")).is_err());
        assert!(require_json(&HeaderMap::new()).is_err());
    }

    #[tokio::test]
    async fn test_read_json() {
        let value: serde_json::Value = read_json(Body::from(r#"{"url":"http://a.io"}"#), 1024)
            .await
            .unwrap();
        assert_eq!(value["url"], "http://a.io");
    }

    #[tokio::test]
    async fn test_read_json_over_limit() {
        let body = Body::from(format!(r#"{{"url":"http://a.io/{}"}}"#, "x".repeat(100)));
        let result: Result<serde_json::Value, _> = read_json(body, 64).await;
        assert!(matches!(result, Err(ApiError::PayloadTooLarge(64))));
    }

    #[tokio::test]
    async fn test_read_json_malformed() {
        let result: Result<serde_json::Value, _> = read_json(Body::from("{not json"), 1024).await;
        assert!(matches!(result, Err(ApiError::InvalidPayload(_))));
    }
}
