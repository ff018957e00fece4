//! Request and response models for the content endpoint.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::form_urlencoded;

use crate::core::error::RequestError;
use crate::core::job::{ContentItem, ContentRequest};
use crate::core::worker_pool::PoolError;

/// JSON content type of every response body.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Why a request could not be served.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Caller input failed validation.
    #[error("invalid request: {0}")]
    InvalidInput(#[from] RequestError),
    /// The service is shutting down.
    #[error("service is shutting down")]
    ShuttingDown,
    /// The per-request worker pool could not be started.
    #[error("worker pool failure: {0}")]
    Pool(#[from] PoolError),
}

impl ServiceError {
    /// HTTP status code reported for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::ShuttingDown => 503,
            Self::Pool(_) => 500,
        }
    }
}

/// Body of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    pub error: String,
}

/// Successful response body: items in schedule order, possibly fewer than asked.
pub type ContentResponse = Vec<ContentItem>;

/// Transport-neutral response: status, content type and serialized body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    /// HTTP status code.
    pub status: u16,
    /// Value for the `Content-Type` header.
    pub content_type: &'static str,
    /// JSON body.
    pub body: String,
}

impl ServiceResponse {
    /// 200 response carrying `items`.
    #[must_use]
    pub fn ok(items: &[ContentItem]) -> Self {
        Self::json(200, items)
    }

    /// Error response with the status of `err`.
    #[must_use]
    pub fn from_error(err: &ServiceError) -> Self {
        Self::json(
            err.status_code(),
            &ErrorBody {
                error: err.to_string(),
            },
        )
    }

    fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status,
                content_type: CONTENT_TYPE_JSON,
                body,
            },
            Err(e) => Self {
                status: 500,
                content_type: CONTENT_TYPE_JSON,
                body: format!("{{\"error\":\"serialization failed: {}\"}}", e.to_string().replace('"', "'")),
            },
        }
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

impl ContentRequest {
    /// Parse `count` and `offset` from a URL query string such as
    /// `count=5&offset=0`. Both are required; the first occurrence wins.
    /// Keys and values are form-decoded first, so `count=%35` reads as 5.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] if a parameter is missing, not an integer,
    /// `count < 1` or `offset < 0`.
    pub fn from_query(query: &str, requester: impl Into<String>) -> Result<Self, RequestError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let count = integer_param(query, "count")?;
        if count < 1 {
            return Err(RequestError::CountTooSmall(count));
        }
        let offset = integer_param(query, "offset")?;
        if offset < 0 {
            return Err(RequestError::NegativeOffset(offset));
        }

        let count = usize::try_from(count).map_err(|_| malformed("count", count))?;
        let offset = usize::try_from(offset).map_err(|_| malformed("offset", offset))?;
        Ok(Self::new(count, offset, requester))
    }
}

fn malformed(param: &'static str, value: i64) -> RequestError {
    RequestError::Malformed {
        param,
        value: value.to_string(),
    }
}

fn query_param(query: &str, name: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find_map(|(key, value)| (key == name).then(|| value.into_owned()))
}

fn integer_param(query: &str, name: &'static str) -> Result<i64, RequestError> {
    let raw = query_param(query, name).ok_or(RequestError::Missing(name))?;
    raw.parse().map_err(|_| RequestError::Malformed {
        param: name,
        value: raw,
    })
}

/// Caller identity: the `X-Forwarded-For` value when present and non-empty,
/// otherwise the peer address.
#[must_use]
pub fn requester_identity(forwarded_for: Option<&str>, remote_addr: &str) -> String {
    forwarded_for
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(remote_addr)
        .to_string()
}
