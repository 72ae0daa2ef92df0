//! Transport request/response types.

use std::time::Duration;

use thiserror::Error;

use crate::query::RequestParams;

/// HTTP method used for GetFeatureInfo requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    /// Parameters in the query string.
    #[default]
    Get,
    /// Parameters as a form-encoded body.
    Post,
}

impl std::str::FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            other => Err(format!("unsupported method '{}'", other)),
        }
    }
}

/// One outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub params: RequestParams,
}

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// `Content-Type` header, if the server sent one.
    pub content_type: Option<String>,
    /// Raw body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Build a 200 response; convenient for scripted clients.
    pub fn ok(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.into()),
            body: body.into(),
        }
    }
}

/// Errors that can occur while performing a request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HttpError {
    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    ClientBuild(String),

    /// The request could not be sent or the connection failed.
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The response body could not be read.
    #[error("failed to read response from {url}: {message}")]
    Body { url: String, message: String },

    /// No response within the allowed time.
    #[error("request to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },
}
