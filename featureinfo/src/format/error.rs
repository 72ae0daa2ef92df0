//! Format error types.

use thiserror::Error;

/// Errors raised while reading a response body.
#[derive(Debug, Error)]
pub enum FormatError {
    /// No reader for this content type.
    #[error("unsupported content type '{0}'")]
    UnsupportedContentType(String),

    /// Body is not valid in its declared (or default UTF-8) encoding.
    #[error("response is not valid {0}")]
    Encoding(&'static str),

    /// XML syntax error.
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed XML attribute.
    #[error("attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    /// JSON syntax error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document is well-formed but not what the format promised.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The server answered with an OGC exception report.
    #[error("service exception: {0}")]
    ServiceException(String),
}
