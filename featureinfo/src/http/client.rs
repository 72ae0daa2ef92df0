//! Async HTTP client trait and its reqwest implementation.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::types::{HttpError, HttpMethod, HttpRequest, HttpResponse};

/// Default request timeout used by [`AsyncReqwestClient::new`].
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!("featureinfo/", env!("CARGO_PKG_VERSION"));

/// Trait for asynchronous HTTP client operations.
///
/// Implementations must report non-success status codes as
/// [`HttpError::Status`] so callers only ever see 2xx responses as `Ok`.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs the request and returns the response.
    ///
    /// # Arguments
    ///
    /// * `request` - Method, URL and parameters to send
    fn send(
        &self,
        request: &HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send;
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl AsyncReqwestClient {
    /// Creates a new client with the default 30 second timeout.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a new client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| HttpError::ClientBuild(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Timeout applied to every request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET carries the parameters in the query string, POST as a
    /// form-encoded body.
    fn request_builder(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let url = request.url.as_str();
        match request.method {
            HttpMethod::Get => self.client.get(url).query(request.params.pairs()),
            HttpMethod::Post => self.client.post(url).form(request.params.pairs()),
        }
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        let url = request.url.as_str();
        trace!(url = url, method = ?request.method, "HTTP request starting");

        let response = match self.request_builder(request).send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                if e.is_timeout() {
                    return Err(HttpError::Timeout {
                        url: url.to_string(),
                        after: self.timeout,
                    });
                }
                return Err(HttpError::Request {
                    url: url.to_string(),
                    message: e.to_string(),
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(url = url, status = status.as_u16(), "HTTP error status");
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url = url, bytes = bytes.len(), "HTTP response body read");
                Ok(HttpResponse {
                    status: status.as_u16(),
                    content_type,
                    body: bytes.to_vec(),
                })
            }
            Err(e) => {
                warn!(url = url, error = %e, "Failed to read response body");
                Err(HttpError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::RequestParams;

    #[test]
    fn test_client_builds_with_custom_timeout() {
        let client = AsyncReqwestClient::with_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }

    fn request(method: HttpMethod) -> HttpRequest {
        let mut params = RequestParams::new();
        params.insert("service", "WMS");
        params.insert("query_layers", "roads,rivers");
        params.insert("cql_filter", "kind = 'school'");
        HttpRequest {
            method,
            url: "http://maps.example.com/wms?map=/srv/roads.map".to_string(),
            params,
        }
    }

    #[test]
    fn test_get_encodes_params_in_query_string() {
        let client = AsyncReqwestClient::new().unwrap();
        let built = client
            .request_builder(&request(HttpMethod::Get))
            .build()
            .unwrap();

        assert_eq!(*built.method(), reqwest::Method::GET);
        assert_eq!(
            built.url().query(),
            Some("map=/srv/roads.map&SERVICE=WMS&QUERY_LAYERS=roads%2Crivers&CQL_FILTER=kind+%3D+%27school%27")
        );
        assert!(built.body().is_none());
    }

    #[test]
    fn test_post_sends_form_body() {
        let client = AsyncReqwestClient::new().unwrap();
        let built = client
            .request_builder(&request(HttpMethod::Post))
            .build()
            .unwrap();

        assert_eq!(*built.method(), reqwest::Method::POST);
        assert_eq!(built.url().query(), Some("map=/srv/roads.map"));
        assert_eq!(
            built
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("application/x-www-form-urlencoded")
        );
        let body = built.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(
            body,
            b"SERVICE=WMS&QUERY_LAYERS=roads%2Crivers&CQL_FILTER=kind+%3D+%27school%27"
        );
    }

    #[test]
    fn test_user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("featureinfo/"));
    }
}
