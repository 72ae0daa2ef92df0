//! Dispatcher configuration and per-dispatch options.

use std::time::Duration;

use crate::http::HttpMethod;
use crate::query::{GroupingPolicy, RequestSettings};

/// Default time a single GetFeatureInfo request may take.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for one `dispatch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Combine targets sharing an endpoint into one request.
    ///
    /// When false, all targets go into a single request to the first
    /// target's endpoint.
    pub batch_by_endpoint: bool,

    /// One request per target. Overrides `batch_by_endpoint`.
    pub per_target_requests: bool,

    /// Overrides the configured `FEATURE_COUNT` for this dispatch.
    pub feature_count: Option<u32>,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            batch_by_endpoint: true,
            per_target_requests: false,
            feature_count: None,
        }
    }
}

impl DispatchOptions {
    pub fn with_batch_by_endpoint(mut self, batch: bool) -> Self {
        self.batch_by_endpoint = batch;
        self
    }

    pub fn with_per_target_requests(mut self, per_target: bool) -> Self {
        self.per_target_requests = per_target;
        self
    }

    pub fn with_feature_count(mut self, count: u32) -> Self {
        self.feature_count = Some(count);
        self
    }

    /// Grouping policy implied by these options.
    pub fn grouping_policy(&self) -> GroupingPolicy {
        if self.per_target_requests {
            GroupingPolicy::PerTarget
        } else if self.batch_by_endpoint {
            GroupingPolicy::ByEndpoint
        } else {
            GroupingPolicy::Combined
        }
    }
}

/// Long-lived dispatcher settings.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Per-request timeout; expiry counts as a failed group.
    pub timeout: Duration,
    /// HTTP method for GetFeatureInfo requests.
    pub method: HttpMethod,
    /// Feature count, default info format and global vendor parameters.
    pub request: RequestSettings,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
            method: HttpMethod::Get,
            request: RequestSettings::default(),
        }
    }
}

impl DispatcherConfig {
    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the HTTP method.
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the default `FEATURE_COUNT`.
    pub fn with_feature_count(mut self, count: u32) -> Self {
        self.request.feature_count = count;
        self
    }

    /// Set the default `INFO_FORMAT`.
    pub fn with_info_format(mut self, info_format: impl Into<String>) -> Self {
        self.request.info_format = info_format.into();
        self
    }

    /// Add a global vendor parameter.
    pub fn with_vendor_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.vendor_params.push((key.into(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = DispatchOptions::default();
        assert!(options.batch_by_endpoint);
        assert!(!options.per_target_requests);
        assert_eq!(options.grouping_policy(), GroupingPolicy::ByEndpoint);
    }

    #[test]
    fn test_per_target_overrides_batching() {
        let options = DispatchOptions::default()
            .with_batch_by_endpoint(true)
            .with_per_target_requests(true);
        assert_eq!(options.grouping_policy(), GroupingPolicy::PerTarget);

        let options = options.with_batch_by_endpoint(false);
        assert_eq!(options.grouping_policy(), GroupingPolicy::PerTarget);
    }

    #[test]
    fn test_no_batching_combines() {
        let options = DispatchOptions::default().with_batch_by_endpoint(false);
        assert_eq!(options.grouping_policy(), GroupingPolicy::Combined);
    }

    #[test]
    fn test_config_builder() {
        let config = DispatcherConfig::default()
            .with_timeout(Duration::from_secs(5))
            .with_method(HttpMethod::Post)
            .with_feature_count(25)
            .with_info_format("application/json")
            .with_vendor_param("buffer", "10");

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.method, HttpMethod::Post);
        assert_eq!(config.request.feature_count, 25);
        assert_eq!(config.request.info_format, "application/json");
        assert_eq!(
            config.request.vendor_params,
            vec![("buffer".to_string(), "10".to_string())]
        );
    }
}
