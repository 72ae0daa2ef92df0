//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file. Layer
//! sections (`[target:<id>]`) are read straight into [`QueryTarget`]s.

use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::LayerCatalog;
use crate::dispatch::{DispatchOptions, DispatcherConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::http::HttpMethod;
use crate::query::{Extent, MapView, QueryTarget, DEFAULT_FEATURE_COUNT, DEFAULT_INFO_FORMAT};

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    /// Grouping, timeout and request defaults
    pub dispatch: DispatchSettings,
    /// Map view the clicks refer to
    pub view: ViewSettings,
    /// Global vendor parameters, in file order
    pub vendor: Vec<(String, String)>,
    /// Logging settings
    pub logging: LoggingSettings,
    /// Layers, in file order
    pub targets: Vec<QueryTarget>,
}

/// `[dispatch]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSettings {
    pub batch_by_endpoint: bool,
    pub per_target_requests: bool,
    /// Request timeout in seconds
    pub timeout: u64,
    pub feature_count: u32,
    pub info_format: String,
    pub method: HttpMethod,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            batch_by_endpoint: true,
            per_target_requests: false,
            timeout: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            feature_count: DEFAULT_FEATURE_COUNT,
            info_format: DEFAULT_INFO_FORMAT.to_string(),
            method: HttpMethod::Get,
        }
    }
}

/// `[view]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    pub projection: String,
    pub extent: Extent,
    pub width: u32,
    pub height: u32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        let view = MapView::default();
        Self {
            projection: view.projection,
            extent: view.extent,
            width: view.width,
            height: view.height,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: super::file::config_directory().join("featureinfo.log"),
        }
    }
}

impl ConfigFile {
    /// Dispatcher settings described by this file.
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        let mut config = DispatcherConfig::default()
            .with_timeout(Duration::from_secs(self.dispatch.timeout))
            .with_method(self.dispatch.method)
            .with_feature_count(self.dispatch.feature_count)
            .with_info_format(self.dispatch.info_format.clone());
        for (key, value) in &self.vendor {
            config = config.with_vendor_param(key.clone(), value.clone());
        }
        config
    }

    /// Default per-dispatch options.
    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions::default()
            .with_batch_by_endpoint(self.dispatch.batch_by_endpoint)
            .with_per_target_requests(self.dispatch.per_target_requests)
    }

    pub fn map_view(&self) -> MapView {
        MapView::new(
            self.view.projection.clone(),
            self.view.extent,
            self.view.width,
            self.view.height,
        )
    }

    /// Layer catalog holding every configured target.
    pub fn catalog(&self) -> LayerCatalog {
        self.targets.iter().cloned().collect()
    }
}
