//! GetFeatureInfo query model and request construction.
//!
//! This module holds the immutable inputs of a query (the layers being
//! queried, the clicked pixel, the map view it was clicked on) and the pure
//! functions that turn them into wire requests:
//!
//! - [`partition`] decides how many requests a click needs
//! - [`build_params`] produces the GetFeatureInfo parameter set for one request
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use featureinfo::query::{
//!     build_params, ClickPosition, Extent, GroupingPolicy, MapView, QueryTarget,
//!     RequestSettings, partition,
//! };
//!
//! let view = MapView::new("EPSG:28992", Extent::new(0.0, 300000.0, 280000.0, 625000.0), 800, 600);
//! let targets = vec![
//!     Arc::new(QueryTarget::new("roads", "https://example.com/wms").with_layers(["roads"])),
//!     Arc::new(QueryTarget::new("rivers", "https://example.com/wms").with_layers(["rivers"])),
//! ];
//!
//! let groups = partition(&targets, GroupingPolicy::ByEndpoint);
//! assert_eq!(groups.len(), 1);
//!
//! let params = build_params(&groups[0].targets, ClickPosition::new(10.0, 20.0), &view, &RequestSettings::default());
//! assert_eq!(params.get("layers"), Some("roads,rivers"));
//! ```

mod group;
mod params;
mod types;

pub use group::{partition, GroupingPolicy, RequestGroup};
pub use params::{
    build_params, RequestParams, RequestSettings, DEFAULT_FEATURE_COUNT, DEFAULT_IMAGE_FORMAT,
    DEFAULT_INFO_FORMAT,
};
pub use types::{
    ClickPosition, Extent, MapView, ProtocolVersion, QueryTarget, DEFAULT_WMS_VERSION,
};
