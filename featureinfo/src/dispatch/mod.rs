//! GetFeatureInfo dispatch and response aggregation.
//!
//! One click becomes one *dispatch cycle*. The dispatcher partitions the
//! queried targets into request groups, registers the number of groups with
//! the aggregator, and only then issues the requests, one Tokio task each.
//! Every task reports exactly once (features, parse failure, transport
//! failure or timeout), and the aggregator emits a single
//! [`FeatureInfoEvent::Complete`] once all groups of the cycle have reported.
//!
//! # Architecture
//!
//! ```text
//! dispatch(click) ──► Begin{cycle, expected} ──┐
//!        │                                     ▼
//!        ├──► request task 0 ──► Response ──► aggregator task ──► FeatureInfoEvents
//!        ├──► request task 1 ──► Response ──┘   (owns AggregationState)
//!        └──► request task n ──► Response ──┘
//! ```
//!
//! A new dispatch supersedes the running cycle: the aggregator drops its
//! state and discards any late responses tagged with the old cycle id.
//!
//! # Example
//!
//! ```ignore
//! use featureinfo::dispatch::{DispatchOptions, DispatcherConfig, FeatureInfoDispatcher, FeatureInfoEvent};
//! use featureinfo::http::AsyncReqwestClient;
//! use featureinfo::query::{ClickPosition, MapView};
//!
//! let (mut dispatcher, mut events) =
//!     FeatureInfoDispatcher::start(AsyncReqwestClient::new()?, DispatcherConfig::default(), view);
//!
//! dispatcher.dispatch(ClickPosition::new(120.0, 80.0), &targets, &DispatchOptions::default());
//!
//! if let Some(FeatureInfoEvent::Complete(result)) = events.recv().await {
//!     for item in result.features() {
//!         println!("{}: {:?}", item.target.id, item.feature.attributes);
//!     }
//! }
//! ```

mod attribution;
mod dispatcher;
mod options;
mod state;
mod types;

pub use dispatcher::{FeatureInfoDispatcher, FeatureInfoEvents};
pub use options::{DispatchOptions, DispatcherConfig, DEFAULT_REQUEST_TIMEOUT};
pub use state::AggregationState;
pub use types::{
    AttributedFeature, CycleId, DispatchTicket, FeatureInfoEvent, FeatureInfoResult, GroupFailure,
    GroupResult, PendingRequest,
};
