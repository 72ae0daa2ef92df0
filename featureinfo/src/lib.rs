//! FeatureInfo - WMS GetFeatureInfo querying across layers and endpoints
//!
//! This library turns a click on a composed map view into one or more WMS
//! GetFeatureInfo requests, sends them concurrently, and delivers a single
//! ordered result once every request has answered, failed, or timed out.
//!
//! # Architecture
//!
//! ```text
//! click ──► FeatureInfoDispatcher ──► grouping ──► request builder
//!                 │                                      │
//!                 │                       AsyncHttpClient (one task/group)
//!                 │                                      │
//!                 │                         ResponseParser + attribution
//!                 ▼                                      │
//!         aggregator task ◄──────────── GroupResponse ───┘
//!                 │
//!                 ▼
//!       FeatureInfoEvents (one Complete per click)
//! ```

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod format;
pub mod http;
pub mod logging;
pub mod query;

/// Library version, taken from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
