//! Dispatch cycle types.

use std::fmt;
use std::sync::Arc;

use crate::format::ParsedFeature;
use crate::http::{HttpError, HttpRequest};
use crate::query::{ClickPosition, QueryTarget};

/// Identifier of one dispatch cycle; strictly increasing per dispatcher.
pub type CycleId = u64;

/// One request of a dispatch cycle, ready to be issued.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    /// Cycle the request belongs to.
    pub cycle: CycleId,
    /// Group index within the cycle; decides the position of its results.
    pub index: usize,
    /// Endpoint URL.
    pub endpoint: String,
    /// Targets covered by this request.
    pub targets: Vec<Arc<QueryTarget>>,
    /// Wire request.
    pub request: HttpRequest,
}

impl PendingRequest {
    pub fn target_ids(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.id.clone()).collect()
    }
}

/// A feature together with the target it was returned for.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributedFeature {
    pub target: Arc<QueryTarget>,
    pub feature: ParsedFeature,
}

/// Why a group produced no features.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupFailure {
    /// Network error, non-success status or timeout.
    Transport(HttpError),
    /// The body could not be read in its content type.
    Parse(String),
}

impl fmt::Display for GroupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupFailure::Transport(e) => write!(f, "transport: {}", e),
            GroupFailure::Parse(msg) => write!(f, "parse: {}", msg),
        }
    }
}

/// Outcome of one request group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupResult {
    /// Group index within the cycle.
    pub index: usize,
    /// Endpoint the request went to.
    pub endpoint: String,
    /// Identifiers of the group's targets.
    pub target_ids: Vec<String>,
    /// Features, attributed to targets.
    pub features: Vec<AttributedFeature>,
    /// Raw body for textual info formats.
    pub text: Option<String>,
    /// Set when the group failed; `features` is then empty.
    pub failure: Option<GroupFailure>,
}

impl GroupResult {
    /// A group that failed and contributes no features.
    pub fn failed(request: &PendingRequest, failure: GroupFailure) -> Self {
        Self {
            index: request.index,
            endpoint: request.endpoint.clone(),
            target_ids: request.target_ids(),
            features: Vec::new(),
            text: None,
            failure: Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// The aggregated answer to one click.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureInfoResult {
    /// Cycle this result belongs to.
    pub cycle: CycleId,
    /// Where the user clicked.
    pub click: ClickPosition,
    /// One entry per request group, in dispatch order.
    pub groups: Vec<GroupResult>,
}

impl FeatureInfoResult {
    /// All features in dispatch order.
    pub fn features(&self) -> impl Iterator<Item = &AttributedFeature> {
        self.groups.iter().flat_map(|g| g.features.iter())
    }

    pub fn feature_count(&self) -> usize {
        self.groups.iter().map(|g| g.features.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.feature_count() == 0
    }

    /// Groups that failed.
    pub fn failed_groups(&self) -> impl Iterator<Item = &GroupResult> {
        self.groups.iter().filter(|g| !g.is_success())
    }
}

/// Events delivered to the host application.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureInfoEvent {
    /// The click had nothing to query.
    NoTargets { cycle: CycleId },
    /// Every group of the cycle has reported.
    Complete(FeatureInfoResult),
}

/// What `dispatch` did, returned synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchTicket {
    /// No targets; no requests were issued.
    NoTargets { cycle: CycleId },
    /// Requests were issued; a `Complete` event will follow.
    Dispatched { cycle: CycleId, requests: usize },
}

impl DispatchTicket {
    pub fn cycle(&self) -> CycleId {
        match self {
            DispatchTicket::NoTargets { cycle } => *cycle,
            DispatchTicket::Dispatched { cycle, .. } => *cycle,
        }
    }
}
