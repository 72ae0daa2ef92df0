//! The GetFeatureInfo dispatcher and its aggregator task.

use std::sync::Arc;
use std::time::Instant;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::attribution::attribute;
use super::options::{DispatchOptions, DispatcherConfig};
use super::state::{Aggregator, AggregatorMessage};
use super::types::{
    CycleId, DispatchTicket, FeatureInfoEvent, GroupFailure, GroupResult, PendingRequest,
};
use crate::format::{DefaultResponseParser, ResponseParser};
use crate::http::{AsyncHttpClient, HttpError, HttpRequest};
use crate::query::{build_params, partition, ClickPosition, MapView, QueryTarget, RequestSettings};

/// Receiving side of the dispatcher's event stream.
#[derive(Debug)]
pub struct FeatureInfoEvents {
    rx: mpsc::UnboundedReceiver<FeatureInfoEvent>,
}

impl FeatureInfoEvents {
    /// Wait for the next event.
    ///
    /// Returns `None` once the dispatcher and all in-flight requests are gone.
    pub async fn recv(&mut self) -> Option<FeatureInfoEvent> {
        self.rx.recv().await
    }

    /// Take an event if one is ready.
    pub fn try_recv(&mut self) -> Option<FeatureInfoEvent> {
        self.rx.try_recv().ok()
    }
}

/// Issues GetFeatureInfo requests for map clicks and aggregates the answers.
///
/// Created with [`FeatureInfoDispatcher::start`], which spawns the
/// aggregator task and therefore must be called inside a Tokio runtime.
/// The dispatcher keeps a handle to that runtime, so [`dispatch`](Self::dispatch)
/// may be called from any thread afterwards.
pub struct FeatureInfoDispatcher<C, P = DefaultResponseParser> {
    client: Arc<C>,
    parser: Arc<P>,
    config: DispatcherConfig,
    view: MapView,
    next_cycle: CycleId,
    runtime: Handle,
    aggregator_tx: mpsc::UnboundedSender<AggregatorMessage>,
}

impl<C> FeatureInfoDispatcher<C, DefaultResponseParser>
where
    C: AsyncHttpClient + 'static,
{
    /// Start a dispatcher using the built-in response parser.
    pub fn start(client: C, config: DispatcherConfig, view: MapView) -> (Self, FeatureInfoEvents) {
        Self::with_parser(client, DefaultResponseParser, config, view)
    }
}

impl<C, P> FeatureInfoDispatcher<C, P>
where
    C: AsyncHttpClient + 'static,
    P: ResponseParser + 'static,
{
    /// Start a dispatcher with a custom response parser.
    ///
    /// # Panics
    ///
    /// When called outside a Tokio runtime.
    pub fn with_parser(
        client: C,
        parser: P,
        config: DispatcherConfig,
        view: MapView,
    ) -> (Self, FeatureInfoEvents) {
        let (aggregator_tx, aggregator_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let runtime = Handle::current();
        runtime.spawn(run_aggregator(aggregator_rx, events_tx));

        info!(
            timeout_ms = config.timeout.as_millis() as u64,
            method = ?config.method,
            projection = %view.projection,
            "FeatureInfo dispatcher started"
        );

        let dispatcher = Self {
            client: Arc::new(client),
            parser: Arc::new(parser),
            config,
            view,
            next_cycle: 1,
            runtime,
            aggregator_tx,
        };

        (dispatcher, FeatureInfoEvents { rx: events_rx })
    }

    /// Current map view.
    pub fn view(&self) -> &MapView {
        &self.view
    }

    /// Replace the map view used for subsequent dispatches.
    pub fn update_view(&mut self, view: MapView) {
        debug!(projection = %view.projection, width = view.width, height = view.height, "Map view updated");
        self.view = view;
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Build the requests for one click without issuing them.
    pub fn plan(
        &self,
        cycle: CycleId,
        click: ClickPosition,
        targets: &[Arc<QueryTarget>],
        options: &DispatchOptions,
    ) -> Vec<PendingRequest> {
        let settings = self.settings_for(options);
        partition(targets, options.grouping_policy())
            .into_iter()
            .enumerate()
            .map(|(index, group)| {
                let params = build_params(&group.targets, click, &self.view, &settings);
                PendingRequest {
                    cycle,
                    index,
                    request: HttpRequest {
                        method: self.config.method,
                        url: group.endpoint.clone(),
                        params,
                    },
                    endpoint: group.endpoint,
                    targets: group.targets,
                }
            })
            .collect()
    }

    /// Query `targets` at `click`.
    ///
    /// Returns immediately. Any running cycle is superseded. With no targets
    /// the ticket says so, a [`FeatureInfoEvent::NoTargets`] follows and
    /// nothing is sent; otherwise exactly one [`FeatureInfoEvent::Complete`]
    /// follows once every request has answered, failed or timed out.
    /// Events arrive in cycle order.
    ///
    /// Requests run on the runtime the dispatcher was started in.
    pub fn dispatch(
        &mut self,
        click: ClickPosition,
        targets: &[Arc<QueryTarget>],
        options: &DispatchOptions,
    ) -> DispatchTicket {
        let cycle = self.next_cycle;
        self.next_cycle += 1;

        if targets.is_empty() {
            info!(cycle, "No queryable targets at click");
            // Answered by the aggregator, behind any cycle it is finishing
            self.send_to_aggregator(AggregatorMessage::Begin {
                cycle,
                click,
                expected: 0,
            });
            return DispatchTicket::NoTargets { cycle };
        }

        let requests = self.plan(cycle, click, targets, options);
        let count = requests.len();

        info!(
            cycle,
            x = click.x,
            y = click.y,
            targets = targets.len(),
            requests = count,
            "Dispatching GetFeatureInfo"
        );

        // The expected count must be registered before any request can report.
        self.send_to_aggregator(AggregatorMessage::Begin {
            cycle,
            click,
            expected: count,
        });

        for pending in requests {
            let client = Arc::clone(&self.client);
            let parser = Arc::clone(&self.parser);
            let tx = self.aggregator_tx.clone();
            let timeout = self.config.timeout;

            self.runtime.spawn(async move {
                let result = execute(client.as_ref(), parser.as_ref(), &pending, timeout).await;
                let _ = tx.send(AggregatorMessage::Response {
                    cycle: pending.cycle,
                    result,
                });
            });
        }

        DispatchTicket::Dispatched {
            cycle,
            requests: count,
        }
    }

    fn settings_for(&self, options: &DispatchOptions) -> RequestSettings {
        let mut settings = self.config.request.clone();
        if let Some(count) = options.feature_count {
            settings.feature_count = count;
        }
        settings
    }

    fn send_to_aggregator(&self, message: AggregatorMessage) {
        if self.aggregator_tx.send(message).is_err() {
            warn!("Aggregator task is gone; result will not be delivered");
        }
    }
}

/// Issue one request and turn the outcome into a group result.
///
/// Never fails: transport errors, timeouts and unreadable bodies become a
/// failed group with no features.
async fn execute<C, P>(
    client: &C,
    parser: &P,
    pending: &PendingRequest,
    timeout: std::time::Duration,
) -> GroupResult
where
    C: AsyncHttpClient,
    P: ResponseParser,
{
    let start = Instant::now();

    let response = match tokio::time::timeout(timeout, client.send(&pending.request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            warn!(
                cycle = pending.cycle,
                index = pending.index,
                endpoint = %pending.endpoint,
                error = %e,
                "GetFeatureInfo request failed"
            );
            return GroupResult::failed(pending, GroupFailure::Transport(e));
        }
        Err(_) => {
            warn!(
                cycle = pending.cycle,
                index = pending.index,
                endpoint = %pending.endpoint,
                timeout_ms = timeout.as_millis() as u64,
                "GetFeatureInfo request timed out"
            );
            return GroupResult::failed(
                pending,
                GroupFailure::Transport(HttpError::Timeout {
                    url: pending.endpoint.clone(),
                    after: timeout,
                }),
            );
        }
    };

    let content_type = response
        .content_type
        .clone()
        .or_else(|| pending.request.params.get("INFO_FORMAT").map(str::to_string))
        .unwrap_or_default();

    match parser.parse(&response.body, &content_type) {
        Ok(parsed) => {
            debug!(
                cycle = pending.cycle,
                index = pending.index,
                endpoint = %pending.endpoint,
                content_type = %content_type,
                features = parsed.features.len(),
                duration_ms = start.elapsed().as_millis() as u64,
                "GetFeatureInfo response parsed"
            );
            GroupResult {
                index: pending.index,
                endpoint: pending.endpoint.clone(),
                target_ids: pending.target_ids(),
                features: attribute(parsed.features, &pending.targets),
                text: parsed.text,
                failure: None,
            }
        }
        Err(e) => {
            error!(
                cycle = pending.cycle,
                index = pending.index,
                endpoint = %pending.endpoint,
                content_type = %content_type,
                error = %e,
                "Could not parse GetFeatureInfo response"
            );
            GroupResult::failed(pending, GroupFailure::Parse(e.to_string()))
        }
    }
}

async fn run_aggregator(
    mut rx: mpsc::UnboundedReceiver<AggregatorMessage>,
    events_tx: mpsc::UnboundedSender<FeatureInfoEvent>,
) {
    let mut aggregator = Aggregator::new();

    while let Some(message) = rx.recv().await {
        if let Some(event) = aggregator.handle(message) {
            if let FeatureInfoEvent::Complete(result) = &event {
                info!(
                    cycle = result.cycle,
                    groups = result.groups.len(),
                    features = result.feature_count(),
                    failed = result.failed_groups().count(),
                    "GetFeatureInfo cycle complete"
                );
            }
            if events_tx.send(event).is_err() {
                debug!("Event receiver dropped; stopping aggregator");
                break;
            }
        }
    }
}
