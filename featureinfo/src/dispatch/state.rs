//! Per-cycle aggregation state.

use tracing::{debug, warn};

use super::types::{CycleId, FeatureInfoEvent, FeatureInfoResult, GroupResult};
use crate::query::ClickPosition;

/// Messages consumed by the aggregator task.
#[derive(Debug)]
pub(crate) enum AggregatorMessage {
    /// A new cycle starts; any running cycle is abandoned. A cycle with
    /// nothing to expect is answered with `NoTargets` at once.
    Begin {
        cycle: CycleId,
        click: ClickPosition,
        expected: usize,
    },
    /// One group of some cycle has finished.
    Response { cycle: CycleId, result: GroupResult },
}

/// Counters and result slots of one dispatch cycle.
///
/// Slots are pre-sized to the number of groups so results land at their
/// group index regardless of arrival order.
#[derive(Debug)]
pub struct AggregationState {
    cycle: CycleId,
    click: ClickPosition,
    total_expected: usize,
    completed: usize,
    slots: Vec<Option<GroupResult>>,
}

impl AggregationState {
    pub fn new(cycle: CycleId, click: ClickPosition, total_expected: usize) -> Self {
        Self {
            cycle,
            click,
            total_expected,
            completed: 0,
            slots: vec![None; total_expected],
        }
    }

    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    pub fn total_expected(&self) -> usize {
        self.total_expected
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total_expected
    }

    /// Store a group result. Returns false if the index is out of range or
    /// already filled; the completed count is unchanged in that case.
    pub fn record(&mut self, result: GroupResult) -> bool {
        let index = result.index;
        match self.slots.get_mut(index) {
            Some(slot @ None) => {
                *slot = Some(result);
                self.completed += 1;
                true
            }
            Some(Some(_)) => {
                warn!(cycle = self.cycle, index, "Duplicate group response ignored");
                false
            }
            None => {
                warn!(
                    cycle = self.cycle,
                    index,
                    expected = self.total_expected,
                    "Group index out of range"
                );
                false
            }
        }
    }

    /// Consume into the ordered result.
    pub fn into_result(self) -> FeatureInfoResult {
        FeatureInfoResult {
            cycle: self.cycle,
            click: self.click,
            groups: self.slots.into_iter().flatten().collect(),
        }
    }
}

/// Owner of the current cycle's state; lives inside the aggregator task.
#[derive(Debug, Default)]
pub(crate) struct Aggregator {
    current: Option<AggregationState>,
}

impl Aggregator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Apply one message; returns the event to deliver, if any.
    ///
    /// Events leave in cycle order because every cycle passes through here.
    pub(crate) fn handle(&mut self, message: AggregatorMessage) -> Option<FeatureInfoEvent> {
        match message {
            AggregatorMessage::Begin {
                cycle,
                click,
                expected,
            } => {
                if let Some(previous) = self.current.take() {
                    debug!(
                        cycle = previous.cycle(),
                        completed = previous.completed(),
                        expected = previous.total_expected(),
                        "Abandoning superseded cycle"
                    );
                }
                if expected == 0 {
                    return Some(FeatureInfoEvent::NoTargets { cycle });
                }
                self.current = Some(AggregationState::new(cycle, click, expected));
                None
            }
            AggregatorMessage::Response { cycle, result } => {
                let state = match self.current.as_mut() {
                    Some(state) if state.cycle() == cycle => state,
                    _ => {
                        debug!(cycle, index = result.index, "Discarding stale response");
                        return None;
                    }
                };

                state.record(result);
                if state.is_complete() {
                    self.current
                        .take()
                        .map(|state| FeatureInfoEvent::Complete(state.into_result()))
                } else {
                    None
                }
            }
        }
    }

    #[cfg(test)]
    fn current(&self) -> Option<&AggregationState> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::types::GroupFailure;
    use crate::http::HttpError;
    use proptest::prelude::*;

    fn click() -> ClickPosition {
        ClickPosition::new(10.0, 20.0)
    }

    fn result(index: usize) -> GroupResult {
        GroupResult {
            index,
            endpoint: format!("http://host{}/wms", index),
            target_ids: vec![format!("t{}", index)],
            features: Vec::new(),
            text: None,
            failure: None,
        }
    }

    fn failed(index: usize) -> GroupResult {
        GroupResult {
            failure: Some(GroupFailure::Transport(HttpError::Status {
                url: format!("http://host{}/wms", index),
                status: 500,
            })),
            ..result(index)
        }
    }

    fn begin(cycle: CycleId, expected: usize) -> AggregatorMessage {
        AggregatorMessage::Begin {
            cycle,
            click: click(),
            expected,
        }
    }

    fn response(cycle: CycleId, result: GroupResult) -> AggregatorMessage {
        AggregatorMessage::Response { cycle, result }
    }

    fn complete(event: Option<FeatureInfoEvent>) -> FeatureInfoResult {
        match event {
            Some(FeatureInfoEvent::Complete(result)) => result,
            other => panic!("expected Complete, got {:?}", other),
        }
    }

    #[test]
    fn test_delivers_in_group_order_not_arrival_order() {
        let mut aggregator = Aggregator::new();
        assert!(aggregator.handle(begin(1, 3)).is_none());

        assert!(aggregator.handle(response(1, result(2))).is_none());
        assert!(aggregator.handle(response(1, result(0))).is_none());
        let delivered = complete(aggregator.handle(response(1, result(1))));

        let order: Vec<usize> = delivered.groups.iter().map(|g| g.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(delivered.cycle, 1);
        assert!(aggregator.current().is_none());
    }

    #[test]
    fn test_all_failures_deliver_once_empty() {
        let mut aggregator = Aggregator::new();
        aggregator.handle(begin(1, 2));

        assert!(aggregator.handle(response(1, failed(0))).is_none());
        let delivered = complete(aggregator.handle(response(1, failed(1))));

        assert!(delivered.is_empty());
        assert_eq!(delivered.failed_groups().count(), 2);

        // Nothing else can complete the finished cycle
        assert!(aggregator.handle(response(1, failed(1))).is_none());
    }

    #[test]
    fn test_stale_responses_are_discarded() {
        let mut aggregator = Aggregator::new();
        aggregator.handle(begin(1, 2));
        aggregator.handle(response(1, result(0)));

        aggregator.handle(begin(2, 1));
        assert!(aggregator.handle(response(1, result(1))).is_none());

        let state = aggregator.current().unwrap();
        assert_eq!(state.cycle(), 2);
        assert_eq!(state.completed(), 0);

        let delivered = complete(aggregator.handle(response(2, result(0))));
        assert_eq!(delivered.cycle, 2);
        assert_eq!(delivered.groups.len(), 1);
    }

    #[test]
    fn test_zero_expected_begin_abandons_and_signals_no_targets() {
        let mut aggregator = Aggregator::new();
        aggregator.handle(begin(1, 1));
        assert_eq!(
            aggregator.handle(begin(2, 0)),
            Some(FeatureInfoEvent::NoTargets { cycle: 2 })
        );
        assert!(aggregator.current().is_none());
        assert!(aggregator.handle(response(1, result(0))).is_none());
    }

    #[test]
    fn test_finished_cycle_is_delivered_before_following_no_targets() {
        let mut aggregator = Aggregator::new();
        let mut events = Vec::new();
        for message in [
            begin(1, 1),
            response(1, result(0)),
            begin(2, 0),
        ] {
            events.extend(aggregator.handle(message));
        }

        let cycles: Vec<CycleId> = events
            .iter()
            .map(|e| match e {
                FeatureInfoEvent::Complete(r) => r.cycle,
                FeatureInfoEvent::NoTargets { cycle } => *cycle,
            })
            .collect();
        assert_eq!(cycles, vec![1, 2]);
    }

    #[test]
    fn test_duplicate_index_does_not_count_twice() {
        let mut state = AggregationState::new(1, click(), 2);

        assert!(state.record(result(0)));
        assert!(!state.record(result(0)));
        assert_eq!(state.completed(), 1);
        assert!(!state.is_complete());

        assert!(!state.record(result(5)));
        assert_eq!(state.completed(), 1);
    }

    proptest! {
        #[test]
        fn prop_completed_never_exceeds_expected_and_order_is_stable(
            arrival in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle()
        ) {
            let mut aggregator = Aggregator::new();
            aggregator.handle(begin(7, arrival.len()));

            let mut deliveries = Vec::new();
            for index in &arrival {
                if let Some(FeatureInfoEvent::Complete(delivered)) =
                    aggregator.handle(response(7, result(*index)))
                {
                    deliveries.push(delivered);
                }
                if let Some(state) = aggregator.current() {
                    prop_assert!(state.completed() <= state.total_expected());
                }
            }

            prop_assert_eq!(deliveries.len(), 1);
            let order: Vec<usize> = deliveries[0].groups.iter().map(|g| g.index).collect();
            prop_assert_eq!(order, (0..6usize).collect::<Vec<_>>());
        }
    }
}
