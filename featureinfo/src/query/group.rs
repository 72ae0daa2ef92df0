//! Partitioning of query targets into request groups.

use std::collections::HashMap;
use std::sync::Arc;

use super::types::QueryTarget;

/// How targets are combined into requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingPolicy {
    /// One request for all targets, sent to the first target's endpoint.
    Combined,
    /// One request per distinct endpoint URL.
    ByEndpoint,
    /// One request per target.
    PerTarget,
}

/// Targets that share one outbound request.
#[derive(Debug, Clone)]
pub struct RequestGroup {
    /// Endpoint URL the request is sent to.
    pub endpoint: String,
    /// Targets in dispatch order; the first one leads parameter construction.
    pub targets: Vec<Arc<QueryTarget>>,
}

impl RequestGroup {
    fn single(target: &Arc<QueryTarget>) -> Self {
        Self {
            endpoint: target.url.clone(),
            targets: vec![Arc::clone(target)],
        }
    }

    /// Identifiers of the group's targets.
    pub fn target_ids(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.id.clone()).collect()
    }
}

/// Partition `targets` into request groups, in dispatch order.
///
/// Endpoints are ordered by first appearance. Within an endpoint, targets
/// keep their relative order; a target flagged `request_individually` always
/// gets a group of its own, regardless of policy.
pub fn partition(targets: &[Arc<QueryTarget>], policy: GroupingPolicy) -> Vec<RequestGroup> {
    match policy {
        GroupingPolicy::Combined => partition_combined(targets),
        GroupingPolicy::ByEndpoint => partition_by_endpoint(targets, false),
        GroupingPolicy::PerTarget => partition_by_endpoint(targets, true),
    }
}

fn partition_combined(targets: &[Arc<QueryTarget>]) -> Vec<RequestGroup> {
    let mut groups: Vec<RequestGroup> = Vec::new();
    let mut shared: Option<usize> = None;

    for target in targets {
        if target.request_individually {
            groups.push(RequestGroup::single(target));
            continue;
        }
        match shared {
            Some(idx) => groups[idx].targets.push(Arc::clone(target)),
            None => {
                shared = Some(groups.len());
                groups.push(RequestGroup::single(target));
            }
        }
    }

    groups
}

fn partition_by_endpoint(targets: &[Arc<QueryTarget>], per_target: bool) -> Vec<RequestGroup> {
    // Bucket by endpoint, keeping first-appearance order
    let mut endpoints: Vec<&str> = Vec::new();
    let mut buckets: HashMap<&str, Vec<&Arc<QueryTarget>>> = HashMap::new();
    for target in targets {
        let bucket = buckets.entry(target.url.as_str()).or_insert_with(|| {
            endpoints.push(target.url.as_str());
            Vec::new()
        });
        bucket.push(target);
    }

    let mut groups = Vec::new();
    for endpoint in endpoints {
        let mut shared: Option<usize> = None;
        for target in &buckets[endpoint] {
            if per_target || target.request_individually {
                groups.push(RequestGroup::single(target));
                continue;
            }
            match shared {
                Some(idx) => groups[idx].targets.push(Arc::clone(target)),
                None => {
                    shared = Some(groups.len());
                    groups.push(RequestGroup::single(target));
                }
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(id: &str, url: &str) -> Arc<QueryTarget> {
        Arc::new(QueryTarget::new(id, url).with_layers([id]))
    }

    fn ids(groups: &[RequestGroup]) -> Vec<Vec<String>> {
        groups.iter().map(|g| g.target_ids()).collect()
    }

    #[test]
    fn test_empty_targets_yield_no_groups() {
        assert!(partition(&[], GroupingPolicy::ByEndpoint).is_empty());
        assert!(partition(&[], GroupingPolicy::Combined).is_empty());
        assert!(partition(&[], GroupingPolicy::PerTarget).is_empty());
    }

    #[test]
    fn test_by_endpoint_groups_in_first_appearance_order() {
        let targets = vec![
            t("a", "http://one/wms"),
            t("b", "http://two/wms"),
            t("c", "http://one/wms"),
        ];
        let groups = partition(&targets, GroupingPolicy::ByEndpoint);

        assert_eq!(ids(&groups), vec![vec!["a", "c"], vec!["b"]]);
        assert_eq!(groups[0].endpoint, "http://one/wms");
        assert_eq!(groups[1].endpoint, "http://two/wms");
    }

    #[test]
    fn test_per_target_keeps_endpoint_runs() {
        let targets = vec![
            t("a", "http://one/wms"),
            t("b", "http://two/wms"),
            t("c", "http://one/wms"),
        ];
        let groups = partition(&targets, GroupingPolicy::PerTarget);

        assert_eq!(ids(&groups), vec![vec!["a"], vec!["c"], vec!["b"]]);
    }

    #[test]
    fn test_combined_uses_first_endpoint() {
        let targets = vec![t("a", "http://one/wms"), t("b", "http://two/wms")];
        let groups = partition(&targets, GroupingPolicy::Combined);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].endpoint, "http://one/wms");
        assert_eq!(ids(&groups), vec![vec!["a", "b"]]);
    }

    #[test]
    fn test_individual_target_split_out_of_batch() {
        let schools = Arc::new(
            QueryTarget::new("schools", "http://one/wms")
                .with_layers(["buildings"])
                .with_vendor_param("CQL_FILTER", "kind='school'")
                .with_request_individually(true),
        );
        let targets = vec![t("a", "http://one/wms"), schools, t("c", "http://one/wms")];

        let groups = partition(&targets, GroupingPolicy::ByEndpoint);
        assert_eq!(ids(&groups), vec![vec!["a", "c"], vec!["schools"]]);

        let combined = partition(&targets, GroupingPolicy::Combined);
        assert_eq!(ids(&combined), vec![vec!["a", "c"], vec!["schools"]]);
    }
}
