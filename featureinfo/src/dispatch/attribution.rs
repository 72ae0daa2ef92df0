//! Attribution of parsed features to query targets.

use std::sync::Arc;

use super::types::AttributedFeature;
use crate::format::ParsedFeature;
use crate::query::QueryTarget;

/// Assign each feature of one group response to a target of that group.
///
/// A single-target group owns every feature. For a batched group the
/// feature type is matched against the targets' layer names; features that
/// match no layer go to the first target.
pub(crate) fn attribute(
    features: Vec<ParsedFeature>,
    targets: &[Arc<QueryTarget>],
) -> Vec<AttributedFeature> {
    let Some(first) = targets.first() else {
        return Vec::new();
    };

    features
        .into_iter()
        .map(|feature| {
            let target = if targets.len() == 1 {
                first
            } else {
                feature
                    .feature_type
                    .as_deref()
                    .and_then(|name| find_target(name, targets))
                    .unwrap_or(first)
            };
            AttributedFeature {
                target: Arc::clone(target),
                feature,
            }
        })
        .collect()
}

fn find_target<'a>(feature_type: &str, targets: &'a [Arc<QueryTarget>]) -> Option<&'a Arc<QueryTarget>> {
    let wanted = normalize(feature_type);
    targets
        .iter()
        .find(|t| t.layers.iter().any(|layer| normalize(layer) == wanted))
}

/// Strip a namespace prefix and the `_layer` / `_feature` suffixes servers
/// append, then lowercase.
fn normalize(name: &str) -> String {
    let local = name.rsplit_once(':').map(|(_, l)| l).unwrap_or(name);
    let lower = local.to_ascii_lowercase();
    for suffix in ["_layer", "_feature"] {
        if let Some(stripped) = lower.strip_suffix(suffix) {
            if !stripped.is_empty() {
                return stripped.to_string();
            }
        }
    }
    lower
}
