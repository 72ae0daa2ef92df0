//! GeoJSON info format reader.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::FormatError;
use super::feature::ParsedFeature;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Document {
    FeatureCollection {
        #[serde(default)]
        features: Vec<Feature>,
    },
    Feature(Feature),
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

/// Read features from a GeoJSON `FeatureCollection` or single `Feature`.
///
/// Property values are stringified; nested values keep their JSON text.
/// An id of the form `type.n` (as GeoServer writes them) also yields the
/// feature type.
pub(super) fn read_features(body: &[u8]) -> Result<Vec<ParsedFeature>, FormatError> {
    let document: Document = serde_json::from_slice(body)?;

    let features = match document {
        Document::FeatureCollection { features } => features,
        Document::Feature(feature) => vec![feature],
    };

    Ok(features.into_iter().map(convert).collect())
}

fn convert(feature: Feature) -> ParsedFeature {
    let fid = feature.id.as_ref().and_then(|id| match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    let feature_type = fid
        .as_deref()
        .and_then(|id| id.rsplit_once('.'))
        .map(|(kind, _)| kind.to_string());

    let attributes = feature
        .properties
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| (name, value_to_string(value)))
        .collect();

    ParsedFeature {
        feature_type,
        fid,
        attributes,
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
