//! GetFeatureInfo parameter construction.

use std::sync::Arc;

use super::types::{ClickPosition, MapView, QueryTarget};

/// Default maximum number of features requested per layer.
pub const DEFAULT_FEATURE_COUNT: u32 = 10;

/// Default `INFO_FORMAT` when the layer does not set one.
pub const DEFAULT_INFO_FORMAT: &str = "application/vnd.ogc.gml";

/// Default `FORMAT` when the layer does not set one.
pub const DEFAULT_IMAGE_FORMAT: &str = "image/png";

/// Ordered request parameters with case-insensitive keys.
///
/// Keys are stored upper-cased, the way WMS servers conventionally expect
/// them. Insertion order is preserved so built URLs are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParams {
    entries: Vec<(String, String)>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing any existing value for it.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let key = key.to_ascii_uppercase();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Set `key` only when it is not present yet.
    pub fn insert_default(&mut self, key: &str, value: impl Into<String>) {
        if !self.contains(key) {
            self.insert(key, value);
        }
    }

    /// Look up a value, ignoring key case.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parameters as key/value pairs, in insertion order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.entries
    }
}

/// Dispatcher-wide inputs to request construction.
#[derive(Debug, Clone)]
pub struct RequestSettings {
    /// `FEATURE_COUNT` value.
    pub feature_count: u32,
    /// `INFO_FORMAT` used when the lead layer has none.
    pub info_format: String,
    /// Global vendor parameters, lowest precedence.
    pub vendor_params: Vec<(String, String)>,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            feature_count: DEFAULT_FEATURE_COUNT,
            info_format: DEFAULT_INFO_FORMAT.to_string(),
            vendor_params: Vec::new(),
        }
    }
}

/// Build the GetFeatureInfo parameters for one request group.
///
/// The first target leads: it decides version, projection, formats and which
/// vendor parameters apply. Layer and style names of all targets are
/// concatenated in order.
///
/// Precedence on key collision, highest first: standard parameters, the lead
/// target's vendor parameters, the group's `TIME`, global vendor parameters.
///
/// # Panics
///
/// Never; an empty `targets` slice yields the bare standard parameters
/// without layer information.
pub fn build_params(
    targets: &[Arc<QueryTarget>],
    click: ClickPosition,
    view: &MapView,
    settings: &RequestSettings,
) -> RequestParams {
    let mut params = RequestParams::new();

    let mut layer_names: Vec<String> = Vec::new();
    let mut style_names: Vec<String> = Vec::new();
    let mut time: Option<&str> = None;
    for target in targets {
        if !target.layers.is_empty() {
            layer_names.extend(target.layers.iter().cloned());
            style_names.extend(target.style_names());
        }
        if let Some(t) = target.time.as_deref() {
            time = Some(t);
        }
    }

    if !layer_names.is_empty() {
        let layers = layer_names.join(",");
        params.insert("layers", layers.clone());
        params.insert("query_layers", layers);
        params.insert("styles", style_names.join(","));
    }

    let lead = targets.first();
    let version = lead
        .map(|t| t.version.as_str())
        .unwrap_or(super::types::DEFAULT_WMS_VERSION);
    // BBOX is in view units, so a layer CRS only counts when it names the
    // view projection.
    let projection = lead
        .and_then(|t| t.crs.as_deref())
        .filter(|crs| crs.eq_ignore_ascii_case(&view.projection))
        .unwrap_or(view.projection.as_str());
    let uses_crs = lead.map(|t| t.uses_crs_convention()).unwrap_or(false);
    let reverse_axis = lead
        .map(|t| t.reverse_axis_order(projection))
        .unwrap_or(false);

    params.insert("service", "WMS");
    params.insert("version", version);
    params.insert("request", "GetFeatureInfo");
    if let Some(exceptions) = lead.and_then(|t| t.exceptions.as_deref()) {
        params.insert("exceptions", exceptions);
    }
    params.insert("bbox", view.extent.to_bbox(reverse_axis));
    params.insert("feature_count", settings.feature_count.to_string());
    params.insert("height", view.height.to_string());
    params.insert("width", view.width.to_string());
    params.insert(
        "format",
        lead.and_then(|t| t.format.as_deref())
            .unwrap_or(DEFAULT_IMAGE_FORMAT),
    );
    params.insert(
        "info_format",
        lead.and_then(|t| t.info_format.as_deref())
            .unwrap_or(settings.info_format.as_str()),
    );

    if uses_crs {
        params.insert("crs", projection);
        params.insert("i", click.column().to_string());
        params.insert("j", click.row().to_string());
    } else {
        params.insert("srs", projection);
        params.insert("x", click.column().to_string());
        params.insert("y", click.row().to_string());
    }

    if let Some(lead) = lead {
        for (key, value) in &lead.vendor_params {
            params.insert_default(key, value.as_str());
        }
    }
    if let Some(time) = time {
        params.insert_default("time", time);
    }
    for (key, value) in &settings.vendor_params {
        params.insert_default(key, value.as_str());
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Extent;

    fn view() -> MapView {
        MapView::new(
            "EPSG:28992",
            Extent::new(0.0, 300000.0, 280000.0, 625000.0),
            800,
            600,
        )
    }

    fn target(id: &str) -> Arc<QueryTarget> {
        Arc::new(QueryTarget::new(id, "https://example.com/wms").with_layers([id]))
    }

    #[test]
    fn test_wms13_uses_crs_i_j() {
        let t = Arc::new(
            QueryTarget::new("a", "https://example.com/wms")
                .with_layers(["a"])
                .with_version("1.3.0"),
        );
        let params = build_params(&[t], ClickPosition::new(100.7, 50.2), &view(), &RequestSettings::default());

        assert_eq!(params.get("crs"), Some("EPSG:28992"));
        assert_eq!(params.get("i"), Some("100"));
        assert_eq!(params.get("j"), Some("50"));
        assert!(!params.contains("srs"));
        assert!(!params.contains("x"));
        assert!(!params.contains("y"));
    }

    #[test]
    fn test_wms111_uses_srs_x_y() {
        let t = Arc::new(
            QueryTarget::new("a", "https://example.com/wms")
                .with_layers(["a"])
                .with_version("1.1.1"),
        );
        let params = build_params(&[t], ClickPosition::new(100.7, 50.2), &view(), &RequestSettings::default());

        assert_eq!(params.get("srs"), Some("EPSG:28992"));
        assert_eq!(params.get("x"), Some("100"));
        assert_eq!(params.get("y"), Some("50"));
        assert!(!params.contains("crs"));
        assert!(!params.contains("i"));
        assert!(!params.contains("j"));
    }

    #[test]
    fn test_standard_parameters_present() {
        let params = build_params(&[target("a")], ClickPosition::new(1.0, 2.0), &view(), &RequestSettings::default());

        assert_eq!(params.get("service"), Some("WMS"));
        assert_eq!(params.get("version"), Some("1.1.1"));
        assert_eq!(params.get("request"), Some("GetFeatureInfo"));
        assert_eq!(params.get("bbox"), Some("0,300000,280000,625000"));
        assert_eq!(params.get("feature_count"), Some("10"));
        assert_eq!(params.get("height"), Some("600"));
        assert_eq!(params.get("width"), Some("800"));
        assert_eq!(params.get("format"), Some("image/png"));
        assert_eq!(params.get("info_format"), Some("application/vnd.ogc.gml"));
        assert!(!params.contains("exceptions"));
    }

    #[test]
    fn test_keys_are_upper_cased() {
        let params = build_params(&[target("a")], ClickPosition::new(1.0, 2.0), &view(), &RequestSettings::default());
        assert!(params
            .iter()
            .all(|(k, _)| k.chars().all(|c| !c.is_ascii_lowercase())));
    }

    #[test]
    fn test_layers_and_styles_concatenated_in_order() {
        let a = Arc::new(
            QueryTarget::new("a", "https://example.com/wms")
                .with_layers(["roads", "rail"])
                .with_styles(["thin", "dashed"]),
        );
        let b = target("rivers");
        let params = build_params(&[a, b], ClickPosition::new(1.0, 2.0), &view(), &RequestSettings::default());

        assert_eq!(params.get("layers"), Some("roads,rail,rivers"));
        assert_eq!(params.get("query_layers"), Some("roads,rail,rivers"));
        assert_eq!(params.get("styles"), Some("thin,dashed,"));
    }

    #[test]
    fn test_no_layer_parameters_without_layer_names() {
        let t = Arc::new(QueryTarget::new("a", "https://example.com/wms"));
        let params = build_params(&[t], ClickPosition::new(1.0, 2.0), &view(), &RequestSettings::default());

        assert!(!params.contains("layers"));
        assert!(!params.contains("query_layers"));
        assert!(!params.contains("styles"));
    }

    #[test]
    fn test_target_vendor_param_wins_over_global() {
        let t = Arc::new(
            QueryTarget::new("a", "https://example.com/wms")
                .with_layers(["a"])
                .with_vendor_param("cql_filter", "kind = 'school'"),
        );
        let settings = RequestSettings {
            vendor_params: vec![
                ("CQL_FILTER".to_string(), "kind = 'any'".to_string()),
                ("buffer".to_string(), "5".to_string()),
            ],
            ..Default::default()
        };
        let params = build_params(&[t], ClickPosition::new(1.0, 2.0), &view(), &settings);

        assert_eq!(params.get("CQL_FILTER"), Some("kind = 'school'"));
        assert_eq!(params.get("buffer"), Some("5"));
    }

    #[test]
    fn test_vendor_params_cannot_override_standard_params() {
        let t = Arc::new(
            QueryTarget::new("a", "https://example.com/wms")
                .with_layers(["a"])
                .with_vendor_param("request", "GetMap"),
        );
        let params = build_params(&[t], ClickPosition::new(1.0, 2.0), &view(), &RequestSettings::default());
        assert_eq!(params.get("request"), Some("GetFeatureInfo"));
    }

    #[test]
    fn test_time_from_group_beats_global_vendor_time() {
        let a = target("a");
        let b = Arc::new(
            QueryTarget::new("b", "https://example.com/wms")
                .with_layers(["b"])
                .with_time("2014-02-13"),
        );
        let settings = RequestSettings {
            vendor_params: vec![("time".to_string(), "2000-01-01".to_string())],
            ..Default::default()
        };
        let params = build_params(&[a, b], ClickPosition::new(1.0, 2.0), &view(), &settings);
        assert_eq!(params.get("TIME"), Some("2014-02-13"));
    }

    #[test]
    fn test_lead_target_decides_formats() {
        let a = Arc::new(
            QueryTarget::new("a", "https://example.com/wms")
                .with_layers(["a"])
                .with_version("1.3.0")
                .with_format("image/jpeg")
                .with_info_format("application/json")
                .with_exceptions("XML"),
        );
        let b = target("b");
        let params = build_params(&[a, b], ClickPosition::new(1.0, 2.0), &view(), &RequestSettings::default());

        assert_eq!(params.get("format"), Some("image/jpeg"));
        assert_eq!(params.get("info_format"), Some("application/json"));
        assert_eq!(params.get("exceptions"), Some("XML"));
    }

    #[test]
    fn test_foreign_layer_crs_keeps_view_projection() {
        let t = Arc::new(
            QueryTarget::new("a", "https://example.com/wms")
                .with_layers(["a"])
                .with_version("1.3.0")
                .with_crs("EPSG:4326"),
        );
        let params = build_params(&[t], ClickPosition::new(1.0, 2.0), &view(), &RequestSettings::default());

        assert_eq!(params.get("crs"), Some("EPSG:28992"));
        assert_eq!(params.get("bbox"), Some("0,300000,280000,625000"));
    }

    #[test]
    fn test_matching_layer_crs_reverses_latitude_first_bbox() {
        let view = MapView::new("EPSG:4326", Extent::new(4.0, 51.0, 6.0, 53.0), 800, 600);
        let t = Arc::new(
            QueryTarget::new("a", "https://example.com/wms")
                .with_layers(["a"])
                .with_version("1.3.0")
                .with_crs("EPSG:4326"),
        );
        let params = build_params(&[t], ClickPosition::new(1.0, 2.0), &view, &RequestSettings::default());

        assert_eq!(params.get("crs"), Some("EPSG:4326"));
        assert_eq!(params.get("bbox"), Some("51,4,53,6"));
    }

    #[test]
    fn test_request_params_insert_replaces_case_insensitively() {
        let mut params = RequestParams::new();
        params.insert("Layers", "a");
        params.insert("LAYERS", "b");
        params.insert_default("layers", "c");

        assert_eq!(params.len(), 1);
        assert_eq!(params.get("layers"), Some("b"));
        assert_eq!(params.pairs()[0].0, "LAYERS");
    }
}
