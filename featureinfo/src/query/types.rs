//! Query input types.

use std::fmt;

/// WMS version assumed when a layer does not declare one.
pub const DEFAULT_WMS_VERSION: &str = "1.1.1";

/// CRS codes whose axis order is latitude first under WMS 1.3.
const LATITUDE_FIRST_CRS: &[&str] = &[
    "EPSG:4326",
    "EPSG:4258",
    "EPSG:3035",
    "EPSG:31466",
    "EPSG:31467",
    "EPSG:31468",
    "EPSG:31469",
    "urn:ogc:def:crs:EPSG::4326",
];

/// A pixel position within the rendered map surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickPosition {
    pub x: f64,
    pub y: f64,
}

impl ClickPosition {
    /// Create a click position from pixel coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Column as sent on the wire (truncated toward zero).
    pub fn column(&self) -> i64 {
        self.x.trunc() as i64
    }

    /// Row as sent on the wire (truncated toward zero).
    pub fn row(&self) -> i64 {
        self.y.trunc() as i64
    }
}

impl fmt::Display for ClickPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Map extent in view projection units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Format as a WMS `BBOX` value.
    ///
    /// Coordinates are rounded to six decimals. With `reverse_axis_order` the
    /// y axis is written first, as required for latitude-first CRS in WMS 1.3.
    pub fn to_bbox(&self, reverse_axis_order: bool) -> String {
        let round = |v: f64| (v * 1e6).round() / 1e6;
        let (a, b, c, d) = if reverse_axis_order {
            (self.min_y, self.min_x, self.max_y, self.max_x)
        } else {
            (self.min_x, self.min_y, self.max_x, self.max_y)
        };
        format!("{},{},{},{}", round(a), round(b), round(c), round(d))
    }
}

impl std::str::FromStr for Extent {
    type Err = String;

    /// Parse `minx,miny,maxx,maxy`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values: Vec<f64> = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("invalid coordinate: {}", e))?;

        match values.as_slice() {
            [min_x, min_y, max_x, max_y] => Ok(Self::new(*min_x, *min_y, *max_x, *max_y)),
            _ => Err(format!("expected 4 coordinates, got {}", values.len())),
        }
    }
}

/// The map view a click happened on.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    /// Projection code of the view (e.g. "EPSG:3857").
    pub projection: String,
    /// Visible extent in projection units.
    pub extent: Extent,
    /// Rendered width in pixels.
    pub width: u32,
    /// Rendered height in pixels.
    pub height: u32,
}

impl MapView {
    pub fn new(projection: impl Into<String>, extent: Extent, width: u32, height: u32) -> Self {
        Self {
            projection: projection.into(),
            extent,
            width,
            height,
        }
    }
}

impl Default for MapView {
    fn default() -> Self {
        Self::new(
            "EPSG:3857",
            Extent::new(-20037508.34, -20037508.34, 20037508.34, 20037508.34),
            256,
            256,
        )
    }
}

/// Parsed WMS protocol version (major.minor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProtocolVersion {
    pub major: u32,
    pub minor: u32,
}

impl ProtocolVersion {
    /// Parse the leading `major.minor` of a version string.
    ///
    /// Returns `None` for strings that do not start with a number.
    pub fn parse(version: &str) -> Option<Self> {
        let mut parts = version.trim().split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts
            .next()
            .map(|p| p.parse().ok())
            .unwrap_or(Some(0))?;
        Some(Self { major, minor })
    }

    /// True when this version uses `CRS`/`I`/`J` instead of `SRS`/`X`/`Y`.
    pub fn uses_crs_convention(&self) -> bool {
        *self >= Self { major: 1, minor: 3 }
    }
}

/// A queryable WMS layer reference.
///
/// Targets are shared between the catalog, in-flight requests, and the
/// delivered results, so they are normally handled as `Arc<QueryTarget>`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTarget {
    /// Catalog identifier.
    pub id: String,
    /// Service endpoint URL.
    pub url: String,
    /// Server-side layer names (`LAYERS`).
    pub layers: Vec<String>,
    /// Style names (`STYLES`); empty means default style per layer.
    pub styles: Vec<String>,
    /// CRS code; falls back to the view projection.
    pub crs: Option<String>,
    /// WMS version string as declared by the layer.
    pub version: String,
    /// Image format of the corresponding GetMap request.
    pub format: Option<String>,
    /// Info format override for this layer.
    pub info_format: Option<String>,
    /// Exceptions format.
    pub exceptions: Option<String>,
    /// TIME dimension value.
    pub time: Option<String>,
    /// Vendor parameters, e.g. a CQL filter selecting a sub-layer.
    pub vendor_params: Vec<(String, String)>,
    /// Always query this layer in its own request.
    pub request_individually: bool,
    pub visible: bool,
    pub queryable: bool,
}

impl QueryTarget {
    /// Create a visible, queryable target with WMS 1.1.1 defaults.
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            layers: Vec::new(),
            styles: Vec::new(),
            crs: None,
            version: DEFAULT_WMS_VERSION.to_string(),
            format: None,
            info_format: None,
            exceptions: None,
            time: None,
            vendor_params: Vec::new(),
            request_individually: false,
            visible: true,
            queryable: true,
        }
    }

    pub fn with_layers<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layers = layers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_styles<I, S>(mut self, styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.styles = styles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_crs(mut self, crs: impl Into<String>) -> Self {
        self.crs = Some(crs.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_info_format(mut self, info_format: impl Into<String>) -> Self {
        self.info_format = Some(info_format.into());
        self
    }

    pub fn with_exceptions(mut self, exceptions: impl Into<String>) -> Self {
        self.exceptions = Some(exceptions.into());
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Add a vendor parameter. A later value for the same key replaces the earlier one.
    pub fn with_vendor_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.vendor_params
            .retain(|(k, _)| !k.eq_ignore_ascii_case(&key));
        self.vendor_params.push((key, value.into()));
        self
    }

    pub fn with_request_individually(mut self, individually: bool) -> Self {
        self.request_individually = individually;
        self
    }

    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_queryable(mut self, queryable: bool) -> Self {
        self.queryable = queryable;
        self
    }

    /// Parsed protocol version, if the version string is numeric.
    pub fn protocol_version(&self) -> Option<ProtocolVersion> {
        ProtocolVersion::parse(&self.version)
    }

    /// True when the request for this layer must use `CRS`/`I`/`J`.
    pub fn uses_crs_convention(&self) -> bool {
        self.protocol_version()
            .map(|v| v.uses_crs_convention())
            .unwrap_or(false)
    }

    /// True when `BBOX` must be written latitude first for `projection`.
    pub fn reverse_axis_order(&self, projection: &str) -> bool {
        self.uses_crs_convention() && LATITUDE_FIRST_CRS.contains(&projection)
    }

    /// Style names aligned with [`layers`](Self::layers).
    ///
    /// Without explicit styles every layer gets an empty (default) style.
    pub fn style_names(&self) -> Vec<String> {
        if self.styles.is_empty() {
            vec![String::new(); self.layers.len()]
        } else {
            self.styles.clone()
        }
    }
}
