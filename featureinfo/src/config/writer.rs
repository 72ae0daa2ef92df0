//! INI serialization logic for converting `ConfigFile` → INI string.

use std::fmt::Write;

use super::parser::{TARGET_SECTION_PREFIX, VENDOR_KEY_PREFIX};
use super::settings::ConfigFile;
use crate::http::HttpMethod;
use crate::query::QueryTarget;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let method = match config.dispatch.method {
        HttpMethod::Get => "get",
        HttpMethod::Post => "post",
    };
    let extent = config.view.extent;

    let mut out = format!(
        r#"[dispatch]
; Combine layers served by the same endpoint into one request (default: true)
; When false, every layer goes into a single request to the first layer's endpoint
batch_by_endpoint = {}
; Send one request per layer (default: false); overrides batch_by_endpoint
per_target_requests = {}
; Per-request timeout in seconds (default: 30)
timeout = {}
; Maximum features per request (default: 10)
feature_count = {}
; Info format requested when a layer doesn't set one
info_format = {}
; HTTP method: get or post
method = {}

[view]
; Projection of the map the pixel coordinates refer to
projection = {}
; Visible extent: minx,miny,maxx,maxy
bbox = {},{},{},{}
; Map size in pixels
width = {}
height = {}

[logging]
file = {}

[vendor]
; Extra parameters added to every request, e.g. buffer = 10
"#,
        config.dispatch.batch_by_endpoint,
        config.dispatch.per_target_requests,
        config.dispatch.timeout,
        config.dispatch.feature_count,
        config.dispatch.info_format,
        method,
        config.view.projection,
        extent.min_x,
        extent.min_y,
        extent.max_x,
        extent.max_y,
        config.view.width,
        config.view.height,
        config.logging.file.to_string_lossy(),
    );

    for (key, value) in &config.vendor {
        let _ = writeln!(out, "{} = {}", key, value);
    }

    for target in &config.targets {
        out.push('\n');
        write_target(&mut out, target);
    }

    out
}

fn write_target(out: &mut String, target: &QueryTarget) {
    let _ = writeln!(out, "[{}{}]", TARGET_SECTION_PREFIX, target.id);
    let _ = writeln!(out, "url = {}", target.url);
    let _ = writeln!(out, "layers = {}", target.layers.join(","));
    if !target.styles.is_empty() {
        let _ = writeln!(out, "styles = {}", target.styles.join(","));
    }
    let _ = writeln!(out, "version = {}", target.version);

    let optional = [
        ("crs", &target.crs),
        ("format", &target.format),
        ("info_format", &target.info_format),
        ("exceptions", &target.exceptions),
        ("time", &target.time),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            let _ = writeln!(out, "{} = {}", key, value);
        }
    }

    let _ = writeln!(out, "individual = {}", target.request_individually);
    let _ = writeln!(out, "visible = {}", target.visible);
    let _ = writeln!(out, "queryable = {}", target.queryable);
    for (key, value) in &target.vendor_params {
        let _ = writeln!(out, "{}{} = {}", VENDOR_KEY_PREFIX, key, value);
    }
}
