//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::{Ini, Properties};
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::http::HttpMethod;
use crate::query::{Extent, QueryTarget};

/// Prefix of layer section names: `[target:<id>]`.
pub(super) const TARGET_SECTION_PREFIX: &str = "target:";

/// Prefix of per-target vendor parameter keys: `vendor.<KEY> = value`.
pub(super) const VENDOR_KEY_PREFIX: &str = "vendor.";

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [dispatch] section
    if let Some(section) = ini.section(Some("dispatch")) {
        if let Some(v) = section.get("batch_by_endpoint") {
            config.dispatch.batch_by_endpoint = parse_bool(v, "dispatch", "batch_by_endpoint")?;
        }
        if let Some(v) = section.get("per_target_requests") {
            config.dispatch.per_target_requests =
                parse_bool(v, "dispatch", "per_target_requests")?;
        }
        if let Some(v) = section.get("timeout") {
            config.dispatch.timeout = parse_positive(v, "dispatch", "timeout", "(seconds)")?;
        }
        if let Some(v) = section.get("feature_count") {
            config.dispatch.feature_count = parse_positive(v, "dispatch", "feature_count", "")?;
        }
        if let Some(v) = section.get("info_format") {
            let v = v.trim();
            if !v.is_empty() {
                config.dispatch.info_format = v.to_string();
            }
        }
        if let Some(v) = section.get("method") {
            config.dispatch.method =
                HttpMethod::from_str(v).map_err(|_| ConfigFileError::InvalidValue {
                    section: "dispatch".to_string(),
                    key: "method".to_string(),
                    value: v.to_string(),
                    reason: "must be 'get' or 'post'".to_string(),
                })?;
        }
    }

    // [view] section
    if let Some(section) = ini.section(Some("view")) {
        if let Some(v) = section.get("projection") {
            let v = v.trim();
            if !v.is_empty() {
                config.view.projection = v.to_string();
            }
        }
        if let Some(v) = section.get("bbox") {
            config.view.extent =
                Extent::from_str(v).map_err(|reason| ConfigFileError::InvalidValue {
                    section: "view".to_string(),
                    key: "bbox".to_string(),
                    value: v.to_string(),
                    reason,
                })?;
        }
        if let Some(v) = section.get("width") {
            config.view.width = parse_positive(v, "view", "width", "(pixels)")?;
        }
        if let Some(v) = section.get("height") {
            config.view.height = parse_positive(v, "view", "height", "(pixels)")?;
        }
    }

    // [vendor] section
    if let Some(section) = ini.section(Some("vendor")) {
        config.vendor = section
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    // [target:<id>] sections
    for (name, section) in ini.iter() {
        let Some(id) = name.and_then(|n| n.strip_prefix(TARGET_SECTION_PREFIX)) else {
            continue;
        };
        let id = id.trim();
        if config.targets.iter().any(|t| t.id == id) {
            return Err(ConfigFileError::InvalidValue {
                section: format!("{}{}", TARGET_SECTION_PREFIX, id),
                key: String::new(),
                value: id.to_string(),
                reason: "duplicate layer id".to_string(),
            });
        }
        config.targets.push(parse_target(id, section)?);
    }

    Ok(config)
}

fn parse_target(id: &str, section: &Properties) -> Result<QueryTarget, ConfigFileError> {
    let section_name = format!("{}{}", TARGET_SECTION_PREFIX, id);

    let url = section
        .get("url")
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigFileError::InvalidValue {
            section: section_name.clone(),
            key: "url".to_string(),
            value: String::new(),
            reason: "every layer needs a service URL".to_string(),
        })?;

    let mut target = QueryTarget::new(id, url);

    if let Some(v) = section.get("layers") {
        target.layers = split_list(v).into_iter().filter(|l| !l.is_empty()).collect();
    }
    if let Some(v) = section.get("styles") {
        target.styles = split_list(v);
    }
    if let Some(v) = non_empty(section.get("version")) {
        target.version = v;
    }
    target.crs = non_empty(section.get("crs"));
    target.format = non_empty(section.get("format"));
    target.info_format = non_empty(section.get("info_format"));
    target.exceptions = non_empty(section.get("exceptions"));
    target.time = non_empty(section.get("time"));
    if let Some(v) = section.get("individual") {
        target.request_individually = parse_bool(v, &section_name, "individual")?;
    }
    if let Some(v) = section.get("visible") {
        target.visible = parse_bool(v, &section_name, "visible")?;
    }
    if let Some(v) = section.get("queryable") {
        target.queryable = parse_bool(v, &section_name, "queryable")?;
    }

    for (key, value) in section.iter() {
        if let Some(param) = key.strip_prefix(VENDOR_KEY_PREFIX) {
            if param.is_empty() {
                return Err(ConfigFileError::InvalidValue {
                    section: section_name,
                    key: key.to_string(),
                    value: value.to_string(),
                    reason: "vendor parameter name missing".to_string(),
                });
            }
            target = target.with_vendor_param(param, value);
        }
    }

    if !target.styles.is_empty() && target.styles.len() != target.layers.len() {
        return Err(ConfigFileError::InvalidValue {
            section: section_name,
            key: "styles".to_string(),
            value: target.styles.join(","),
            reason: format!("expected {} entries to match layers", target.layers.len()),
        });
    }

    Ok(target)
}

/// Parse a non-zero integer; out-of-range values are rejected, not wrapped.
fn parse_positive<T>(
    value: &str,
    section: &str,
    key: &str,
    unit: &str,
) -> Result<T, ConfigFileError>
where
    T: FromStr + Default + PartialEq,
{
    match value.trim().parse::<T>() {
        Ok(n) if n != T::default() => Ok(n),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: format!("must be a positive integer {}", unit)
                .trim_end()
                .to_string(),
        }),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).collect()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse a boolean value from a string.
///
/// Accepts true/false, yes/no, on/off and 1/0 in any case.
pub(super) fn parse_bool(value: &str, section: &str, key: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be true or false".to_string(),
        }),
    }
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
