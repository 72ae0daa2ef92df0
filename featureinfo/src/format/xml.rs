//! XML info format reader.
//!
//! Reads the body into a small element tree first, then recognises the
//! document by its root element:
//!
//! - `msGMLOutput` (MapServer): `<name>_layer` elements holding `<name>_feature`s
//! - `FeatureInfoResponse` (ESRI): `FIELDS` elements, values as attributes or
//!   as `FIELD name=".." value=".."` children
//! - `ServiceExceptionReport` / `ExceptionReport`: reported as an error
//! - anything else: WFS-style `featureMember`, `featureMembers` or `member`
//!   elements anywhere in the document; no members means no features
//!
//! Bodies are decoded with the charset named in the XML declaration
//! (MapServer defaults to ISO-8859-1); without one they must be UTF-8.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::error::FormatError;
use super::feature::ParsedFeature;

/// Minimal element tree; names are local (namespace prefix stripped).
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Leaf children as `(name, text)` pairs; nested structures such as
    /// geometries and bounding boxes are skipped.
    fn leaf_attributes(&self) -> Vec<(String, String)> {
        self.children
            .iter()
            .filter(|c| c.is_leaf())
            .map(|c| (c.name.clone(), c.text.clone()))
            .collect()
    }

    fn descendants<'a>(&'a self, names: &[&str], out: &mut Vec<&'a Element>) {
        for child in &self.children {
            if names.contains(&child.name.as_str()) {
                out.push(child);
            } else {
                child.descendants(names, out);
            }
        }
    }
}

/// Read all features from an XML GetFeatureInfo body.
pub(super) fn read_features(body: &[u8]) -> Result<Vec<ParsedFeature>, FormatError> {
    let root = parse_tree(body)?;

    match root.name.as_str() {
        "ServiceExceptionReport" | "ExceptionReport" => {
            Err(FormatError::ServiceException(exception_text(&root)))
        }
        "msGMLOutput" => Ok(read_msgml(&root)),
        "FeatureInfoResponse" => Ok(read_esri(&root)),
        _ => Ok(read_feature_members(&root)),
    }
}

/// Decode `body` to text using its declared encoding, honouring a BOM.
fn decode_body(body: &[u8]) -> Result<Cow<'_, str>, FormatError> {
    let encoding = declared_encoding(body).unwrap_or(UTF_8);
    let (text, used, had_errors) = encoding.decode(body);
    if had_errors {
        return Err(FormatError::Encoding(used.name()));
    }
    Ok(text)
}

/// The `encoding` pseudo-attribute of an ASCII-compatible XML declaration.
fn declared_encoding(body: &[u8]) -> Option<&'static Encoding> {
    fn skip_space(bytes: &[u8]) -> &[u8] {
        let start = bytes
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(bytes.len());
        &bytes[start..]
    }

    let body = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
    let rest = body.strip_prefix(b"<?xml")?;
    let end = rest.windows(2).position(|w| w == b"?>")?;
    let declaration = &rest[..end];

    let at = declaration.windows(8).position(|w| w == b"encoding")?;
    let value = skip_space(skip_space(&declaration[at + 8..]).strip_prefix(b"=")?);
    let (&quote, value) = value.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let len = value.iter().position(|&b| b == quote)?;
    Encoding::for_label(&value[..len])
}

fn parse_tree(body: &[u8]) -> Result<Element, FormatError> {
    let source = decode_body(body)?;
    let mut reader = Reader::from_str(&source);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(element_from(&e)?),
            Event::Empty(e) => {
                let element = element_from(&e)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| FormatError::Malformed("unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, element);
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(FormatError::Malformed(
            "unexpected end of document".to_string(),
        ));
    }
    root.ok_or_else(|| FormatError::Malformed("empty document".to_string()))
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, FormatError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = attr.key.local_name();
        // Namespace declarations are not data
        if attr.key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        attributes.push((
            String::from_utf8_lossy(key.as_ref()).into_owned(),
            attr.unescape_value()?.into_owned(),
        ));
    }
    Ok(Element {
        name,
        attributes,
        ..Default::default()
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn exception_text(root: &Element) -> String {
    let mut found = Vec::new();
    root.descendants(&["ServiceException", "ExceptionText"], &mut found);

    let messages: Vec<&str> = found
        .iter()
        .map(|e| e.text.trim())
        .filter(|t| !t.is_empty())
        .collect();

    if messages.is_empty() {
        root.text.trim().to_string()
    } else {
        messages.join("; ")
    }
}

fn read_msgml(root: &Element) -> Vec<ParsedFeature> {
    let mut features = Vec::new();
    for layer in &root.children {
        let Some(layer_name) = layer.name.strip_suffix("_layer") else {
            continue;
        };
        for node in layer.children.iter().filter(|c| c.name.ends_with("_feature")) {
            let mut feature = ParsedFeature::new().with_feature_type(layer_name);
            feature.fid = node.attribute("fid").map(str::to_string);
            feature.attributes = node.leaf_attributes();
            features.push(feature);
        }
    }
    features
}

fn read_esri(root: &Element) -> Vec<ParsedFeature> {
    let mut nodes = Vec::new();
    root.descendants(&["FIELDS"], &mut nodes);

    nodes
        .into_iter()
        .map(|node| {
            let mut feature = ParsedFeature::new();
            if node.attributes.is_empty() {
                for field in &node.children {
                    if let Some(name) = field.attribute("name") {
                        let value = field.attribute("value").unwrap_or_default();
                        feature.attributes.push((name.to_string(), value.to_string()));
                    }
                }
            } else {
                feature.attributes = node.attributes.clone();
            }
            feature
        })
        .collect()
}

fn read_feature_members(root: &Element) -> Vec<ParsedFeature> {
    let mut members = Vec::new();
    root.descendants(&["featureMember", "featureMembers", "member"], &mut members);

    members
        .into_iter()
        .flat_map(|member| member.children.iter())
        .map(|node| {
            let mut feature = ParsedFeature::new().with_feature_type(node.name.clone());
            feature.fid = node
                .attribute("fid")
                .or_else(|| node.attribute("id"))
                .map(str::to_string);
            feature.attributes = node.leaf_attributes();
            feature
        })
        .collect()
}
