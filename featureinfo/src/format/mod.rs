//! GetFeatureInfo response parsing.
//!
//! Servers answer GetFeatureInfo in whatever `INFO_FORMAT` they were asked
//! for (and sometimes in something else). The content type of the response
//! selects an [`InfoFormat`], and each format has one reader:
//!
//! | Content type                                   | Reader                    |
//! |------------------------------------------------|---------------------------|
//! | `application/vnd.ogc.gml`, `text/xml`, ...     | GML / ESRI XML reader     |
//! | `application/json`, `application/geo+json`    | GeoJSON reader            |
//! | `text/html`, `text/plain`                      | none; raw text kept       |
//!
//! Parsers are pluggable through [`ResponseParser`]; [`DefaultResponseParser`]
//! covers the formats above.

mod error;
mod feature;
mod geojson;
mod xml;

pub use error::FormatError;
pub use feature::ParsedFeature;

/// Info formats the default parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoFormat {
    /// GML flavours, ESRI FeatureInfoResponse, generic XML.
    Xml,
    /// GeoJSON feature collections.
    GeoJson,
    /// HTML meant for display; carries no features.
    Html,
    /// Plain text meant for display; carries no features.
    Plain,
}

impl InfoFormat {
    /// Resolve a MIME type (parameters such as `; charset=` are ignored).
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "text/xml" | "application/xml" | "application/vnd.ogc.wms_xml" => Some(Self::Xml),
            m if m.starts_with("application/vnd.ogc.gml") => Some(Self::Xml),
            m if m.starts_with("application/gml+xml") => Some(Self::Xml),
            "application/json" | "application/geo+json" | "application/geojson" => {
                Some(Self::GeoJson)
            }
            "text/html" => Some(Self::Html),
            "text/plain" => Some(Self::Plain),
            _ => None,
        }
    }
}

/// Result of parsing one response body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedBody {
    /// Features in document order.
    pub features: Vec<ParsedFeature>,
    /// Raw body for textual formats.
    pub text: Option<String>,
}

/// Trait for turning a response body into features.
pub trait ResponseParser: Send + Sync {
    /// Parse `body` according to `content_type`.
    fn parse(&self, body: &[u8], content_type: &str) -> Result<ParsedBody, FormatError>;
}

/// Parser for the info formats listed in [`InfoFormat`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResponseParser;

impl ResponseParser for DefaultResponseParser {
    fn parse(&self, body: &[u8], content_type: &str) -> Result<ParsedBody, FormatError> {
        let format = InfoFormat::from_content_type(content_type)
            .ok_or_else(|| FormatError::UnsupportedContentType(content_type.to_string()))?;

        match format {
            InfoFormat::Xml => Ok(ParsedBody {
                features: xml::read_features(body)?,
                text: None,
            }),
            InfoFormat::GeoJson => Ok(ParsedBody {
                features: geojson::read_features(body)?,
                text: None,
            }),
            InfoFormat::Html | InfoFormat::Plain => Ok(ParsedBody {
                features: Vec::new(),
                text: Some(String::from_utf8_lossy(body).into_owned()),
            }),
        }
    }
}
