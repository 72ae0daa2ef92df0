//! Parsed feature type.

/// A feature read from a GetFeatureInfo response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeature {
    /// Layer / feature type name as reported by the server.
    pub feature_type: Option<String>,
    /// Feature identifier, when the format carries one.
    pub fid: Option<String>,
    /// Attributes in the order the response format yields them.
    pub attributes: Vec<(String, String)>,
}

impl ParsedFeature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feature_type(mut self, feature_type: impl Into<String>) -> Self {
        self.feature_type = Some(feature_type.into());
        self
    }

    pub fn with_fid(mut self, fid: impl Into<String>) -> Self {
        self.fid = Some(fid.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// First value of attribute `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}
