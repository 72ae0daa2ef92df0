//! Registry of map layers that can be queried.
//!
//! The catalog stands in for the host application's layer list: it keeps
//! targets in display order and answers which of them a click should query.

use std::sync::Arc;

use thiserror::Error;

use crate::query::QueryTarget;

/// Errors from catalog lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown layer: {0}")]
    UnknownTarget(String),

    #[error("layer '{0}' is not queryable")]
    NotQueryable(String),
}

/// Ordered set of query targets, unique by id.
#[derive(Debug, Clone, Default)]
pub struct LayerCatalog {
    targets: Vec<Arc<QueryTarget>>,
}

impl LayerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target. A target with the same id is replaced in place.
    pub fn insert(&mut self, target: QueryTarget) {
        let target = Arc::new(target);
        match self.targets.iter_mut().find(|t| t.id == target.id) {
            Some(existing) => *existing = target,
            None => self.targets.push(target),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<QueryTarget>> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Arc<QueryTarget>> {
        let pos = self.targets.iter().position(|t| t.id == id)?;
        Some(self.targets.remove(pos))
    }

    /// Targets a click queries: visible and queryable, in catalog order.
    pub fn queryable(&self) -> Vec<Arc<QueryTarget>> {
        self.targets
            .iter()
            .filter(|t| t.visible && t.queryable)
            .cloned()
            .collect()
    }

    /// Targets by id, in the requested order.
    ///
    /// Unknown ids and targets flagged non-queryable are errors; visibility
    /// is not checked since an explicit selection overrides it.
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Arc<QueryTarget>>, CatalogError> {
        ids.iter()
            .map(|id| {
                let id = id.as_ref();
                let target = self
                    .get(id)
                    .ok_or_else(|| CatalogError::UnknownTarget(id.to_string()))?;
                if !target.queryable {
                    return Err(CatalogError::NotQueryable(id.to_string()));
                }
                Ok(Arc::clone(target))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<QueryTarget>> {
        self.targets.iter()
    }
}

impl FromIterator<QueryTarget> for LayerCatalog {
    fn from_iter<I: IntoIterator<Item = QueryTarget>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for target in iter {
            catalog.insert(target);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> LayerCatalog {
        [
            QueryTarget::new("roads", "http://a/wms").with_layers(["roads"]),
            QueryTarget::new("rivers", "http://a/wms")
                .with_layers(["rivers"])
                .with_visibility(false),
            QueryTarget::new("labels", "http://b/wms")
                .with_layers(["labels"])
                .with_queryable(false),
            QueryTarget::new("parcels", "http://b/wms").with_layers(["parcels"]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_queryable_filters_hidden_and_non_queryable() {
        let ids: Vec<String> = catalog().queryable().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec!["roads", "parcels"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut catalog = catalog();
        catalog.insert(QueryTarget::new("rivers", "http://c/wms").with_layers(["rivers"]));

        assert_eq!(catalog.len(), 4);
        let ids: Vec<&str> = catalog.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["roads", "rivers", "labels", "parcels"]);
        assert_eq!(catalog.get("rivers").unwrap().url, "http://c/wms");
        assert!(catalog.get("rivers").unwrap().visible);
    }

    #[test]
    fn test_select_preserves_requested_order() {
        let selected = catalog().select(&["parcels", "rivers"]).unwrap();
        let ids: Vec<&str> = selected.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["parcels", "rivers"]);
    }

    #[test]
    fn test_select_errors() {
        let catalog = catalog();
        assert_eq!(
            catalog.select(&["roads", "missing"]).unwrap_err(),
            CatalogError::UnknownTarget("missing".to_string())
        );
        assert_eq!(
            catalog.select(&["labels"]).unwrap_err(),
            CatalogError::NotQueryable("labels".to_string())
        );
    }

    #[test]
    fn test_remove() {
        let mut catalog = catalog();
        assert!(catalog.remove("roads").is_some());
        assert!(catalog.remove("roads").is_none());
        assert_eq!(catalog.len(), 3);
        assert!(!catalog.is_empty());
    }
}
