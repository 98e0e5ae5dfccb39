//! Collapse-on-load behavior
//!
//! The filter navigation panel of a changelist page arrives with its
//! disclosure widgets expanded. This module forces every one of them shut
//! the moment the page's content-loaded signal fires, so the panel starts
//! folded instead of pushing the result list below the fold.

use serde::{Deserialize, Serialize};

use crate::dom::Document;
use crate::error::{Error, Result};
use crate::page::Page;
use crate::CollapseConfig;

/// Id of the filter navigation panel on a changelist page
pub const FILTER_NAV_ID: &str = "changelist-filter";

/// Tag of the collapsible disclosure widget
pub const DISCLOSURE_TAG: &str = "details";

/// Presence flag that renders a disclosure widget expanded
pub const OPEN_ATTR: &str = "open";

/// What a collapse pass did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapseOutcome {
    /// Whether the container element was present
    pub container_found: bool,
    /// Widgets that were expanded and got collapsed
    pub collapsed: usize,
    /// Widgets that were already collapsed and were left alone
    pub already_collapsed: usize,
}

impl CollapseOutcome {
    fn absent() -> Self {
        Self {
            container_found: false,
            collapsed: 0,
            already_collapsed: 0,
        }
    }

    /// Total widgets the pass looked at
    pub fn widgets_seen(&self) -> usize {
        self.collapsed + self.already_collapsed
    }

    /// Save the outcome to a JSON file
    pub fn save(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load an outcome from a JSON file
    pub fn load(path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let outcome = serde_json::from_str(&json)?;
        Ok(outcome)
    }
}

/// Collapse every disclosure widget inside the filter container
///
/// Resolves the container by id, snapshots its `details` descendants at any
/// depth in document order, and strips the `open` flag from each. Widgets
/// outside the container are never touched. A second pass over the same
/// document finds nothing left to collapse.
///
/// When the container is absent the default config makes this a graceful
/// no-op (a page without a filter panel is an expected condition, not a
/// fault); a [`CollapseConfig::strict`] config surfaces
/// [`Error::ContainerMissing`] instead, with zero mutations performed.
pub fn collapse_filters(doc: &mut Document, config: &CollapseConfig) -> Result<CollapseOutcome> {
    let Some(container) = doc.get_element_by_id(&config.container_id) else {
        if config.require_container {
            return Err(Error::container_missing(&config.container_id));
        }
        tracing::debug!(
            "Filter container #{} not present; nothing to collapse",
            config.container_id
        );
        return Ok(CollapseOutcome::absent());
    };

    let widgets = doc.elements_by_tag(container, DISCLOSURE_TAG);
    let mut outcome = CollapseOutcome {
        container_found: true,
        collapsed: 0,
        already_collapsed: 0,
    };
    for widget in widgets {
        if doc.remove_attribute(widget, OPEN_ATTR) {
            outcome.collapsed += 1;
        } else {
            outcome.already_collapsed += 1;
        }
    }

    tracing::debug!(
        "Collapsed {} of {} disclosure widgets in #{}",
        outcome.collapsed,
        outcome.widgets_seen(),
        config.container_id
    );
    Ok(outcome)
}

/// Install the collapse pass as a content-loaded hook on a page
///
/// The pass then runs exactly once per load, right after parsing finishes —
/// the filter panel is already folded by the time the page reports ready.
pub async fn install(page: &Page, config: CollapseConfig) {
    page.on_content_loaded(move |doc| collapse_filters(doc, &config).map(|_| ()))
        .await;
}

/// Run a collapse pass immediately against a loaded page
pub async fn collapse_now(page: &Page, config: &CollapseConfig) -> Result<CollapseOutcome> {
    page.with_document_mut(|doc| collapse_filters(doc, config))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom;

    #[test]
    fn test_outcome_roundtrip() {
        let outcome = CollapseOutcome {
            container_found: true,
            collapsed: 2,
            already_collapsed: 1,
        };

        let dir = std::env::temp_dir().join("navfold-outcome-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("outcome.json");
        let path = path.to_str().unwrap();

        outcome.save(path).unwrap();
        let loaded = CollapseOutcome::load(path).unwrap();
        assert_eq!(loaded, outcome);
    }

    #[test]
    fn test_collapse_counts_expanded_and_already_collapsed() {
        let mut doc = dom::parse(
            r#"<nav id="changelist-filter">
                <details open></details>
                <details open></details>
                <details></details>
            </nav>"#,
        );

        let outcome = collapse_filters(&mut doc, &CollapseConfig::default()).unwrap();
        assert_eq!(outcome.collapsed, 2);
        assert_eq!(outcome.already_collapsed, 1);
        assert!(outcome.container_found);
    }

    #[test]
    fn test_strict_config_errors_on_missing_container() {
        let mut doc = dom::parse("<body><details open></details></body>");

        let result = collapse_filters(&mut doc, &CollapseConfig::strict());
        assert!(matches!(
            result,
            Err(Error::ContainerMissing { ref id }) if id == FILTER_NAV_ID
        ));
        // Zero mutations: the stray widget keeps its flag
        let widgets = doc.elements_by_tag(doc.root(), DISCLOSURE_TAG);
        assert!(doc.has_attribute(widgets[0], OPEN_ATTR));
    }

    #[test]
    fn test_default_config_noops_on_missing_container() {
        let mut doc = dom::parse("<body><p>no filters here</p></body>");

        let outcome = collapse_filters(&mut doc, &CollapseConfig::default()).unwrap();
        assert_eq!(outcome, CollapseOutcome::absent());
    }
}
