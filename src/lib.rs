//! # Navfold
//!
//! Collapse filter-panel disclosure widgets on page load.
//!
//! Changelist-style admin pages render their filter sidebar as a stack of
//! native `<details>` disclosure widgets, expanded by default. Navfold
//! models such a page in memory and, the moment the document's
//! content-loaded signal fires, folds every widget inside the filter
//! navigation panel (`#changelist-filter`) shut — and touches nothing else.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use navfold::{collapse, CollapseConfig, Page};
//!
//! #[tokio::main]
//! async fn main() -> navfold::Result<()> {
//!     let page = Page::new();
//!
//!     // Fold the filter panel on every load
//!     collapse::install(&page, CollapseConfig::default()).await;
//!
//!     let html = std::fs::read_to_string("changelist.html")?;
//!     page.load(&html).await?;
//!
//!     // The panel is already collapsed by the time the page is ready
//!     println!("{}", page.content().await?);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```rust,no_run
//! use navfold::CollapseConfig;
//!
//! // Fail loudly when the filter panel is missing instead of no-opping
//! let config = CollapseConfig::strict();
//!
//! // Or target a differently-named container
//! let config = CollapseConfig {
//!     container_id: "sidebar-filters".to_string(),
//!     ..Default::default()
//! };
//! ```

pub mod collapse;
pub mod dom;
pub mod error;
pub mod page;

// Re-exports
pub use collapse::{
    collapse_filters, collapse_now, install, CollapseOutcome, DISCLOSURE_TAG, FILTER_NAV_ID,
    OPEN_ATTR,
};
pub use dom::{Document, NodeId};
pub use error::{Error, Result};
pub use page::{Element, Page, PageState};

/// Configuration for the collapse pass
#[derive(Debug, Clone)]
pub struct CollapseConfig {
    /// Id of the container whose disclosure widgets get collapsed
    pub container_id: String,
    /// Treat a missing container as an error instead of a no-op
    pub require_container: bool,
}

impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            container_id: collapse::FILTER_NAV_ID.to_string(),
            require_container: false,
        }
    }
}

impl CollapseConfig {
    /// Create a config that fails when the container is absent
    ///
    /// This reproduces the unguarded behavior of the original page script,
    /// which dereferenced the container without checking for it.
    pub fn strict() -> Self {
        Self {
            require_container: true,
            ..Default::default()
        }
    }

    /// Create a config targeting a custom container id
    pub fn for_container(id: impl Into<String>) -> Self {
        Self {
            container_id: id.into(),
            ..Default::default()
        }
    }
}
