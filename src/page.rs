//! Page Abstraction
//!
//! High-level API for a loaded document: a one-shot content-loaded
//! lifecycle, id/tag queries, and element handles for attribute work.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{watch, Mutex, RwLock};

use crate::dom::{self, Document, NodeId};
use crate::error::{Error, Result};

/// Hook invoked once per load, right after the document finishes parsing
type LoadHook = Box<dyn FnMut(&mut Document) -> Result<()> + Send>;

/// A page holding at most one loaded document
///
/// The page starts empty. [`Page::load`] parses markup, installs the
/// document, runs every registered content-loaded hook exactly once, and
/// then flips the readiness signal. A later `load` models a fresh
/// navigation: handles from the previous document go stale and hooks run
/// again against the new tree.
pub struct Page {
    document: RwLock<Option<Document>>,
    hooks: Mutex<Vec<LoadHook>>,
    ready_tx: watch::Sender<bool>,
    // Bumped on every load so stale element handles can be detected
    generation: AtomicU64,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    /// Create an empty, not-yet-ready page
    pub fn new() -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            document: RwLock::new(None),
            hooks: Mutex::new(Vec::new()),
            ready_tx,
            generation: AtomicU64::new(0),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Parse `html` and make it the page's document
    ///
    /// Runs all content-loaded hooks in registration order before marking
    /// the page ready. Every hook runs even if an earlier one fails; the
    /// first hook error is returned after the pass completes. The page is
    /// ready afterwards either way, the same way a throwing listener does
    /// not keep a browser page from finishing its load.
    pub async fn load(&self, html: &str) -> Result<()> {
        let doc = dom::parse(html);
        tracing::debug!("Parsed document with {} nodes", doc.len());

        self.ready_tx.send_replace(false);
        self.generation.fetch_add(1, Ordering::SeqCst);
        {
            let mut guard = self.document.write().await;
            *guard = Some(doc);
        }

        let result = self.run_content_loaded_hooks().await;
        self.ready_tx.send_replace(true);
        result
    }

    async fn run_content_loaded_hooks(&self) -> Result<()> {
        let mut hooks = self.hooks.lock().await;
        let mut guard = self.document.write().await;
        let doc = guard.as_mut().ok_or(Error::NotLoaded)?;

        let mut first_error = None;
        for hook in hooks.iter_mut() {
            if let Err(e) = hook(doc) {
                tracing::warn!("Content-loaded hook failed: {}", e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Register a hook to run when a document finishes loading
    ///
    /// Hooks registered while the current document is already ready are
    /// dropped, matching `DOMContentLoaded` listeners added after the event
    /// fired.
    pub async fn on_content_loaded<F>(&self, hook: F)
    where
        F: FnMut(&mut Document) -> Result<()> + Send + 'static,
    {
        if self.is_ready() {
            tracing::debug!("Content-loaded already fired; hook not registered");
            return;
        }
        self.hooks.lock().await.push(Box::new(hook));
    }

    /// Whether the current document has finished loading
    pub fn is_ready(&self) -> bool {
        *self.ready_tx.borrow()
    }

    /// Wait until the page becomes ready
    ///
    /// Times out after 30 seconds.
    pub async fn wait_until_ready(&self) -> Result<()> {
        self.wait_until_ready_timeout(30_000).await
    }

    /// Wait until the page becomes ready, with a timeout in milliseconds
    pub async fn wait_until_ready_timeout(&self, timeout_ms: u64) -> Result<()> {
        let mut rx = self.ready_tx.subscribe();
        let timeout = std::time::Duration::from_millis(timeout_ms);
        let result = match tokio::time::timeout(timeout, rx.wait_for(|ready| *ready)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(Error::Timeout("Readiness channel closed".to_string())),
            Err(_) => Err(Error::Timeout(format!(
                "Document did not become ready within {}ms",
                timeout_ms
            ))),
        };
        result
    }

    // =========================================================================
    // Page Info
    // =========================================================================

    /// Get the page title (empty string when the document has none)
    pub async fn title(&self) -> Result<String> {
        let guard = self.document.read().await;
        let doc = guard.as_ref().ok_or(Error::NotLoaded)?;
        Ok(doc
            .elements_by_tag(doc.root(), "title")
            .first()
            .map(|&n| doc.text_content(n))
            .unwrap_or_default())
    }

    /// Get the serialized HTML of the whole document
    pub async fn content(&self) -> Result<String> {
        let guard = self.document.read().await;
        let doc = guard.as_ref().ok_or(Error::NotLoaded)?;
        Ok(doc.to_html())
    }

    /// Get the text content of the document body
    pub async fn text(&self) -> Result<String> {
        let guard = self.document.read().await;
        let doc = guard.as_ref().ok_or(Error::NotLoaded)?;
        let scope = doc
            .elements_by_tag(doc.root(), "body")
            .first()
            .copied()
            .unwrap_or(doc.root());
        Ok(doc.text_content(scope))
    }

    // =========================================================================
    // Element Finding
    // =========================================================================

    /// Find an element by its `id` attribute
    pub async fn find_by_id(&self, id: &str) -> Result<Element<'_>> {
        let guard = self.document.read().await;
        let doc = guard.as_ref().ok_or(Error::NotLoaded)?;
        let node_id = doc
            .get_element_by_id(id)
            .ok_or_else(|| Error::not_found(id))?;
        Ok(self.element(node_id))
    }

    /// Check if an element with the given id exists
    #[must_use = "returns true if element exists"]
    pub async fn exists(&self, id: &str) -> bool {
        self.find_by_id(id).await.is_ok()
    }

    /// Find all elements with the given tag name, in document order
    ///
    /// The result is a snapshot taken at call time, not a live collection.
    pub async fn find_all(&self, tag: &str) -> Result<Vec<Element<'_>>> {
        let guard = self.document.read().await;
        let doc = guard.as_ref().ok_or(Error::NotLoaded)?;
        Ok(doc
            .elements_by_tag(doc.root(), tag)
            .into_iter()
            .map(|node_id| self.element(node_id))
            .collect())
    }

    fn element(&self, node_id: NodeId) -> Element<'_> {
        Element {
            page: self,
            node_id,
            generation: self.generation.load(Ordering::SeqCst),
        }
    }

    /// Run a closure against the live document
    pub(crate) async fn with_document_mut<T>(
        &self,
        f: impl FnOnce(&mut Document) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.document.write().await;
        let doc = guard.as_mut().ok_or(Error::NotLoaded)?;
        f(doc)
    }

    /// Log-friendly snapshot of the current page state
    pub async fn debug_state(&self) -> Result<PageState> {
        let guard = self.document.read().await;
        let doc = guard.as_ref().ok_or(Error::NotLoaded)?;

        let title = doc
            .elements_by_tag(doc.root(), "title")
            .first()
            .map(|&n| doc.text_content(n))
            .unwrap_or_default();
        let element_count = doc
            .descendants(doc.root())
            .filter(|&n| doc.tag_name(n).is_some())
            .count();
        let widgets = doc.elements_by_tag(doc.root(), crate::collapse::DISCLOSURE_TAG);
        let expanded_count = widgets
            .iter()
            .filter(|&&w| doc.has_attribute(w, crate::collapse::OPEN_ATTR))
            .count();

        Ok(PageState {
            title,
            element_count,
            widget_count: widgets.len(),
            expanded_count,
            filter_panel_present: doc.get_element_by_id(crate::collapse::FILTER_NAV_ID).is_some(),
        })
    }
}

/// Debug information about page state
#[derive(Debug, Clone)]
pub struct PageState {
    /// Page title
    pub title: String,
    /// Number of elements in the document
    pub element_count: usize,
    /// Number of disclosure widgets
    pub widget_count: usize,
    /// Number of disclosure widgets currently expanded
    pub expanded_count: usize,
    /// Whether the filter navigation panel is present
    pub filter_panel_present: bool,
}

/// An element on the page
///
/// A handle, not an owned node: accessors read through the page, so a
/// handle taken before a reload reports [`Error::StaleElement`] afterwards
/// instead of touching the wrong tree.
pub struct Element<'a> {
    page: &'a Page,
    node_id: NodeId,
    generation: u64,
}

impl<'a> Element<'a> {
    /// The underlying arena handle
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    fn check_fresh(&self) -> Result<()> {
        if self.generation != self.page.generation.load(Ordering::SeqCst) {
            return Err(Error::StaleElement);
        }
        Ok(())
    }

    async fn with_doc<T>(&self, f: impl FnOnce(&Document) -> T) -> Result<T> {
        self.check_fresh()?;
        let guard = self.page.document.read().await;
        let doc = guard.as_ref().ok_or(Error::NotLoaded)?;
        Ok(f(doc))
    }

    async fn with_doc_mut<T>(&self, f: impl FnOnce(&mut Document) -> T) -> Result<T> {
        self.check_fresh()?;
        let mut guard = self.page.document.write().await;
        let doc = guard.as_mut().ok_or(Error::NotLoaded)?;
        Ok(f(doc))
    }

    /// Get the tag name of the element (e.g., "nav", "details")
    pub async fn tag_name(&self) -> Result<String> {
        self.with_doc(|doc| doc.tag_name(self.node_id).unwrap_or_default().to_string())
            .await
    }

    /// Get the element's text content
    pub async fn text(&self) -> Result<String> {
        self.with_doc(|doc| doc.text_content(self.node_id)).await
    }

    /// Get outer HTML
    pub async fn outer_html(&self) -> Result<String> {
        self.with_doc(|doc| doc.outer_html(self.node_id)).await
    }

    /// Get an attribute value from the element
    pub async fn get_attribute(&self, name: &str) -> Result<Option<String>> {
        self.with_doc(|doc| doc.attribute(self.node_id, name).map(str::to_owned))
            .await
    }

    /// Check whether the element carries an attribute
    pub async fn has_attribute(&self, name: &str) -> Result<bool> {
        self.with_doc(|doc| doc.has_attribute(self.node_id, name))
            .await
    }

    /// Set an attribute on the element
    pub async fn set_attribute(&self, name: &str, value: &str) -> Result<()> {
        self.with_doc_mut(|doc| doc.set_attribute(self.node_id, name, value))
            .await
    }

    /// Remove an attribute; returns true if it was present
    pub async fn remove_attribute(&self, name: &str) -> Result<bool> {
        self.with_doc_mut(|doc| doc.remove_attribute(self.node_id, name))
            .await
    }

    /// Find all descendant elements with the given tag name, in document
    /// order, as a snapshot
    pub async fn find_all(&self, tag: &str) -> Result<Vec<Element<'a>>> {
        self.with_doc(|doc| {
            doc.elements_by_tag(self.node_id, tag)
                .into_iter()
                .map(|node_id| Element {
                    page: self.page,
                    node_id,
                    generation: self.generation,
                })
                .collect()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queries_before_load_report_not_loaded() {
        let page = Page::new();
        assert!(matches!(page.title().await, Err(Error::NotLoaded)));
        assert!(matches!(
            page.find_by_id("anything").await,
            Err(Error::NotLoaded)
        ));
    }

    #[tokio::test]
    async fn test_handles_go_stale_across_loads() {
        let page = Page::new();
        page.load(r#"<div id="a">first</div>"#).await.unwrap();
        let handle = page.find_by_id("a").await.unwrap();
        assert_eq!(handle.text().await.unwrap(), "first");

        page.load(r#"<div id="a">second</div>"#).await.unwrap();
        assert!(matches!(
            handle.text().await,
            Err(Error::StaleElement)
        ));
    }

    #[tokio::test]
    async fn test_wait_until_ready_times_out_without_load() {
        let page = Page::new();
        let result = page.wait_until_ready_timeout(20).await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }
}
