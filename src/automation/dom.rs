use async_trait::async_trait;

use crate::error::Result;

/// Page-context operations the driver needs from a loaded tab.
///
/// Element handles are only valid for the document they were queried from;
/// callers re-query after every interaction instead of caching them.
#[async_trait]
pub trait PageDom: Send + Sync {
    type Element: Send + Sync;

    /// All elements matching `selector`, in document order.
    ///
    /// Returns [`ClipbookError::InvalidSelector`](crate::error::ClipbookError::InvalidSelector)
    /// when the selector is rejected by the DOM engine.
    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Element>>;

    /// The element's `textContent`
    async fn text_content(&self, element: &Self::Element) -> Result<String>;

    /// `textContent` of the first descendant matching `selector`, if any
    async fn descendant_text(&self, element: &Self::Element, selector: &str)
        -> Result<Option<String>>;

    async fn click(&self, element: &Self::Element) -> Result<()>;

    /// Assign the `value` property of an input or textarea
    async fn set_value(&self, element: &Self::Element, value: &str) -> Result<()>;

    /// Dispatch a bubbling DOM event of the given type
    async fn dispatch_event(&self, element: &Self::Element, event_type: &str) -> Result<()>;
}
