use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScraperError;

/// Rendering backend shared by every query task.
///
/// Each task asks for its own [`Surface`] so concurrent navigations never
/// interfere with each other.
#[async_trait]
pub trait RenderClient: Send + Sync {
    type Surface: Surface + 'static;

    /// Open a fresh, isolated navigable surface (a browser tab).
    async fn new_surface(&self) -> Result<Self::Surface, ScraperError>;
}

/// One navigable surface. Element lookups are document scoped.
#[async_trait]
pub trait Surface: Send + Sync {
    type Entry: ResultEntry + 'static;

    /// Load `url` and wait for the navigation to settle.
    async fn goto(&self, url: &str) -> Result<(), ScraperError>;

    /// Wait until `selector` matches; fails with [`ScraperError::Timeout`].
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), ScraperError>;

    /// Scroll the first element matching `selector` down by `distance` pixels.
    async fn scroll_by(&self, selector: &str, distance: u32) -> Result<(), ScraperError>;

    /// All elements currently matching `selector`, in document order.
    async fn entries(&self, selector: &str) -> Result<Vec<Self::Entry>, ScraperError>;

    /// Attribute of the first element matching `selector`, `None` when nothing matches.
    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, ScraperError>;

    /// Inner text of the first element matching `selector`.
    async fn text(&self, selector: &str) -> Result<String, ScraperError>;

    /// Click the first element matching `selector`; `false` when nothing matches.
    async fn click(&self, selector: &str) -> Result<bool, ScraperError>;

    /// PNG screenshot of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>, ScraperError>;

    /// Close the surface. Calling it more than once is a no-op.
    async fn close(&self) -> Result<(), ScraperError>;
}

/// Handle to one rendered listing. Only valid while its surface is open.
#[async_trait]
pub trait ResultEntry: Send + Sync {
    async fn text(&self) -> Result<String, ScraperError>;

    /// Number of descendants matching `selector`.
    async fn count(&self, selector: &str) -> Result<usize, ScraperError>;

    /// Attribute of the first descendant matching `selector`.
    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>, ScraperError>;

    async fn click(&self) -> Result<(), ScraperError>;
}
