//! Presentation seam for rendered responses.
//!
//! The dispatcher never talks to a display directly; it hands fetched
//! pages to a `Renderer`. `Document` is the in-memory implementation most
//! hosts (and the tests) use.

use tracing::debug;

/// Capability handed to the dispatcher for surfacing a fetched page.
pub trait Renderer {
    /// Replace the entire current document with `html`.
    fn replace_document(&mut self, html: &str);

    /// Record `url` as the new visible location. Entries accumulate; this
    /// is a push, not a replacement.
    fn push_history(&mut self, url: &str);
}

/// The current page plus the navigation history behind it.
#[derive(Debug, Default)]
pub struct Document {
    html: String,
    history: Vec<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current document text. Empty until the first GET is rendered.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// The visible location: the most recently pushed entry.
    pub fn location(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    /// Every pushed location, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl Renderer for Document {
    fn replace_document(&mut self, html: &str) {
        self.html = html.to_string();
    }

    fn push_history(&mut self, url: &str) {
        self.history.push(url.to_string());
    }
}

/// Renderer for hosts with no page to update; output is logged and dropped.
#[derive(Debug, Default)]
pub struct DiscardRenderer;

impl Renderer for DiscardRenderer {
    fn replace_document(&mut self, html: &str) {
        debug!(bytes = html.len(), "discarding rendered document");
    }

    fn push_history(&mut self, url: &str) {
        debug!(url, "discarding history entry");
    }
}
