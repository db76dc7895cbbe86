//! Automated browser session
//!
//! The discovery engine drives a feed through this trait only, so the real
//! Chromium session and scripted test sessions are interchangeable. A session
//! is exclusively owned: every operation takes `&mut self`, which rules out
//! concurrent navigation or scrolling on the same page.

mod chrome;

pub use chrome::ChromeSession;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Errors raised by the browser session
///
/// Any of these makes the session unusable and ends the crawl.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Viewport change failed: {0}")]
    Viewport(String),

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Failed to read rendered markup: {0}")]
    Markup(String),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Operations the discovery engine needs from an automated browser
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigates the session to `url`
    async fn navigate(&mut self, url: &Url) -> SessionResult<()>;

    /// Fixes the viewport size in CSS pixels
    async fn set_viewport(&mut self, width: u32, height: u32) -> SessionResult<()>;

    /// Returns the currently rendered document markup
    async fn rendered_markup(&mut self) -> SessionResult<String>;

    /// Scrolls the document to its bottom
    async fn scroll_to_bottom(&mut self) -> SessionResult<()>;

    /// Reads the current scroll extent (document height)
    async fn scroll_extent(&mut self) -> SessionResult<u64>;
}
