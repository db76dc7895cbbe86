//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `DiscoveryPhase`: where the scroll-driven discovery loop is (priming, scrolling, stalled)
//! - `PostOutcome`: what happened to each discovered post (downloaded, skipped, fatal)

mod discovery_phase;
mod post_outcome;

// Re-export main types
pub use discovery_phase::DiscoveryPhase;
pub use post_outcome::PostOutcome;
