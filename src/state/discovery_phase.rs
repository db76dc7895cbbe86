/// Phase definitions for the scroll-driven discovery loop
use std::fmt;

/// Represents where a discovery run is in its scroll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoveryPhase {
    /// Navigating to the profile and fixing the viewport
    Priming,

    /// Harvesting anchors, scrolling and waiting for the feed to grow
    Scrolling,

    /// The scroll extent stopped growing; the feed is exhausted or hung
    Stalled,
}

impl DiscoveryPhase {
    /// Returns true once no further scroll passes will run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stalled)
    }

    /// Returns the phase that follows a scroll pass
    ///
    /// `unchanged_passes` counts consecutive passes whose scroll extent did
    /// not grow; reaching `stall_threshold` ends the loop.
    pub fn after_pass(&self, unchanged_passes: u32, stall_threshold: u32) -> Self {
        match self {
            Self::Stalled => Self::Stalled,
            _ if unchanged_passes >= stall_threshold => Self::Stalled,
            _ => Self::Scrolling,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Priming => "priming",
            Self::Scrolling => "scrolling",
            Self::Stalled => "stalled",
        }
    }
}

impl fmt::Display for DiscoveryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
