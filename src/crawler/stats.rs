//! Running counters for a mirror run

use std::fmt;

/// Counters reported at completion, interruption and fatal abort
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Nodes taken off the frontier, skipped ones included
    pub nodes_visited: u64,

    /// Nodes handed to persistence successfully
    pub pages_persisted: u64,

    /// Persisted pages stored without markup
    pub pages_without_markup: u64,

    /// Nodes dropped because of their name
    pub nodes_skipped: u64,

    /// Nodes with no usable payload after all retries
    pub resolve_failures: u64,
}

impl fmt::Display for CrawlStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes visited, {} persisted, {} without markup, {} skipped, {} unresolved",
            self.nodes_visited,
            self.pages_persisted,
            self.pages_without_markup,
            self.nodes_skipped,
            self.resolve_failures
        )
    }
}
