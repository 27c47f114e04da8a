//! Output channel abstraction for command handlers.
//!
//! Two kinds of output exist: the direct response to the command (edits the
//! deferred interaction reply, or replies to the message) and asynchronous
//! channel notifications emitted while a command is still running (scan
//! matches, the final scan listing). Front-ends render [`Notification`]s
//! into platform messages; the core only emits typed values.

use async_trait::async_trait;

use crate::core::scanner::ScanResult;
use crate::errors::Result;

/// A typed channel notification, rendered by the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A scan found a matching project; emitted immediately, in attempt order.
    ScanMatch {
        /// Project name as reported by the directory.
        name: String,
        /// User-facing project link.
        url: String,
    },
    /// Final itemized scan listing (only emitted when matches exist).
    ScanReport {
        /// The search term the scan ran with.
        term: String,
        /// Every match, in attempt order.
        results: Vec<ScanResult>,
    },
    /// A finished scan found nothing.
    ScanEmpty {
        /// The search term the scan ran with.
        term: String,
    },
}

/// Where a command handler sends its output.
#[async_trait]
pub trait ReplySink: Send {
    /// Delivers the command's direct response.
    async fn respond(&mut self, text: String) -> Result<()>;

    /// Delivers an asynchronous channel notification.
    async fn notify(&mut self, note: Notification) -> Result<()>;
}
