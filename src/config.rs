//! Runtime settings shared by the application wiring and the binary.

use std::path::PathBuf;
use std::time::Duration;

/// Default quiescence window applied to search and category edits.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAILBOX_SIZE: usize = 32;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the inventory service, e.g. `http://localhost:8080`.
    /// `None` serves everything from the in-process backend.
    pub api_url: Option<String>,
    pub request_timeout: Duration,
    pub debounce: Duration,
    pub page_size: u32,
    /// Where the session keys are persisted. `None` keeps them in memory.
    pub store_path: Option<PathBuf>,
    pub mailbox_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            debounce: DEFAULT_DEBOUNCE,
            page_size: DEFAULT_PAGE_SIZE,
            store_path: None,
            mailbox_size: DEFAULT_MAILBOX_SIZE,
        }
    }
}
