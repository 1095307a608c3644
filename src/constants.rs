//! Shared defaults for timeouts, paging, and concurrency limits.

/// Default timeout for blocking HTTP requests, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default per-event read timeout for SSE streams, in seconds.
pub const DEFAULT_SSE_TIMEOUT_SECS: u64 = 60;

/// Reconnect-attempt budget carried by the SSE parser for callers that
/// implement resume. The parser itself never reconnects.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Default page size when walking paginated console listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Default in-flight cap for console batch operations.
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Hard cap for concurrent plugin-marketplace lookups. The marketplace
/// rate-limits aggressively above this.
pub const PLUGIN_MARKETPLACE_CONCURRENCY: usize = 3;

/// Default concurrency for CLI batch commands (flag-overridable).
pub const CLI_DEFAULT_CONCURRENCY: usize = 16;

/// Base URL of the public plugin marketplace, used to resolve latest
/// plugin versions during upgrades.
pub const MARKETPLACE_BASE_URL: &str = "https://marketplace.dify.ai";

/// Configuration file name looked up in the working directory and under
/// the user config directory.
pub const CONFIG_FILE_NAME: &str = "app.toml";
