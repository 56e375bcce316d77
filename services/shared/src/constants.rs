/// Shared constants for the wagering client and the fixture backend
///
/// Centralizes the limits both sides of the REST surface must agree on.

/// Default history page size when none is configured
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Maximum history page size accepted by the backend
///
/// Larger requests are rejected rather than silently clamped so the client's
/// `has_more` arithmetic always matches what the server returned.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Default HTTP request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Initial delay between settlement polls for deferred bets
pub const RESULT_POLL_INITIAL_MS: u64 = 200;

/// Upper bound for the delay between settlement polls
pub const RESULT_POLL_MAX_MS: u64 = 2_000;

/// Total time a deferred bet may stay unsettled before it is failed
pub const RESULT_TIMEOUT_MS: u64 = 15_000;
