use std::time::Duration;

/// Application name
pub const APP_NAME: &str = "Spektr";

/// Namespace under which the last authenticated identity is persisted
pub const SESSION_NAMESPACE: &str = "spektr_user";

/// Interval between conversation history refreshes
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Number of digits in an email verification code
pub const VERIFICATION_CODE_LEN: usize = 6;

/// Header carrying the caller's user id on list/search requests
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Default backend base URL for local development
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8080";

/// Default HTTP request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
