//! Connectivity probing.
//!
//! A probe issues one side-effect-free read against a backend's target to
//! check reachability and credentials. It is independent of any run and may
//! be called any number of times.

use serde::{Deserialize, Serialize};

/// Maximum number of payload characters kept in a successful probe detail.
pub const DETAIL_LIMIT: usize = 50;

/// Result of a connectivity probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Whether the target answered.
    pub ok: bool,
    /// Truncated payload on success, error text on failure.
    pub detail: String,
}

impl ProbeResult {
    /// A successful probe; the payload is cut to [`DETAIL_LIMIT`] characters.
    pub fn reachable(payload: &str) -> Self {
        Self {
            ok: true,
            detail: truncate(payload, DETAIL_LIMIT),
        }
    }

    /// A failed probe. The detail is never empty.
    pub fn unreachable(error: impl Into<String>) -> Self {
        let detail = error.into();
        Self {
            ok: false,
            detail: if detail.trim().is_empty() {
                "unknown error".to_string()
            } else {
                detail
            },
        }
    }
}

/// Anything that can check whether its target is reachable.
#[async_trait::async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Run the probe. Never panics and never returns an error.
    async fn probe(&self) -> ProbeResult;
}

fn truncate(s: &str, limit: usize) -> String {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reachable_truncates() {
        let payload = "PostgreSQL 15.1 on aarch64-unknown-linux-gnu, compiled by gcc";
        let result = ProbeResult::reachable(payload);
        assert!(result.ok);
        assert_eq!(result.detail.chars().count(), DETAIL_LIMIT);
        assert!(payload.starts_with(&result.detail));
    }

    #[test]
    fn test_reachable_short_payload_untouched() {
        assert_eq!(ProbeResult::reachable("ok").detail, "ok");
    }

    #[test]
    fn test_unreachable_never_empty() {
        let result = ProbeResult::unreachable("");
        assert!(!result.ok);
        assert_eq!(result.detail, "unknown error");

        let result = ProbeResult::unreachable("connection refused");
        assert_eq!(result.detail, "connection refused");
    }
}
