use std::time::Duration;

use crate::models::PriceSnapshot;

/// Classified result of a single fetch attempt.
///
/// Produced by a [`PriceFeed`](crate::traits::PriceFeed) implementation and
/// consumed by the loop controller's decision table. Immutable once built.
///
/// The non-success variants are all tick-scoped: none of them ends the
/// process. `NonRetriable` means "do not expect the next tick to do better",
/// not "shut down" - process-fatal failure exists only as broker
/// connection exhaustion, which is a different type entirely.
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    /// The upstream returned a well-formed snapshot.
    Success(PriceSnapshot),

    /// HTTP 429. The caller is expected to pause before the next tick;
    /// `retry_after` is the courtesy delay the fetcher already served.
    RateLimited {
        /// Courtesy delay applied by the fetcher before returning
        retry_after: Duration,
    },

    /// Transient failure; trying again next tick is expected to help.
    Retriable {
        /// Short machine-readable reason, e.g. "timeout"
        reason: String,
    },

    /// Failure that retrying next tick is not expected to fix
    /// (malformed body, non-2xx response, connection-level error).
    NonRetriable {
        /// Description of the failure
        reason: String,
    },
}

impl FetchOutcome {
    /// Label used in structured log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::RateLimited { .. } => "rate_limited",
            Self::Retriable { .. } => "retriable_error",
            Self::NonRetriable { .. } => "non_retriable_error",
        }
    }

    /// Whether this outcome carries a publishable snapshot.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(
            FetchOutcome::RateLimited {
                retry_after: Duration::from_secs(60)
            }
            .label(),
            "rate_limited"
        );
        assert_eq!(
            FetchOutcome::Retriable {
                reason: "timeout".to_string()
            }
            .label(),
            "retriable_error"
        );
        assert_eq!(
            FetchOutcome::NonRetriable {
                reason: "invalid_response".to_string()
            }
            .label(),
            "non_retriable_error"
        );
    }

    #[test]
    fn test_only_success_is_success() {
        assert!(!FetchOutcome::Retriable {
            reason: "timeout".to_string()
        }
        .is_success());
    }
}
