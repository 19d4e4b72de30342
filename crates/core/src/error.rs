//! Error types for submission tracking.

use crate::status::TxNotification;
use thiserror::Error;

/// Terminal failure of one tracked submission.
///
/// A pending submission is never surfaced as an error; it is represented by
/// continued waiting inside the tracker.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The extrinsic reached a terminal failure state on chain.
    ///
    /// Carries the originating notification so callers can inspect the
    /// emitted events alongside the derived message.
    #[error("dispatch failed: {message}")]
    Dispatch {
        /// Human-readable failure reason, label-prefixed when configured.
        message: String,
        /// The notification that triggered the rejection.
        notification: Box<TxNotification>,
    },

    /// No terminal notification arrived within the configured bound.
    #[error("submission timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The underlying transport reported an error on the subscription.
    #[error("subscription error: {0}")]
    Subscription(String),

    /// The subscription ended before a terminal status was observed.
    #[error("subscription closed before a terminal status was observed")]
    SubscriptionClosed,
}

/// Result type alias for tracking operations.
pub type TrackResult<T> = Result<T, SubmissionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::TxLifecycleStatus;

    #[test]
    fn test_error_display() {
        let err = SubmissionError::Timeout { timeout_ms: 60_000 };
        assert!(err.to_string().contains("60000"));

        let err = SubmissionError::Dispatch {
            message: "Balances.InsufficientBalance: Balance too low".to_string(),
            notification: Box::new(TxNotification::new(
                TxLifecycleStatus::InBlock {
                    block_hash: [0u8; 32],
                },
                Vec::new(),
            )),
        };
        assert!(err.to_string().contains("Balances.InsufficientBalance"));
    }

    #[test]
    fn test_dispatch_error_keeps_notification() {
        let notification = TxNotification::new(TxLifecycleStatus::Broadcast, Vec::new());
        let err = SubmissionError::Dispatch {
            message: "Unknown error".to_string(),
            notification: Box::new(notification.clone()),
        };

        match err {
            SubmissionError::Dispatch {
                notification: kept, ..
            } => assert_eq!(*kept, notification),
            _ => panic!("Expected Dispatch"),
        }
    }
}
