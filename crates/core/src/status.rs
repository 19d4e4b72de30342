//! Lifecycle status types and the status classifier.
//!
//! One submitted extrinsic produces a stream of lifecycle notifications.
//! [`classify`] reduces a single notification to a verdict without any
//! history: the verdict is re-derived from each notification independently,
//! so duplicate or out-of-order deliveries before the terminal one are
//! harmless.

use std::fmt;

/// Lifecycle status of one submitted extrinsic, ordered by finality strength.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxLifecycleStatus {
    /// Accepted by the node but not yet gossiped.
    Ready,
    /// Gossiped to peers, not yet included in a block.
    Broadcast,
    /// Included in a (not yet finalized) block.
    InBlock {
        /// Hash of the including block.
        block_hash: [u8; 32],
    },
    /// Included in a finalized block.
    Finalized {
        /// Hash of the finalized block.
        block_hash: [u8; 32],
    },
    /// The node stopped tracking the extrinsic (dropped, invalid, usurped,
    /// or a transport-reported error).
    Aborted {
        /// Reason reported by the node.
        reason: String,
    },
}

impl fmt::Display for TxLifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxLifecycleStatus::Ready => write!(f, "Ready"),
            TxLifecycleStatus::Broadcast => write!(f, "Broadcast"),
            TxLifecycleStatus::InBlock { block_hash } => {
                write!(f, "InBlock(0x{})", hex::encode(block_hash))
            }
            TxLifecycleStatus::Finalized { block_hash } => {
                write!(f, "Finalized(0x{})", hex::encode(block_hash))
            }
            TxLifecycleStatus::Aborted { reason } => write!(f, "Aborted({reason})"),
        }
    }
}

/// Why a dispatched extrinsic failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchFailure {
    /// Error raised by a specific pallet; resolvable against chain metadata.
    Module {
        /// Index of the pallet that raised the error.
        pallet_index: u8,
        /// Index of the error within the pallet.
        error_index: u8,
    },
    /// Opaque non-module error, already stringified (e.g. `BadOrigin`).
    Other(String),
}

/// A runtime event attached to a lifecycle notification, decoded at the
/// transport boundary into the closed set the classifier cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    /// `System.ExtrinsicSuccess`: the extrinsic executed successfully.
    ExtrinsicSuccess,
    /// `System.ExtrinsicFailed`: execution failed with the given error.
    ExtrinsicFailed(DispatchFailure),
    /// Any other runtime event.
    Other {
        /// Pallet that emitted the event.
        pallet: String,
        /// Event variant name.
        variant: String,
    },
}

/// One asynchronous update delivered for a submitted extrinsic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxNotification {
    /// Lifecycle status at the time of this update.
    pub status: TxLifecycleStatus,
    /// Events emitted for the extrinsic (empty until block inclusion).
    pub events: Vec<ChainEvent>,
}

impl TxNotification {
    /// Create a notification from a status and its emitted events.
    pub fn new(status: TxLifecycleStatus, events: Vec<ChainEvent>) -> Self {
        Self { status, events }
    }

    /// First dispatch failure among the emitted events, if any.
    pub fn dispatch_failure(&self) -> Option<&DispatchFailure> {
        self.events.iter().find_map(|event| match event {
            ChainEvent::ExtrinsicFailed(failure) => Some(failure),
            _ => None,
        })
    }

    fn has_success_marker(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, ChainEvent::ExtrinsicSuccess))
    }
}

/// Verdict produced by [`classify`] for one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxVerdict {
    /// Not yet included in a block; keep waiting.
    NotReady,
    /// Terminal failure.
    Fail,
    /// Terminal success.
    Success,
}

/// Classify one lifecycle notification.
///
/// Pure function of the notification alone. An included notification with
/// neither marker event classifies as [`TxVerdict::Fail`] rather than
/// pending, so a tracker driven by this verdict can never hang on an
/// unclassified outcome. The same conservative default applies to statuses
/// outside the ready/broadcast/included set.
pub fn classify(notification: &TxNotification) -> TxVerdict {
    match &notification.status {
        TxLifecycleStatus::Ready | TxLifecycleStatus::Broadcast => TxVerdict::NotReady,
        TxLifecycleStatus::InBlock { .. } | TxLifecycleStatus::Finalized { .. } => {
            if notification.dispatch_failure().is_some() {
                TxVerdict::Fail
            } else if notification.has_success_marker() {
                TxVerdict::Success
            } else {
                TxVerdict::Fail
            }
        }
        TxLifecycleStatus::Aborted { .. } => TxVerdict::Fail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn included(events: Vec<ChainEvent>) -> TxNotification {
        TxNotification::new(
            TxLifecycleStatus::InBlock {
                block_hash: [1u8; 32],
            },
            events,
        )
    }

    #[test]
    fn test_pending_statuses_are_not_ready() {
        let ready = TxNotification::new(TxLifecycleStatus::Ready, Vec::new());
        let broadcast = TxNotification::new(TxLifecycleStatus::Broadcast, Vec::new());

        assert_eq!(classify(&ready), TxVerdict::NotReady);
        assert_eq!(classify(&broadcast), TxVerdict::NotReady);
    }

    #[test]
    fn test_included_with_success_marker() {
        let notification = included(vec![ChainEvent::ExtrinsicSuccess]);
        assert_eq!(classify(&notification), TxVerdict::Success);
    }

    #[test]
    fn test_included_with_failure_marker() {
        let notification = included(vec![ChainEvent::ExtrinsicFailed(DispatchFailure::Module {
            pallet_index: 3,
            error_index: 7,
        })]);
        assert_eq!(classify(&notification), TxVerdict::Fail);
    }

    #[test]
    fn test_failure_marker_wins_over_success_marker() {
        let notification = included(vec![
            ChainEvent::ExtrinsicSuccess,
            ChainEvent::ExtrinsicFailed(DispatchFailure::Other("BadOrigin".to_string())),
        ]);
        assert_eq!(classify(&notification), TxVerdict::Fail);
    }

    #[test]
    fn test_included_without_markers_fails_conservatively() {
        let notification = included(vec![ChainEvent::Other {
            pallet: "Balances".to_string(),
            variant: "Withdraw".to_string(),
        }]);
        assert_eq!(classify(&notification), TxVerdict::Fail);
    }

    #[test]
    fn test_included_never_classifies_as_not_ready() {
        let combos: Vec<Vec<ChainEvent>> = vec![
            Vec::new(),
            vec![ChainEvent::ExtrinsicSuccess],
            vec![ChainEvent::ExtrinsicFailed(DispatchFailure::Other(
                "CannotLookup".to_string(),
            ))],
        ];

        for events in combos {
            let in_block = included(events.clone());
            let finalized = TxNotification::new(
                TxLifecycleStatus::Finalized {
                    block_hash: [2u8; 32],
                },
                events,
            );
            assert_ne!(classify(&in_block), TxVerdict::NotReady);
            assert_ne!(classify(&finalized), TxVerdict::NotReady);
        }
    }

    #[test]
    fn test_aborted_fails() {
        let notification = TxNotification::new(
            TxLifecycleStatus::Aborted {
                reason: "dropped: pool full".to_string(),
            },
            Vec::new(),
        );
        assert_eq!(classify(&notification), TxVerdict::Fail);
    }

    #[test]
    fn test_finalized_with_success_marker() {
        let notification = TxNotification::new(
            TxLifecycleStatus::Finalized {
                block_hash: [9u8; 32],
            },
            vec![ChainEvent::ExtrinsicSuccess],
        );
        assert_eq!(classify(&notification), TxVerdict::Success);
    }

    #[test]
    fn test_status_display() {
        let status = TxLifecycleStatus::InBlock {
            block_hash: [0xab; 32],
        };
        let rendered = status.to_string();
        assert!(rendered.starts_with("InBlock(0xabab"));

        assert_eq!(TxLifecycleStatus::Ready.to_string(), "Ready");
    }
}
