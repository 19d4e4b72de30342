//! Single-resolution tracking of one submitted extrinsic.
//!
//! [`track`] consumes the notification stream for one submission and settles
//! exactly once: it resolves with the first success-classified notification
//! or rejects with a [`SubmissionError`], unsubscribing before either. The
//! push-based subscription is wrapped in an ordinary future rather than
//! shared mutable state, so only the first terminal transition can ever take
//! effect; duplicate terminal deliveries are simply never polled.

use crate::error::{SubmissionError, TrackResult};
use crate::registry::ErrorRegistry;
use crate::status::{classify, DispatchFailure, TxLifecycleStatus, TxNotification, TxVerdict};
use futures::{Stream, StreamExt};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for tracking one submission.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Maximum time to wait for a terminal notification.
    pub timeout: Duration,
    /// Label identifying the operation in failure messages
    /// (e.g. `TaskMarket::submit_result`).
    pub label: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            label: None,
        }
    }
}

impl TrackerConfig {
    /// Set the operation label embedded in failure messages.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the terminal-notification timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A live subscription to lifecycle notifications for one submission.
///
/// Bundles the notification stream with its unsubscribe callback. The
/// callback is owned exclusively by the subscription and invoked at most
/// once: on the first terminal notification, on timeout, or on drop.
pub struct Subscription<S> {
    stream: S,
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl<S> Subscription<S> {
    /// Create a subscription from a stream and its unsubscribe callback.
    pub fn new(stream: S, unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            stream,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Create a subscription whose teardown is dropping the stream itself.
    pub fn without_unsubscribe(stream: S) -> Self {
        Self {
            stream,
            unsubscribe: None,
        }
    }

    fn unsubscribe(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl<S> Drop for Subscription<S> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Track one submission to its terminal outcome.
///
/// Suspends until the stream delivers a terminal notification, then
/// unsubscribes and settles. Returns the terminal notification on success
/// (callers extract emitted events and the including block hash from it).
/// Rejects with [`SubmissionError::Timeout`] if no terminal notification
/// arrives within `config.timeout`.
pub async fn track<S, R>(
    mut subscription: Subscription<S>,
    registry: &R,
    config: &TrackerConfig,
) -> TrackResult<TxNotification>
where
    S: Stream<Item = TrackResult<TxNotification>> + Unpin,
    R: ErrorRegistry,
{
    match tokio::time::timeout(config.timeout, drive(&mut subscription, registry, config)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            subscription.unsubscribe();
            let timeout_ms = config.timeout.as_millis() as u64;
            warn!(timeout_ms, "No terminal status before deadline");
            Err(SubmissionError::Timeout { timeout_ms })
        }
    }
}

/// Consume notifications until the first terminal verdict.
async fn drive<S, R>(
    subscription: &mut Subscription<S>,
    registry: &R,
    config: &TrackerConfig,
) -> TrackResult<TxNotification>
where
    S: Stream<Item = TrackResult<TxNotification>> + Unpin,
    R: ErrorRegistry,
{
    loop {
        let Some(item) = subscription.stream.next().await else {
            subscription.unsubscribe();
            return Err(SubmissionError::SubscriptionClosed);
        };

        let notification = match item {
            Ok(notification) => notification,
            Err(err) => {
                subscription.unsubscribe();
                return Err(err);
            }
        };

        match classify(&notification) {
            TxVerdict::NotReady => {
                debug!(status = %notification.status, "Submission still pending");
            }
            TxVerdict::Success => {
                subscription.unsubscribe();
                info!(status = %notification.status, "Submission succeeded");
                return Ok(notification);
            }
            TxVerdict::Fail => {
                subscription.unsubscribe();
                let message =
                    failure_message(&notification, registry, config.label.as_deref());
                warn!(status = %notification.status, message = %message, "Submission failed");
                return Err(SubmissionError::Dispatch {
                    message,
                    notification: Box::new(notification),
                });
            }
        }
    }
}

/// Derive the failure message for a terminal-failed notification.
///
/// Module errors resolve against the registry to `section.name: docs`;
/// opaque dispatch errors use their stringified descriptor; an aborted
/// status falls back to the transport reason; anything else is an included
/// extrinsic with neither marker event, reported as `Unknown error`.
fn failure_message<R: ErrorRegistry>(
    notification: &TxNotification,
    registry: &R,
    label: Option<&str>,
) -> String {
    let reason = failure_reason(notification, registry);
    match label {
        Some(label) => format!("{label}: {reason}"),
        None => reason,
    }
}

fn failure_reason<R: ErrorRegistry>(notification: &TxNotification, registry: &R) -> String {
    if let Some(failure) = notification.dispatch_failure() {
        return match failure {
            DispatchFailure::Module {
                pallet_index,
                error_index,
            } => registry
                .resolve(*pallet_index, *error_index)
                .map(|details| details.human_message())
                .unwrap_or_else(|| format!("module error {pallet_index}/{error_index}")),
            DispatchFailure::Other(descriptor) => descriptor.clone(),
        };
    }

    if let TxLifecycleStatus::Aborted { reason } = &notification.status {
        return reason.clone();
    }

    "Unknown error".to_string()
}
