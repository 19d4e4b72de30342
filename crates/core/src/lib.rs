//! # Extrinsic Submission Tracking
//!
//! Client-side contract for "submit an operation, observe its outcome
//! exactly once": a pure status classifier plus a single-resolution tracker
//! over the lifecycle notification stream of one submitted extrinsic.
//!
//! ## Architecture
//!
//! ```text
//! submit-and-subscribe → Subscription → track() → classify() per notification
//!                                          │
//!                                          └─ settles once, unsubscribes first
//! ```
//!
//! ## Components
//!
//! - [`classify`]: maps one notification to `NotReady` / `Fail` / `Success`
//! - [`track`]: drives a [`Subscription`] to its terminal outcome
//! - [`ErrorRegistry`]: injected metadata lookup for module dispatch errors
//!
//! Transport adapters live outside this crate; see `txwatch-chain-client`
//! for the subxt-backed one.
//!
//! ## Example
//!
//! ```rust,ignore
//! use txwatch_core::{track, Subscription, TrackerConfig, StaticErrorRegistry};
//!
//! let subscription = Subscription::new(notifications, move || unsubscribe());
//! let registry = StaticErrorRegistry::new();
//! let config = TrackerConfig::default().with_label("Balances::transfer");
//!
//! let terminal = track(subscription, &registry, &config).await?;
//! println!("included: {}", terminal.status);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod registry;
pub mod status;
pub mod tracker;

// Re-export main types
pub use error::{SubmissionError, TrackResult};
pub use registry::{ErrorDetails, ErrorRegistry, StaticErrorRegistry};
pub use status::{
    classify, ChainEvent, DispatchFailure, TxLifecycleStatus, TxNotification, TxVerdict,
};
pub use tracker::{track, Subscription, TrackerConfig};
