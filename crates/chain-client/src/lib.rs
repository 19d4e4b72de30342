//! Chain client for submitting extrinsics and tracking them to a terminal
//! outcome.
//!
//! Wraps a subxt [`OnlineClient`]: builds a dynamic call, signs and submits
//! it, adapts the node's transaction progress subscription into the
//! `txwatch-core` notification stream, and resolves module dispatch errors
//! against live chain metadata.

use std::time::Duration;

use futures::{stream, Stream};
use parity_scale_codec::Decode;
use subxt::dynamic::{tx, Value};
use subxt::tx::{TxInBlock, TxProgress, TxStatus};
use subxt::{Metadata, OnlineClient, PolkadotConfig};
use subxt_signer::sr25519::Keypair;
use thiserror::Error;
use tracing::{debug, info};
use txwatch_core::{
    track, ChainEvent, DispatchFailure, ErrorDetails, ErrorRegistry, SubmissionError,
    Subscription, TrackResult, TrackerConfig, TxLifecycleStatus, TxNotification,
};

/// Errors returned by the chain client.
#[derive(Debug, Error)]
pub enum ChainClientError {
    /// Chain connection failed.
    #[error("chain connection failed: {0}")]
    Connection(String),

    /// Subxt error during call construction or submission.
    #[error("subxt error: {0}")]
    Subxt(#[from] subxt::Error),

    /// The submission reached a terminal failure or could not be tracked.
    #[error("submission failed: {0}")]
    Submission(#[from] SubmissionError),
}

/// Result type alias for chain client operations.
pub type ClientResult<T> = Result<T, ChainClientError>;

/// Configuration for the chain client.
#[derive(Debug, Clone)]
pub struct ChainClientConfig {
    /// Chain RPC endpoint.
    pub chain_rpc_url: String,
    /// Terminal-notification timeout in milliseconds.
    pub tx_timeout_ms: u64,
}

impl Default for ChainClientConfig {
    fn default() -> Self {
        Self {
            chain_rpc_url: "ws://127.0.0.1:9944".to_string(),
            tx_timeout_ms: 60_000,
        }
    }
}

/// Submits signed extrinsics and tracks each one to a terminal outcome.
///
/// The connection is established lazily on first use and can be dropped and
/// re-established with [`ChainClient::disconnect`] / [`ChainClient::connect`].
pub struct ChainClient {
    config: ChainClientConfig,
    client: Option<OnlineClient<PolkadotConfig>>,
    signer: Keypair,
}

impl ChainClient {
    /// Create a new chain client.
    ///
    /// # Arguments
    /// * `config` - Client configuration
    /// * `signer` - Sr25519 keypair for signing transactions
    pub fn new(config: ChainClientConfig, signer: Keypair) -> Self {
        Self {
            config,
            client: None,
            signer,
        }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ChainClientConfig {
        &self.config
    }

    /// Connect to the chain.
    pub async fn connect(&mut self) -> ClientResult<()> {
        if self.client.is_some() {
            return Ok(());
        }

        info!(
            rpc_url = %self.config.chain_rpc_url,
            "Connecting to chain for submissions"
        );

        let client = OnlineClient::<PolkadotConfig>::from_url(&self.config.chain_rpc_url)
            .await
            .map_err(|e| ChainClientError::Connection(e.to_string()))?;

        self.client = Some(client);
        Ok(())
    }

    /// Disconnect from the chain.
    pub fn disconnect(&mut self) {
        self.client = None;
    }

    /// Check if connected to chain.
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Submit a call and track it to a terminal outcome.
    ///
    /// Resolves with the terminal notification (events and including block
    /// hash), or rejects with the failure reason resolved against chain
    /// metadata. Failure messages are labeled `pallet::call`.
    pub async fn submit_and_track(
        &mut self,
        pallet: &str,
        call_name: &str,
        args: Vec<Value>,
    ) -> ClientResult<TxNotification> {
        self.connect().await?;

        let client = self
            .client
            .as_ref()
            .ok_or_else(|| ChainClientError::Connection("client not connected".to_string()))?;

        debug!(pallet, call = call_name, "Submitting extrinsic");

        let call = tx(pallet, call_name, args);
        let progress = client
            .tx()
            .sign_and_submit_then_watch_default(&call, &self.signer)
            .await?;

        let registry = MetadataErrorRegistry::new(client.metadata());
        let config = TrackerConfig::default()
            .with_timeout(Duration::from_millis(self.config.tx_timeout_ms))
            .with_label(format!("{pallet}::{call_name}"));

        // Dropping the progress stream is what stops further status
        // deliveries, so the subscription needs no separate callback.
        let subscription = Subscription::without_unsubscribe(notification_stream(progress));
        let notification = track(subscription, &registry, &config).await?;

        info!(
            pallet,
            call = call_name,
            status = %notification.status,
            "Extrinsic reached terminal status"
        );
        Ok(notification)
    }
}

/// Adapt a subxt transaction progress subscription into the core
/// notification stream.
fn notification_stream(
    progress: TxProgress<PolkadotConfig, OnlineClient<PolkadotConfig>>,
) -> impl Stream<Item = TrackResult<TxNotification>> + Unpin {
    Box::pin(stream::unfold(progress, |mut progress| async move {
        let status = progress.next().await?;
        let item = match status {
            Ok(status) => adapt_status(status).await,
            Err(err) => Err(SubmissionError::Subscription(err.to_string())),
        };
        Some((item, progress))
    }))
}

async fn adapt_status(
    status: TxStatus<PolkadotConfig, OnlineClient<PolkadotConfig>>,
) -> TrackResult<TxNotification> {
    match status {
        // Validated but not yet gossiped; a retracted extrinsic goes back
        // to waiting for inclusion, so both map to the pending state.
        TxStatus::Validated | TxStatus::NoLongerInBestBlock => {
            Ok(TxNotification::new(TxLifecycleStatus::Ready, Vec::new()))
        }
        TxStatus::Broadcasted { num_peers } => {
            debug!(num_peers, "Extrinsic broadcast to peers");
            Ok(TxNotification::new(TxLifecycleStatus::Broadcast, Vec::new()))
        }
        TxStatus::InBestBlock(in_block) => adapt_included(in_block, false).await,
        TxStatus::InFinalizedBlock(in_block) => adapt_included(in_block, true).await,
        TxStatus::Error { message } => Ok(TxNotification::new(
            TxLifecycleStatus::Aborted { reason: message },
            Vec::new(),
        )),
        TxStatus::Dropped { message } => Ok(TxNotification::new(
            TxLifecycleStatus::Aborted {
                reason: format!("dropped: {message}"),
            },
            Vec::new(),
        )),
        TxStatus::Invalid { message } => Ok(TxNotification::new(
            TxLifecycleStatus::Aborted {
                reason: format!("invalid: {message}"),
            },
            Vec::new(),
        )),
    }
}

async fn adapt_included(
    in_block: TxInBlock<PolkadotConfig, OnlineClient<PolkadotConfig>>,
    finalized: bool,
) -> TrackResult<TxNotification> {
    let block_hash = hash_bytes(in_block.block_hash());

    let events = in_block
        .fetch_events()
        .await
        .map_err(|e| SubmissionError::Subscription(format!("failed to fetch events: {e}")))?;

    let mut adapted = Vec::new();
    for event in events.iter() {
        let event = event
            .map_err(|e| SubmissionError::Subscription(format!("failed to decode event: {e}")))?;
        adapted.push(adapt_event(
            event.pallet_name(),
            event.variant_name(),
            event.field_bytes(),
        ));
    }

    let status = if finalized {
        TxLifecycleStatus::Finalized { block_hash }
    } else {
        TxLifecycleStatus::InBlock { block_hash }
    };
    Ok(TxNotification::new(status, adapted))
}

/// Map one runtime event into the closed set the classifier operates on.
fn adapt_event(pallet: &str, variant: &str, field_bytes: &[u8]) -> ChainEvent {
    match (pallet, variant) {
        ("System", "ExtrinsicSuccess") => ChainEvent::ExtrinsicSuccess,
        ("System", "ExtrinsicFailed") => {
            ChainEvent::ExtrinsicFailed(decode_dispatch_failure(field_bytes))
        }
        _ => ChainEvent::Other {
            pallet: pallet.to_string(),
            variant: variant.to_string(),
        },
    }
}

/// Local mirror of the runtime `DispatchError`, decoded from the leading
/// field of `System.ExtrinsicFailed`. Trailing dispatch info is ignored.
#[derive(Debug, Clone, Decode)]
enum DispatchErrorRaw {
    Other,
    CannotLookup,
    BadOrigin,
    Module(ModuleErrorRaw),
    ConsumerRemaining,
    NoProviders,
    TooManyConsumers,
    Token(TokenErrorRaw),
    Arithmetic(ArithmeticErrorRaw),
    Transactional(TransactionalErrorRaw),
    Exhausted,
    Corruption,
    Unavailable,
    RootNotAllowed,
}

#[derive(Debug, Clone, Decode)]
struct ModuleErrorRaw {
    index: u8,
    error: [u8; 4],
}

#[derive(Debug, Clone, Decode)]
enum TokenErrorRaw {
    FundsUnavailable,
    OnlyProvider,
    BelowMinimum,
    CannotCreate,
    UnknownAsset,
    Frozen,
    Unsupported,
    CannotCreateHold,
    NotExpendable,
    Blocked,
}

#[derive(Debug, Clone, Decode)]
enum ArithmeticErrorRaw {
    Underflow,
    Overflow,
    DivisionByZero,
}

#[derive(Debug, Clone, Decode)]
enum TransactionalErrorRaw {
    LimitReached,
    NoLayer,
}

fn decode_dispatch_failure(mut bytes: &[u8]) -> DispatchFailure {
    match DispatchErrorRaw::decode(&mut bytes) {
        Ok(DispatchErrorRaw::Module(module)) => DispatchFailure::Module {
            pallet_index: module.index,
            error_index: module.error[0],
        },
        Ok(other) => DispatchFailure::Other(format!("{other:?}")),
        Err(_) => DispatchFailure::Other("Unknown error".to_string()),
    }
}

fn hash_bytes(hash: impl AsRef<[u8]>) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(hash.as_ref());
    bytes
}

/// Error registry backed by live chain metadata.
pub struct MetadataErrorRegistry {
    metadata: Metadata,
}

impl MetadataErrorRegistry {
    /// Create a registry over a metadata snapshot.
    pub fn new(metadata: Metadata) -> Self {
        Self { metadata }
    }
}

impl ErrorRegistry for MetadataErrorRegistry {
    fn resolve(&self, pallet_index: u8, error_index: u8) -> Option<ErrorDetails> {
        let pallet = self.metadata.pallet_by_index(pallet_index)?;
        let variant = pallet.error_variant_by_index(error_index)?;
        Some(ErrorDetails {
            section: pallet.name().to_string(),
            name: variant.name.clone(),
            docs: variant.docs.join(" ").trim().to_string(),
        })
    }
}
