//! Offline-resilient synchronization core
//!
//! Reads go through [`fetcher::DataFetcher`] and the TTL cache; writes go through
//! [`SyncEngine::submit`], which falls back to the [`queue::RetryQueue`] whenever the
//! API cannot take them yet. Connectivity transitions drive queue flushes.

pub mod engine;
pub mod fetcher;
pub mod network;
pub mod notify;
pub mod queue;

pub use engine::{MutationOutcome, SyncEngine};
pub use network::{Connectivity, probe};
pub use notify::ConsoleNotifier;
pub use queue::{FlushReport, MAX_RETRY_ATTEMPTS, MutationKind, MutationResult, RetryItem};
