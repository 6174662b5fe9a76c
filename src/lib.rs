//! Starling Sweep - savings automation for Starling Bank webhooks
//!
//! Receives feed-item notifications, authenticates them, drops redeliveries
//! and moves money into savings goals: card spends are rounded up, and large
//! inbound payments trigger a sweep of the balance that was there before.
//!
//! # Modules
//!
//! - [`webhook`] - Signature verification and payload classification
//! - [`dedup`] - Idempotency guard over an external key-value cache
//! - [`policy`] - Round-up and threshold sweep decisions
//! - [`transfer`] - Dispatches decided transfers to the bank
//! - [`bank`] - Starling Bank REST client
//! - [`pipeline`] - Runs one delivery through every stage
//! - [`gateway`] - Axum HTTP surface
//! - [`money`] - Minor-unit amounts
//! - [`config`] - YAML + environment configuration

pub mod bank;
pub mod config;
pub mod dedup;
pub mod gateway;
pub mod logging;
pub mod money;
pub mod pipeline;
pub mod policy;
pub mod transfer;
pub mod webhook;

// Convenient re-exports at crate root
pub use bank::{BankApi, BankError, StarlingClient, TransferReceipt};
pub use config::AppConfig;
pub use dedup::{CacheError, Delivery, IdempotencyGuard, KvCache, MemoryCache, RedisCache};
pub use gateway::{AppState, build_router, run_server};
pub use money::Amount;
pub use pipeline::{Outcome, ProcessError, WebhookProcessor};
pub use policy::{Decision, NoOpReason, PlanKind, PolicyEngine, TransferPlan};
pub use transfer::{TransferDispatcher, TransferError};
pub use webhook::{
    EventSource, NotificationEvent, ParseError, SignatureError, SignatureVerifier, classify,
};
