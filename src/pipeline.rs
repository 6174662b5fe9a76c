//! Delivery pipeline
//!
//! One webhook delivery flows through the stages in a fixed order:
//!
//! ```text
//! body ──▶ verify ──▶ classify ──▶ dedup ──▶ policy ──────────▶ dispatch
//!            │           │           │          │                   │
//!            ▼           ▼           ▼          ▼                   ▼
//!         Signature    Parse     Cache/Dup   Ignored/NoOp/Balance  Transfer
//! ```
//!
//! The event uid lives inside the payload, so parsing has to happen before the
//! duplicate check. Every path ends inside the call; nothing is queued or
//! retried, and the terminal state is logged exactly once.

use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::bank::{BankApi, BankError};
use crate::config::AppConfig;
use crate::dedup::{CacheError, Delivery, IdempotencyGuard};
use crate::policy::{Decision, NoOpReason, PolicyEngine, TransferPlan};
use crate::transfer::{TransferDispatcher, TransferError};
use crate::webhook::{EventSource, ParseError, SignatureError, SignatureVerifier, classify};

/// How a delivery ended when nothing went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    EmptyBody,
    Duplicate { event_uid: String },
    Ignored { source: EventSource },
    NoOp(NoOpReason),
    /// Everything short of the transfer ran
    DryRun(TransferPlan),
    Transferred {
        plan: TransferPlan,
        transfer_uid: String,
    },
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Signature verification failed: {0}")]
    Signature(#[from] SignatureError),

    #[error("Malformed payload: {0}")]
    Parse(#[from] ParseError),

    #[error("Idempotency cache failure: {0}")]
    Cache(#[from] CacheError),

    #[error("Failed to get balance: {0}")]
    Balance(#[source] BankError),

    #[error("Failed to transfer to savings goal: {0}")]
    Transfer(#[from] TransferError),
}

impl ProcessError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ProcessError::Signature(_))
    }
}

pub struct WebhookProcessor {
    verifier: SignatureVerifier,
    guard: IdempotencyGuard,
    policy: PolicyEngine,
    dispatcher: TransferDispatcher,
}

impl WebhookProcessor {
    pub fn new(
        verifier: SignatureVerifier,
        guard: IdempotencyGuard,
        policy: PolicyEngine,
        dispatcher: TransferDispatcher,
    ) -> Self {
        Self {
            verifier,
            guard,
            policy,
            dispatcher,
        }
    }

    /// Wire the stages from config around an injected bank client.
    ///
    /// A public key that does not parse and an invalid cache URL fail here;
    /// an unreachable cache does not, it fails per delivery.
    pub fn from_config(config: &AppConfig, bank: Arc<dyn BankApi>) -> Result<Self, ProcessError> {
        let verifier = SignatureVerifier::from_config(&config.signature)?;
        let guard = IdempotencyGuard::from_config(&config.cache)?;
        let policy = PolicyEngine::new(
            config.policy.clone(),
            config.bank.account_uid.clone(),
            bank.clone(),
        );
        let dispatcher = TransferDispatcher::new(bank, config.bank.account_uid.clone());
        Ok(Self::new(verifier, guard, policy, dispatcher))
    }

    pub fn signature_bypassed(&self) -> bool {
        self.verifier.is_bypassed()
    }

    /// Process one delivery and log how it ended.
    pub async fn process(
        &self,
        body: &[u8],
        signature: Option<&str>,
        dry_run: bool,
    ) -> Result<Outcome, ProcessError> {
        let result = self.run(body, signature, dry_run).await;
        match &result {
            Ok(outcome) => log_outcome(outcome),
            Err(e) => log_failure(e),
        }
        result
    }

    async fn run(
        &self,
        body: &[u8],
        signature: Option<&str>,
        dry_run: bool,
    ) -> Result<Outcome, ProcessError> {
        if body.is_empty() {
            return Ok(Outcome::EmptyBody);
        }

        if self.verifier.is_bypassed() {
            warn!("[webhook] Signature verification bypassed for this delivery");
        } else {
            self.verifier.verify(body, signature)?;
        }

        let event = classify(body)?;
        info!(
            event_uid = %event.event_uid,
            source = %event.source,
            direction = ?event.direction,
            amount = %event.amount.display(),
            transaction_time = ?event.transaction_time,
            "[webhook] Delivery received"
        );

        if self.guard.check_and_record(&event.event_uid).await? == Delivery::Duplicate {
            return Ok(Outcome::Duplicate {
                event_uid: event.event_uid,
            });
        }

        let plan = match self.policy.decide(&event).await.map_err(ProcessError::Balance)? {
            Decision::Ignore => {
                return Ok(Outcome::Ignored {
                    source: event.source,
                });
            }
            Decision::Skip(reason) => return Ok(Outcome::NoOp(reason)),
            Decision::Transfer(plan) => plan,
        };

        if dry_run {
            return Ok(Outcome::DryRun(plan));
        }

        let receipt = self.dispatcher.transfer(&plan).await?;
        Ok(Outcome::Transferred {
            plan,
            transfer_uid: receipt.transfer_uid,
        })
    }
}

fn log_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::EmptyBody => info!("[webhook] Empty body, pretending all is OK"),
        Outcome::Duplicate { event_uid } => {
            info!(event_uid = %event_uid, "[webhook] Duplicate delivery, ignoring")
        }
        Outcome::Ignored { source } => {
            info!(source = %source, "[webhook] Unsupported source, ignoring")
        }
        Outcome::NoOp(reason) => info!(reason = %reason, "[webhook] Nothing to do"),
        Outcome::DryRun(plan) => info!(
            kind = %plan.kind,
            goal_uid = %plan.goal_uid,
            amount = %plan.amount.display(),
            "[webhook] Dry run, would transfer"
        ),
        Outcome::Transferred { plan, transfer_uid } => info!(
            kind = %plan.kind,
            goal_uid = %plan.goal_uid,
            amount = %plan.amount.display(),
            transfer_uid = %transfer_uid,
            "[webhook] Transferred to savings goal"
        ),
    }
}

fn log_failure(err: &ProcessError) {
    match err {
        ProcessError::Transfer(e) => error!(
            code = e.code(),
            provider_status = ?e.provider_status(),
            "[webhook] {}",
            err
        ),
        ProcessError::Balance(e) => {
            error!(provider_status = ?e.status(), "[webhook] {}", err)
        }
        _ => error!("[webhook] {}", err),
    }
}
