#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use rsa::pkcs8::EncodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha2::{Digest, Sha512};

use starling_sweep::bank::{BankApi, BankError, TransferReceipt};
use starling_sweep::config::{AuthFailureResponse, PolicyConfig};
use starling_sweep::dedup::{IdempotencyGuard, MemoryCache};
use starling_sweep::gateway::{AppState, build_router};
use starling_sweep::money::Amount;
use starling_sweep::pipeline::WebhookProcessor;
use starling_sweep::policy::PolicyEngine;
use starling_sweep::transfer::TransferDispatcher;
use starling_sweep::webhook::{SIGNATURE_HEADER, SignatureVerifier};

pub const ACCOUNT: &str = "acc-1";
pub const ROUND_UP_GOAL: &str = "goal-round";
pub const SWEEP_GOAL: &str = "goal-sweep";

/// In-process bank recording every transfer it is asked to make.
pub struct FakeBank {
    balance: i64,
    balance_calls: AtomicUsize,
    transfers: Mutex<Vec<(String, Amount)>>,
}

impl FakeBank {
    pub fn new(balance: i64) -> Self {
        Self {
            balance,
            balance_calls: AtomicUsize::new(0),
            transfers: Mutex::new(Vec::new()),
        }
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    /// `(goal_uid, amount)` per transfer, in call order
    pub fn transfers(&self) -> Vec<(String, Amount)> {
        self.transfers.lock().unwrap().clone()
    }
}

#[async_trait]
impl BankApi for FakeBank {
    async fn effective_balance(&self, _account_uid: &str) -> Result<Amount, BankError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Amount::new("GBP", self.balance))
    }

    async fn transfer_to_goal(
        &self,
        account_uid: &str,
        goal_uid: &str,
        amount: &Amount,
    ) -> Result<TransferReceipt, BankError> {
        assert_eq!(account_uid, ACCOUNT);
        let mut transfers = self.transfers.lock().unwrap();
        transfers.push((goal_uid.to_string(), amount.clone()));
        Ok(TransferReceipt {
            transfer_uid: format!("fake-{}", transfers.len()),
        })
    }
}

pub fn policy() -> PolicyConfig {
    PolicyConfig {
        round_up_goal: Some(ROUND_UP_GOAL.to_string()),
        sweep_goal: Some(SWEEP_GOAL.to_string()),
        sweep_threshold: 100000,
    }
}

pub fn router(
    bank: Arc<FakeBank>,
    verifier: SignatureVerifier,
    on_auth_failure: AuthFailureResponse,
) -> Router {
    let guard = IdempotencyGuard::new(Arc::new(MemoryCache::new()), "last_processed_event_uid");
    let processor = WebhookProcessor::new(
        verifier,
        guard,
        PolicyEngine::new(policy(), ACCOUNT, bank.clone()),
        TransferDispatcher::new(bank, ACCOUNT),
    );
    build_router(Arc::new(AppState::new(Arc::new(processor), on_auth_failure)))
}

pub fn feed_item(uid: &str, source: &str, direction: &str, minor_units: i64) -> String {
    serde_json::json!({
        "webhookEventUid": uid,
        "eventTimestamp": "2024-03-01T10:15:00.000Z",
        "accountHolderUid": "holder-1",
        "content": {
            "feedItemUid": format!("feed-{}", uid),
            "source": source,
            "direction": direction,
            "amount": { "currency": "GBP", "minorUnits": minor_units },
            "transactionTime": "2024-03-01T10:14:59.000Z"
        }
    })
    .to_string()
}

pub fn post(uri: &str, body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(sig) = signature {
        builder = builder.header(SIGNATURE_HEADER, sig);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Test signing key pair; the public half as base64 DER
pub fn rsa_keys() -> (RsaPrivateKey, String) {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    let private = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
    let der = private.to_public_key().to_public_key_der().unwrap();
    (private, STANDARD.encode(der.as_bytes()))
}

pub fn rsa_sign(key: &RsaPrivateKey, body: &[u8]) -> String {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    let digest = Sha512::digest(body);
    let signature = key.sign(Pkcs1v15Sign::new::<Sha512>(), &digest).unwrap();
    STANDARD.encode(signature)
}
