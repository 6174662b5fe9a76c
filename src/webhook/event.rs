//! Feed-item notification payload and source classification.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::debug;

use super::error::ParseError;
use crate::money::Amount;

/// Transaction direction as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    In,
    Out,
}

/// Closed set of sources the pipeline acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSource {
    CardSpend,
    FasterPaymentIn,
    NostroDeposit,
    DirectCredit,
    /// Anything else, keeping the raw tag for logs
    Other(String),
}

impl EventSource {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "MASTER_CARD" => Self::CardSpend,
            "FASTER_PAYMENTS_IN" => Self::FasterPaymentIn,
            "NOSTRO_DEPOSIT" => Self::NostroDeposit,
            "DIRECT_CREDIT" => Self::DirectCredit,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::CardSpend => "MASTER_CARD",
            Self::FasterPaymentIn => "FASTER_PAYMENTS_IN",
            Self::NostroDeposit => "NOSTRO_DEPOSIT",
            Self::DirectCredit => "DIRECT_CREDIT",
            Self::Other(tag) => tag,
        }
    }

    /// Inbound payment classes eligible for a threshold sweep.
    pub fn is_sweepable(&self) -> bool {
        matches!(
            self,
            Self::FasterPaymentIn | Self::NostroDeposit | Self::DirectCredit
        )
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One parsed delivery. Lives for the duration of a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEvent {
    /// Unique per delivery attempt; empty when the payload omitted it
    pub event_uid: String,
    pub feed_item_uid: Option<String>,
    pub source: EventSource,
    pub direction: Direction,
    /// Non-negative magnitude in minor units
    pub amount: Amount,
    /// Informational only; `None` when absent or unreadable
    pub transaction_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebhookPayload {
    #[serde(default)]
    webhook_event_uid: String,
    content: FeedItem,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedItem {
    #[serde(default)]
    feed_item_uid: Option<String>,
    source: String,
    direction: Direction,
    amount: Amount,
    #[serde(default)]
    transaction_time: Option<Value>,
}

/// Timestamps never fail a delivery. RFC 3339 first, then a bare
/// `YYYY-MM-DD HH:MM:SS` taken as UTC.
fn parse_timestamp(raw: &Value) -> Option<DateTime<Utc>> {
    let text = raw.as_str()?;
    let parsed = DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|t| t.and_utc())
        });
    if parsed.is_none() {
        debug!(transaction_time = %raw, "Unreadable transaction time ignored");
    }
    parsed
}

/// Parse a raw delivery body into a typed event.
///
/// Unknown sources are not an error; they classify as [`EventSource::Other`].
pub fn classify(payload: &[u8]) -> Result<NotificationEvent, ParseError> {
    let payload: WebhookPayload = serde_json::from_slice(payload)?;
    let item = payload.content;

    if item.amount.minor_units < 0 {
        return Err(ParseError::NegativeAmount(item.amount.minor_units));
    }

    Ok(NotificationEvent {
        event_uid: payload.webhook_event_uid,
        feed_item_uid: item.feed_item_uid,
        source: EventSource::from_tag(&item.source),
        direction: item.direction,
        amount: item.amount,
        transaction_time: item.transaction_time.as_ref().and_then(parse_timestamp),
    })
}
