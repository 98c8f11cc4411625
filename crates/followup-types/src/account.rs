use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// A tenant account, one per Follow Up Boss installation.
///
/// Holds the CRM OAuth token pair and the Stripe subscription state that
/// gates access to the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_id: i64,
    /// The account id reported by the FUB embed context. Unique per tenant.
    pub fub_account_id: String,
    pub subscription_status: SubscriptionStatus,
    #[serde(skip_serializing, default)]
    pub fub_access_token: Option<String>,
    #[serde(skip_serializing, default)]
    pub fub_refresh_token: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subscription lifecycle states, mirroring Stripe's subscription statuses.
///
/// Maps to the CHECK constraint in the SQLite schema. New accounts start
/// in `Trialing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trialing,
    Active,
    PastDue,
    Cancelled,
    Incomplete,
    Unpaid,
}

impl SubscriptionStatus {
    /// Whether this status grants access to chat and note writing.
    ///
    /// Trials count as entitled; everything past-due or ended does not.
    pub fn is_entitled(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionStatus::Trialing => write!(f, "trialing"),
            SubscriptionStatus::Active => write!(f, "active"),
            SubscriptionStatus::PastDue => write!(f, "past_due"),
            SubscriptionStatus::Cancelled => write!(f, "cancelled"),
            SubscriptionStatus::Incomplete => write!(f, "incomplete"),
            SubscriptionStatus::Unpaid => write!(f, "unpaid"),
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trialing" => Ok(SubscriptionStatus::Trialing),
            "active" => Ok(SubscriptionStatus::Active),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "cancelled" => Ok(SubscriptionStatus::Cancelled),
            "incomplete" => Ok(SubscriptionStatus::Incomplete),
            "unpaid" => Ok(SubscriptionStatus::Unpaid),
            other => Err(format!("invalid subscription status: '{other}'")),
        }
    }
}

impl Default for SubscriptionStatus {
    fn default() -> Self {
        SubscriptionStatus::Trialing
    }
}
