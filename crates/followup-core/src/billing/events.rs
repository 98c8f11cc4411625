//! Pure classification of Stripe webhook events.
//!
//! Turns a verified event payload into the account update it implies.
//! Everything here is side-effect free; `BillingService` applies the result.

use followup_types::account::SubscriptionStatus;
use followup_types::error::BillingError;

/// The account change a Stripe event calls for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingUpdate {
    /// First successful checkout: link the Stripe customer and activate.
    CheckoutCompleted {
        fub_account_id: String,
        stripe_customer_id: String,
    },
    /// Subscription lifecycle or payment outcome for a known customer.
    StatusChanged {
        stripe_customer_id: String,
        status: SubscriptionStatus,
    },
    /// Event type we do not act on. Acknowledged and dropped.
    Ignored,
}

/// Map a Stripe subscription status string onto ours.
///
/// Unknown statuses are treated as cancelled so a tenant never keeps
/// access on a state this code predates.
pub fn map_stripe_status(status: &str) -> SubscriptionStatus {
    match status {
        "active" => SubscriptionStatus::Active,
        "trialing" => SubscriptionStatus::Trialing,
        "past_due" => SubscriptionStatus::PastDue,
        "incomplete" => SubscriptionStatus::Incomplete,
        "unpaid" => SubscriptionStatus::Unpaid,
        "canceled" => SubscriptionStatus::Cancelled,
        _ => SubscriptionStatus::Cancelled,
    }
}

/// Classify a (signature-verified) Stripe event envelope.
pub fn classify_event(event: &serde_json::Value) -> Result<BillingUpdate, BillingError> {
    let event_type = event
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| BillingError::MalformedPayload("missing event type".to_string()))?;

    let object = event
        .pointer("/data/object")
        .ok_or_else(|| BillingError::MalformedPayload("missing data.object".to_string()))?;

    let update = match event_type {
        "checkout.session.completed" => {
            let fub_account_id = object
                .pointer("/metadata/fub_account_id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    BillingError::MalformedPayload(
                        "checkout session missing metadata.fub_account_id".to_string(),
                    )
                })?;
            let customer = require_customer(object)?;
            BillingUpdate::CheckoutCompleted {
                fub_account_id: fub_account_id.to_string(),
                stripe_customer_id: customer,
            }
        }
        "customer.subscription.updated" => {
            let status = object
                .get("status")
                .and_then(|v| v.as_str())
                .map(map_stripe_status)
                .ok_or_else(|| {
                    BillingError::MalformedPayload("subscription missing status".to_string())
                })?;
            BillingUpdate::StatusChanged {
                stripe_customer_id: require_customer(object)?,
                status,
            }
        }
        "customer.subscription.deleted" => BillingUpdate::StatusChanged {
            stripe_customer_id: require_customer(object)?,
            status: SubscriptionStatus::Cancelled,
        },
        "invoice.payment_succeeded" => BillingUpdate::StatusChanged {
            stripe_customer_id: require_customer(object)?,
            status: SubscriptionStatus::Active,
        },
        "invoice.payment_failed" => BillingUpdate::StatusChanged {
            stripe_customer_id: require_customer(object)?,
            status: SubscriptionStatus::PastDue,
        },
        _ => BillingUpdate::Ignored,
    };

    Ok(update)
}

fn require_customer(object: &serde_json::Value) -> Result<String, BillingError> {
    object
        .get("customer")
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| BillingError::MalformedPayload("missing customer id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_checkout_completed() {
        let event = json!({
            "type": "checkout.session.completed",
            "data": { "object": {
                "customer": "cus_123",
                "metadata": { "fub_account_id": "fub-9" }
            }}
        });
        assert_eq!(
            classify_event(&event).unwrap(),
            BillingUpdate::CheckoutCompleted {
                fub_account_id: "fub-9".to_string(),
                stripe_customer_id: "cus_123".to_string(),
            }
        );
    }

    #[test]
    fn test_checkout_without_metadata_is_malformed() {
        let event = json!({
            "type": "checkout.session.completed",
            "data": { "object": { "customer": "cus_123" } }
        });
        assert!(matches!(
            classify_event(&event),
            Err(BillingError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_subscription_updated_maps_status() {
        for (stripe, ours) in [
            ("active", SubscriptionStatus::Active),
            ("trialing", SubscriptionStatus::Trialing),
            ("past_due", SubscriptionStatus::PastDue),
            ("incomplete", SubscriptionStatus::Incomplete),
            ("unpaid", SubscriptionStatus::Unpaid),
            ("canceled", SubscriptionStatus::Cancelled),
            ("paused", SubscriptionStatus::Cancelled),
        ] {
            let event = json!({
                "type": "customer.subscription.updated",
                "data": { "object": { "customer": "cus_1", "status": stripe } }
            });
            assert_eq!(
                classify_event(&event).unwrap(),
                BillingUpdate::StatusChanged {
                    stripe_customer_id: "cus_1".to_string(),
                    status: ours,
                }
            );
        }
    }

    #[test]
    fn test_subscription_deleted_cancels() {
        let event = json!({
            "type": "customer.subscription.deleted",
            "data": { "object": { "customer": "cus_1" } }
        });
        assert_eq!(
            classify_event(&event).unwrap(),
            BillingUpdate::StatusChanged {
                stripe_customer_id: "cus_1".to_string(),
                status: SubscriptionStatus::Cancelled,
            }
        );
    }

    #[test]
    fn test_invoice_outcomes() {
        let paid = json!({
            "type": "invoice.payment_succeeded",
            "data": { "object": { "customer": "cus_1" } }
        });
        let failed = json!({
            "type": "invoice.payment_failed",
            "data": { "object": { "customer": "cus_1" } }
        });
        assert!(matches!(
            classify_event(&paid).unwrap(),
            BillingUpdate::StatusChanged { status: SubscriptionStatus::Active, .. }
        ));
        assert!(matches!(
            classify_event(&failed).unwrap(),
            BillingUpdate::StatusChanged { status: SubscriptionStatus::PastDue, .. }
        ));
    }

    #[test]
    fn test_unhandled_event_is_ignored() {
        let event = json!({
            "type": "customer.created",
            "data": { "object": {} }
        });
        assert_eq!(classify_event(&event).unwrap(), BillingUpdate::Ignored);
    }

    #[test]
    fn test_missing_type_is_malformed() {
        let event = json!({ "data": { "object": {} } });
        assert!(matches!(
            classify_event(&event),
            Err(BillingError::MalformedPayload(_))
        ));
    }
}
