//! StripeClient -- checkout and billing-portal session creation.
//!
//! Talks to the Stripe REST API with form-encoded bodies. The secret key
//! is wrapped in [`secrecy::SecretString`] and only exposed when building
//! the Authorization header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use followup_types::error::BillingError;

const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

/// A created Checkout Session the widget redirects the agent to.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// A created billing-portal session.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalSession {
    pub url: String,
}

/// Stripe API client for subscription checkout and self-service billing.
pub struct StripeClient {
    client: reqwest::Client,
    base_url: String,
    secret_key: SecretString,
    price_id_monthly: String,
}

// StripeClient intentionally does NOT derive Debug so the secret key can
// never end up in logs or panic output.

impl StripeClient {
    pub fn new(secret_key: SecretString, price_id_monthly: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            base_url: DEFAULT_STRIPE_API_BASE.to_string(),
            secret_key,
            price_id_monthly,
        }
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create a subscription Checkout Session for a tenant.
    ///
    /// `fub_account_id` rides along as metadata so the completion webhook
    /// can link the Stripe customer back to the account. An existing
    /// customer id pins the session to that customer instead of creating
    /// a new one.
    pub async fn create_checkout_session(
        &self,
        fub_account_id: &str,
        existing_customer_id: Option<&str>,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, BillingError> {
        let mut form: Vec<(&str, &str)> = vec![
            ("mode", "subscription"),
            ("line_items[0][price]", self.price_id_monthly.as_str()),
            ("line_items[0][quantity]", "1"),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
            ("metadata[fub_account_id]", fub_account_id),
        ];
        if let Some(customer) = existing_customer_id {
            form.push(("customer", customer));
        }

        self.post_form("/v1/checkout/sessions", &form).await
    }

    /// Create a billing-portal session for an existing customer.
    pub async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, BillingError> {
        let form = [("customer", customer_id), ("return_url", return_url)];
        self.post_form("/v1/billing_portal/sessions", &form).await
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, BillingError> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(self.secret_key.expose_secret())
            .form(form)
            .send()
            .await
            .map_err(|e| BillingError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BillingError::Api {
                status: status.as_u16(),
                message: stripe_error_message(&body),
            });
        }

        response.json().await.map_err(|e| BillingError::Api {
            status: status.as_u16(),
            message: format!("failed to parse response: {e}"),
        })
    }
}

/// Pull the human-readable message out of a Stripe error body when present.
fn stripe_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}
