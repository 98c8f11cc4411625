//! Applies classified billing updates to account records.

use followup_types::error::RepositoryError;

use crate::billing::events::BillingUpdate;
use crate::repository::AccountRepository;

/// Outcome of applying a billing update, for webhook handler logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingOutcome {
    Applied,
    /// The event referenced a Stripe customer we have no account for.
    /// Acknowledged so Stripe stops retrying.
    UnknownCustomer,
    Ignored,
}

/// Service translating Stripe lifecycle events into account updates.
pub struct BillingService<A: AccountRepository> {
    accounts: A,
}

impl<A: AccountRepository> BillingService<A> {
    pub fn new(accounts: A) -> Self {
        Self { accounts }
    }

    /// Apply one classified update.
    pub async fn apply(&self, update: BillingUpdate) -> Result<BillingOutcome, RepositoryError> {
        match update {
            BillingUpdate::CheckoutCompleted {
                fub_account_id,
                stripe_customer_id,
            } => {
                // The account normally exists already (checkout starts inside
                // the embed), but a replayed webhook must not 500.
                let account = self.accounts.upsert_by_fub_account_id(&fub_account_id).await?;
                self.accounts
                    .set_stripe_customer_id(account.account_id, &stripe_customer_id)
                    .await?;
                self.accounts
                    .set_subscription_status(
                        account.account_id,
                        followup_types::account::SubscriptionStatus::Active,
                    )
                    .await?;
                tracing::info!(
                    account_id = account.account_id,
                    %stripe_customer_id,
                    "checkout completed, subscription activated"
                );
                Ok(BillingOutcome::Applied)
            }
            BillingUpdate::StatusChanged {
                stripe_customer_id,
                status,
            } => {
                match self
                    .accounts
                    .get_by_stripe_customer_id(&stripe_customer_id)
                    .await?
                {
                    Some(account) => {
                        self.accounts
                            .set_subscription_status(account.account_id, status)
                            .await?;
                        tracing::info!(
                            account_id = account.account_id,
                            %status,
                            "subscription status updated"
                        );
                        Ok(BillingOutcome::Applied)
                    }
                    None => {
                        tracing::warn!(
                            %stripe_customer_id,
                            "billing event for unknown customer"
                        );
                        Ok(BillingOutcome::UnknownCustomer)
                    }
                }
            }
            BillingUpdate::Ignored => Ok(BillingOutcome::Ignored),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;
    use followup_types::account::{Account, SubscriptionStatus};

    #[derive(Default)]
    struct MemAccounts {
        rows: Mutex<HashMap<i64, Account>>,
        next_id: Mutex<i64>,
    }

    impl MemAccounts {
        fn seed(&self, fub_account_id: &str, stripe_customer_id: Option<&str>) -> i64 {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let id = *next;
            self.rows.lock().unwrap().insert(
                id,
                Account {
                    account_id: id,
                    fub_account_id: fub_account_id.to_string(),
                    subscription_status: SubscriptionStatus::Trialing,
                    fub_access_token: None,
                    fub_refresh_token: None,
                    stripe_customer_id: stripe_customer_id.map(String::from),
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                },
            );
            id
        }

        fn status_of(&self, id: i64) -> SubscriptionStatus {
            self.rows.lock().unwrap()[&id].subscription_status
        }
    }

    impl AccountRepository for MemAccounts {
        async fn upsert_by_fub_account_id(
            &self,
            fub_account_id: &str,
        ) -> Result<Account, RepositoryError> {
            if let Some(existing) = self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|a| a.fub_account_id == fub_account_id)
            {
                return Ok(existing.clone());
            }
            let id = self.seed(fub_account_id, None);
            Ok(self.rows.lock().unwrap()[&id].clone())
        }

        async fn get(&self, account_id: i64) -> Result<Option<Account>, RepositoryError> {
            Ok(self.rows.lock().unwrap().get(&account_id).cloned())
        }

        async fn get_by_fub_account_id(
            &self,
            fub_account_id: &str,
        ) -> Result<Option<Account>, RepositoryError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|a| a.fub_account_id == fub_account_id)
                .cloned())
        }

        async fn get_by_stripe_customer_id(
            &self,
            customer_id: &str,
        ) -> Result<Option<Account>, RepositoryError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .find(|a| a.stripe_customer_id.as_deref() == Some(customer_id))
                .cloned())
        }

        async fn set_subscription_status(
            &self,
            account_id: i64,
            status: SubscriptionStatus,
        ) -> Result<(), RepositoryError> {
            self.rows
                .lock()
                .unwrap()
                .get_mut(&account_id)
                .ok_or(RepositoryError::NotFound)?
                .subscription_status = status;
            Ok(())
        }

        async fn set_stripe_customer_id(
            &self,
            account_id: i64,
            customer_id: &str,
        ) -> Result<(), RepositoryError> {
            self.rows
                .lock()
                .unwrap()
                .get_mut(&account_id)
                .ok_or(RepositoryError::NotFound)?
                .stripe_customer_id = Some(customer_id.to_string());
            Ok(())
        }

        async fn set_oauth_tokens(
            &self,
            _account_id: i64,
            _access_token: &str,
            _refresh_token: Option<&str>,
        ) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn count(&self) -> Result<u64, RepositoryError> {
            Ok(self.rows.lock().unwrap().len() as u64)
        }
    }

    #[tokio::test]
    async fn test_checkout_links_customer_and_activates() {
        let accounts = MemAccounts::default();
        let id = accounts.seed("fub-1", None);
        let svc = BillingService::new(accounts);

        let outcome = svc
            .apply(BillingUpdate::CheckoutCompleted {
                fub_account_id: "fub-1".to_string(),
                stripe_customer_id: "cus_9".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(outcome, BillingOutcome::Applied);
        assert_eq!(svc.accounts.status_of(id), SubscriptionStatus::Active);
        assert_eq!(
            svc.accounts.rows.lock().unwrap()[&id].stripe_customer_id.as_deref(),
            Some("cus_9")
        );
    }

    #[tokio::test]
    async fn test_checkout_for_unseen_account_creates_it() {
        let svc = BillingService::new(MemAccounts::default());
        let outcome = svc
            .apply(BillingUpdate::CheckoutCompleted {
                fub_account_id: "fub-new".to_string(),
                stripe_customer_id: "cus_1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(outcome, BillingOutcome::Applied);
        assert_eq!(svc.accounts.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_status_change_updates_known_customer() {
        let accounts = MemAccounts::default();
        let id = accounts.seed("fub-1", Some("cus_9"));
        let svc = BillingService::new(accounts);

        let outcome = svc
            .apply(BillingUpdate::StatusChanged {
                stripe_customer_id: "cus_9".to_string(),
                status: SubscriptionStatus::PastDue,
            })
            .await
            .unwrap();

        assert_eq!(outcome, BillingOutcome::Applied);
        assert_eq!(svc.accounts.status_of(id), SubscriptionStatus::PastDue);
    }

    #[tokio::test]
    async fn test_status_change_for_unknown_customer_is_acknowledged() {
        let svc = BillingService::new(MemAccounts::default());
        let outcome = svc
            .apply(BillingUpdate::StatusChanged {
                stripe_customer_id: "cus_missing".to_string(),
                status: SubscriptionStatus::Active,
            })
            .await
            .unwrap();
        assert_eq!(outcome, BillingOutcome::UnknownCustomer);
    }

    #[tokio::test]
    async fn test_ignored_event_is_a_no_op() {
        let svc = BillingService::new(MemAccounts::default());
        let outcome = svc.apply(BillingUpdate::Ignored).await.unwrap();
        assert_eq!(outcome, BillingOutcome::Ignored);
    }
}
