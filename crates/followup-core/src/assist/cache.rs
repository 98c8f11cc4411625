//! In-process TTL cache for lead context.
//!
//! CRM lookups cost two upstream round trips per question; agents tend to
//! ask several questions about the same lead in a row. Entries live for a
//! short window and are dropped eagerly on read once expired.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use followup_types::lead::LeadContext;

/// Default entry lifetime.
const DEFAULT_TTL: Duration = Duration::from_secs(90);

struct CacheEntry {
    context: LeadContext,
    stored_at: Instant,
}

/// Concurrent (account, person) -> lead context cache with per-entry TTL.
pub struct LeadCache {
    entries: DashMap<(i64, String), CacheEntry>,
    ttl: Duration,
}

impl LeadCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Get a fresh entry, removing it if it has expired.
    pub fn get(&self, account_id: i64, person_id: &str) -> Option<LeadContext> {
        let key = (account_id, person_id.to_string());
        let expired = match self.entries.get(&key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                return Some(entry.context.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(&key);
        }
        None
    }

    pub fn insert(&self, account_id: i64, person_id: &str, context: LeadContext) {
        self.entries.insert(
            (account_id, person_id.to_string()),
            CacheEntry {
                context,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop the entry for one lead within one account.
    pub fn invalidate(&self, account_id: i64, person_id: &str) {
        self.entries.remove(&(account_id, person_id.to_string()));
    }

    /// Drop entries for a person across every account.
    ///
    /// CRM webhooks identify the person but not always the tenant.
    pub fn invalidate_person(&self, person_id: &str) {
        self.entries.retain(|(_, pid), _| pid != person_id);
    }

    /// Drop every expired entry. Called opportunistically.
    pub fn purge_expired(&self) {
        self.entries
            .retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LeadCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
