//! Payload types for Follow Up Boss people and activities.
//!
//! These mirror the subset of the FUB REST responses the assistant reads.
//! Unknown fields are ignored; most fields are optional because FUB omits
//! them freely depending on account configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A CRM person (lead) as returned by GET /v1/people/{id}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, rename = "lastName")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Person {
    /// Best-effort display name: `name`, else first + last, else "this lead".
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            if !name.trim().is_empty() {
                return name.trim().to_string();
            }
        }
        let joined = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let joined = joined.trim();
        if joined.is_empty() {
            "this lead".to_string()
        } else {
            joined.to_string()
        }
    }
}

/// A single activity row from GET /v1/people/{id}/activities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub id: Option<i64>,
    /// Activity type as FUB reports it: "call", "text", "email", "note", ...
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Envelope for the activities listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityList {
    #[serde(default)]
    pub activities: Vec<Activity>,
}

/// The cached bundle the assist pipeline works from.
#[derive(Debug, Clone)]
pub struct LeadContext {
    pub person: Person,
    pub activities: Vec<Activity>,
}
