// crates/quill-core/src/trust.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A locally recorded, unilateral grant of trust.
///
/// "I accept pushes and replies claiming to originate from `origin`."
/// Created only through the admin-gated establisher. Trust is directional:
/// holding a Connection says nothing about whether the remote trusts us.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Trusted remote origin (unique key).
    pub origin: String,
    /// When trust was first granted.
    pub created_at: DateTime<Utc>,
}

/// A locally recorded intent to push updates to a remote origin.
///
/// Created only after a successful reverse-trust probe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Push target origin (unique key).
    pub origin: String,
    /// When the subscription was first recorded.
    pub created_at: DateTime<Utc>,
}

impl Connection {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            created_at: Utc::now(),
        }
    }
}

impl Subscription {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            created_at: Utc::now(),
        }
    }
}
