// [libs/domain/models/src/user.rs]
//! User identity and subscription/quota state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

/// Access tier granted to an authenticated operator. Governs both the
/// monthly search/application limits and the concurrency of background
/// work the scheduler will dispatch on the user's behalf.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Free,
    Standard,
    Premium,
}

impl SubscriptionTier {
    /// Monthly search quota for the tier. Free users get a handful of
    /// manual searches; Premium users effectively never hit the wall.
    pub fn searches_limit(self) -> u32 {
        match self {
            SubscriptionTier::Free => 5,
            SubscriptionTier::Standard => 50,
            SubscriptionTier::Premium => 500,
        }
    }

    pub fn applications_limit(self) -> u32 {
        match self {
            SubscriptionTier::Free => 1,
            SubscriptionTier::Standard => 10,
            SubscriptionTier::Premium => 100,
        }
    }
}

/// A subscribed operator of the grant-discovery pipeline, identified by
/// an external identity token claim. Created lazily on first authenticated
/// request; never hard-deleted except via an explicit cascading purge.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// The `sub` claim from the external identity provider's token.
    pub external_subject: String,
    pub subscription_tier: SubscriptionTier,
    pub searches_used: u32,
    pub applications_used: u32,
    /// Start of the current billing period; counters reset when it rolls.
    pub billing_period_started_at: DateTime<Utc>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.deactivated_at.is_none()
    }

    pub fn has_search_quota(&self) -> bool {
        self.searches_used < self.subscription_tier.searches_limit()
    }

    pub fn has_application_quota(&self) -> bool {
        self.applications_used < self.subscription_tier.applications_limit()
    }
}
