// [libs/domain/billing/src/lib.rs]
/*!
 * QUOTA LEDGER
 * RESPONSIBILITY: subscription-tier quota accounting for searches and
 * application drafts, and the transaction trail behind each decrement.
 *
 * `QuotaSnapshot` is what the API surfaces to a caller; `QuotaTransaction`
 * is what gets appended to the ledger table every time a search run or
 * application draft consumes quota. The two are deliberately separate:
 * the snapshot is a derived view, the transaction is the source of truth.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

use grantwell_domain_models::{SubscriptionTier, User};

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    pub subscription_tier: SubscriptionTier,
    pub searches_used: u32,
    pub searches_limit: u32,
    pub applications_used: u32,
    pub applications_limit: u32,
    pub billing_period_started_at: DateTime<Utc>,
}

impl QuotaSnapshot {
    pub fn from_user(user: &User) -> Self {
        QuotaSnapshot {
            subscription_tier: user.subscription_tier,
            searches_used: user.searches_used,
            searches_limit: user.subscription_tier.searches_limit(),
            applications_used: user.applications_used,
            applications_limit: user.subscription_tier.applications_limit(),
            billing_period_started_at: user.billing_period_started_at,
        }
    }

    pub fn searches_remaining(&self) -> u32 {
        self.searches_limit.saturating_sub(self.searches_used)
    }

    pub fn applications_remaining(&self) -> u32 {
        self.applications_limit.saturating_sub(self.applications_used)
    }
}

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuotaKind {
    Search,
    Application,
}

/// One ledger entry behind a quota decrement. Appended, never mutated;
/// a billing-period rollover zeroes the counters on `User` but leaves
/// the historical transactions in place for audit.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: QuotaKind,
    /// Always 1 today; kept as a field rather than implied so a future
    /// bulk-search feature can charge more than one unit per call.
    pub units: u32,
    pub reference_id: Uuid,
    pub recorded_at: DateTime<Utc>,
}

impl QuotaTransaction {
    pub fn new(user_id: Uuid, kind: QuotaKind, reference_id: Uuid, recorded_at: DateTime<Utc>) -> Self {
        QuotaTransaction {
            id: Uuid::new_v4(),
            user_id,
            kind,
            units: 1,
            reference_id,
            recorded_at,
        }
    }
}

/// Pure decision of whether a user may consume one more unit of the
/// given quota kind. Does not mutate `User`; callers apply the result
/// inside the same transaction that persists the ledger entry.
pub fn can_consume(user: &User, kind: QuotaKind) -> bool {
    if !user.is_active() {
        return false;
    }
    match kind {
        QuotaKind::Search => user.has_search_quota(),
        QuotaKind::Application => user.has_application_quota(),
    }
}

/// True once a user's billing period is old enough to roll over. The
/// scheduler calls this once per cycle rather than on every request.
pub fn billing_period_elapsed(user: &User, now: DateTime<Utc>, period_days: i64) -> bool {
    now.signed_duration_since(user.billing_period_started_at).num_days() >= period_days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_user(tier: SubscriptionTier, searches_used: u32) -> User {
        User {
            id: Uuid::new_v4(),
            external_subject: "sub|abc".to_string(),
            subscription_tier: tier,
            searches_used,
            applications_used: 0,
            billing_period_started_at: Utc::now() - Duration::days(10),
            deactivated_at: None,
            created_at: Utc::now() - Duration::days(40),
        }
    }

    #[test]
    fn free_tier_blocks_after_five_searches() {
        let user = sample_user(SubscriptionTier::Free, 5);
        assert!(!can_consume(&user, QuotaKind::Search));
    }

    #[test]
    fn free_tier_allows_before_limit() {
        let user = sample_user(SubscriptionTier::Free, 4);
        assert!(can_consume(&user, QuotaKind::Search));
    }

    #[test]
    fn deactivated_user_cannot_consume_any_quota() {
        let mut user = sample_user(SubscriptionTier::Premium, 0);
        user.deactivated_at = Some(Utc::now());
        assert!(!can_consume(&user, QuotaKind::Search));
        assert!(!can_consume(&user, QuotaKind::Application));
    }

    #[test]
    fn snapshot_reports_remaining_quota() {
        let user = sample_user(SubscriptionTier::Standard, 48);
        let snapshot = QuotaSnapshot::from_user(&user);
        assert_eq!(snapshot.searches_remaining(), 2);
    }

    #[test]
    fn billing_period_rolls_over_after_configured_days() {
        let user = sample_user(SubscriptionTier::Free, 0);
        assert!(!billing_period_elapsed(&user, Utc::now(), 30));
        assert!(billing_period_elapsed(&user, Utc::now(), 9));
    }
}
