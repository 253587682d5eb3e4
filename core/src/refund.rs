//! Time-based cancellation refunds.
//!
//! One pure function over a declarative [`RefundPolicy`]; the ad hoc
//! per-screen percentages of older booking flows all route through here.

use crate::types::{Money, RefundPolicy};
use chrono::{DateTime, Duration, Utc};

/// Compute the refund owed for cancelling at `now` a booking that starts at
/// `start_time`, given the resource's policy and the amount actually paid.
///
/// Tiers are evaluated most-generous-first; the first tier whose lead-time
/// threshold the cancellation meets wins. The threshold is inclusive:
/// cancelling exactly `hours_before_start` hours ahead earns the tier. When
/// no tier matches (including cancellations after start), the policy's
/// fallback percentage applies. Nothing was paid, nothing is refunded.
#[must_use]
pub fn compute_refund(
    policy: &RefundPolicy,
    start_time: DateTime<Utc>,
    now: DateTime<Utc>,
    paid_amount: Money,
) -> Money {
    if paid_amount.is_zero() {
        return Money::ZERO;
    }

    let lead_time = start_time.signed_duration_since(now);
    for tier in policy.tiers() {
        if lead_time >= Duration::hours(i64::from(tier.hours_before_start)) {
            return paid_amount.percent(tier.refund_percent);
        }
    }
    paid_amount.percent(policy.no_refund_percent())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;
    use crate::types::RefundTier;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn policy_48_24_6() -> RefundPolicy {
        RefundPolicy::new(
            [
                RefundTier::new(48, 100),
                RefundTier::new(24, 75),
                RefundTier::new(6, 50),
            ],
            10,
        )
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn most_generous_matching_tier_wins() {
        let paid = Money::from_cents(10_000);
        let policy = policy_48_24_6();

        let refund = compute_refund(&policy, start(), start() - Duration::hours(72), paid);
        assert_eq!(refund, Money::from_cents(10_000));

        let refund = compute_refund(&policy, start(), start() - Duration::hours(30), paid);
        assert_eq!(refund, Money::from_cents(7_500));

        let refund = compute_refund(&policy, start(), start() - Duration::hours(10), paid);
        assert_eq!(refund, Money::from_cents(5_000));
    }

    #[test]
    fn boundary_is_inclusive_for_the_generous_tier() {
        let paid = Money::from_cents(10_000);
        let policy = policy_48_24_6();

        // Exactly 24h before start earns the 24h tier, not the 6h one.
        let refund = compute_refund(&policy, start(), start() - Duration::hours(24), paid);
        assert_eq!(refund, Money::from_cents(7_500));

        // One second inside the window drops to the next tier.
        let refund = compute_refund(
            &policy,
            start(),
            start() - Duration::hours(24) + Duration::seconds(1),
            paid,
        );
        assert_eq!(refund, Money::from_cents(5_000));
    }

    #[test]
    fn fallback_applies_when_no_tier_matches() {
        let paid = Money::from_cents(10_000);
        let policy = policy_48_24_6();

        let refund = compute_refund(&policy, start(), start() - Duration::hours(1), paid);
        assert_eq!(refund, Money::from_cents(1_000));

        // Cancelling after start also falls through to the fallback.
        let refund = compute_refund(&policy, start(), start() + Duration::hours(1), paid);
        assert_eq!(refund, Money::from_cents(1_000));
    }

    #[test]
    fn nothing_paid_refunds_nothing() {
        let refund = compute_refund(&policy_48_24_6(), start(), start(), Money::ZERO);
        assert_eq!(refund, Money::ZERO);
    }

    proptest! {
        /// Cancelling later never refunds more than cancelling earlier.
        #[test]
        fn refund_is_monotone_in_lead_time(
            paid in 0u64..10_000_000,
            earlier_hours in 0i64..200,
            later_offset in 0i64..200,
        ) {
            let policy = policy_48_24_6();
            let paid = Money::from_cents(paid);
            let earlier = start() - Duration::hours(earlier_hours + later_offset);
            let later = start() - Duration::hours(earlier_hours);

            let refund_early = compute_refund(&policy, start(), earlier, paid);
            let refund_late = compute_refund(&policy, start(), later, paid);
            prop_assert!(refund_late <= refund_early);
        }

        /// The refund never exceeds what was paid.
        #[test]
        fn refund_never_exceeds_paid(
            paid in 0u64..10_000_000,
            hours in -48i64..200,
        ) {
            let policy = policy_48_24_6();
            let paid = Money::from_cents(paid);
            let refund = compute_refund(&policy, start(), start() - Duration::hours(hours), paid);
            prop_assert!(refund <= paid);
        }
    }
}
