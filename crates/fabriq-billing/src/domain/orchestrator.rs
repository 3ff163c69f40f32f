use crate::domain::calculator::CostCalculator;
use crate::domain::ledger::UsageLedger;
use crate::domain::policy::AccessPolicy;
use crate::domain::types::{AccessType, CostEstimate, DailyUsageRecord, UsageSession, UserId};
use crate::error::Result;
use chrono::{DateTime, FixedOffset, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Composes the calculator and the ledger around one session's lifecycle.
pub struct BillingOrchestrator {
    ledger: Arc<dyn UsageLedger>,
    /// The makerspace's local timezone; daily caps reset at its midnight.
    timezone: FixedOffset,
}

impl BillingOrchestrator {
    pub fn new(ledger: Arc<dyn UsageLedger>, timezone: FixedOffset) -> Self {
        Self { ledger, timezone }
    }

    /// Finalize one completed session: look up the daily totals for the
    /// session's end date (makerspace local time), compute the cost, and
    /// record it against the ledger.
    pub async fn settle(
        &self,
        policy: &AccessPolicy,
        session: &UsageSession,
    ) -> Result<CostEstimate> {
        // A pay-per-use policy with incomplete pricing fails the
        // settlement outright, before any ledger read.
        if policy.access_type == AccessType::PayPerUse {
            policy.billing_rate()?;
        }

        let date = session
            .ended_at
            .with_timezone(&self.timezone)
            .date_naive();
        debug!(
            user = %session.user_id,
            equipment = %session.equipment_id,
            %date,
            "Settling session"
        );

        let daily_usage_so_far = self
            .ledger
            .get(&session.user_id, &session.equipment_id, date)
            .await?;

        let estimate =
            CostCalculator::compute(policy, session.duration_minutes(), &daily_usage_so_far)?;

        self.ledger
            .record(&session.user_id, &session.equipment_id, date, &estimate)
            .await?;

        info!(
            user = %session.user_id,
            equipment = %session.equipment_id,
            minutes = estimate.billed_minutes,
            total = %estimate.total_cost,
            cap_reached = estimate.daily_cap_reached,
            "Settled session"
        );

        Ok(estimate)
    }

    /// Cost preview for a hypothetical session of `duration_minutes`.
    ///
    /// With a user, the preview runs against their live daily totals;
    /// without one, against a fresh day. Never writes to the ledger.
    pub async fn preview(
        &self,
        policy: &AccessPolicy,
        duration_minutes: i64,
        user_id: Option<&UserId>,
        now: DateTime<Utc>,
    ) -> Result<CostEstimate> {
        let date = now.with_timezone(&self.timezone).date_naive();
        let daily_usage_so_far = match user_id {
            Some(user_id) => self.ledger.get(user_id, &policy.equipment_id, date).await?,
            None => DailyUsageRecord::zeroed(
                UserId::new("anonymous"),
                policy.equipment_id.clone(),
                date,
            ),
        };

        CostCalculator::compute(policy, duration_minutes, &daily_usage_so_far)
    }

    /// Calendar date of an instant in the makerspace's local timezone.
    pub fn local_date(&self, at: DateTime<Utc>) -> chrono::NaiveDate {
        at.with_timezone(&self.timezone).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::InMemoryUsageLedger;
    use crate::domain::types::{CostUnit, EquipmentId, Money};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn orchestrator(offset_hours: i32) -> BillingOrchestrator {
        BillingOrchestrator::new(
            Arc::new(InMemoryUsageLedger::new()),
            FixedOffset::east_opt(offset_hours * 3600).unwrap(),
        )
    }

    fn pay_per_use(price: rust_decimal::Decimal) -> AccessPolicy {
        let mut policy = AccessPolicy::new(
            EquipmentId::new("laser-1"),
            AccessType::PayPerUse,
            "ops@fabriq".to_string(),
        );
        policy.price_per_unit = Some(price);
        policy.cost_unit = Some(CostUnit::Minute);
        policy
    }

    fn session(start_hms: (u32, u32), minutes: i64) -> UsageSession {
        let started_at = Utc
            .with_ymd_and_hms(2025, 3, 10, start_hms.0, start_hms.1, 0)
            .unwrap();
        UsageSession {
            equipment_id: EquipmentId::new("laser-1"),
            user_id: UserId::new("member-7"),
            started_at,
            ended_at: started_at + chrono::Duration::minutes(minutes),
        }
    }

    #[tokio::test]
    async fn test_settle_records_against_ledger() {
        let orchestrator = orchestrator(0);
        let policy = pay_per_use(dec!(2));

        let first = orchestrator.settle(&policy, &session((10, 0), 30)).await.unwrap();
        assert_eq!(first.total_cost.as_decimal(), dec!(60));

        // A later preview for the same user sees the accumulated day.
        let mut capped = policy.clone();
        capped.max_daily_cap = Some(Money::from_decimal(dec!(100)));
        let preview = orchestrator
            .preview(
                &capped,
                30,
                Some(&UserId::new("member-7")),
                Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap(),
            )
            .await
            .unwrap();
        assert!(preview.daily_cap_reached);
        assert_eq!(preview.capped_amount.as_decimal(), dec!(40));
    }

    #[tokio::test]
    async fn test_settlements_accumulate_into_the_daily_cap() {
        let orchestrator = orchestrator(0);
        let mut policy = pay_per_use(dec!(1));
        policy.max_daily_cap = Some(Money::from_decimal(dec!(100)));
        policy.overuse_penalty_flat = Some(Money::from_decimal(dec!(10)));

        let first = orchestrator.settle(&policy, &session((9, 0), 80)).await.unwrap();
        assert!(!first.daily_cap_reached);

        let second = orchestrator.settle(&policy, &session((14, 0), 80)).await.unwrap();
        assert!(second.daily_cap_reached);
        assert_eq!(second.capped_amount.as_decimal(), dec!(20));
        // 60 overage, flat penalty only
        assert_eq!(second.penalty_applied.as_decimal(), dec!(10));
        assert_eq!(second.total_cost.as_decimal(), dec!(30));
    }

    #[tokio::test]
    async fn test_end_time_buckets_in_makerspace_timezone() {
        // A session ending 23:50 UTC on March 10 is already March 11 at
        // the makerspace (UTC+2), so its charge lands on the March 11
        // record.
        let orchestrator = orchestrator(2);
        let mut policy = pay_per_use(dec!(1));
        policy.max_daily_cap = Some(Money::from_decimal(dec!(15)));

        orchestrator.settle(&policy, &session((23, 30), 20)).await.unwrap();

        let march_11 = chrono::NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        assert_eq!(
            orchestrator.local_date(Utc.with_ymd_and_hms(2025, 3, 10, 23, 50, 0).unwrap()),
            march_11
        );

        let user = UserId::new("member-7");

        // Preview while it is still March 10 locally: fresh day, no cap.
        let same_day = orchestrator
            .preview(
                &policy,
                10,
                Some(&user),
                Utc.with_ymd_and_hms(2025, 3, 10, 20, 0, 0).unwrap(),
            )
            .await
            .unwrap();
        assert!(!same_day.daily_cap_reached);

        // Preview once the makerspace clock has passed midnight: the
        // settled session counts and the cap is already blown.
        let next_day = orchestrator
            .preview(
                &policy,
                10,
                Some(&user),
                Utc.with_ymd_and_hms(2025, 3, 10, 23, 55, 0).unwrap(),
            )
            .await
            .unwrap();
        assert!(next_day.daily_cap_reached);
        assert_eq!(next_day.capped_amount, Money::zero());
    }

    #[tokio::test]
    async fn test_misconfigured_policy_fails_settlement() {
        let orchestrator = orchestrator(0);
        let mut policy = pay_per_use(dec!(1));
        policy.price_per_unit = None;

        let err = orchestrator.settle(&policy, &session((10, 0), 30)).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::BillingError::MisconfiguredPolicy { .. }
        ));
    }

    #[tokio::test]
    async fn test_preview_without_user_assumes_fresh_day() {
        let orchestrator = orchestrator(0);
        let mut policy = pay_per_use(dec!(1));
        policy.max_daily_cap = Some(Money::from_decimal(dec!(50)));

        orchestrator.settle(&policy, &session((9, 0), 40)).await.unwrap();

        let preview = orchestrator
            .preview(&policy, 40, None, Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap())
            .await
            .unwrap();
        assert!(!preview.daily_cap_reached);
        assert_eq!(preview.total_cost.as_decimal(), dec!(40));
    }
}
