use crate::domain::policy::AccessPolicy;
use crate::domain::types::{CostEstimate, CostUnit, DailyUsageRecord, Money};
use crate::error::{BillingError, Result};
use rust_decimal::Decimal;

/// Pure session cost computation; functional of its three inputs.
pub struct CostCalculator;

impl CostCalculator {
    /// Compute the cost of one session against a policy and the caller's
    /// daily totals so far.
    ///
    /// The step order is the billing contract: grace subtraction, then the
    /// minimum-billing floor, then the rate, then the daily-cap clamp and
    /// penalty. The minimum floor applies even when the whole session fell
    /// inside the grace period; it is a show-up minimum, not a
    /// proportional one.
    pub fn compute(
        policy: &AccessPolicy,
        duration_minutes: i64,
        daily_usage_so_far: &DailyUsageRecord,
    ) -> Result<CostEstimate> {
        if duration_minutes < 0 {
            return Err(BillingError::InvalidDuration {
                minutes: duration_minutes,
            });
        }

        if !policy.access_type.is_billable() {
            return Ok(CostEstimate::free(policy.access_type));
        }

        let rate = policy.billing_rate()?;
        let duration = duration_minutes as u64;
        let mut breakdown = Vec::new();

        // Step 1: grace subtraction.
        let chargeable_minutes = duration.saturating_sub(policy.grace_period_minutes);
        let exempted_minutes = duration.min(policy.grace_period_minutes);
        let grace_period_applied = exempted_minutes > 0;
        if grace_period_applied {
            breakdown.push(format!(
                "Grace period: first {} min of {} min free",
                exempted_minutes, duration
            ));
        }

        // Step 2: minimum-billing floor.
        let billed_minutes = chargeable_minutes.max(policy.minimum_billing_minutes);
        if billed_minutes > chargeable_minutes {
            breakdown.push(format!(
                "Minimum billing time applied: {} min",
                billed_minutes
            ));
        }

        // Step 3: rate.
        let base_cost = match rate.cost_unit {
            CostUnit::Minute => {
                Money::from_decimal(Decimal::from(billed_minutes) * rate.price_per_unit)
            }
            CostUnit::Hour => Money::from_decimal(
                Decimal::from(billed_minutes) / Decimal::from(60) * rate.price_per_unit,
            ),
        };
        breakdown.push(format!(
            "Rate: {} min x {}/{} = {}",
            billed_minutes, rate.price_per_unit, rate.cost_unit, base_cost
        ));

        // Steps 4-6: daily-cap clamp and overuse penalty.
        let projected_daily_total = daily_usage_so_far.billed_amount_so_far.add(base_cost);
        let estimate = match policy.max_daily_cap {
            Some(cap) if projected_daily_total > cap => {
                let overage = projected_daily_total.saturating_sub(cap);
                let flat = policy.overuse_penalty_flat.unwrap_or_else(Money::zero);
                let percent = policy.overuse_penalty_percent.unwrap_or(Decimal::ZERO);
                let penalty = flat.add(overage.multiply(percent / Decimal::from(100)));
                // The slice of this session that still fits under the cap.
                let capped_amount = cap.saturating_sub(daily_usage_so_far.billed_amount_so_far);

                breakdown.push(format!(
                    "Daily cap {} reached: {} of {} charged",
                    cap, capped_amount, base_cost
                ));
                if !penalty.is_zero() {
                    breakdown.push(format!(
                        "Overuse penalty: {} (flat {} + {}% of {} overage)",
                        penalty, flat, percent, overage
                    ));
                }

                CostEstimate {
                    base_cost,
                    grace_period_applied,
                    capped_amount,
                    penalty_applied: penalty,
                    total_cost: capped_amount.add(penalty),
                    daily_cap_reached: true,
                    billed_minutes,
                    breakdown,
                }
            }
            _ => CostEstimate {
                base_cost,
                grace_period_applied,
                capped_amount: base_cost,
                penalty_applied: Money::zero(),
                total_cost: base_cost,
                daily_cap_reached: false,
                billed_minutes,
                breakdown,
            },
        };

        Ok(estimate)
    }
}
