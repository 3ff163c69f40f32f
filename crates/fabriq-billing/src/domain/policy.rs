use crate::domain::types::{AccessType, CostUnit, EquipmentId, Money};
use crate::error::{BillingError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-equipment access and billing configuration.
///
/// Pricing fields are meaningful only for `payPerUse` equipment; for other
/// access types they are ignored, present or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPolicy {
    pub equipment_id: EquipmentId,
    pub access_type: AccessType,
    /// Independent of `access_type`; even free equipment may require base
    /// membership.
    #[serde(default)]
    pub membership_required: bool,
    #[serde(default)]
    pub price_per_unit: Option<Decimal>,
    #[serde(default)]
    pub cost_unit: Option<CostUnit>,
    /// Floor applied to every billed session, in minutes.
    #[serde(default)]
    pub minimum_billing_minutes: u64,
    /// Initial minutes of a session exempt from billing.
    #[serde(default)]
    pub grace_period_minutes: u64,
    /// Upper bound on one user's spend on this equipment per calendar day.
    #[serde(default)]
    pub max_daily_cap: Option<Money>,
    /// Added once per session that triggers the cap.
    #[serde(default)]
    pub overuse_penalty_flat: Option<Money>,
    /// Percentage applied to the amount exceeding the cap.
    #[serde(default)]
    pub overuse_penalty_percent: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

/// Validated pay-per-use pricing extracted from a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingRate {
    pub price_per_unit: Decimal,
    pub cost_unit: CostUnit,
}

impl AccessPolicy {
    pub fn new(equipment_id: EquipmentId, access_type: AccessType, updated_by: String) -> Self {
        let now = Utc::now();
        Self {
            equipment_id,
            access_type,
            membership_required: false,
            price_per_unit: None,
            cost_unit: None,
            minimum_billing_minutes: 0,
            grace_period_minutes: 0,
            max_daily_cap: None,
            overuse_penalty_flat: None,
            overuse_penalty_percent: None,
            created_at: now,
            updated_at: now,
            updated_by,
        }
    }

    /// The validated rate for a pay-per-use policy.
    ///
    /// A pay-per-use policy with incomplete pricing is a configuration
    /// error, never silently billed as zero.
    pub fn billing_rate(&self) -> Result<BillingRate> {
        debug_assert!(self.access_type == AccessType::PayPerUse);

        let price_per_unit =
            self.price_per_unit
                .ok_or_else(|| BillingError::MisconfiguredPolicy {
                    equipment_id: self.equipment_id.to_string(),
                    reason: "payPerUse policy is missing pricePerUnit".to_string(),
                })?;
        let cost_unit = self
            .cost_unit
            .ok_or_else(|| BillingError::MisconfiguredPolicy {
                equipment_id: self.equipment_id.to_string(),
                reason: "payPerUse policy is missing costUnit".to_string(),
            })?;

        Ok(BillingRate {
            price_per_unit,
            cost_unit,
        })
    }

    /// Field-level validation applied before a policy is stored.
    pub fn validate(&self) -> Result<()> {
        if let Some(price) = self.price_per_unit {
            if price < Decimal::ZERO {
                return Err(BillingError::ValidationError {
                    field: "pricePerUnit".to_string(),
                    message: "must be non-negative".to_string(),
                });
            }
        }
        if let Some(percent) = self.overuse_penalty_percent {
            if percent < Decimal::ZERO {
                return Err(BillingError::ValidationError {
                    field: "overusePenaltyPercent".to_string(),
                    message: "must be non-negative".to_string(),
                });
            }
        }
        if self.access_type == AccessType::PayPerUse {
            // Surface incomplete pricing at write time, not first settlement.
            self.billing_rate()?;
        }
        Ok(())
    }
}
