use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Member identifier (from the makerspace identity provider)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Equipment identifier, foreign key to the equipment registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EquipmentId(String);

impl EquipmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EquipmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monetary amount with fixed-point precision handling.
///
/// Currency-agnostic; the currency code is a makerspace-wide setting.
/// Serializes as a decimal string, never a binary float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn from_decimal(amount: Decimal) -> Self {
        Self(amount.round_dp(2)) // 2 decimal places, banker's rounding
    }

    pub fn from_f64(amount: f64) -> Option<Self> {
        Decimal::from_f64(amount).map(|d| Self(d.round_dp(2)))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn add(&self, other: Money) -> Self {
        Self::from_decimal(self.0 + other.0)
    }

    /// Subtraction clamped at zero; billed amounts never go negative.
    pub fn saturating_sub(&self, other: Money) -> Self {
        if self.0 >= other.0 {
            Self::from_decimal(self.0 - other.0)
        } else {
            Self::zero()
        }
    }

    pub fn multiply(&self, factor: Decimal) -> Self {
        Self::from_decimal(self.0 * factor)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a piece of equipment may be accessed and billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessType {
    Free,
    SubscriptionOnly,
    PayPerUse,
}

impl AccessType {
    pub fn is_billable(&self) -> bool {
        matches!(self, AccessType::PayPerUse)
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessType::Free => write!(f, "free"),
            AccessType::SubscriptionOnly => write!(f, "subscriptionOnly"),
            AccessType::PayPerUse => write!(f, "payPerUse"),
        }
    }
}

/// Unit the pay-per-use rate is quoted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CostUnit {
    Minute,
    Hour,
}

impl fmt::Display for CostUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostUnit::Minute => write!(f, "minute"),
            CostUnit::Hour => write!(f, "hour"),
        }
    }
}

/// Membership and skill state of the member requesting access.
///
/// Skill certification is carried for callers but gated by an external
/// policy service, not by this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub has_active_membership: bool,
    pub has_active_subscription: bool,
    pub has_required_skill: bool,
}

/// One completed usage of a piece of equipment; never persisted here
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSession {
    pub equipment_id: EquipmentId,
    pub user_id: UserId,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl UsageSession {
    /// Whole minutes between start and end, clamped at zero.
    pub fn duration_minutes(&self) -> i64 {
        (self.ended_at - self.started_at).num_minutes().max(0)
    }
}

/// Per-(user, equipment, calendar day) billing totals, mutated only by
/// the usage ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUsageRecord {
    pub user_id: UserId,
    pub equipment_id: EquipmentId,
    pub date: NaiveDate,
    pub billed_minutes_so_far: u64,
    pub billed_amount_so_far: Money,
}

impl DailyUsageRecord {
    /// Fresh record for the first session of the day.
    pub fn zeroed(user_id: UserId, equipment_id: EquipmentId, date: NaiveDate) -> Self {
        Self {
            user_id,
            equipment_id,
            date,
            billed_minutes_so_far: 0,
            billed_amount_so_far: Money::zero(),
        }
    }

    /// Fold one settled session into the daily totals.
    pub fn absorb(&mut self, estimate: &CostEstimate) {
        self.billed_minutes_so_far += estimate.billed_minutes;
        self.billed_amount_so_far = self.billed_amount_so_far.add(estimate.total_cost);
    }
}

/// Why access was refused; surfaced verbatim for UI messaging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessDenialReason {
    MembershipRequired,
    SubscriptionRequired,
}

impl fmt::Display for AccessDenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessDenialReason::MembershipRequired => write!(f, "membership required"),
            AccessDenialReason::SubscriptionRequired => write!(f, "subscription required"),
        }
    }
}

/// Outcome of an access-policy evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: Option<AccessDenialReason>,
}

impl AccessDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: AccessDenialReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// Cost of one session with a line-by-line breakdown for transparency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub base_cost: Money,
    pub grace_period_applied: bool,
    /// The amount after cap truncation; equals `base_cost` when no cap hit.
    pub capped_amount: Money,
    pub penalty_applied: Money,
    pub total_cost: Money,
    pub daily_cap_reached: bool,
    pub billed_minutes: u64,
    pub breakdown: Vec<String>,
}

impl CostEstimate {
    /// Zero-cost estimate for equipment that is not pay-per-use.
    pub fn free(access_type: AccessType) -> Self {
        Self {
            base_cost: Money::zero(),
            grace_period_applied: false,
            capped_amount: Money::zero(),
            penalty_applied: Money::zero(),
            total_cost: Money::zero(),
            daily_cap_reached: false,
            billed_minutes: 0,
            breakdown: vec![format!("No charge: {access_type} equipment")],
        }
    }
}
