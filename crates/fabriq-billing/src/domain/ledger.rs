use crate::domain::types::{CostEstimate, DailyUsageRecord, EquipmentId, UserId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Per-(user, equipment, calendar day) billing totals.
///
/// `record` is a read-modify-write critical section keyed by
/// (user, equipment, date); implementations must never lose a concurrent
/// update. Days roll over implicitly through the date key.
#[async_trait]
pub trait UsageLedger: Send + Sync {
    /// Current daily totals; a zeroed record when none exists yet.
    async fn get(
        &self,
        user_id: &UserId,
        equipment_id: &EquipmentId,
        date: NaiveDate,
    ) -> Result<DailyUsageRecord>;

    /// Add a settled session's total cost and billed minutes to the daily
    /// record, creating it if absent, and return the updated record.
    async fn record(
        &self,
        user_id: &UserId,
        equipment_id: &EquipmentId,
        date: NaiveDate,
        estimate: &CostEstimate,
    ) -> Result<DailyUsageRecord>;
}

type LedgerKey = (UserId, EquipmentId, NaiveDate);

/// In-memory ledger; the write lock spans the whole read-modify-write, so
/// concurrent settlements of the same key serialize instead of racing.
pub struct InMemoryUsageLedger {
    records: Arc<RwLock<HashMap<LedgerKey, DailyUsageRecord>>>,
}

impl InMemoryUsageLedger {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryUsageLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UsageLedger for InMemoryUsageLedger {
    async fn get(
        &self,
        user_id: &UserId,
        equipment_id: &EquipmentId,
        date: NaiveDate,
    ) -> Result<DailyUsageRecord> {
        let records = self.records.read().await;
        Ok(records
            .get(&(user_id.clone(), equipment_id.clone(), date))
            .cloned()
            .unwrap_or_else(|| {
                DailyUsageRecord::zeroed(user_id.clone(), equipment_id.clone(), date)
            }))
    }

    async fn record(
        &self,
        user_id: &UserId,
        equipment_id: &EquipmentId,
        date: NaiveDate,
        estimate: &CostEstimate,
    ) -> Result<DailyUsageRecord> {
        let mut records = self.records.write().await;
        let entry = records
            .entry((user_id.clone(), equipment_id.clone(), date))
            .or_insert_with(|| {
                DailyUsageRecord::zeroed(user_id.clone(), equipment_id.clone(), date)
            });
        entry.absorb(estimate);
        Ok(entry.clone())
    }
}
