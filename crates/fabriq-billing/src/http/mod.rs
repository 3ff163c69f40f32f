//! HTTP surface of the billing engine: policy CRUD, access checks, cost
//! previews, and session settlement.

use crate::config::BillingConfig;
use crate::domain::policy::AccessPolicy;
use crate::domain::types::{
    AccessDecision, AccessType, CostEstimate, CostUnit, EquipmentId, Money, UsageSession,
    UserContext, UserId,
};
use crate::domain::{AccessEvaluator, BillingOrchestrator};
use crate::error::{BillingError, Result};
use crate::storage::PolicyRepository;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BillingConfig>,
    pub policies: Arc<dyn PolicyRepository>,
    pub orchestrator: Arc<BillingOrchestrator>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/access-policies", get(list_access_policies))
        .route(
            "/api/v1/equipment/:id/access-policy",
            get(get_access_policy).put(put_access_policy),
        )
        .route("/api/v1/equipment/:id/access-check", post(check_access))
        .route("/api/v1/equipment/:id/cost-estimate", post(estimate_cost))
        .route("/api/v1/sessions/settle", post(settle_session))
        .with_state(state)
}

/// Write payload for an access policy; timestamps are stamped server-side
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyUpdateRequest {
    pub access_type: AccessType,
    #[serde(default)]
    pub membership_required: bool,
    #[serde(default)]
    pub price_per_unit: Option<Decimal>,
    #[serde(default)]
    pub cost_unit: Option<CostUnit>,
    #[serde(default)]
    pub minimum_billing_minutes: u64,
    #[serde(default)]
    pub grace_period_minutes: u64,
    #[serde(default)]
    pub max_daily_cap: Option<Money>,
    #[serde(default)]
    pub overuse_penalty_flat: Option<Money>,
    #[serde(default)]
    pub overuse_penalty_percent: Option<Decimal>,
    pub updated_by: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimateRequest {
    pub duration_minutes: i64,
    /// With a user, the preview runs against their live daily totals.
    #[serde(default)]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    pub equipment_id: EquipmentId,
    pub user_id: UserId,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": state.config.service.name,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Look up a policy, failing closed when none is configured.
async fn require_policy(state: &AppState, equipment_id: &EquipmentId) -> Result<AccessPolicy> {
    state
        .policies
        .get(equipment_id)
        .await?
        .ok_or_else(|| BillingError::PolicyNotFound {
            equipment_id: equipment_id.to_string(),
        })
}

async fn list_access_policies(State(state): State<AppState>) -> Result<Json<Vec<AccessPolicy>>> {
    let policies = state.policies.list().await?;
    Ok(Json(policies))
}

async fn get_access_policy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AccessPolicy>> {
    let policy = require_policy(&state, &EquipmentId::new(id)).await?;
    Ok(Json(policy))
}

async fn put_access_policy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PolicyUpdateRequest>,
) -> Result<Json<AccessPolicy>> {
    let equipment_id = EquipmentId::new(id);

    let mut policy = AccessPolicy::new(
        equipment_id.clone(),
        request.access_type,
        request.updated_by,
    );
    policy.membership_required = request.membership_required;
    policy.price_per_unit = request.price_per_unit;
    policy.cost_unit = request.cost_unit;
    policy.minimum_billing_minutes = request.minimum_billing_minutes;
    policy.grace_period_minutes = request.grace_period_minutes;
    policy.max_daily_cap = request.max_daily_cap;
    policy.overuse_penalty_flat = request.overuse_penalty_flat;
    policy.overuse_penalty_percent = request.overuse_penalty_percent;

    policy.validate()?;
    let stored = state.policies.upsert(policy).await?;

    info!(equipment = %equipment_id, access_type = %stored.access_type, "Stored access policy");
    Ok(Json(stored))
}

async fn check_access(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(user): Json<UserContext>,
) -> Result<Json<AccessDecision>> {
    let policy = require_policy(&state, &EquipmentId::new(id)).await?;
    Ok(Json(AccessEvaluator::evaluate(&policy, &user)))
}

async fn estimate_cost(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CostEstimateRequest>,
) -> Result<Json<CostEstimate>> {
    let policy = require_policy(&state, &EquipmentId::new(id)).await?;
    let estimate = state
        .orchestrator
        .preview(
            &policy,
            request.duration_minutes,
            request.user_id.as_ref(),
            Utc::now(),
        )
        .await?;
    Ok(Json(estimate))
}

async fn settle_session(
    State(state): State<AppState>,
    Json(request): Json<SettleRequest>,
) -> Result<Json<CostEstimate>> {
    let policy = require_policy(&state, &request.equipment_id).await?;
    let session = UsageSession {
        equipment_id: request.equipment_id,
        user_id: request.user_id,
        started_at: request.started_at,
        ended_at: request.ended_at,
    };
    let estimate = state.orchestrator.settle(&policy, &session).await?;
    Ok(Json(estimate))
}
