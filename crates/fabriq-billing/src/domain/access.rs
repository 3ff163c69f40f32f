use crate::domain::policy::AccessPolicy;
use crate::domain::types::{AccessDecision, AccessDenialReason, AccessType, UserContext};

/// Pure access-policy evaluation; no side effects, deterministic.
pub struct AccessEvaluator;

impl AccessEvaluator {
    /// Rules are evaluated in order and the first failing rule wins:
    /// membership gating before subscription gating.
    pub fn evaluate(policy: &AccessPolicy, user: &UserContext) -> AccessDecision {
        if policy.membership_required && !user.has_active_membership {
            return AccessDecision::deny(AccessDenialReason::MembershipRequired);
        }

        if policy.access_type == AccessType::SubscriptionOnly && !user.has_active_subscription {
            return AccessDecision::deny(AccessDenialReason::SubscriptionRequired);
        }

        AccessDecision::allow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::EquipmentId;

    fn policy(access_type: AccessType, membership_required: bool) -> AccessPolicy {
        let mut policy = AccessPolicy::new(
            EquipmentId::new("printer-1"),
            access_type,
            "ops@fabriq".to_string(),
        );
        policy.membership_required = membership_required;
        policy
    }

    fn member(membership: bool, subscription: bool) -> UserContext {
        UserContext {
            has_active_membership: membership,
            has_active_subscription: subscription,
            has_required_skill: true,
        }
    }

    #[test]
    fn test_free_equipment_allows_anyone() {
        let decision = AccessEvaluator::evaluate(&policy(AccessType::Free, false), &member(false, false));
        assert!(decision.allowed);
        assert_eq!(decision.reason, None);
    }

    #[test]
    fn test_membership_gate() {
        let decision = AccessEvaluator::evaluate(&policy(AccessType::Free, true), &member(false, false));
        assert_eq!(decision, AccessDecision::deny(AccessDenialReason::MembershipRequired));

        let decision = AccessEvaluator::evaluate(&policy(AccessType::Free, true), &member(true, false));
        assert!(decision.allowed);
    }

    #[test]
    fn test_subscription_gate() {
        let decision = AccessEvaluator::evaluate(
            &policy(AccessType::SubscriptionOnly, false),
            &member(true, false),
        );
        assert_eq!(
            decision,
            AccessDecision::deny(AccessDenialReason::SubscriptionRequired)
        );

        let decision = AccessEvaluator::evaluate(
            &policy(AccessType::SubscriptionOnly, false),
            &member(true, true),
        );
        assert!(decision.allowed);
    }

    #[test]
    fn test_membership_rule_wins_over_subscription_rule() {
        // Lacking both, against a subscriptionOnly + membershipRequired
        // policy, the membership denial is reported.
        let decision = AccessEvaluator::evaluate(
            &policy(AccessType::SubscriptionOnly, true),
            &member(false, false),
        );
        assert_eq!(
            decision,
            AccessDecision::deny(AccessDenialReason::MembershipRequired)
        );
    }

    #[test]
    fn test_pay_per_use_needs_no_subscription() {
        let decision = AccessEvaluator::evaluate(
            &policy(AccessType::PayPerUse, false),
            &member(false, false),
        );
        assert!(decision.allowed);
    }
}
