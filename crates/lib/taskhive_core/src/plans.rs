//! Subscription plan limits.

use std::collections::HashMap;

use crate::models::SubscriptionPlan;

/// Per-plan resource limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanLimits {
    pub max_users: i32,
    pub max_projects: i32,
}

/// Mapping from plan to limits, injected into registration via
/// [`AuthSettings`](crate::auth::AuthSettings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanCatalog {
    limits: HashMap<SubscriptionPlan, PlanLimits>,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::new([
            (
                SubscriptionPlan::Free,
                PlanLimits {
                    max_users: 5,
                    max_projects: 3,
                },
            ),
            (
                SubscriptionPlan::Pro,
                PlanLimits {
                    max_users: 25,
                    max_projects: 15,
                },
            ),
            (
                SubscriptionPlan::Enterprise,
                PlanLimits {
                    max_users: 100,
                    max_projects: 50,
                },
            ),
        ])
    }
}

impl PlanCatalog {
    pub fn new(entries: impl IntoIterator<Item = (SubscriptionPlan, PlanLimits)>) -> Self {
        Self {
            limits: entries.into_iter().collect(),
        }
    }

    /// Limits for `plan`; plans missing from the catalog fall back to the free
    /// tier's defaults.
    pub fn limits(&self, plan: SubscriptionPlan) -> PlanLimits {
        self.limits
            .get(&plan)
            .or_else(|| self.limits.get(&SubscriptionPlan::Free))
            .copied()
            .unwrap_or(PlanLimits {
                max_users: 5,
                max_projects: 3,
            })
    }

    pub fn with(mut self, plan: SubscriptionPlan, limits: PlanLimits) -> Self {
        self.limits.insert(plan, limits);
        self
    }
}
