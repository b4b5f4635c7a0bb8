//! Tenant domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::plans::PlanLimits;

/// Tenant lifecycle status. Only `Active` tenants accept logins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tenant_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    Active,
    Suspended,
    Trial,
}

impl TenantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantStatus::Active => "active",
            TenantStatus::Suspended => "suspended",
            TenantStatus::Trial => "trial",
        }
    }
}

/// Subscription plan; decides the tenant's user and project limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_plan", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Free,
    Pro,
    Enterprise,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Pro => "pro",
            SubscriptionPlan::Enterprise => "enterprise",
        }
    }
}

impl std::str::FromStr for SubscriptionPlan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(SubscriptionPlan::Free),
            "pro" => Ok(SubscriptionPlan::Pro),
            "enterprise" => Ok(SubscriptionPlan::Enterprise),
            other => Err(format!("unknown subscription plan: {other}")),
        }
    }
}

/// Database row for `tenants`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    /// Globally unique, stored lowercase.
    pub subdomain: String,
    pub status: TenantStatus,
    pub subscription_plan: SubscriptionPlan,
    pub max_users: i32,
    pub max_projects: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    pub fn is_active(&self) -> bool {
        self.status == TenantStatus::Active
    }

    pub fn summary(&self) -> TenantSummary {
        TenantSummary {
            id: self.id,
            name: self.name.clone(),
            subdomain: self.subdomain.clone(),
            subscription_plan: self.subscription_plan,
            max_users: self.max_users,
            max_projects: self.max_projects,
        }
    }
}

/// Tenant fields embedded in login and profile responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSummary {
    pub id: Uuid,
    pub name: String,
    pub subdomain: String,
    pub subscription_plan: SubscriptionPlan,
    pub max_users: i32,
    pub max_projects: i32,
}

/// Fields required to create a tenant. New tenants start `Active`.
#[derive(Debug, Clone)]
pub struct NewTenant {
    pub name: String,
    pub subdomain: String,
    pub plan: SubscriptionPlan,
    pub limits: PlanLimits,
}

/// Usage counters for a tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantStats {
    pub total_users: i64,
    pub total_projects: i64,
    pub total_tasks: i64,
}
