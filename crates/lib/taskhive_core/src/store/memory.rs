//! In-memory store.
//!
//! Enforces the same unique constraints and cascades as the Postgres schema.
//! Each trait call takes the lock once, so multi-row writes are atomic.
//! The audit trail is a ring buffer: once full, the oldest entry is dropped.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ProjectStore, StoreError, StoreResult, TaskStore, TenantStore, UserStore};
use crate::audit::AuditLogger;
use crate::identity::TenantScope;
use crate::models::{
    AuditEntry, AuditRecord, NewProject, NewTask, NewTenant, NewUser, Page, Paged, Project,
    ProjectChanges, Role, Task, TaskChanges, TaskFilter, Tenant, TenantStats, TenantStatus, User,
    UserChanges,
};

#[derive(Debug, Default)]
struct Tables {
    tenants: Vec<Tenant>,
    users: Vec<User>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    audit: VecDeque<AuditRecord>,
}

impl Tables {
    fn email_taken(&self, email: &str, tenant_id: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.email == email && u.tenant_id == tenant_id)
    }

    fn owns_project(&self, tenant_id: Uuid, project_id: Uuid) -> bool {
        self.projects
            .iter()
            .any(|p| p.id == project_id && p.tenant_id == tenant_id)
    }

    fn task_in_tenant(&self, tenant_id: Uuid, task: &Task) -> bool {
        self.owns_project(tenant_id, task.project_id)
    }

    fn insert_user(&mut self, user: NewUser) -> StoreResult<User> {
        if self.email_taken(&user.email, user.tenant_id) {
            return Err(StoreError::UniqueViolation("Email".into()));
        }
        let now = Utc::now();
        let row = User {
            id: Uuid::now_v7(),
            email: user.email,
            password_hash: user.password_hash,
            full_name: user.full_name,
            role: user.role,
            tenant_id: user.tenant_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.users.push(row.clone());
        Ok(row)
    }
}

/// Audit entries kept by [`MemoryStore::new`].
pub const DEFAULT_AUDIT_CAPACITY: usize = 10_000;

/// Store backed by process memory. Cloning shares the underlying tables.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    audit_capacity: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_audit_capacity(DEFAULT_AUDIT_CAPACITY)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` audit entries (minimum one).
    pub fn with_audit_capacity(capacity: usize) -> Self {
        Self {
            tables: Arc::default(),
            audit_capacity: capacity.max(1),
        }
    }

    /// Snapshot of the retained audit entries, oldest first.
    pub async fn audit_entries(&self) -> Vec<AuditRecord> {
        self.tables.read().await.audit.iter().cloned().collect()
    }

    pub async fn tenant_count(&self) -> usize {
        self.tables.read().await.tenants.len()
    }

    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    /// Total tasks across all tenants.
    pub async fn task_count(&self) -> usize {
        self.tables.read().await.tasks.len()
    }
}

#[async_trait]
impl TenantStore for MemoryStore {
    async fn create_tenant_with_admin(
        &self,
        tenant: NewTenant,
        admin: NewUser,
    ) -> StoreResult<(Tenant, User)> {
        let mut t = self.tables.write().await;
        if t.tenants.iter().any(|x| x.subdomain == tenant.subdomain) {
            return Err(StoreError::UniqueViolation("Subdomain".into()));
        }
        let now = Utc::now();
        let row = Tenant {
            id: Uuid::now_v7(),
            name: tenant.name,
            subdomain: tenant.subdomain,
            status: TenantStatus::Active,
            subscription_plan: tenant.plan,
            max_users: tenant.limits.max_users,
            max_projects: tenant.limits.max_projects,
            created_at: now,
            updated_at: now,
        };
        // New tenant, so the admin's email cannot collide.
        let user = t.insert_user(NewUser {
            tenant_id: Some(row.id),
            ..admin
        })?;
        t.tenants.push(row.clone());
        Ok((row, user))
    }

    async fn tenant_by_id(&self, id: Uuid) -> StoreResult<Option<Tenant>> {
        let t = self.tables.read().await;
        Ok(t.tenants.iter().find(|x| x.id == id).cloned())
    }

    async fn tenant_by_subdomain(&self, subdomain: &str) -> StoreResult<Option<Tenant>> {
        let t = self.tables.read().await;
        Ok(t.tenants.iter().find(|x| x.subdomain == subdomain).cloned())
    }

    async fn set_tenant_status(
        &self,
        id: Uuid,
        status: TenantStatus,
    ) -> StoreResult<Option<Tenant>> {
        let mut t = self.tables.write().await;
        Ok(t.tenants.iter_mut().find(|x| x.id == id).map(|tenant| {
            tenant.status = status;
            tenant.updated_at = Utc::now();
            tenant.clone()
        }))
    }

    async fn tenant_stats(&self, id: Uuid) -> StoreResult<TenantStats> {
        let t = self.tables.read().await;
        let project_ids: Vec<Uuid> = t
            .projects
            .iter()
            .filter(|p| p.tenant_id == id)
            .map(|p| p.id)
            .collect();
        Ok(TenantStats {
            total_users: t.users.iter().filter(|u| u.tenant_id == Some(id)).count() as i64,
            total_projects: project_ids.len() as i64,
            total_tasks: t
                .tasks
                .iter()
                .filter(|task| project_ids.contains(&task.project_id))
                .count() as i64,
        })
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        if let Some(tenant_id) = user.tenant_id
            && !t.tenants.iter().any(|x| x.id == tenant_id)
        {
            return Err(StoreError::Backend(format!("unknown tenant {tenant_id}")));
        }
        t.insert_user(user)
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_email(&self, email: &str, scope: TenantScope) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t
            .users
            .iter()
            .find(|u| u.email == email && scope.matches(u.tenant_id))
            .cloned())
    }

    async fn super_admin_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t
            .users
            .iter()
            .find(|u| u.email == email && u.role == Role::SuperAdmin)
            .cloned())
    }

    async fn email_bound_to_tenant(&self, email: &str) -> StoreResult<bool> {
        let t = self.tables.read().await;
        Ok(t
            .users
            .iter()
            .any(|u| u.email == email && u.tenant_id.is_some()))
    }

    async fn list_users(&self, tenant_id: Uuid, page: Page) -> StoreResult<Paged<User>> {
        let t = self.tables.read().await;
        let users: Vec<User> = t
            .users
            .iter()
            .filter(|u| u.tenant_id == Some(tenant_id))
            .cloned()
            .collect();
        Ok(page.apply(users))
    }

    async fn count_users(&self, tenant_id: Uuid) -> StoreResult<i64> {
        let t = self.tables.read().await;
        Ok(t.users.iter().filter(|u| u.tenant_id == Some(tenant_id)).count() as i64)
    }

    async fn update_user(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: UserChanges,
    ) -> StoreResult<Option<User>> {
        let mut t = self.tables.write().await;
        let Some(user) = t
            .users
            .iter_mut()
            .find(|u| u.id == id && u.tenant_id == Some(tenant_id))
        else {
            return Ok(None);
        };
        if let Some(full_name) = changes.full_name {
            user.full_name = full_name;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let before = t.users.len();
        t.users
            .retain(|u| !(u.id == id && u.tenant_id == Some(tenant_id)));
        Ok(t.users.len() != before)
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn insert_project(&self, project: NewProject) -> StoreResult<Project> {
        let mut t = self.tables.write().await;
        if !t.tenants.iter().any(|x| x.id == project.tenant_id) {
            return Err(StoreError::Backend(format!(
                "unknown tenant {}",
                project.tenant_id
            )));
        }
        let now = Utc::now();
        let row = Project {
            id: Uuid::now_v7(),
            tenant_id: project.tenant_id,
            name: project.name,
            description: project.description,
            status: project.status,
            created_at: now,
            updated_at: now,
        };
        t.projects.push(row.clone());
        Ok(row)
    }

    async fn project(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Project>> {
        let t = self.tables.read().await;
        Ok(t
            .projects
            .iter()
            .find(|p| p.id == id && p.tenant_id == tenant_id)
            .cloned())
    }

    async fn list_projects(&self, tenant_id: Uuid, page: Page) -> StoreResult<Paged<Project>> {
        let t = self.tables.read().await;
        let projects: Vec<Project> = t
            .projects
            .iter()
            .filter(|p| p.tenant_id == tenant_id)
            .cloned()
            .collect();
        Ok(page.apply(projects))
    }

    async fn count_projects(&self, tenant_id: Uuid) -> StoreResult<i64> {
        let t = self.tables.read().await;
        Ok(t.projects.iter().filter(|p| p.tenant_id == tenant_id).count() as i64)
    }

    async fn update_project(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: ProjectChanges,
    ) -> StoreResult<Option<Project>> {
        let mut t = self.tables.write().await;
        let Some(project) = t
            .projects
            .iter_mut()
            .find(|p| p.id == id && p.tenant_id == tenant_id)
        else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            project.name = name;
        }
        if let Some(description) = changes.description {
            project.description = description;
        }
        if let Some(status) = changes.status {
            project.status = status;
        }
        project.updated_at = Utc::now();
        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        if !t.owns_project(tenant_id, id) {
            return Ok(false);
        }
        t.tasks.retain(|task| task.project_id != id);
        t.projects.retain(|p| p.id != id);
        Ok(true)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: NewTask) -> StoreResult<Task> {
        let mut t = self.tables.write().await;
        if !t.projects.iter().any(|p| p.id == task.project_id) {
            return Err(StoreError::Backend(format!(
                "unknown project {}",
                task.project_id
            )));
        }
        let now = Utc::now();
        let row = Task {
            id: Uuid::now_v7(),
            project_id: task.project_id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            created_at: now,
            updated_at: now,
        };
        t.tasks.push(row.clone());
        Ok(row)
    }

    async fn task(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Task>> {
        let t = self.tables.read().await;
        Ok(t
            .tasks
            .iter()
            .find(|task| task.id == id && t.task_in_tenant(tenant_id, task))
            .cloned())
    }

    async fn list_tasks(
        &self,
        tenant_id: Uuid,
        project_id: Uuid,
        filter: TaskFilter,
        page: Page,
    ) -> StoreResult<Paged<Task>> {
        let t = self.tables.read().await;
        if !t.owns_project(tenant_id, project_id) {
            return Ok(page.apply(Vec::new()));
        }
        let tasks: Vec<Task> = t
            .tasks
            .iter()
            .filter(|task| task.project_id == project_id && filter.matches(task))
            .cloned()
            .collect();
        Ok(page.apply(tasks))
    }

    async fn update_task(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: TaskChanges,
    ) -> StoreResult<Option<Task>> {
        let mut guard = self.tables.write().await;
        let t = &mut *guard;
        let owned: Vec<Uuid> = t
            .projects
            .iter()
            .filter(|p| p.tenant_id == tenant_id)
            .map(|p| p.id)
            .collect();
        let Some(task) = t
            .tasks
            .iter_mut()
            .find(|task| task.id == id && owned.contains(&task.project_id))
        else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(description) = changes.description {
            task.description = description;
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        if let Some(priority) = changes.priority {
            task.priority = priority;
        }
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let Some(index) = t
            .tasks
            .iter()
            .position(|task| task.id == id && t.task_in_tenant(tenant_id, task))
        else {
            return Ok(false);
        };
        t.tasks.remove(index);
        Ok(true)
    }
}

#[async_trait]
impl AuditLogger for MemoryStore {
    async fn append(&self, entry: AuditEntry) -> Result<(), StoreError> {
        let mut t = self.tables.write().await;
        if t.audit.len() >= self.audit_capacity {
            t.audit.pop_front();
        }
        t.audit.push_back(AuditRecord::from_entry(entry));
        Ok(())
    }
}
