//! Tenant-scoped task operations.
//!
//! Tasks have no tenant column; ownership is always checked through the
//! parent project.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::audit::{self, AuditEntry, AuditLogger};
use crate::error::{CoreError, CoreResult, FieldErrors};
use crate::identity::Caller;
use crate::models::{
    AuditAction, AuditEntity, NewTask, Page, Paged, Task, TaskChanges, TaskFilter, TaskPriority,
    TaskStatus,
};
use crate::scope::{TenantContext, tenant_of};
use crate::store::Store;
use crate::validation;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn Store>,
    audit: Arc<dyn AuditLogger>,
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>, audit: Arc<dyn AuditLogger>) -> Self {
        Self { store, audit }
    }

    async fn require_project(&self, ctx: &TenantContext, project_id: Uuid) -> CoreResult<()> {
        match self.store.project(ctx.tenant_id(), project_id).await? {
            Some(_) => Ok(()),
            None => Err(CoreError::not_found("Project")),
        }
    }

    pub async fn create(
        &self,
        caller: &Caller,
        project_id: Uuid,
        input: CreateTask,
    ) -> CoreResult<Task> {
        let ctx = tenant_of(self.store.as_ref(), caller).await?;

        let mut errors = FieldErrors::new();
        validation::require(&mut errors, "title", &input.title);
        errors.into_result()?;

        self.require_project(&ctx, project_id).await?;

        let task = self
            .store
            .insert_task(NewTask {
                project_id,
                title: input.title.trim().to_string(),
                description: input.description,
                status: input.status.unwrap_or_default(),
                priority: input.priority.unwrap_or_default(),
            })
            .await?;

        audit::record(
            self.audit.as_ref(),
            AuditEntry::by(caller, AuditAction::CreateTask, AuditEntity::Task).entity(task.id),
        )
        .await;
        Ok(task)
    }

    pub async fn get(&self, caller: &Caller, id: Uuid) -> CoreResult<Task> {
        let ctx = tenant_of(self.store.as_ref(), caller).await?;
        self.store
            .task(ctx.tenant_id(), id)
            .await?
            .ok_or_else(|| CoreError::not_found("Task"))
    }

    /// Tasks of one in-tenant project, in creation order.
    pub async fn list(
        &self,
        caller: &Caller,
        project_id: Uuid,
        filter: TaskFilter,
        page: Page,
    ) -> CoreResult<Paged<Task>> {
        let ctx = tenant_of(self.store.as_ref(), caller).await?;
        self.require_project(&ctx, project_id).await?;
        Ok(self
            .store
            .list_tasks(ctx.tenant_id(), project_id, filter, page)
            .await?)
    }

    /// Apply field-level changes. Any status may be set from any other.
    pub async fn update(
        &self,
        caller: &Caller,
        id: Uuid,
        mut changes: TaskChanges,
    ) -> CoreResult<Task> {
        let ctx = tenant_of(self.store.as_ref(), caller).await?;
        if let Some(title) = &changes.title {
            if title.trim().is_empty() {
                return Err(CoreError::invalid_field("title", "Required"));
            }
            changes.title = Some(title.trim().to_string());
        }

        let task = self
            .store
            .update_task(ctx.tenant_id(), id, changes)
            .await?
            .ok_or_else(|| CoreError::not_found("Task"))?;

        audit::record(
            self.audit.as_ref(),
            AuditEntry::by(caller, AuditAction::UpdateTask, AuditEntity::Task).entity(task.id),
        )
        .await;
        Ok(task)
    }

    pub async fn delete(&self, caller: &Caller, id: Uuid) -> CoreResult<()> {
        let ctx = tenant_of(self.store.as_ref(), caller).await?;
        if !self.store.delete_task(ctx.tenant_id(), id).await? {
            return Err(CoreError::not_found("Task"));
        }
        audit::record(
            self.audit.as_ref(),
            AuditEntry::by(caller, AuditAction::DeleteTask, AuditEntity::Task).entity(id),
        )
        .await;
        Ok(())
    }
}
