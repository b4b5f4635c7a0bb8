//! Tenant-scoped project operations.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::audit::{self, AuditEntry, AuditLogger};
use crate::error::{CoreError, CoreResult, FieldErrors};
use crate::identity::Caller;
use crate::models::{
    AuditAction, AuditEntity, NewProject, Page, Paged, Project, ProjectChanges, ProjectStatus,
};
use crate::scope::tenant_of;
use crate::store::Store;
use crate::validation;

/// Client fields for a new project. The owning tenant always comes from the
/// caller; any tenant id a client sends is dropped before this point.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
}

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn Store>,
    audit: Arc<dyn AuditLogger>,
}

impl ProjectService {
    pub fn new(store: Arc<dyn Store>, audit: Arc<dyn AuditLogger>) -> Self {
        Self { store, audit }
    }

    pub async fn create(&self, caller: &Caller, input: CreateProject) -> CoreResult<Project> {
        let ctx = tenant_of(self.store.as_ref(), caller).await?;

        let mut errors = FieldErrors::new();
        validation::require(&mut errors, "name", &input.name);
        errors.into_result()?;

        let existing = self.store.count_projects(ctx.tenant_id()).await?;
        if existing >= i64::from(ctx.tenant.max_projects) {
            return Err(CoreError::Forbidden(
                "Project limit reached for subscription plan".into(),
            ));
        }

        let project = self
            .store
            .insert_project(NewProject {
                tenant_id: ctx.tenant_id(),
                name: input.name.trim().to_string(),
                description: input.description,
                status: input.status.unwrap_or_default(),
            })
            .await?;

        audit::record(
            self.audit.as_ref(),
            AuditEntry::by(caller, AuditAction::CreateProject, AuditEntity::Project)
                .entity(project.id),
        )
        .await;
        info!(tenant_id = %project.tenant_id, project_id = %project.id, "project created");
        Ok(project)
    }

    pub async fn get(&self, caller: &Caller, id: Uuid) -> CoreResult<Project> {
        let ctx = tenant_of(self.store.as_ref(), caller).await?;
        self.store
            .project(ctx.tenant_id(), id)
            .await?
            .ok_or_else(|| CoreError::not_found("Project"))
    }

    /// Projects of the caller's tenant in creation order.
    pub async fn list(&self, caller: &Caller, page: Page) -> CoreResult<Paged<Project>> {
        let ctx = tenant_of(self.store.as_ref(), caller).await?;
        Ok(self.store.list_projects(ctx.tenant_id(), page).await?)
    }

    pub async fn update(
        &self,
        caller: &Caller,
        id: Uuid,
        mut changes: ProjectChanges,
    ) -> CoreResult<Project> {
        let ctx = tenant_of(self.store.as_ref(), caller).await?;
        if let Some(name) = &changes.name {
            if name.trim().is_empty() {
                return Err(CoreError::invalid_field("name", "Required"));
            }
            changes.name = Some(name.trim().to_string());
        }

        let project = self
            .store
            .update_project(ctx.tenant_id(), id, changes)
            .await?
            .ok_or_else(|| CoreError::not_found("Project"))?;

        audit::record(
            self.audit.as_ref(),
            AuditEntry::by(caller, AuditAction::UpdateProject, AuditEntity::Project)
                .entity(project.id),
        )
        .await;
        Ok(project)
    }

    /// Delete a project together with all of its tasks.
    pub async fn delete(&self, caller: &Caller, id: Uuid) -> CoreResult<()> {
        let ctx = tenant_of(self.store.as_ref(), caller).await?;
        if !self.store.delete_project(ctx.tenant_id(), id).await? {
            return Err(CoreError::not_found("Project"));
        }

        audit::record(
            self.audit.as_ref(),
            AuditEntry::by(caller, AuditAction::DeleteProject, AuditEntity::Project).entity(id),
        )
        .await;
        info!(tenant_id = %ctx.tenant_id(), project_id = %id, "project deleted");
        Ok(())
    }
}
