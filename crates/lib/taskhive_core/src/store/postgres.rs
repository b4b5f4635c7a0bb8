//! PostgreSQL store.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{ProjectStore, StoreError, StoreResult, TaskStore, TenantStore, UserStore};
use crate::audit::AuditLogger;
use crate::identity::TenantScope;
use crate::models::{
    AuditEntry, NewProject, NewTask, NewTenant, NewUser, Page, Paged, Project, ProjectChanges,
    Task, TaskChanges, TaskFilter, Tenant, TenantStats, TenantStatus, User, UserChanges,
};

macro_rules! tenant_columns {
    () => {
        "id, name, subdomain, status, subscription_plan, max_users, max_projects, created_at, updated_at"
    };
}

macro_rules! user_columns {
    () => {
        "id, email, password_hash, full_name, role, tenant_id, is_active, created_at, updated_at"
    };
}

macro_rules! project_columns {
    () => {
        "id, tenant_id, name, description, status, created_at, updated_at"
    };
}

macro_rules! task_columns {
    () => {
        "t.id, t.project_id, t.title, t.description, t.status, t.priority, t.created_at, t.updated_at"
    };
}

/// Map unique violations onto [`StoreError::UniqueViolation`] by constraint name.
fn classify(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e
        && db.is_unique_violation()
    {
        let what = match db.constraint() {
            Some(c) if c.starts_with("tenants_subdomain") => "Subdomain",
            Some(c) if c.starts_with("users_email") => "Email",
            _ => "Record",
        };
        return StoreError::UniqueViolation(what.into());
    }
    StoreError::Database(e)
}

fn limit_offset(page: Page) -> (i64, i64) {
    (
        i64::from(page.limit),
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    )
}

fn paged<T>(items: Vec<T>, total: i64, page: Page) -> Paged<T> {
    Paged::new(items, u64::try_from(total).unwrap_or(0), page)
}

/// Store backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run the embedded migrations from `taskhive_core/migrations/`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl TenantStore for PgStore {
    async fn create_tenant_with_admin(
        &self,
        tenant: NewTenant,
        admin: NewUser,
    ) -> StoreResult<(Tenant, User)> {
        let mut tx = self.pool.begin().await?;

        let tenant = sqlx::query_as::<_, Tenant>(concat!(
            "INSERT INTO tenants (id, name, subdomain, status, subscription_plan, max_users, max_projects) \
             VALUES ($1, $2, $3, 'active', $4, $5, $6) RETURNING ",
            tenant_columns!()
        ))
        .bind(Uuid::now_v7())
        .bind(&tenant.name)
        .bind(&tenant.subdomain)
        .bind(tenant.plan)
        .bind(tenant.limits.max_users)
        .bind(tenant.limits.max_projects)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

        let user = sqlx::query_as::<_, User>(concat!(
            "INSERT INTO users (id, email, password_hash, full_name, role, tenant_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING ",
            user_columns!()
        ))
        .bind(Uuid::now_v7())
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(&admin.full_name)
        .bind(admin.role)
        .bind(tenant.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

        tx.commit().await?;
        debug!(tenant_id = %tenant.id, user_id = %user.id, "tenant and admin inserted");
        Ok((tenant, user))
    }

    async fn tenant_by_id(&self, id: Uuid) -> StoreResult<Option<Tenant>> {
        let row = sqlx::query_as::<_, Tenant>(concat!(
            "SELECT ",
            tenant_columns!(),
            " FROM tenants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn tenant_by_subdomain(&self, subdomain: &str) -> StoreResult<Option<Tenant>> {
        let row = sqlx::query_as::<_, Tenant>(concat!(
            "SELECT ",
            tenant_columns!(),
            " FROM tenants WHERE subdomain = $1"
        ))
        .bind(subdomain)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn set_tenant_status(
        &self,
        id: Uuid,
        status: TenantStatus,
    ) -> StoreResult<Option<Tenant>> {
        let row = sqlx::query_as::<_, Tenant>(concat!(
            "UPDATE tenants SET status = $2, updated_at = now() WHERE id = $1 RETURNING ",
            tenant_columns!()
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn tenant_stats(&self, id: Uuid) -> StoreResult<TenantStats> {
        let (total_users, total_projects, total_tasks) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users WHERE tenant_id = $1),
                (SELECT COUNT(*) FROM projects WHERE tenant_id = $1),
                (SELECT COUNT(*) FROM tasks t JOIN projects p ON p.id = t.project_id
                  WHERE p.tenant_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(TenantStats {
            total_users,
            total_projects,
            total_tasks,
        })
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(concat!(
            "INSERT INTO users (id, email, password_hash, full_name, role, tenant_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING ",
            user_columns!()
        ))
        .bind(Uuid::now_v7())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role)
        .bind(user.tenant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn user_by_email(&self, email: &str, scope: TenantScope) -> StoreResult<Option<User>> {
        let query = match scope {
            TenantScope::WithTenant(tenant_id) => sqlx::query_as::<_, User>(concat!(
                "SELECT ",
                user_columns!(),
                " FROM users WHERE email = $1 AND tenant_id = $2"
            ))
            .bind(email)
            .bind(tenant_id),
            TenantScope::NoTenant => sqlx::query_as::<_, User>(concat!(
                "SELECT ",
                user_columns!(),
                " FROM users WHERE email = $1 AND tenant_id IS NULL"
            ))
            .bind(email),
        };
        Ok(query.fetch_optional(&self.pool).await?)
    }

    async fn super_admin_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE email = $1 AND role = 'super_admin' LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn email_bound_to_tenant(&self, email: &str) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND tenant_id IS NOT NULL)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list_users(&self, tenant_id: Uuid, page: Page) -> StoreResult<Paged<User>> {
        let total = self.count_users(tenant_id).await?;
        let (limit, offset) = limit_offset(page);
        let rows = sqlx::query_as::<_, User>(concat!(
            "SELECT ",
            user_columns!(),
            " FROM users WHERE tenant_id = $1 ORDER BY created_at, id LIMIT $2 OFFSET $3"
        ))
        .bind(tenant_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(paged(rows, total, page))
    }

    async fn count_users(&self, tenant_id: Uuid) -> StoreResult<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn update_user(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: UserChanges,
    ) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(concat!(
            "UPDATE users SET \
               full_name = COALESCE($3, full_name), \
               role = COALESCE($4, role), \
               is_active = COALESCE($5, is_active), \
               updated_at = now() \
             WHERE id = $1 AND tenant_id = $2 RETURNING ",
            user_columns!()
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(changes.full_name)
        .bind(changes.role)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_user(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn insert_project(&self, project: NewProject) -> StoreResult<Project> {
        sqlx::query_as::<_, Project>(concat!(
            "INSERT INTO projects (id, tenant_id, name, description, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING ",
            project_columns!()
        ))
        .bind(Uuid::now_v7())
        .bind(project.tenant_id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.status)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn project(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Project>> {
        let row = sqlx::query_as::<_, Project>(concat!(
            "SELECT ",
            project_columns!(),
            " FROM projects WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_projects(&self, tenant_id: Uuid, page: Page) -> StoreResult<Paged<Project>> {
        let total = self.count_projects(tenant_id).await?;
        let (limit, offset) = limit_offset(page);
        let rows = sqlx::query_as::<_, Project>(concat!(
            "SELECT ",
            project_columns!(),
            " FROM projects WHERE tenant_id = $1 ORDER BY created_at, id LIMIT $2 OFFSET $3"
        ))
        .bind(tenant_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(paged(rows, total, page))
    }

    async fn count_projects(&self, tenant_id: Uuid) -> StoreResult<i64> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM projects WHERE tenant_id = $1")
                .bind(tenant_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(total)
    }

    async fn update_project(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: ProjectChanges,
    ) -> StoreResult<Option<Project>> {
        let row = sqlx::query_as::<_, Project>(concat!(
            "UPDATE projects SET \
               name = COALESCE($3, name), \
               description = CASE WHEN $4 THEN $5 ELSE description END, \
               status = COALESCE($6, status), \
               updated_at = now() \
             WHERE id = $1 AND tenant_id = $2 RETURNING ",
            project_columns!()
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(changes.name)
        .bind(changes.description.is_some())
        .bind(changes.description.flatten())
        .bind(changes.status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_project(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<bool> {
        // tasks go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, task: NewTask) -> StoreResult<Task> {
        sqlx::query_as::<_, Task>(concat!(
            "INSERT INTO tasks AS t (id, project_id, title, description, status, priority) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING ",
            task_columns!()
        ))
        .bind(Uuid::now_v7())
        .bind(task.project_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn task(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Task>> {
        let row = sqlx::query_as::<_, Task>(concat!(
            "SELECT ",
            task_columns!(),
            " FROM tasks t JOIN projects p ON p.id = t.project_id \
              WHERE t.id = $1 AND p.tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_tasks(
        &self,
        tenant_id: Uuid,
        project_id: Uuid,
        filter: TaskFilter,
        page: Page,
    ) -> StoreResult<Paged<Task>> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM tasks t JOIN projects p ON p.id = t.project_id
            WHERE p.tenant_id = $1 AND t.project_id = $2
              AND ($3::task_status IS NULL OR t.status = $3)
              AND ($4::task_priority IS NULL OR t.priority = $4)
            "#,
        )
        .bind(tenant_id)
        .bind(project_id)
        .bind(filter.status)
        .bind(filter.priority)
        .fetch_one(&self.pool)
        .await?;

        let (limit, offset) = limit_offset(page);
        let rows = sqlx::query_as::<_, Task>(concat!(
            "SELECT ",
            task_columns!(),
            " FROM tasks t JOIN projects p ON p.id = t.project_id \
              WHERE p.tenant_id = $1 AND t.project_id = $2 \
                AND ($3::task_status IS NULL OR t.status = $3) \
                AND ($4::task_priority IS NULL OR t.priority = $4) \
              ORDER BY t.created_at, t.id LIMIT $5 OFFSET $6"
        ))
        .bind(tenant_id)
        .bind(project_id)
        .bind(filter.status)
        .bind(filter.priority)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(paged(rows, total, page))
    }

    async fn update_task(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: TaskChanges,
    ) -> StoreResult<Option<Task>> {
        let row = sqlx::query_as::<_, Task>(concat!(
            "UPDATE tasks t SET \
               title = COALESCE($3, t.title), \
               description = CASE WHEN $4 THEN $5 ELSE t.description END, \
               status = COALESCE($6, t.status), \
               priority = COALESCE($7, t.priority), \
               updated_at = now() \
             FROM projects p \
             WHERE t.id = $1 AND p.id = t.project_id AND p.tenant_id = $2 RETURNING ",
            task_columns!()
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(changes.title)
        .bind(changes.description.is_some())
        .bind(changes.description.flatten())
        .bind(changes.status)
        .bind(changes.priority)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_task(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "DELETE FROM tasks t USING projects p \
             WHERE t.id = $1 AND p.id = t.project_id AND p.tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AuditLogger for PgStore {
    async fn append(&self, entry: AuditEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, tenant_id, user_id, action, entity_type, entity_id, ip_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(entry.tenant_id)
        .bind(entry.user_id)
        .bind(entry.action.as_str())
        .bind(entry.entity_type.as_str())
        .bind(entry.entity_id)
        .bind(entry.ip_address)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
