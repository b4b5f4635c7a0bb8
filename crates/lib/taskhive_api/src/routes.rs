//! Route paths.

pub const HEALTH: &str = "/api/health";

pub const AUTH_REGISTER_TENANT: &str = "/api/auth/register-tenant";
pub const AUTH_LOGIN: &str = "/api/auth/login";
pub const AUTH_ME: &str = "/api/auth/me";
pub const AUTH_LOGOUT: &str = "/api/auth/logout";

pub const TENANT: &str = "/api/tenants/{tenantId}";
pub const TENANT_USERS: &str = "/api/tenants/{tenantId}/users";
pub const TENANT_PROJECTS: &str = "/api/tenants/{tenantId}/projects";

pub const USER: &str = "/api/users/{userId}";

pub const PROJECT: &str = "/api/projects/{projectId}";
pub const PROJECT_TASKS: &str = "/api/projects/{projectId}/tasks";

pub const TASK: &str = "/api/tasks/{taskId}";
