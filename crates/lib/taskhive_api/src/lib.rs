//! # taskhive_api
//!
//! HTTP API library for Taskhive.

pub mod config;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use taskhive_core::Services;
use taskhive_core::audit::AuditLogger;
use taskhive_core::auth::{AuthSettings, BcryptHasher, CredentialHasher, Hs256TokenIssuer};
use taskhive_core::store::Store;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{auth, health, projects, tasks, tenants, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Domain services wired to the store.
    pub services: Services,
    /// Backing store, kept for the health check.
    pub store: Arc<dyn Store>,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    /// Wire services around `store`, which also receives audit entries.
    pub fn new<S>(store: Arc<S>, config: ApiConfig) -> Self
    where
        S: Store + AuditLogger + 'static,
    {
        Self::with_hasher(store, config, Arc::new(BcryptHasher::default()))
    }

    /// Like [`AppState::new`] with an explicit credential hasher.
    pub fn with_hasher<S>(store: Arc<S>, config: ApiConfig, hasher: Arc<dyn CredentialHasher>) -> Self
    where
        S: Store + AuditLogger + 'static,
    {
        let tokens = Arc::new(Hs256TokenIssuer::new(config.jwt_secret.as_bytes()));
        let settings = AuthSettings {
            token_ttl_secs: config.token_ttl_secs,
            ..AuthSettings::default()
        };
        let audit: Arc<dyn AuditLogger> = store.clone();
        let store: Arc<dyn Store> = store;
        let services = Services::new(store.clone(), audit, hasher, tokens, settings);
        Self {
            services,
            store,
            config,
        }
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::HEALTH, get(health::health_handler))
        .route(routes::AUTH_REGISTER_TENANT, post(auth::register_tenant_handler))
        .route(routes::AUTH_LOGIN, post(auth::login_handler));

    // Logout works with or without a valid token
    let optional = Router::new()
        .route(routes::AUTH_LOGOUT, post(auth::logout_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::optional_auth,
        ));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(routes::AUTH_ME, get(auth::me_handler))
        .route(routes::TENANT, get(tenants::get_tenant_handler))
        .route(
            routes::TENANT_USERS,
            post(tenants::add_user_handler).get(tenants::list_users_handler),
        )
        .route(
            routes::USER,
            put(users::update_user_handler).delete(users::delete_user_handler),
        )
        .route(
            routes::TENANT_PROJECTS,
            post(projects::create_project_handler).get(projects::list_projects_handler),
        )
        .route(
            routes::PROJECT,
            get(projects::get_project_handler)
                .put(projects::update_project_handler)
                .delete(projects::delete_project_handler),
        )
        .route(
            routes::PROJECT_TASKS,
            post(tasks::create_task_handler).get(tasks::list_tasks_handler),
        )
        .route(
            routes::TASK,
            get(tasks::get_task_handler)
                .put(tasks::update_task_handler)
                .delete(tasks::delete_task_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(optional)
        .merge(protected)
        .fallback(handlers::fallback_handler)
        .layer(cors)
        .with_state(state)
}
