//! End-to-end HTTP tests: build the router over an in-memory store and drive
//! it with `oneshot`.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use taskhive_api::{AppState, config::ApiConfig};
use taskhive_core::auth::{BcryptHasher, Hs256TokenIssuer, TokenIssuer};
use taskhive_core::models::{AuditAction, Role};
use taskhive_core::store::MemoryStore;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test-secret";

fn app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        database_url: None,
        jwt_secret: SECRET.into(),
        token_ttl_secs: 3600,
    };
    let state = AppState::with_hasher(store.clone(), config, Arc::new(BcryptHasher::with_cost(4)));
    (taskhive_api::router(state), store)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("parse JSON")
    };
    (status, json)
}

async fn register(app: &Router, subdomain: &str, email: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register-tenant",
        None,
        Some(json!({
            "tenantName": format!("{subdomain} Inc"),
            "subdomain": subdomain,
            "adminEmail": email,
            "adminPassword": "password123",
            "adminFullName": "Admin",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

async fn login(app: &Router, email: &str, subdomain: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "password123", "subdomain": subdomain })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["token"].as_str().expect("token").to_string()
}

fn id_of(value: &Value) -> &str {
    value["id"].as_str().expect("id")
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = app();
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["storeConnected"], true);
}

#[tokio::test]
async fn tenant_isolation_scenario() {
    let (app, _) = app();

    let acme = register(&app, "acme", "a@acme.com").await;
    assert_eq!(acme["maxProjects"], 3);
    assert_eq!(acme["maxUsers"], 5);
    assert_eq!(acme["adminUser"]["role"], "tenant_admin");
    let acme_id = acme["tenantId"].as_str().unwrap().to_string();

    let token = login(&app, "a@acme.com", "acme").await;
    let claims = Hs256TokenIssuer::new(SECRET.as_bytes())
        .verify(&token)
        .unwrap();
    assert_eq!(claims.tenant_id, Some(Uuid::parse_str(&acme_id).unwrap()));
    assert_eq!(claims.role, Role::TenantAdmin);

    // A tenant id smuggled in the body is ignored.
    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/tenants/{acme_id}/projects"),
        Some(token.as_str()),
        Some(json!({ "name": "P1", "tenantId": Uuid::now_v7() })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["tenantId"], acme_id.as_str());
    let project_id = id_of(&body["data"]).to_string();

    register(&app, "globex", "g@globex.com").await;
    let other = login(&app, "g@globex.com", "globex").await;

    let (status, body) = send(&app, "GET", &format!("/api/projects/{project_id}"), Some(other.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/projects/{project_id}"),
        Some(other.as_str()),
        Some(json!({ "name": "stolen" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/api/projects/{project_id}"), Some(other.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "GET", &format!("/api/projects/{project_id}"), Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "P1");
}

#[tokio::test]
async fn foreign_tenant_path_is_forbidden() {
    let (app, _) = app();
    register(&app, "acme", "a@acme.com").await;
    let globex = register(&app, "globex", "g@globex.com").await;
    let token = login(&app, "a@acme.com", "acme").await;
    let globex_id = globex["tenantId"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/tenants/{globex_id}/projects"),
        Some(token.as_str()),
        Some(json!({ "name": "P1" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied to this tenant");

    let (status, _) = send(&app, "GET", &format!("/api/tenants/{globex_id}/projects"), Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "GET", &format!("/api/tenants/{globex_id}"), Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn registration_validation_and_conflict() {
    let (app, store) = app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register-tenant",
        None,
        Some(json!({ "tenantName": "Acme", "subdomain": "bad sub", "adminEmail": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid input");
    let fields = body["data"]["fieldErrors"].as_object().unwrap();
    for field in ["subdomain", "adminEmail", "adminPassword", "adminFullName"] {
        assert!(fields.contains_key(field), "missing {field}");
    }
    assert!(!fields.contains_key("tenantName"));
    assert_eq!(store.tenant_count().await, 0);

    register(&app, "acme", "a@acme.com").await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register-tenant",
        None,
        Some(json!({
            "tenantName": "Other",
            "subdomain": "acme",
            "adminEmail": "b@acme.com",
            "adminPassword": "password123",
            "adminFullName": "Bob",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Subdomain already exists");
    assert_eq!(store.tenant_count().await, 1);
}

#[tokio::test]
async fn login_failures() {
    let (app, _) = app();
    register(&app, "acme", "a@acme.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "a@acme.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "TENANT_REQUIRED");

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "a@acme.com", "password": "wrong-password", "subdomain": "acme" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");
    assert!(body.get("code").is_none());

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "a@acme.com", "password": "password123", "subdomain": "nowhere" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Tenant not found");
}

#[tokio::test]
async fn login_accepts_tenant_subdomain_field() {
    let (app, _) = app();
    let acme = register(&app, "acme", "a@acme.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "a@acme.com", "password": "password123", "tenantSubdomain": "acme" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["user"]["tenant"]["id"], acme["tenantId"]);
}

#[tokio::test]
async fn login_returns_profile_and_expiry() {
    let (app, _) = app();
    let acme = register(&app, "acme", "a@acme.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "A@Acme.com", "password": "password123", "tenantId": acme["tenantId"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let data = &body["data"];
    assert_eq!(data["expiresIn"], 3600);
    assert_eq!(data["user"]["email"], "a@acme.com");
    assert_eq!(data["user"]["tenant"]["subdomain"], "acme");
    assert!(data["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let (app, _) = app();

    let (status, body) = send(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, "GET", "/api/auth/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = Hs256TokenIssuer::new(b"some-other-secret")
        .issue(
            &taskhive_core::Principal {
                user_id: Uuid::now_v7(),
                tenant_id: None,
                role: Role::SuperAdmin,
            },
            3600,
        )
        .unwrap();
    let (status, _) = send(&app, "GET", "/api/auth/me", Some(forged.as_str()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_and_logout() {
    let (app, store) = app();
    register(&app, "acme", "a@acme.com").await;
    let token = login(&app, "a@acme.com", "acme").await;

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "a@acme.com");
    assert_eq!(body["data"]["isActive"], true);
    assert_eq!(body["data"]["tenant"]["maxProjects"], 3);

    let (status, body) = send(&app, "POST", "/api/auth/logout", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");

    let (status, _) = send(&app, "POST", "/api/auth/logout", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let logouts: Vec<_> = store
        .audit_entries()
        .await
        .into_iter()
        .filter(|e| e.action == AuditAction::Logout)
        .collect();
    assert_eq!(logouts.len(), 2);
    assert!(logouts[0].user_id.is_some());
    assert!(logouts[1].user_id.is_none());
}

#[tokio::test]
async fn task_lifecycle() {
    let (app, _) = app();
    let acme = register(&app, "acme", "a@acme.com").await;
    let acme_id = acme["tenantId"].as_str().unwrap();
    let token = login(&app, "a@acme.com", "acme").await;

    let (_, body) = send(
        &app,
        "POST",
        &format!("/api/tenants/{acme_id}/projects"),
        Some(token.as_str()),
        Some(json!({ "name": "P1" })),
    )
    .await;
    let project_id = id_of(&body["data"]).to_string();
    let tasks_uri = format!("/api/projects/{project_id}/tasks");

    let (status, body) = send(&app, "POST", &tasks_uri, Some(token.as_str()), Some(json!({ "title": "T1" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["priority"], "medium");
    let task_id = id_of(&body["data"]).to_string();

    send(
        &app,
        "POST",
        &tasks_uri,
        Some(token.as_str()),
        Some(json!({ "title": "T2", "priority": "high" })),
    )
    .await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/tasks/{task_id}"),
        Some(token.as_str()),
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["title"], "T1");

    let task_uri = format!("/api/tasks/{task_id}");
    let (_, body) = send(&app, "PUT", &task_uri, Some(token.as_str()), Some(json!({ "description": "notes" }))).await;
    assert_eq!(body["data"]["description"], "notes");
    let (_, body) = send(&app, "PUT", &task_uri, Some(token.as_str()), Some(json!({ "status": "completed" }))).await;
    assert_eq!(body["data"]["description"], "notes");
    let (status, body) = send(&app, "PUT", &task_uri, Some(token.as_str()), Some(json!({ "description": null }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["description"].is_null());

    let (status, body) = send(&app, "GET", &format!("{tasks_uri}?status=completed"), Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "T1");

    let (status, body) = send(&app, "GET", &format!("{tasks_uri}?limit=1&page=2"), Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["totalPages"], 2);
    assert_eq!(body["data"]["items"][0]["title"], "T2");

    let (status, _) = send(&app, "GET", &format!("{tasks_uri}?status=someday"), Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "DELETE", &format!("/api/tasks/{task_id}"), Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/api/tasks/{task_id}"), Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/api/projects/{project_id}"), Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &tasks_uri, Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tenant_user_administration() {
    let (app, _) = app();
    let acme = register(&app, "acme", "a@acme.com").await;
    let acme_id = acme["tenantId"].as_str().unwrap();
    let admin_id = acme["adminUser"]["id"].as_str().unwrap();
    let token = login(&app, "a@acme.com", "acme").await;
    let users_uri = format!("/api/tenants/{acme_id}/users");

    let (status, body) = send(
        &app,
        "POST",
        &users_uri,
        Some(token.as_str()),
        Some(json!({ "email": "bob@acme.com", "password": "password123", "fullName": "Bob" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["role"], "user");
    let bob_id = id_of(&body["data"]).to_string();

    let (status, _) = send(
        &app,
        "POST",
        &users_uri,
        Some(token.as_str()),
        Some(json!({ "email": "bob@acme.com", "password": "password123", "fullName": "Bob" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "GET", &users_uri, Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);

    let bob = login(&app, "bob@acme.com", "acme").await;
    let (status, _) = send(
        &app,
        "POST",
        &users_uri,
        Some(bob.as_str()),
        Some(json!({ "email": "eve@acme.com", "password": "password123", "fullName": "Eve" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/users/{admin_id}"),
        Some(token.as_str()),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You cannot deactivate or demote yourself");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/users/{bob_id}"),
        Some(token.as_str()),
        Some(json!({ "fullName": "Robert" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fullName"], "Robert");

    let (status, _) = send(&app, "DELETE", &format!("/api/users/{bob_id}"), Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);

    // Bob's token outlives his account but no longer opens tenant data.
    let (status, _) = send(&app, "GET", &format!("/api/tenants/{acme_id}/projects"), Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_requests_use_the_envelope() {
    let (app, _) = app();
    register(&app, "acme", "a@acme.com").await;
    let token = login(&app, "a@acme.com", "acme").await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);

    let (status, body) = send(&app, "GET", "/api/projects/not-a-uuid", Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = send(&app, "GET", "/api/nothing-here", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Route not found");
}
