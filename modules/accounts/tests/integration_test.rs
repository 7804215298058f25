//! Integration-style tests for the accounts module.
//!
//! - Each test runs on a fresh in-memory SQLite DB with migrations applied.
//! - The service is built on the SeaORM repository.
//! - REST is exercised through the real route registration.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware, routing::get, Router,
};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::{json, Value};
use tower::ServiceExt;

use accounts::{
    api::rest::auth::{require_identity, Authenticated},
    config::AccountsConfig,
    contract::{client::AccountsApi, error::AccountsError, model::Credentials},
    domain::{error::DomainError, service::Service, token::TokenCodec},
    infra::storage::{migrations::Migrator, sea_orm_repo::SeaOrmUsersRepository},
    Accounts,
};
use modkit::{DbModule, RestfulModule};

const SECRET: &str = "integration-secret";

async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

async fn create_test_service() -> Arc<Service> {
    let repo = SeaOrmUsersRepository::new(create_test_db().await);
    let tokens = TokenCodec::new(SECRET, chrono::Duration::days(7));
    Arc::new(Service::new(Arc::new(repo), tokens))
}

fn creds(username: &str, password: &str) -> Credentials {
    Credentials {
        username: username.to_string(),
        password: password.to_string(),
    }
}

async fn module() -> Accounts {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let cfg = AccountsConfig {
        jwt_secret: SECRET.to_string(),
        ..Default::default()
    };
    let accounts = Accounts::new(db.clone(), cfg).unwrap();
    accounts.migrate(&db).await.unwrap();
    accounts
}

/// Accounts routes plus a protected `/whoami` probe, nested like the ingress does.
fn app(accounts: &Accounts) -> Router {
    let api = accounts.register_rest(Router::new()).unwrap();
    let protected = Router::new()
        .route(
            "/whoami",
            get(|Authenticated(who): Authenticated| async move { who.username }),
        )
        .route_layer(middleware::from_fn_with_state(
            accounts.client(),
            require_identity,
        ));
    Router::new().nest("/api", api.merge(protected))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn whoami(auth: Option<&str>) -> Request<Body> {
    let mut b = Request::get("/api/whoami");
    if let Some(v) = auth {
        b = b.header("authorization", v);
    }
    b.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_register_then_login() -> Result<()> {
    let service = create_test_service().await;

    let registered = service.register(creds("alice", "pw1")).await?;
    let issued = service.login(creds("alice", "pw1")).await?;

    assert_eq!(issued.identity, registered);
    let resolved = service.authenticate(&issued.token).await?;
    assert_eq!(resolved.username, "alice");
    assert_eq!(resolved.id, registered.id);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_username_conflicts() -> Result<()> {
    let service = create_test_service().await;
    service.register(creds("alice", "pw1")).await?;

    let err = service.register(creds("alice", "other")).await.unwrap_err();
    assert!(matches!(err, DomainError::UsernameTaken { .. }));
    assert_eq!(err.to_string(), "Username already taken.");
    Ok(())
}

#[tokio::test]
async fn test_usernames_are_case_sensitive() -> Result<()> {
    let service = create_test_service().await;
    service.register(creds("alice", "pw1")).await?;
    service.register(creds("Alice", "pw2")).await?;
    Ok(())
}

#[tokio::test]
async fn test_wrong_password_and_unknown_user_look_the_same() -> Result<()> {
    let service = create_test_service().await;
    service.register(creds("alice", "pw1")).await?;

    let wrong = service.login(creds("alice", "nope")).await.unwrap_err();
    let unknown = service.login(creds("bob", "pw1")).await.unwrap_err();
    assert_eq!(wrong.to_string(), unknown.to_string());
    assert_eq!(wrong.to_string(), "Invalid username or password.");
    Ok(())
}

#[tokio::test]
async fn test_empty_fields_fail_validation() {
    let service = create_test_service().await;
    for (u, p) in [("", "pw"), ("alice", ""), ("", "")] {
        let err = service.register(creds(u, p)).await.unwrap_err();
        assert!(matches!(err, DomainError::MissingCredentials));
        let err = service.login(creds(u, p)).await.unwrap_err();
        assert!(matches!(err, DomainError::MissingCredentials));
    }
}

#[tokio::test]
async fn test_local_client_maps_errors_to_contract() -> Result<()> {
    let accounts = module().await;
    let client = accounts.client();

    client.register(creds("alice", "pw1")).await?;
    assert_eq!(
        client.register(creds("alice", "pw1")).await.unwrap_err(),
        AccountsError::conflict("Username already taken.")
    );
    assert_eq!(
        client.authenticate("").await.unwrap_err(),
        AccountsError::unauthorized("Missing token")
    );
    assert_eq!(
        client.authenticate("abc").await.unwrap_err(),
        AccountsError::unauthorized("Invalid or expired token")
    );
    Ok(())
}

#[tokio::test]
async fn test_module_requires_secret() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let err = Accounts::new(db, AccountsConfig::default()).err().unwrap();
    assert!(err.to_string().contains("jwt_secret"));
}

#[tokio::test]
async fn test_rest_register_and_login() {
    let accounts = module().await;
    let app = app(&accounts);

    let (status, body) = send(
        &app,
        post_json("/api/register", json!({"username": "alice", "password": "pw1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["message"].is_string());

    let (status, body) = send(
        &app,
        post_json("/api/register", json!({"username": "alice", "password": "pw1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Username already taken.");
    assert_eq!(body["code"], "USERNAME_TAKEN");
    assert_eq!(body["instance"], "/api/register");

    let (status, body) = send(
        &app,
        post_json("/api/login", json!({"username": "alice", "password": "pw1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = send(&app, whoami(Some(&format!("Bearer {token}")))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_rest_login_failures() {
    let accounts = module().await;
    let app = app(&accounts);
    send(
        &app,
        post_json("/api/register", json!({"username": "alice", "password": "pw1"})),
    )
    .await;

    let (status, body) = send(
        &app,
        post_json("/api/login", json!({"username": "alice", "password": "bad"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid username or password.");

    let (status, body) = send(&app, post_json("/api/login", json!({"username": "alice"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Username and password are required.");

    let (status, body) = send(
        &app,
        post_json("/api/login", json!({"username": 5, "password": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
}

#[tokio::test]
async fn test_guard_rejections() {
    let accounts = module().await;
    let app = app(&accounts);

    let (status, body) = send(&app, whoami(None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Missing token");
    assert_eq!(body["instance"], "/api/whoami");

    let (_, body) = send(&app, whoami(Some("Token abc"))).await;
    assert_eq!(body["detail"], "Missing token");

    let (status, body) = send(&app, whoami(Some("Bearer not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid or expired token");

    let forged = TokenCodec::new("some-other-secret", chrono::Duration::days(1))
        .issue(&accounts::contract::Identity {
            id: uuid::Uuid::new_v4(),
            username: "mallory".into(),
        })
        .unwrap()
        .0;
    let (_, body) = send(&app, whoami(Some(&format!("Bearer {forged}")))).await;
    assert_eq!(body["detail"], "Invalid or expired token");
}
