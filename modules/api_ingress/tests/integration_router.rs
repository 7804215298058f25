//! Integration tests for the ingress router: module mounting, health,
//! OpenAPI document and the shared middleware stack.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Json, Router,
};
use modkit::{api::ApiJson, RestfulModule};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use utoipa::{OpenApi, ToSchema};

use api_ingress::{ApiIngress, ApiIngressConfig};

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct Note {
    pub text: String,
}

/// List notes
#[utoipa::path(get, path = "/api/notes", responses((status = 200, body = [Note])))]
async fn list_notes() -> Json<Vec<Note>> {
    Json(vec![Note {
        text: "hello".into(),
    }])
}

async fn create_note(ApiJson(note): ApiJson<Note>) -> (StatusCode, Json<Note>) {
    (StatusCode::CREATED, Json(note))
}

#[derive(OpenApi)]
#[openapi(paths(list_notes), components(schemas(Note)))]
struct NotesDoc;

struct NotesModule;

impl RestfulModule for NotesModule {
    fn name(&self) -> &'static str {
        "notes"
    }

    fn register_rest(&self, router: Router) -> Result<Router> {
        Ok(router.merge(
            Router::new()
                .route("/notes", get(list_notes).post(create_note)),
        ))
    }

    fn openapi(&self) -> utoipa::openapi::OpenApi {
        NotesDoc::openapi()
    }
}

fn ingress(config: ApiIngressConfig) -> ApiIngress {
    ApiIngress::new(config).with_module(Arc::new(NotesModule))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value, axum::http::HeaderMap) {
    let resp = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (
        status,
        serde_json::from_slice(&bytes).unwrap_or(Value::Null),
        headers,
    )
}

#[tokio::test]
async fn module_routes_are_nested_under_api() {
    let app = ingress(ApiIngressConfig::default()).build_router().unwrap();

    let (status, body, headers) = get_json(app.clone(), "/api/notes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["text"], "hello");
    assert!(headers.contains_key("x-request-id"));

    let (status, _, _) = get_json(app, "/notes").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_ok() {
    let app = ingress(ApiIngressConfig::default()).build_router().unwrap();
    let (status, body, _) = get_json(app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(chrono::DateTime::parse_from_rfc3339(body["time"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn openapi_document_merges_modules() {
    let app = ingress(ApiIngressConfig::default()).build_router().unwrap();
    let (status, doc, _) = get_json(app, "/api/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["openapi"].as_str().unwrap().starts_with("3."));
    assert_eq!(doc["info"]["title"], "TaskBoard API");
    assert!(doc["paths"]["/api/health"]["get"].is_object());
    assert!(doc["paths"]["/api/notes"]["get"].is_object());
    assert!(doc["components"]["schemas"]["Note"].is_object());
    assert!(doc["components"]["schemas"]["Problem"].is_object());
}

#[tokio::test]
async fn unknown_route_is_a_problem_with_request_id() {
    let app = ingress(ApiIngressConfig::default()).build_router().unwrap();
    let resp = app
        .oneshot(
            Request::get("/api/nope")
                .header("x-request-id", "rid-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["request_id"], "rid-42");
}

#[tokio::test]
async fn malformed_json_is_a_problem() {
    let app = ingress(ApiIngressConfig::default()).build_router().unwrap();
    let resp = app
        .oneshot(
            Request::post("/api/notes")
                .header("content-type", "application/json")
                .body(Body::from("{\"text\":"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["instance"], "/api/notes");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let config = ApiIngressConfig {
        body_limit_bytes: 16,
        ..Default::default()
    };
    let app = ingress(config).build_router().unwrap();
    let payload = format!("{{\"text\":\"{}\"}}", "x".repeat(64));
    let resp = app
        .oneshot(
            Request::post("/api/notes")
                .header("content-type", "application/json")
                .header("content-length", payload.len())
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn cors_can_be_disabled() {
    let preflight = || {
        Request::builder()
            .method("OPTIONS")
            .uri("/api/notes")
            .header("origin", "http://localhost:3000")
            .header("access-control-request-method", "GET")
            .body(Body::empty())
            .unwrap()
    };

    let on = ingress(ApiIngressConfig::default()).build_router().unwrap();
    let resp = on.oneshot(preflight()).await.unwrap();
    assert!(resp.headers().contains_key("access-control-allow-origin"));

    let off = ingress(ApiIngressConfig {
        cors_enabled: false,
        ..Default::default()
    })
    .build_router()
    .unwrap();
    let resp = off.oneshot(preflight()).await.unwrap();
    assert!(!resp.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn serve_stops_on_cancel() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let cancel = CancellationToken::new();
    let ingress = ingress(ApiIngressConfig::default());

    let server = {
        let cancel = cancel.clone();
        tokio::spawn(async move { ingress.serve_on(listener, cancel).await })
    };
    cancel.cancel();

    let result = tokio::time::timeout(std::time::Duration::from_secs(5), server)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}
