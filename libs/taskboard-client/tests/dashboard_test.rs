use std::time::Duration;

use httpmock::prelude::*;
use serde_json::{json, Value};
use taskboard_client::commands::DeleteTask;
use taskboard_client::{
    ApiClient, ClientError, Dashboard, Outcome, Poller, Priority, Session, TaskStatus,
};
use tokio_util::sync::CancellationToken;

const TOKEN: &str = "header.eyJ1c2VybmFtZSI6ImFsaWNlIn0.sig";
const ID_A: &str = "0b6c1f7e-7a53-4d0b-9a55-1d2b2f3c4d5e";
const ID_B: &str = "5f0e7f8a-3c1b-4c7e-8d0f-9a1b2c3d4e5f";

fn task_json(id: &str, title: &str, status: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "status": status,
        "priority": "low",
        "owner_id": "7d7d7d7d-0000-4000-8000-000000000001",
        "created_at": "2025-01-01T10:00:00Z",
        "updated_at": "2025-01-01T10:00:00Z"
    })
}

fn problem(status: u16, detail: &str) -> String {
    json!({
        "type": "about:blank",
        "title": "Error",
        "status": status,
        "detail": detail,
        "instance": "/api/tasks",
        "code": "X"
    })
    .to_string()
}

fn session(server: &MockServer) -> Session {
    Session::new(server.base_url(), TOKEN, "alice")
}

async fn loaded_dashboard(server: &MockServer) -> Dashboard {
    let dash = Dashboard::new(ApiClient::default(), session(server));
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tasks");
            then.status(200).json_body(json!({
                "tasks": [task_json(ID_A, "buy milk", "pending"), task_json(ID_B, "walk dog", "completed")]
            }));
        })
        .await;
    dash.refresh().await.unwrap();
    list.delete_async().await;
    dash
}

#[tokio::test]
async fn login_builds_session_from_token() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/login")
                .json_body(json!({"username": "alice", "password": "pw1"}));
            then.status(200)
                .json_body(json!({"message": "Login successful.", "token": TOKEN}));
        })
        .await;

    let s = ApiClient::default()
        .login(&server.base_url(), "alice", "pw1")
        .await
        .unwrap();

    m.assert_async().await;
    assert_eq!(s.username, "alice");
    assert_eq!(s.token, TOKEN);
    assert_eq!(s.base_url, server.base_url());
}

#[tokio::test]
async fn server_detail_becomes_error_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/register");
            then.status(409)
                .header("content-type", "application/problem+json")
                .body(problem(409, "Username already taken."));
        })
        .await;

    let err = ApiClient::default()
        .register(&server.base_url(), "alice", "pw1")
        .await
        .unwrap_err();

    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 409);
            assert_eq!(message, "Username already taken.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn legacy_error_shape_is_understood() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/login");
            then.status(401)
                .json_body(json!({"error": "Invalid username or password."}));
        })
        .await;

    let err = ApiClient::default()
        .login(&server.base_url(), "alice", "nope")
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Invalid username or password.");
}

#[tokio::test]
async fn refresh_sends_bearer_and_fills_board() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/tasks")
                .header("authorization", format!("Bearer {TOKEN}"));
            then.status(200)
                .json_body(json!({"tasks": [task_json(ID_A, "buy milk", "completed")]}));
        })
        .await;

    let dash = Dashboard::new(ApiClient::default(), session(&server));
    let rx = dash.subscribe();
    assert_eq!(dash.refresh().await.unwrap(), 1);

    m.assert_async().await;
    let board = dash.snapshot();
    assert!(board.is_loaded());
    assert_eq!(board.summary().percent, 100);
    assert!(rx.has_changed().unwrap());
}

#[tokio::test]
async fn create_replaces_placeholder_with_server_task() {
    let server = MockServer::start_async().await;
    let dash = loaded_dashboard(&server).await;
    let m = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/tasks")
                .json_body(json!({"title": "call mom"}));
            then.status(201).json_body(json!({
                "message": "Task created.",
                "task": task_json("9a9a9a9a-0000-4000-8000-000000000009", "call mom", "pending")
            }));
        })
        .await;

    assert_eq!(dash.create("  call mom ").await.unwrap(), Outcome::Applied);

    m.assert_async().await;
    let board = dash.snapshot();
    assert_eq!(board.tasks().len(), 3);
    assert_eq!(board.tasks()[0].id, "9a9a9a9a-0000-4000-8000-000000000009");
    assert!(board.tasks().iter().all(|t| !t.is_temp()));
}

#[tokio::test]
async fn failed_create_removes_placeholder() {
    let server = MockServer::start_async().await;
    let dash = loaded_dashboard(&server).await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/tasks");
            then.status(500).body(problem(500, "Internal server error."));
        })
        .await;

    let err = dash.create("call mom").await.unwrap_err();
    assert_eq!(err.status(), Some(500));

    let board = dash.snapshot();
    assert_eq!(board.tasks().len(), 2);
    assert!(board.tasks().iter().all(|t| !t.is_temp()));
}

#[tokio::test]
async fn blank_create_never_reaches_server() {
    let server = MockServer::start_async().await;
    let dash = loaded_dashboard(&server).await;
    let m = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/tasks");
            then.status(201);
        })
        .await;

    assert_eq!(dash.create("   ").await.unwrap(), Outcome::Skipped);
    m.assert_calls_async(0).await;
}

#[tokio::test]
async fn toggle_confirmed_by_server() {
    let server = MockServer::start_async().await;
    let dash = loaded_dashboard(&server).await;
    let m = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(format!("/api/tasks/{ID_A}"))
                .json_body(json!({"status": "completed"}));
            then.status(200).json_body(json!({
                "message": "Task updated.",
                "task": task_json(ID_A, "buy milk", "completed")
            }));
        })
        .await;

    assert_eq!(dash.toggle(ID_A).await.unwrap(), Outcome::Applied);

    m.assert_async().await;
    let board = dash.snapshot();
    assert_eq!(board.get(ID_A).unwrap().status, TaskStatus::Completed);
    assert!(!board.is_updating(ID_A));
    assert_eq!(board.summary().completed, 2);
}

#[tokio::test]
async fn rejected_toggle_is_rolled_back() {
    let server = MockServer::start_async().await;
    let dash = loaded_dashboard(&server).await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path(format!("/api/tasks/{ID_A}"));
            then.status(404).body(problem(404, "Task not found."));
        })
        .await;

    let err = dash.toggle(ID_A).await.unwrap_err();
    assert_eq!(err.to_string(), "Task not found.");

    let board = dash.snapshot();
    assert_eq!(board.get(ID_A).unwrap().status, TaskStatus::Pending);
    assert!(!board.is_updating(ID_A));
}

#[tokio::test]
async fn rejected_priority_cycle_is_rolled_back() {
    let server = MockServer::start_async().await;
    let dash = loaded_dashboard(&server).await;
    let m = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path(format!("/api/tasks/{ID_B}"))
                .json_body(json!({"priority": "medium"}));
            then.status(400).body(problem(400, "Priority must be 'low', 'medium' or 'high'."));
        })
        .await;

    assert!(dash.cycle_priority(ID_B).await.is_err());
    m.assert_async().await;
    assert_eq!(dash.snapshot().get(ID_B).unwrap().priority, Priority::Low);
}

#[tokio::test]
async fn unchanged_rename_is_skipped() {
    let server = MockServer::start_async().await;
    let dash = loaded_dashboard(&server).await;
    assert_eq!(
        dash.rename(ID_A, " buy milk ").await.unwrap(),
        Outcome::Skipped
    );
}

#[tokio::test]
async fn delete_removes_task_after_confirmation() {
    let server = MockServer::start_async().await;
    let dash = loaded_dashboard(&server).await;
    let m = server
        .mock_async(|when, then| {
            when.method(DELETE).path(format!("/api/tasks/{ID_A}"));
            then.status(200).json_body(json!({"message": "Task deleted."}));
        })
        .await;

    let outcome = dash
        .execute(DeleteTask::with_delay(ID_A, Duration::ZERO))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Applied);
    m.assert_async().await;
    let board = dash.snapshot();
    assert!(board.get(ID_A).is_none());
    assert!(!board.is_deleting(ID_A));
}

#[tokio::test]
async fn failed_delete_clears_marker_and_resyncs() {
    let server = MockServer::start_async().await;
    let dash = loaded_dashboard(&server).await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path(format!("/api/tasks/{ID_A}"));
            then.status(500).body(problem(500, "Internal server error."));
        })
        .await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tasks");
            then.status(200)
                .json_body(json!({"tasks": [task_json(ID_A, "buy milk (server)", "pending")]}));
        })
        .await;

    assert!(dash
        .execute(DeleteTask::with_delay(ID_A, Duration::ZERO))
        .await
        .is_err());

    list.assert_async().await;
    let board = dash.snapshot();
    assert!(!board.is_deleting(ID_A));
    assert_eq!(board.tasks().len(), 1);
    assert_eq!(board.get(ID_A).unwrap().title, "buy milk (server)");
}

#[tokio::test]
async fn poller_refreshes_until_cancelled() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tasks");
            then.status(200).json_body(json!({"tasks": []}));
        })
        .await;

    let dash = Dashboard::new(ApiClient::default(), session(&server));
    let cancel = CancellationToken::new();
    let handle = Poller::new(Duration::from_millis(40)).spawn(dash.clone(), cancel.clone());

    tokio::time::sleep(Duration::from_millis(200)).await;
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("poller did not stop")
        .unwrap();

    let polled = list.calls_async().await;
    assert!(polled >= 2, "expected repeated polls, got {polled}");
    assert!(dash.snapshot().is_loaded());
}

#[tokio::test]
async fn poll_failures_are_not_fatal() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tasks");
            then.status(401).body(problem(401, "Invalid or expired token"));
        })
        .await;

    let dash = Dashboard::new(ApiClient::default(), session(&server));
    let cancel = CancellationToken::new();
    let handle = Poller::new(Duration::from_millis(30)).spawn(dash.clone(), cancel.clone());

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!handle.is_finished());
    cancel.cancel();
    handle.await.unwrap();

    assert!(list.calls_async().await >= 2);
    assert!(!dash.snapshot().is_loaded());
}
