use super::*;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use shared::error::ErrorCode;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone)]
struct Seen {
    method: &'static str,
    path: String,
    authorization: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct ServerState {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl ServerState {
    async fn record(&self, method: &'static str, path: String, headers: &HeaderMap, body: Value) {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.seen.lock().await.push(Seen {
            method,
            path,
            authorization,
            body,
        });
    }
}

async fn list_tasks(State(state): State<ServerState>, headers: HeaderMap) -> Json<Value> {
    state.record("GET", "/api/tasks".into(), &headers, Value::Null).await;
    Json(json!([
        {"id": 1, "title": "Write report", "description": "", "status": "entrada",
         "priority": "alta", "due_date": "2025-03-12", "created_at": "2025-03-01T09:00:00"},
        {"id": 2, "title": "Call bank", "status": "concluida", "priority": "baixa",
         "due_date": null, "created_at": null}
    ]))
}

async fn create_task(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.record("POST", "/api/tasks".into(), &headers, body.clone()).await;
    let mut data = body;
    data["id"] = json!(77);
    (
        StatusCode::CREATED,
        Json(json!({"success": true, "message": "Task created", "data": data})),
    )
}

async fn update_task(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    state
        .record("PUT", format!("/api/tasks/{id}"), &headers, body.clone())
        .await;
    let mut data = body;
    data["id"] = json!(id.parse::<i64>().unwrap_or_default());
    Json(json!({"success": true, "data": data}))
}

async fn delete_task(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state
        .record("DELETE", format!("/api/tasks/{id}"), &headers, Value::Null)
        .await;
    if id == "404" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Task not found"})),
        );
    }
    (StatusCode::OK, Json(json!({"success": true})))
}

async fn patch_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state
        .record("PATCH", format!("/api/tasks/{id}/status"), &headers, body.clone())
        .await;
    if body.get("status").and_then(Value::as_str).is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Status required"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"success": true, "data": {"id": id.parse::<i64>().unwrap_or_default(), "status": body["status"]}})),
    )
}

async fn voice_command(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if content_type.starts_with("application/json") {
        let body: Value = serde_json::from_slice(&body).unwrap_or_default();
        state
            .record("POST", "/api/voice/command".into(), &headers, body.clone())
            .await;
        return Json(json!({
            "message": format!("heard: {}", body["text"].as_str().unwrap_or_default()),
            "intent": "create_task",
            "data": {"task": {"id": 9}}
        }));
    }

    let raw = String::from_utf8_lossy(&body).to_string();
    state
        .record("POST", "/api/voice/command".into(), &headers, json!(raw))
        .await;
    Json(json!({
        "success": true,
        "transcription": "what is due today",
        "message": "You have one task today",
        "intent": "list_today_tasks",
        "audio_base64": "SUQz"
    }))
}

async fn login(Json(body): Json<Value>) -> impl IntoResponse {
    if body["password"] == "secret" {
        return (
            StatusCode::OK,
            Json(json!({
                "access_token": "token-123",
                "user": {"id": 3, "name": "Dana", "email": body["email"]}
            })),
        );
    }
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"msg": "Bad email or password"})),
    )
}

async fn spawn_task_server() -> Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/:id", put(update_task).delete(delete_task))
        .route("/api/tasks/:id/status", patch(patch_status))
        .route("/api/voice/command", post(voice_command))
        .route("/api/auth/login", post(login))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/"), state))
}

#[tokio::test]
async fn list_tasks_decodes_backend_records_and_sends_token() {
    let (server_url, state) = spawn_task_server().await.expect("spawn server");
    let backend = HttpBackend::new(&server_url).expect("backend");
    backend.set_token(Some("abc".into())).await;

    let tasks = backend.list_tasks().await.expect("tasks");

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, TaskId::new("1"));
    assert_eq!(tasks[1].status, TaskStatus::Done);
    let seen = state.seen.lock().await;
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer abc"));
}

#[tokio::test]
async fn patch_status_sends_wire_value() {
    let (server_url, state) = spawn_task_server().await.expect("spawn server");
    let backend = HttpBackend::new(&server_url).expect("backend");

    backend
        .patch_status(&TaskId::new("5"), TaskStatus::Doing)
        .await
        .expect("patch");

    let seen = state.seen.lock().await;
    assert_eq!(seen[0].method, "PATCH");
    assert_eq!(seen[0].path, "/api/tasks/5/status");
    assert_eq!(seen[0].body, json!({"status": "fazendo"}));
    assert_eq!(seen[0].authorization, None);
}

#[tokio::test]
async fn create_and_update_return_server_records() {
    let (server_url, state) = spawn_task_server().await.expect("spawn server");
    let backend = HttpBackend::new(&server_url).expect("backend");
    let payload = TaskUpsertRequest {
        title: "Plan trip".into(),
        description: String::new(),
        status: TaskStatus::Entry,
        priority: shared::domain::TaskPriority::Low,
        due_date: "2025-04-01".into(),
    };

    let created = backend
        .create_task(&payload)
        .await
        .expect("create")
        .expect("record");
    assert_eq!(created.id, TaskId::new("77"));

    let updated = backend
        .update_task(&TaskId::new("77"), &payload)
        .await
        .expect("update")
        .expect("record");
    assert_eq!(updated.title, "Plan trip");

    let seen = state.seen.lock().await;
    assert_eq!(seen[0].body["priority"], "baixa");
    assert_eq!(seen[1].path, "/api/tasks/77");
}

#[tokio::test]
async fn backend_error_message_is_surfaced() {
    let (server_url, _state) = spawn_task_server().await.expect("spawn server");
    let backend = HttpBackend::new(&server_url).expect("backend");

    let err = backend
        .delete_task(&TaskId::new("404"))
        .await
        .expect_err("missing task");

    match err {
        ClientError::Api {
            status,
            code,
            message,
        } => {
            assert_eq!(status, 404);
            assert_eq!(code, ErrorCode::NotFound);
            assert_eq!(message, "Task not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    backend.delete_task(&TaskId::new("3")).await.expect("delete");
}

#[tokio::test]
async fn voice_text_and_audio_commands() {
    let (server_url, state) = spawn_task_server().await.expect("spawn server");
    let backend = HttpBackend::new(&server_url).expect("backend");

    let reply = backend
        .send_text("buy milk", Some("nova"))
        .await
        .expect("text reply");
    assert_eq!(reply.message, "heard: buy milk");
    assert!(reply.mutates_tasks());

    let reply = backend
        .send_audio(
            AudioClip {
                filename: "clip.webm".into(),
                mime_type: Some("audio/webm".into()),
                bytes: b"fake-audio".to_vec(),
            },
            Some("nova"),
        )
        .await
        .expect("audio reply");
    assert_eq!(reply.transcription.as_deref(), Some("what is due today"));
    assert!(!reply.mutates_tasks());

    let seen = state.seen.lock().await;
    assert_eq!(seen[0].body, json!({"text": "buy milk", "voiceId": "nova"}));
    let multipart = seen[1].body.as_str().expect("raw multipart");
    assert!(multipart.contains("name=\"audio\""));
    assert!(multipart.contains("name=\"voiceId\""));
    assert!(multipart.contains("fake-audio"));
}

#[tokio::test]
async fn login_stores_token_for_later_requests() {
    let (server_url, state) = spawn_task_server().await.expect("spawn server");
    let backend = HttpBackend::new(&server_url).expect("backend");

    let err = backend
        .login("dana@example.com", "wrong")
        .await
        .expect_err("bad password");
    assert!(err.is_unauthorized());
    assert!(!backend.has_token().await);

    let login = backend
        .login("dana@example.com", "secret")
        .await
        .expect("login");
    assert_eq!(login.access_token, "token-123");
    backend.list_tasks().await.expect("tasks");

    let seen = state.seen.lock().await;
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer token-123"));
}

#[test]
fn rejects_base_url_without_scheme() {
    assert!(matches!(
        HttpBackend::new("localhost:5000/"),
        Err(ClientError::Config(_))
    ));
}
