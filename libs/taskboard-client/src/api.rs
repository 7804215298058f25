//! Typed REST client for the TaskBoard API.

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::error::ClientError;
use crate::model::{NewTask, Task, TaskPatch};
use crate::session::{token_username, Session};

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Deserialize)]
struct LoginBody {
    token: String,
}

#[derive(Deserialize)]
struct TaskListBody {
    #[serde(default)]
    tasks: Vec<Task>,
}

#[derive(Deserialize)]
struct TaskBody {
    task: Task,
}

/// `GET /api/health` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Health {
    pub status: String,
    pub time: chrono::DateTime<chrono::Utc>,
}

/// Any of the error shapes the server may send.
#[derive(Deserialize, Default)]
struct ErrorBody {
    detail: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

fn api_url(base_url: &str, path: &str) -> String {
    format!("{}/api{}", base_url.trim_end_matches('/'), path)
}

#[derive(Debug, Clone, Default)]
pub struct ApiClient {
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    pub async fn health(&self, base_url: &str) -> Result<Health, ClientError> {
        let req = self.http.get(api_url(base_url, "/health"));
        decode(self.send(Method::GET, req).await?).await
    }

    /// Returns the server's confirmation message.
    pub async fn register(
        &self,
        base_url: &str,
        username: &str,
        password: &str,
    ) -> Result<String, ClientError> {
        let req = self
            .http
            .post(api_url(base_url, "/register"))
            .json(&Credentials { username, password });
        let body: MessageBody = decode(self.send(Method::POST, req).await?).await?;
        Ok(body.message)
    }

    /// Log in and build the session every protected call takes.
    pub async fn login(
        &self,
        base_url: &str,
        username: &str,
        password: &str,
    ) -> Result<Session, ClientError> {
        let req = self
            .http
            .post(api_url(base_url, "/login"))
            .json(&Credentials { username, password });
        let body: LoginBody = decode(self.send(Method::POST, req).await?).await?;
        let username = token_username(&body.token).unwrap_or_else(|| username.to_owned());
        Ok(Session::new(base_url, body.token, username))
    }

    pub async fn list_tasks(&self, session: &Session) -> Result<Vec<Task>, ClientError> {
        let req = self.authed(session, Method::GET, "/tasks");
        let body: TaskListBody = decode(self.send(Method::GET, req).await?).await?;
        Ok(body.tasks)
    }

    pub async fn create_task(&self, session: &Session, new: &NewTask) -> Result<Task, ClientError> {
        let req = self.authed(session, Method::POST, "/tasks").json(new);
        let body: TaskBody = decode(self.send(Method::POST, req).await?).await?;
        Ok(body.task)
    }

    pub async fn update_task(
        &self,
        session: &Session,
        id: &str,
        patch: &TaskPatch,
    ) -> Result<Task, ClientError> {
        let req = self
            .authed(session, Method::PUT, &format!("/tasks/{id}"))
            .json(patch);
        let body: TaskBody = decode(self.send(Method::PUT, req).await?).await?;
        Ok(body.task)
    }

    pub async fn delete_task(&self, session: &Session, id: &str) -> Result<String, ClientError> {
        let req = self.authed(session, Method::DELETE, &format!("/tasks/{id}"));
        let body: MessageBody = decode(self.send(Method::DELETE, req).await?).await?;
        Ok(body.message)
    }

    fn authed(&self, session: &Session, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, api_url(&session.base_url, path))
            .header(reqwest::header::AUTHORIZATION, session.bearer())
    }

    /// Send and turn non-success statuses into [`ClientError::Api`].
    async fn send(&self, method: Method, req: RequestBuilder) -> Result<Response, ClientError> {
        let req = req.build()?;
        let span = tracing::debug_span!(
            "outgoing_http",
            http.method = %method,
            http.url = %req.url(),
            http.status_code = tracing::field::Empty,
        );
        async move {
            let resp = self.http.execute(req).await?;
            let status = resp.status();
            tracing::Span::current().record("http.status_code", status.as_u16());
            if status.is_success() {
                return Ok(resp);
            }
            let message = error_message(resp).await;
            tracing::debug!(status = status.as_u16(), %message, "request rejected");
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
        .instrument(span)
        .await
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}

async fn error_message(resp: Response) -> String {
    let status = resp.status();
    let fallback = status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_owned();
    let body: ErrorBody = match resp.bytes().await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
        Err(_) => return fallback,
    };
    body.detail
        .or(body.message)
        .or(body.error)
        .filter(|m| !m.is_empty())
        .unwrap_or(fallback)
}
