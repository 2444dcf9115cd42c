use async_trait::async_trait;
use reqwest::{multipart, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{TaskId, TaskStatus},
    error::ApiErrorBody,
    protocol::{
        Envelope, LoginRequest, LoginResponse, StatusAck, StatusPatchRequest, TaskRecord,
        TaskUpsertRequest, VoiceCommandResponse, VoiceTextCommandRequest,
    },
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{
    config::{normalize_base_url, ClientSettings},
    error::{ClientError, ClientResult},
};

#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self) -> ClientResult<Vec<TaskRecord>>;

    async fn create_task(&self, payload: &TaskUpsertRequest) -> ClientResult<Option<TaskRecord>>;

    async fn update_task(
        &self,
        id: &TaskId,
        payload: &TaskUpsertRequest,
    ) -> ClientResult<Option<TaskRecord>>;

    async fn patch_status(&self, id: &TaskId, status: TaskStatus) -> ClientResult<()>;

    async fn delete_task(&self, id: &TaskId) -> ClientResult<()>;
}

#[async_trait]
pub trait VoiceApi: Send + Sync {
    async fn send_text(
        &self,
        text: &str,
        voice_id: Option<&str>,
    ) -> ClientResult<VoiceCommandResponse>;

    async fn send_audio(
        &self,
        clip: AudioClip,
        voice_id: Option<&str>,
    ) -> ClientResult<VoiceCommandResponse>;
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse>;
}

/// A recorded or imported audio file sent to the voice assistant.
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// REST client for the task backend. The bearer token is swappable at
/// runtime so a login does not require rebuilding the client.
pub struct HttpBackend {
    http: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_client(Client::new(), base_url, None)
    }

    pub fn from_settings(settings: &ClientSettings, token: Option<String>) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()?;
        Self::with_client(http, &settings.api_base_url, token)
    }

    fn with_client(http: Client, base_url: &str, token: Option<String>) -> ClientResult<Self> {
        let base_url = normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            token: RwLock::new(token),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{path}", self.base_url));
        match self.token.read().await.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> ClientResult<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let code = status.as_u16();
        let text = response.text().await.unwrap_or_default();
        let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let error = body.into_api_error(code);
        warn!(status = code, "backend error: {}", error.message);
        Err(ClientError::from_api(code, error))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Single-task routes wrap their payload in an envelope; an empty body
    /// is accepted as success without data.
    async fn decode_envelope<T: DeserializeOwned>(response: Response) -> ClientResult<Option<T>> {
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let envelope: Envelope<T> =
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl TaskApi for HttpBackend {
    async fn list_tasks(&self) -> ClientResult<Vec<TaskRecord>> {
        let builder = self.request(Method::GET, "/api/tasks").await;
        let response = self.send(builder).await?;
        let tasks: Vec<TaskRecord> = Self::decode(response).await?;
        debug!(count = tasks.len(), "fetched tasks");
        Ok(tasks)
    }

    async fn create_task(&self, payload: &TaskUpsertRequest) -> ClientResult<Option<TaskRecord>> {
        let builder = self.request(Method::POST, "/api/tasks").await.json(payload);
        let response = self.send(builder).await?;
        Self::decode_envelope(response).await
    }

    async fn update_task(
        &self,
        id: &TaskId,
        payload: &TaskUpsertRequest,
    ) -> ClientResult<Option<TaskRecord>> {
        let builder = self
            .request(Method::PUT, &format!("/api/tasks/{id}"))
            .await
            .json(payload);
        let response = self.send(builder).await?;
        Self::decode_envelope(response).await
    }

    async fn patch_status(&self, id: &TaskId, status: TaskStatus) -> ClientResult<()> {
        let builder = self
            .request(Method::PATCH, &format!("/api/tasks/{id}/status"))
            .await
            .json(&StatusPatchRequest { status });
        let response = self.send(builder).await?;
        if let Some(ack) = Self::decode_envelope::<StatusAck>(response).await? {
            if ack.status != status {
                warn!(task_id = %id, requested = %status, acknowledged = %ack.status, "status ack mismatch");
            }
        }
        Ok(())
    }

    async fn delete_task(&self, id: &TaskId) -> ClientResult<()> {
        let builder = self
            .request(Method::DELETE, &format!("/api/tasks/{id}"))
            .await;
        self.send(builder).await?;
        Ok(())
    }
}

#[async_trait]
impl VoiceApi for HttpBackend {
    async fn send_text(
        &self,
        text: &str,
        voice_id: Option<&str>,
    ) -> ClientResult<VoiceCommandResponse> {
        let builder = self
            .request(Method::POST, "/api/voice/command")
            .await
            .json(&VoiceTextCommandRequest {
                text: text.to_string(),
                voice_id: voice_id.map(str::to_string),
            });
        let response = self.send(builder).await?;
        Self::decode(response).await
    }

    async fn send_audio(
        &self,
        clip: AudioClip,
        voice_id: Option<&str>,
    ) -> ClientResult<VoiceCommandResponse> {
        let mut part = multipart::Part::bytes(clip.bytes).file_name(clip.filename);
        if let Some(mime_type) = clip.mime_type.as_deref() {
            part = part.mime_str(mime_type)?;
        }
        let mut form = multipart::Form::new().part("audio", part);
        if let Some(voice_id) = voice_id {
            form = form.text("voiceId", voice_id.to_string());
        }

        let builder = self
            .request(Method::POST, "/api/voice/command")
            .await
            .multipart(form);
        let response = self.send(builder).await?;
        Self::decode(response).await
    }
}

#[async_trait]
impl AuthApi for HttpBackend {
    async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        let builder = self
            .request(Method::POST, "/api/auth/login")
            .await
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            });
        let response = self.send(builder).await?;
        let login: LoginResponse = Self::decode(response).await?;
        self.set_token(Some(login.access_token.clone())).await;
        Ok(login)
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
