use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{parse_due_date, DomainError, Task, TaskId, TaskPriority, TaskStatus};

/// Task as served by `GET /api/tasks` and echoed by `PUT`/`POST`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl TaskRecord {
    /// `today` stands in for a missing due date and `now` for a missing or
    /// unreadable creation timestamp.
    pub fn into_task(self, today: NaiveDate, now: DateTime<Utc>) -> Result<Task, DomainError> {
        let due_date = match self.due_date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_due_date(raw)?,
            _ => today,
        };
        let created_at = self
            .created_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(now);
        let description = self.description.filter(|d| !d.trim().is_empty());

        Ok(Task {
            id: self.id,
            title: self.title,
            description,
            status: self.status,
            priority: self.priority,
            due_date,
            created_at,
        })
    }
}

/// Accepts RFC 3339, offset-less ISO timestamps (read as UTC) and date-only
/// strings, which land on local midday so the calendar day cannot shift.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(local_midday)
}

pub fn local_midday(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_hms_opt(12, 0, 0).unwrap_or_default();
    match Local.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => naive.and_utc(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPatchRequest {
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusAck {
    pub id: TaskId,
    pub status: TaskStatus,
}

/// Full task payload for `PUT /api/tasks/{id}` and `POST /api/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUpsertRequest {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: String,
}

impl TaskUpsertRequest {
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            status: task.status,
            priority: task.priority,
            due_date: task.due_date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// `{"success": .., "data": ..}` wrapper used by the single-task routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceTextCommandRequest {
    pub text: String,
    #[serde(rename = "voiceId", skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceIntent {
    CreateTask,
    ListTodayTasks,
    CompleteTask,
    StartTask,
    UpdateTaskDate,
    #[serde(other)]
    Unknown,
}

impl VoiceIntent {
    /// Intents after which the backend's task list differs from ours.
    pub fn mutates_tasks(self) -> bool {
        matches!(
            self,
            VoiceIntent::CreateTask
                | VoiceIntent::CompleteTask
                | VoiceIntent::StartTask
                | VoiceIntent::UpdateTaskDate
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoiceCommandResponse {
    /// Only audio commands report this; text replies omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<VoiceIntent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
}

impl VoiceCommandResponse {
    pub fn is_success(&self) -> bool {
        self.success.unwrap_or(true)
    }

    pub fn mutates_tasks(&self) -> bool {
        self.is_success() && self.intent.is_some_and(VoiceIntent::mutates_tasks)
    }
}
