use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("unknown task status '{0}'")]
    UnknownStatus(String),
    #[error("unknown task priority '{0}'")]
    UnknownPriority(String),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Task identifier. The backend hands out integers; the client also mints
/// string ids for tasks that only exist locally, so ids are kept as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for TaskId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTaskId {
    Int(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawTaskId::deserialize(deserializer)? {
            RawTaskId::Int(value) => TaskId::from(value),
            RawTaskId::Text(value) => TaskId(value),
        })
    }
}

/// Kanban column a task lives in. The serialized form is the backend's
/// column identifier, which is also the drop-target id of the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "entrada", alias = "entry")]
    Entry,
    #[serde(rename = "fazendo", alias = "doing")]
    Doing,
    #[serde(rename = "concluida", alias = "done")]
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Entry, TaskStatus::Doing, TaskStatus::Done];

    pub fn column_id(self) -> &'static str {
        match self {
            TaskStatus::Entry => "entrada",
            TaskStatus::Doing => "fazendo",
            TaskStatus::Done => "concluida",
        }
    }

    /// Matches a drop-target or CLI identifier against the column ids.
    pub fn from_column_id(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "entrada" | "entry" => Some(TaskStatus::Entry),
            "fazendo" | "doing" => Some(TaskStatus::Doing),
            "concluida" | "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Entry => "Entry",
            TaskStatus::Doing => "Doing",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_id())
    }
}

impl FromStr for TaskStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_column_id(s).ok_or_else(|| DomainError::UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskPriority {
    #[serde(rename = "baixa", alias = "low")]
    Low,
    #[default]
    #[serde(rename = "media", alias = "medium")]
    Medium,
    #[serde(rename = "alta", alias = "high")]
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn wire_value(self) -> &'static str {
        match self {
            TaskPriority::Low => "baixa",
            TaskPriority::Medium => "media",
            TaskPriority::High => "alta",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_value())
    }
}

impl FromStr for TaskPriority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baixa" | "low" => Ok(TaskPriority::Low),
            "media" | "média" | "medium" => Ok(TaskPriority::Medium),
            "alta" | "high" => Ok(TaskPriority::High),
            _ => Err(DomainError::UnknownPriority(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

pub fn parse_due_date(value: &str) -> Result<NaiveDate, DomainError> {
    let trimmed = value.trim();
    // Some backends send a full timestamp; only the calendar part matters.
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| DomainError::InvalidDate(value.to_string()))
}
