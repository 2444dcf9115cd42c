//! UI/backend events and error modeling for desktop GUI controller.

use client_core::{ClientError, MutationResult};
use shared::{
    error::ErrorCode,
    protocol::{TaskRecord, VoiceCommandResponse},
};

pub enum UiEvent {
    Info(String),
    Error(UiError),
    TasksLoaded(Vec<TaskRecord>),
    MutationSettled(MutationResult),
    AssistantReplied(VoiceCommandResponse),
    AssistantFailed(UiError),
    LoggedIn { display_name: String },
    LoggedOut,
    Reconnected { api_base_url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    LoadTasks,
    Mutation,
    Assistant,
    Login,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("401")
            || message_lower.contains("403")
            || message_lower.contains("unauthorized")
            || message_lower.contains("not authorized")
            || message_lower.contains("forbidden")
            || message_lower.contains("authorization header")
            || message_lower.contains("token has expired")
            || message_lower.contains("bad email or password")
        {
            UiErrorCategory::Auth
        } else if message_lower.contains("invalid")
            || message_lower.contains("missing")
            || message_lower.contains("malformed")
            || message_lower.contains("required")
            || message_lower.contains("must not be empty")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("transport")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnected")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    /// Uses the structured error where it is unambiguous and falls back to
    /// message classification otherwise.
    pub fn from_client_error(context: UiErrorContext, err: &ClientError) -> Self {
        let category = match err {
            ClientError::Api {
                code: ErrorCode::Unauthorized | ErrorCode::Forbidden,
                ..
            } => Some(UiErrorCategory::Auth),
            ClientError::Api {
                code: ErrorCode::Validation,
                ..
            }
            | ClientError::Validation(_)
            | ClientError::Decode(_)
            | ClientError::Domain(_) => Some(UiErrorCategory::Validation),
            ClientError::Transport(_) => Some(UiErrorCategory::Transport),
            _ => None,
        };
        let mut ui_error = Self::from_message(context, err.to_string());
        if let Some(category) = category {
            ui_error.category = category;
        }
        ui_error
    }

    pub fn requires_reauth(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Auth => "Authentication",
        UiErrorCategory::Transport => "Connection",
        UiErrorCategory::Validation => "Invalid input",
        UiErrorCategory::Unknown => "Error",
    }
}
