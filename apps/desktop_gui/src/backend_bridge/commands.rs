//! Backend commands queued from UI to backend worker. The worker handles
//! them one at a time in arrival order.

use std::path::PathBuf;

use client_core::RemoteMutation;

pub enum BackendCommand {
    LoadTasks,
    Mutate(RemoteMutation),
    SendText {
        text: String,
        voice_id: Option<String>,
    },
    SendAudio {
        path: PathBuf,
        voice_id: Option<String>,
    },
    Login {
        email: String,
        password: String,
    },
    Logout,
    Reconnect {
        api_base_url: String,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::LoadTasks => "load_tasks",
            BackendCommand::Mutate(mutation) => mutation.label(),
            BackendCommand::SendText { .. } => "send_text",
            BackendCommand::SendAudio { .. } => "send_audio",
            BackendCommand::Login { .. } => "login",
            BackendCommand::Logout => "logout",
            BackendCommand::Reconnect { .. } => "reconnect",
        }
    }
}
