//! Conversation state for the text/voice assistant.
//!
//! The session is a small state machine: `Idle -> Listening` while audio is
//! captured, `-> Thinking` while a command is in flight, `-> Responding`
//! once a reply arrived, and back to `Idle` when the reply has been shown
//! or played.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use shared::protocol::{VoiceCommandResponse, VoiceIntent};

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    #[default]
    Idle,
    Listening,
    Thinking,
    Responding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub speaker: Speaker,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// What the caller should do after a reply was recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEffects {
    pub intent: Option<VoiceIntent>,
    pub reload_tasks: bool,
    pub audio: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
pub struct VoiceSession {
    state: VoiceState,
    history: Vec<ConversationEntry>,
}

impl VoiceSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn history(&self) -> &[ConversationEntry] {
        &self.history
    }

    pub fn is_busy(&self) -> bool {
        self.state == VoiceState::Thinking
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn begin_listening(&mut self) -> bool {
        if self.state != VoiceState::Idle {
            return false;
        }
        self.state = VoiceState::Listening;
        true
    }

    /// Leaves `Listening` without sending anything.
    pub fn stop_listening(&mut self) {
        if self.state == VoiceState::Listening {
            self.state = VoiceState::Idle;
        }
    }

    /// Records the user's typed message. Blank input or a command already in
    /// flight returns `None`; otherwise the trimmed text to send.
    pub fn begin_text(&mut self, text: &str, now: DateTime<Utc>) -> Option<String> {
        let text = text.trim();
        if text.is_empty() || self.is_busy() {
            return None;
        }
        self.push(Speaker::User, text.to_string(), now);
        self.state = VoiceState::Thinking;
        Some(text.to_string())
    }

    /// Audio is sent without a user entry; the transcription in the reply
    /// becomes the user's line.
    pub fn begin_audio(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        self.state = VoiceState::Thinking;
        true
    }

    pub fn finish(
        &mut self,
        response: &VoiceCommandResponse,
        now: DateTime<Utc>,
    ) -> ReplyEffects {
        if let Some(transcription) = response
            .transcription
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            self.push(Speaker::User, transcription.to_string(), now);
        }

        let message = if response.message.trim().is_empty() {
            "(no reply)".to_string()
        } else {
            response.message.trim().to_string()
        };
        self.push(Speaker::Agent, message, now);
        self.state = VoiceState::Responding;

        if !response.is_success() {
            tracing::warn!(intent = ?response.intent, "assistant reported failure");
        }

        let audio = decode_reply_audio(response).unwrap_or_else(|err| {
            tracing::warn!("dropping reply audio: {err}");
            None
        });

        ReplyEffects {
            intent: response.intent,
            reload_tasks: response.mutates_tasks(),
            audio,
        }
    }

    pub fn fail(&mut self, reason: &str, now: DateTime<Utc>) {
        self.push(
            Speaker::Agent,
            format!("Sorry, something went wrong: {reason}"),
            now,
        );
        self.state = VoiceState::Idle;
    }

    /// Reply shown or played; ready for the next command.
    pub fn settle(&mut self) {
        if self.state == VoiceState::Responding {
            self.state = VoiceState::Idle;
        }
    }

    fn push(&mut self, speaker: Speaker, message: String, timestamp: DateTime<Utc>) {
        self.history.push(ConversationEntry {
            speaker,
            message,
            timestamp,
        });
    }
}

pub fn decode_reply_audio(response: &VoiceCommandResponse) -> ClientResult<Option<Vec<u8>>> {
    let Some(encoded) = response
        .audio_base64
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
    else {
        return Ok(None);
    };
    STANDARD
        .decode(encoded)
        .map(Some)
        .map_err(|e| ClientError::Decode(format!("invalid reply audio: {e}")))
}
