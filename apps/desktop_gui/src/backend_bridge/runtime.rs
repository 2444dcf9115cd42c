//! Backend worker: owns the HTTP client and runs queued commands serially
//! on its own tokio runtime.

use std::{path::Path, thread};

use client_core::{
    execute_mutation, AudioClip, AuthApi, ClientError, ClientSettings, HttpBackend, TaskApi,
    TokenStore, VoiceApi,
};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(settings: ClientSettings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let tokens = settings.token_store();
            let mut backend = match client_core::connect(&settings) {
                Ok(backend) => backend,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_client_error(
                        UiErrorContext::BackendStartup,
                        &err,
                    )));
                    tracing::error!("failed to set up backend client: {err}");
                    return;
                }
            };
            let _ = ui_tx.try_send(UiEvent::Info(format!(
                "Backend worker ready ({})",
                backend.base_url()
            )));

            while let Ok(cmd) = cmd_rx.recv() {
                let name = cmd.name();
                tracing::debug!(command = name, "backend command");
                let event = match cmd {
                    BackendCommand::LoadTasks => match backend.list_tasks().await {
                        Ok(records) => UiEvent::TasksLoaded(records),
                        Err(err) => UiEvent::Error(UiError::from_client_error(
                            UiErrorContext::LoadTasks,
                            &err,
                        )),
                    },
                    BackendCommand::Mutate(mutation) => {
                        UiEvent::MutationSettled(execute_mutation(&backend, &mutation).await)
                    }
                    BackendCommand::SendText { text, voice_id } => {
                        match backend.send_text(&text, voice_id.as_deref()).await {
                            Ok(reply) => UiEvent::AssistantReplied(reply),
                            Err(err) => UiEvent::AssistantFailed(UiError::from_client_error(
                                UiErrorContext::Assistant,
                                &err,
                            )),
                        }
                    }
                    BackendCommand::SendAudio { path, voice_id } => {
                        let result = match read_audio_clip(&path).await {
                            Ok(clip) => backend.send_audio(clip, voice_id.as_deref()).await,
                            Err(err) => Err(err),
                        };
                        match result {
                            Ok(reply) => UiEvent::AssistantReplied(reply),
                            Err(err) => UiEvent::AssistantFailed(UiError::from_client_error(
                                UiErrorContext::Assistant,
                                &err,
                            )),
                        }
                    }
                    BackendCommand::Login { email, password } => {
                        login(&backend, tokens.as_ref(), &email, &password).await
                    }
                    BackendCommand::Logout => {
                        backend.set_token(None).await;
                        match tokens.as_ref().map(TokenStore::clear).transpose() {
                            Ok(_) => UiEvent::LoggedOut,
                            Err(err) => UiEvent::Error(UiError::from_client_error(
                                UiErrorContext::Login,
                                &err,
                            )),
                        }
                    }
                    BackendCommand::Reconnect { api_base_url } => {
                        let mut next = settings.clone();
                        next.api_base_url = api_base_url;
                        match client_core::connect(&next) {
                            Ok(rebuilt) => {
                                backend = rebuilt;
                                UiEvent::Reconnected {
                                    api_base_url: backend.base_url().to_string(),
                                }
                            }
                            Err(err) => UiEvent::Error(UiError::from_client_error(
                                UiErrorContext::General,
                                &err,
                            )),
                        }
                    }
                };
                if ui_tx.send(event).is_err() {
                    tracing::info!(command = name, "ui closed; stopping backend worker");
                    break;
                }
            }
        });
    });
}

async fn login(
    backend: &HttpBackend,
    tokens: Option<&TokenStore>,
    email: &str,
    password: &str,
) -> UiEvent {
    let result = match tokens {
        Some(tokens) => client_core::login_and_store(backend, tokens, email, password).await,
        None => backend.login(email, password).await,
    };
    match result {
        Ok(login) => UiEvent::LoggedIn {
            display_name: login
                .user
                .and_then(|user| user.name.or(user.email))
                .unwrap_or_else(|| email.to_string()),
        },
        Err(err) => UiEvent::Error(UiError::from_client_error(UiErrorContext::Login, &err)),
    }
}

async fn read_audio_clip(path: &Path) -> Result<AudioClip, ClientError> {
    let bytes = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "recording.webm".to_string());
    let mime_type = mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string());
    Ok(AudioClip {
        filename,
        mime_type,
        bytes,
    })
}
