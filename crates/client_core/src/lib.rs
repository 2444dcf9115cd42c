pub mod api;
pub mod board;
pub mod calendar;
pub mod config;
pub mod drag;
pub mod error;
pub mod ledger;
pub mod projection;
pub mod store;
pub mod sync;
pub mod token;
pub mod voice;

pub use api::{AudioClip, AuthApi, HttpBackend, TaskApi, VoiceApi};
pub use board::{
    FailurePolicy, MutationFailure, MutationResult, RemoteMutation, Settlement, TaskBoard,
    TaskDraft,
};
pub use config::{load_settings, load_settings_from, ClientSettings};
pub use error::{ClientError, ClientResult};
pub use sync::execute_mutation;
pub use token::TokenStore;
pub use voice::{VoiceSession, VoiceState};

/// Builds the HTTP backend from settings, picking up a saved token if one
/// exists.
pub fn connect(settings: &ClientSettings) -> ClientResult<HttpBackend> {
    let token = match settings.token_store() {
        Some(store) => store.load()?,
        None => None,
    };
    if token.is_none() {
        tracing::debug!("no saved token; requests go out unauthenticated");
    }
    HttpBackend::from_settings(settings, token)
}

/// Logs in and persists the returned token.
pub async fn login_and_store(
    backend: &HttpBackend,
    tokens: &TokenStore,
    email: &str,
    password: &str,
) -> ClientResult<shared::protocol::LoginResponse> {
    let response = backend.login(email, password).await?;
    tokens.save(&response.access_token)?;
    tracing::info!(
        user = response.user.as_ref().and_then(|u| u.email.as_deref()).unwrap_or(email),
        "logged in"
    );
    Ok(response)
}
