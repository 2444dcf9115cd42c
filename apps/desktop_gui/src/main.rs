use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod ui;

use anyhow::Result;
use clap::Parser;
use client_core::{config::normalize_base_url, load_settings_from, ClientSettings};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::{SettingsForm, TaskdeckApp, SETTINGS_STORAGE_KEY};

#[derive(Parser, Debug)]
#[command(name = "taskdeck-gui", about = "Kanban task board and assistant")]
struct Args {
    /// TOML settings file; `taskdeck.toml` in the working directory is used when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured and previously saved API url.
    #[arg(long)]
    api_url: Option<String>,
}

fn resolve_settings(args: &Args) -> Result<ClientSettings> {
    let mut settings = match &args.config {
        Some(path) => load_settings_from(Some(path.as_path()))?,
        None => client_core::load_settings()?,
    };
    if let Some(url) = &args.api_url {
        settings.api_base_url = normalize_base_url(url)?;
    }
    Ok(settings)
}

fn has_saved_token(settings: &ClientSettings) -> bool {
    match settings.token_store().map(|store| store.load()).transpose() {
        Ok(token) => token.flatten().is_some(),
        Err(err) => {
            tracing::warn!("could not read saved token: {err}");
            false
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let settings = resolve_settings(&args).unwrap_or_else(|err| {
        tracing::error!("{err:#}; falling back to default settings");
        ClientSettings::default()
    });
    let signed_in = has_saved_token(&settings);

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(1024);
    backend_bridge::runtime::launch(settings.clone(), cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Taskdeck")
            .with_inner_size([1180.0, 760.0])
            .with_min_inner_size([820.0, 560.0]),
        ..Default::default()
    };
    let url_from_args = args.api_url.is_some();
    eframe::run_native(
        "Taskdeck",
        options,
        Box::new(move |cc| {
            let persisted = cc
                .storage
                .and_then(|storage| storage.get_string(SETTINGS_STORAGE_KEY))
                .and_then(|text| serde_json::from_str::<SettingsForm>(&text).ok())
                .map(|mut saved| {
                    if url_from_args {
                        saved.api_base_url = settings.api_base_url.clone();
                    }
                    saved
                });
            Ok(Box::new(TaskdeckApp::new(
                cmd_tx, ui_rx, &settings, persisted, signed_in,
            )))
        }),
    )
}
