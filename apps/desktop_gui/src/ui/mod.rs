//! UI layer for the desktop client: app shell, board, calendar, assistant
//! and settings views.

pub mod app;
mod assistant;
mod board;
mod calendar;
mod settings;

pub use app::{TaskdeckApp, SETTINGS_STORAGE_KEY};
pub use settings::SettingsForm;
