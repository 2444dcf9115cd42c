use client_core::{config::normalize_base_url, ClientSettings, FailurePolicy};
use eframe::egui;
use serde::{Deserialize, Serialize};

/// Editable connection and behavior settings; also what survives restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsForm {
    pub api_base_url: String,
    #[serde(default)]
    pub voice_id: String,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default)]
    pub sync_creates: bool,
    #[serde(skip)]
    pub email: String,
    #[serde(skip)]
    pub password: String,
    #[serde(skip)]
    pub error: Option<String>,
}

impl SettingsForm {
    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self {
            api_base_url: settings.api_base_url.clone(),
            voice_id: settings.voice_id.clone().unwrap_or_default(),
            failure_policy: settings.failure_policy,
            sync_creates: settings.sync_creates,
            email: String::new(),
            password: String::new(),
            error: None,
        }
    }

    pub fn voice_id(&self) -> Option<String> {
        Some(self.voice_id.trim().to_string()).filter(|v| !v.is_empty())
    }

    /// Normalized base url, or the reason it was rejected.
    pub fn validated_base_url(&self) -> Result<String, String> {
        normalize_base_url(&self.api_base_url).map_err(|e| e.to_string())
    }

    /// Takes the password out of the form so it is not kept around.
    pub fn take_credentials(&mut self) -> Option<(String, String)> {
        let email = self.email.trim().to_string();
        if email.is_empty() || self.password.is_empty() {
            self.error = Some("Email and password are required".to_string());
            return None;
        }
        self.error = None;
        Some((email, std::mem::take(&mut self.password)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    Apply,
    Login,
    Logout,
}

pub fn show_settings(
    ctx: &egui::Context,
    open: &mut bool,
    form: &mut SettingsForm,
    signed_in_as: Option<&str>,
) -> Option<SettingsAction> {
    let window_frame = egui::Frame::NONE
        .fill(ctx.style().visuals.window_fill)
        .stroke(egui::Stroke::new(
            1.0,
            ctx.style().visuals.window_stroke().color,
        ))
        .corner_radius(8.0)
        .inner_margin(egui::Margin::symmetric(12, 10));

    let mut action = None;
    let mut close_requested = false;

    egui::Window::new("settings_window")
        .title_bar(false)
        .frame(window_frame)
        .open(open)
        .resizable(false)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Settings");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("x").clicked() {
                        close_requested = true;
                    }
                });
            });
            ui.separator();

            ui.strong("Backend");
            egui::Grid::new("settings_backend_grid")
                .num_columns(2)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    ui.label("API url");
                    ui.text_edit_singleline(&mut form.api_base_url);
                    ui.end_row();

                    ui.label("Voice id");
                    ui.add(
                        egui::TextEdit::singleline(&mut form.voice_id).hint_text("server default"),
                    );
                    ui.end_row();

                    ui.label("On failed save");
                    egui::ComboBox::from_id_salt("failure_policy")
                        .selected_text(policy_label(form.failure_policy))
                        .show_ui(ui, |ui| {
                            for policy in [FailurePolicy::KeepLocal, FailurePolicy::Rollback] {
                                ui.selectable_value(
                                    &mut form.failure_policy,
                                    policy,
                                    policy_label(policy),
                                );
                            }
                        });
                    ui.end_row();
                });
            ui.checkbox(&mut form.sync_creates, "Send new tasks to the backend");
            if ui.button("Apply").clicked() {
                action = Some(SettingsAction::Apply);
            }

            ui.separator();
            ui.strong("Account");
            match signed_in_as {
                Some(name) => {
                    ui.label(format!("Signed in as {name}"));
                    if ui.button("Log out").clicked() {
                        action = Some(SettingsAction::Logout);
                    }
                }
                None => {
                    egui::Grid::new("settings_account_grid")
                        .num_columns(2)
                        .spacing([12.0, 6.0])
                        .show(ui, |ui| {
                            ui.label("Email");
                            ui.text_edit_singleline(&mut form.email);
                            ui.end_row();

                            ui.label("Password");
                            ui.add(egui::TextEdit::singleline(&mut form.password).password(true));
                            ui.end_row();
                        });
                    if ui.button("Log in").clicked() {
                        action = Some(SettingsAction::Login);
                    }
                }
            }

            if let Some(error) = &form.error {
                ui.colored_label(egui::Color32::from_rgb(215, 90, 90), error);
            }
        });

    if close_requested {
        *open = false;
    }
    action
}

fn policy_label(policy: FailurePolicy) -> &'static str {
    match policy {
        FailurePolicy::KeepLocal => "Keep local change",
        FailurePolicy::Rollback => "Undo local change",
    }
}
