//! Home view: conversation with the task assistant.

use client_core::voice::{Speaker, VoiceSession, VoiceState};
use eframe::egui;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantAction {
    SendText(String),
    PickAudio,
    SaveReplyAudio,
    ClearHistory,
}

fn state_label(state: VoiceState) -> &'static str {
    match state {
        VoiceState::Idle => "Ready",
        VoiceState::Listening => "Choosing a recording...",
        VoiceState::Thinking => "Thinking...",
        VoiceState::Responding => "Responding",
    }
}

pub fn show_assistant(
    ui: &mut egui::Ui,
    session: &VoiceSession,
    input: &mut String,
    has_reply_audio: bool,
) -> Option<AssistantAction> {
    let mut action = None;

    ui.horizontal(|ui| {
        ui.heading("Assistant");
        ui.weak(state_label(session.state()));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui
                .add_enabled(!session.history().is_empty(), egui::Button::new("Clear"))
                .clicked()
            {
                action = Some(AssistantAction::ClearHistory);
            }
            if ui
                .add_enabled(has_reply_audio, egui::Button::new("Save reply audio"))
                .clicked()
            {
                action = Some(AssistantAction::SaveReplyAudio);
            }
        });
    });
    ui.separator();

    let composer_height = 44.0;
    egui::ScrollArea::vertical()
        .max_height((ui.available_height() - composer_height).max(80.0))
        .stick_to_bottom(true)
        .auto_shrink([false, false])
        .show(ui, |ui| {
            if session.history().is_empty() {
                ui.weak("Try \"create a task to call the bank tomorrow\" or \"what is due today?\"");
            }
            for entry in session.history() {
                let (fill, align, who) = match entry.speaker {
                    Speaker::User => (
                        ui.visuals().selection.bg_fill.gamma_multiply(0.4),
                        egui::Align::Max,
                        "You",
                    ),
                    Speaker::Agent => (ui.visuals().faint_bg_color, egui::Align::Min, "Assistant"),
                };
                ui.with_layout(egui::Layout::top_down(align), |ui| {
                    egui::Frame::NONE
                        .fill(fill)
                        .corner_radius(10.0)
                        .inner_margin(egui::Margin::symmetric(10, 6))
                        .show(ui, |ui| {
                            ui.set_max_width(ui.available_width() * 0.75);
                            ui.horizontal(|ui| {
                                ui.small(format!(
                                    "{who} {}",
                                    entry
                                        .timestamp
                                        .with_timezone(&chrono::Local)
                                        .format("%H:%M")
                                ));
                                if entry.speaker == Speaker::Agent
                                    && ui.small_button("Copy").clicked()
                                {
                                    ui.ctx().copy_text(entry.message.clone());
                                }
                            });
                            ui.label(&entry.message);
                        });
                });
                ui.add_space(4.0);
            }
        });

    ui.separator();
    let busy = session.is_busy();
    ui.horizontal(|ui| {
        let field = ui.add_enabled(
            !busy,
            egui::TextEdit::singleline(input)
                .hint_text("Type a command")
                .desired_width(ui.available_width() - 160.0),
        );
        let submitted = field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if (ui.add_enabled(!busy, egui::Button::new("Send")).clicked() || submitted)
            && !input.trim().is_empty()
        {
            action = Some(AssistantAction::SendText(std::mem::take(input)));
        }
        if ui
            .add_enabled(!busy, egui::Button::new("Send audio..."))
            .clicked()
        {
            action = Some(AssistantAction::PickAudio);
        }
    });

    action
}
