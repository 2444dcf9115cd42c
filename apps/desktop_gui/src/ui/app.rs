//! App shell: owns the board and assistant session, turns widget actions
//! into backend commands and folds worker events back into state.

use std::time::Duration;

use chrono::{DateTime, Utc};
use client_core::{
    board::local_today, calendar::MonthCursor, ledger::MutationId, ClientSettings,
    MutationFailure, MutationResult, RemoteMutation, Settlement, TaskBoard, VoiceSession,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::TaskId;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{err_label, UiError, UiErrorContext, UiEvent},
    orchestration::{dispatch_backend_command, settlement_status},
};
use crate::ui::{
    assistant::{show_assistant, AssistantAction},
    board::{show_board, show_delete_confirmation, show_task_form, BoardAction, FormOutcome, TaskForm},
    calendar::show_calendar,
    settings::{show_settings, SettingsAction, SettingsForm},
};

pub const SETTINGS_STORAGE_KEY: &str = "taskdeck.settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Home,
    Tasks,
    Calendar,
}

impl View {
    const ALL: [View; 3] = [View::Home, View::Tasks, View::Calendar];

    fn label(self) -> &'static str {
        match self {
            View::Home => "Home",
            View::Tasks => "Tasks",
            View::Calendar => "Calendar",
        }
    }
}

pub struct TaskdeckApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    board: TaskBoard,
    voice: VoiceSession,
    view: View,
    status: String,
    banner: Option<UiError>,
    settings: SettingsForm,
    settings_open: bool,
    form: Option<TaskForm>,
    pending_delete: Option<TaskId>,
    month: MonthCursor,
    assistant_input: String,
    last_reply_audio: Option<Vec<u8>>,
    signed_in_as: Option<String>,
}

impl TaskdeckApp {
    /// `persisted` replaces the loaded settings where the user changed them
    /// in a previous run; a different base url is reconnected right away.
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        settings: &ClientSettings,
        persisted: Option<SettingsForm>,
        has_saved_token: bool,
    ) -> Self {
        let form = persisted.unwrap_or_else(|| SettingsForm::from_settings(settings));
        let now = Utc::now();
        let mut app = Self {
            cmd_tx,
            ui_rx,
            board: TaskBoard::new(form.failure_policy),
            voice: VoiceSession::new(),
            view: View::Tasks,
            status: "Starting...".to_string(),
            banner: None,
            settings: form,
            settings_open: false,
            form: None,
            pending_delete: None,
            month: MonthCursor::containing(local_today(now)),
            assistant_input: String::new(),
            last_reply_audio: None,
            signed_in_as: has_saved_token.then(|| "saved session".to_string()),
        };

        if app.settings.api_base_url != settings.api_base_url {
            let api_base_url = app.settings.api_base_url.clone();
            app.dispatch(BackendCommand::Reconnect { api_base_url });
        } else {
            app.dispatch(BackendCommand::LoadTasks);
        }
        app
    }

    fn dispatch(&mut self, cmd: BackendCommand) -> bool {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status)
    }

    /// Queues a mutation; one that cannot be queued is settled as failed so
    /// the board does not wait on it, and that settlement is returned.
    fn submit(&mut self, mutation: RemoteMutation) -> Option<Settlement> {
        let id = mutation.id();
        if self.dispatch(BackendCommand::Mutate(mutation)) {
            return None;
        }
        let result = MutationResult {
            id,
            outcome: Err(MutationFailure {
                message: self.status.clone(),
                unauthorized: false,
            }),
        };
        let settlement = self.board.apply_result(result, Utc::now());
        tracing::warn!(?settlement, "mutation dropped before reaching the backend");
        Some(settlement)
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.handle_event(event, Utc::now());
        }
    }

    fn handle_event(&mut self, event: UiEvent, now: DateTime<Utc>) {
        match event {
            UiEvent::Info(message) => self.status = message,
            UiEvent::Error(err) => self.show_error(err),
            UiEvent::TasksLoaded(records) => {
                let loaded = self.board.load_records(records, now);
                self.status = format!("Loaded {loaded} tasks");
            }
            UiEvent::MutationSettled(result) => {
                let id = result.id;
                let unauthorized = matches!(&result.outcome, Err(failure) if failure.unauthorized);
                let settlement = self.board.apply_result(result, now);
                if let Some(text) = settlement_status(&settlement) {
                    self.status = text;
                }
                self.settle_form(id, &settlement);
                if unauthorized {
                    self.show_error(UiError::from_message(
                        UiErrorContext::Mutation,
                        "Not authorized; log in again from Settings",
                    ));
                }
            }
            UiEvent::AssistantReplied(reply) => {
                let effects = self.voice.finish(&reply, now);
                if effects.reload_tasks {
                    self.dispatch(BackendCommand::LoadTasks);
                }
                if effects.audio.is_some() {
                    self.last_reply_audio = effects.audio;
                }
                self.voice.settle();
            }
            UiEvent::AssistantFailed(err) => {
                self.voice.fail(err.message(), now);
                if err.requires_reauth() {
                    self.show_error(err);
                }
            }
            UiEvent::LoggedIn { display_name } => {
                self.status = format!("Signed in as {display_name}");
                self.signed_in_as = Some(display_name);
                self.banner = None;
                self.dispatch(BackendCommand::LoadTasks);
            }
            UiEvent::LoggedOut => {
                self.signed_in_as = None;
                self.status = "Signed out".to_string();
            }
            UiEvent::Reconnected { api_base_url } => {
                self.status = format!("Connected to {api_base_url}");
                self.settings.api_base_url = api_base_url;
                self.dispatch(BackendCommand::LoadTasks);
            }
        }
    }

    /// Closes the edit form whose save just got confirmed; a rejected save
    /// leaves it open with the reason.
    fn settle_form(&mut self, id: MutationId, settlement: &Settlement) {
        if !self.form.as_ref().is_some_and(|form| form.saving == Some(id)) {
            return;
        }
        match settlement {
            Settlement::Updated { .. } => self.form = None,
            Settlement::UpdateFailed { reason, .. } => {
                if let Some(form) = self.form.as_mut() {
                    form.saving = None;
                    form.error = Some(format!("Not saved: {reason}"));
                }
            }
            _ => {}
        }
    }

    fn show_error(&mut self, err: UiError) {
        tracing::warn!(context = ?err.context(), "{}", err.message());
        if err.requires_reauth() {
            self.signed_in_as = None;
        }
        self.status = err.message().to_string();
        self.banner = Some(err);
    }

    fn handle_board_action(&mut self, action: BoardAction, now: DateTime<Utc>) {
        match action {
            BoardAction::DragStarted(task_id) => self.board.drag_started(task_id),
            BoardAction::Dropped { task_id, target } => {
                if let Some(mutation) = self.board.drop_task(&task_id, target.as_deref()) {
                    self.submit(mutation);
                }
            }
            BoardAction::New(status) => {
                self.form = Some(TaskForm::new_task(status, local_today(now)));
            }
            BoardAction::Edit(task_id) => self.open_editor(&task_id),
            BoardAction::Delete(task_id) => self.pending_delete = Some(task_id),
        }
    }

    fn open_editor(&mut self, task_id: &TaskId) {
        if let Some(task) = self.board.task(task_id) {
            self.form = Some(TaskForm::edit(task));
        }
    }

    /// Returns whether the form can close. New tasks close at once; edits
    /// stay open until the backend answers.
    fn save_form(&mut self, form: &mut TaskForm, now: DateTime<Utc>) -> bool {
        let saved = match form.editing.clone() {
            Some(task_id) => self.save_edit(form, &task_id).map(|()| false),
            None => self.save_new(form, now).map(|()| true),
        };
        match saved {
            Ok(close) => close,
            Err(message) => {
                form.error = Some(message);
                false
            }
        }
    }

    fn save_edit(&mut self, form: &mut TaskForm, task_id: &TaskId) -> Result<(), String> {
        let task = self
            .board
            .task(task_id)
            .ok_or_else(|| format!("Task {task_id} is no longer on the board"))?;
        let edited = form.apply_to(task)?;
        let mutation = self.board.begin_update(edited).map_err(|e| e.to_string())?;
        let id = mutation.id();
        self.status = format!("Saving task {task_id}...");
        if let Some(settlement) = self.submit(mutation) {
            return Err(settlement
                .failure_reason()
                .unwrap_or("not sent")
                .to_string());
        }
        form.saving = Some(id);
        form.error = None;
        Ok(())
    }

    fn save_new(&mut self, form: &TaskForm, now: DateTime<Utc>) -> Result<(), String> {
        let draft = form.to_draft()?;
        let local_id = self
            .board
            .create_task(draft, now)
            .ok_or_else(|| "Could not create the task".to_string())?;
        self.status = format!("Task {local_id} created");
        if self.settings.sync_creates {
            if let Some(mutation) = self.board.begin_remote_create(&local_id) {
                self.submit(mutation);
            }
        }
        Ok(())
    }

    fn handle_assistant_action(&mut self, action: AssistantAction, now: DateTime<Utc>) {
        match action {
            AssistantAction::SendText(text) => {
                if let Some(text) = self.voice.begin_text(&text, now) {
                    let voice_id = self.settings.voice_id();
                    if !self.dispatch(BackendCommand::SendText { text, voice_id }) {
                        let reason = self.status.clone();
                        self.voice.fail(&reason, now);
                    }
                }
            }
            AssistantAction::PickAudio => {
                if !self.voice.begin_listening() {
                    return;
                }
                let picked = rfd::FileDialog::new()
                    .add_filter("Audio", &["webm", "wav", "mp3", "ogg", "m4a"])
                    .pick_file();
                match picked {
                    Some(path) if self.voice.begin_audio() => {
                        let voice_id = self.settings.voice_id();
                        if !self.dispatch(BackendCommand::SendAudio { path, voice_id }) {
                            let reason = self.status.clone();
                            self.voice.fail(&reason, now);
                        }
                    }
                    _ => self.voice.stop_listening(),
                }
            }
            AssistantAction::SaveReplyAudio => self.save_reply_audio(),
            AssistantAction::ClearHistory => {
                self.voice.clear_history();
                self.last_reply_audio = None;
            }
        }
    }

    fn save_reply_audio(&mut self) {
        let Some(bytes) = self.last_reply_audio.as_deref() else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .set_file_name("reply.mp3")
            .save_file()
        else {
            return;
        };
        self.status = match std::fs::write(&path, bytes) {
            Ok(()) => format!("Saved reply audio to {}", path.display()),
            Err(err) => format!("Could not save reply audio: {err}"),
        };
    }

    fn handle_settings_action(&mut self, action: SettingsAction) {
        match action {
            SettingsAction::Apply => match self.settings.validated_base_url() {
                Ok(api_base_url) => {
                    self.settings.error = None;
                    self.board.set_policy(self.settings.failure_policy);
                    self.dispatch(BackendCommand::Reconnect { api_base_url });
                }
                Err(message) => self.settings.error = Some(message),
            },
            SettingsAction::Login => {
                if let Some((email, password)) = self.settings.take_credentials() {
                    self.status = format!("Signing in as {email}...");
                    self.dispatch(BackendCommand::Login { email, password });
                }
            }
            SettingsAction::Logout => {
                self.dispatch(BackendCommand::Logout);
            }
        }
    }

    fn show_nav_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("app_top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.strong("Taskdeck");
                    ui.separator();
                    for view in View::ALL {
                        if ui.selectable_label(self.view == view, view.label()).clicked() {
                            self.view = view;
                        }
                    }
                    ui.separator();
                    if ui.button("Refresh").clicked() {
                        self.dispatch(BackendCommand::LoadTasks);
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Settings").clicked() {
                            self.settings_open = !self.settings_open;
                        }
                        let pending = self.board.ledger().pending_count();
                        if pending > 0 {
                            ui.weak(format!("{pending} saving"));
                        }
                        if let Some(name) = &self.signed_in_as {
                            ui.weak(name);
                        }
                    });
                });
            });
    }

    fn show_banner(&mut self, ctx: &egui::Context) {
        let Some(banner) = &self.banner else {
            return;
        };
        let mut dismiss = false;
        let mut open_settings = false;
        egui::TopBottomPanel::top("error_banner")
            .frame(
                egui::Frame::NONE
                    .fill(egui::Color32::from_rgb(90, 35, 40))
                    .inner_margin(egui::Margin::symmetric(10, 6)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(
                        egui::Color32::WHITE,
                        format!("{}: {}", err_label(banner.category()), banner.message()),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("Dismiss").clicked() {
                            dismiss = true;
                        }
                        if banner.requires_reauth() && ui.small_button("Log in").clicked() {
                            open_settings = true;
                        }
                    });
                });
            });
        if dismiss || open_settings {
            self.banner = None;
        }
        if open_settings {
            self.settings_open = true;
        }
    }

    fn show_windows(&mut self, ctx: &egui::Context, now: DateTime<Utc>) {
        if let Some(mut form) = self.form.take() {
            match show_task_form(ctx, &mut form) {
                FormOutcome::Open => self.form = Some(form),
                FormOutcome::Cancel => {}
                FormOutcome::Save => {
                    if !self.save_form(&mut form, now) {
                        self.form = Some(form);
                    }
                }
            }
        }

        if let Some(task_id) = self.pending_delete.clone() {
            match self.board.task(&task_id).map(|task| show_delete_confirmation(ctx, task)) {
                None | Some(Some(false)) => self.pending_delete = None,
                Some(None) => {}
                Some(Some(true)) => {
                    self.pending_delete = None;
                    if let Some(mutation) = self.board.begin_delete(&task_id) {
                        self.status = format!("Deleting task {task_id}...");
                        self.submit(mutation);
                    }
                }
            }
        }

        if self.settings_open {
            let mut open = true;
            let action = show_settings(
                ctx,
                &mut open,
                &mut self.settings,
                self.signed_in_as.as_deref(),
            );
            self.settings_open = open;
            if let Some(action) = action {
                self.handle_settings_action(action);
            }
        }
    }
}

impl eframe::App for TaskdeckApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        let now = Utc::now();
        let today = local_today(now);

        self.show_nav_bar(ctx);
        self.show_banner(ctx);
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.small(&self.status);
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.view {
            View::Home => {
                let action = show_assistant(
                    ui,
                    &self.voice,
                    &mut self.assistant_input,
                    self.last_reply_audio.is_some(),
                );
                if let Some(action) = action {
                    self.handle_assistant_action(action, now);
                }
            }
            View::Tasks => {
                for action in show_board(ui, &self.board, today) {
                    self.handle_board_action(action, now);
                }
            }
            View::Calendar => {
                if let Some(task_id) =
                    show_calendar(ui, self.board.store(), &mut self.month, today)
                {
                    self.open_editor(&task_id);
                }
            }
        });

        self.show_windows(ctx, now);

        if self.board.dragging().is_some() {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Ok(serialized) = serde_json::to_string(&self.settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::FailurePolicy;
    use crossbeam_channel::bounded;
    use shared::{
        domain::{TaskPriority, TaskStatus},
        protocol::{TaskRecord, VoiceCommandResponse, VoiceIntent},
    };

    struct Harness {
        app: TaskdeckApp,
        cmd_rx: Receiver<BackendCommand>,
    }

    fn harness() -> Harness {
        let (cmd_tx, cmd_rx) = bounded(16);
        let (_ui_tx, ui_rx) = bounded(16);
        let app = TaskdeckApp::new(cmd_tx, ui_rx, &ClientSettings::default(), None, false);
        Harness { app, cmd_rx }
    }

    fn record(id: &str, status: TaskStatus) -> TaskRecord {
        TaskRecord {
            id: TaskId::new(id),
            title: format!("task {id}"),
            description: None,
            status,
            priority: TaskPriority::Medium,
            due_date: Some("2025-03-10".into()),
            created_at: None,
        }
    }

    fn drain(rx: &Receiver<BackendCommand>) -> Vec<&'static str> {
        rx.try_iter().map(|cmd| cmd.name()).collect()
    }

    #[test]
    fn startup_loads_tasks_unless_a_saved_url_differs() {
        let h = harness();
        assert_eq!(drain(&h.cmd_rx), vec!["load_tasks"]);

        let (cmd_tx, cmd_rx) = bounded(16);
        let (_ui_tx, ui_rx) = bounded(16);
        let mut saved = SettingsForm::from_settings(&ClientSettings::default());
        saved.api_base_url = "http://tasks.internal:8080".into();
        saved.failure_policy = FailurePolicy::Rollback;
        let app = TaskdeckApp::new(cmd_tx, ui_rx, &ClientSettings::default(), Some(saved), true);
        assert_eq!(drain(&cmd_rx), vec!["reconnect"]);
        assert_eq!(app.board.policy(), FailurePolicy::Rollback);
        assert!(app.signed_in_as.is_some());
    }

    #[test]
    fn drop_on_another_column_queues_a_status_patch() {
        let mut h = harness();
        drain(&h.cmd_rx);
        let now = Utc::now();
        h.app
            .handle_event(UiEvent::TasksLoaded(vec![record("1", TaskStatus::Entry)]), now);

        h.app
            .handle_board_action(BoardAction::DragStarted(TaskId::new("1")), now);
        h.app.handle_board_action(
            BoardAction::Dropped {
                task_id: TaskId::new("1"),
                target: Some("done".into()),
            },
            now,
        );

        assert_eq!(drain(&h.cmd_rx), vec!["patch_status"]);
        assert_eq!(
            h.app.board.task(&TaskId::new("1")).map(|t| t.status),
            Some(TaskStatus::Done)
        );
        assert_eq!(h.app.board.dragging(), None);
    }

    #[test]
    fn release_over_nothing_sends_nothing() {
        let mut h = harness();
        drain(&h.cmd_rx);
        let now = Utc::now();
        h.app
            .handle_event(UiEvent::TasksLoaded(vec![record("1", TaskStatus::Doing)]), now);
        h.app
            .handle_board_action(BoardAction::DragStarted(TaskId::new("1")), now);
        h.app.handle_board_action(
            BoardAction::Dropped {
                task_id: TaskId::new("1"),
                target: None,
            },
            now,
        );
        assert!(drain(&h.cmd_rx).is_empty());
        assert_eq!(
            h.app.board.task(&TaskId::new("1")).map(|t| t.status),
            Some(TaskStatus::Doing)
        );
    }

    #[test]
    fn unauthorized_settlement_raises_reauth_banner() {
        let mut h = harness();
        h.app.signed_in_as = Some("ana".into());
        let now = Utc::now();
        h.app
            .handle_event(UiEvent::TasksLoaded(vec![record("1", TaskStatus::Entry)]), now);
        let mutation = h
            .app
            .board
            .drop_task(&TaskId::new("1"), Some("doing"))
            .expect("move");

        h.app.handle_event(
            UiEvent::MutationSettled(MutationResult {
                id: mutation.id(),
                outcome: Err(MutationFailure {
                    message: "backend rejected request (401): unauthorized".into(),
                    unauthorized: true,
                }),
            }),
            now,
        );

        assert!(h.app.banner.as_ref().is_some_and(UiError::requires_reauth));
        assert_eq!(h.app.signed_in_as, None);
    }

    #[test]
    fn mutating_reply_reloads_tasks_and_settles_session() {
        let mut h = harness();
        drain(&h.cmd_rx);
        let now = Utc::now();
        h.app
            .handle_assistant_action(AssistantAction::SendText("start the report".into()), now);
        assert_eq!(drain(&h.cmd_rx), vec!["send_text"]);
        assert!(h.app.voice.is_busy());

        let reply = VoiceCommandResponse {
            message: "Started it".into(),
            intent: Some(VoiceIntent::StartTask),
            ..Default::default()
        };
        h.app.handle_event(UiEvent::AssistantReplied(reply), now);

        assert_eq!(drain(&h.cmd_rx), vec!["load_tasks"]);
        assert!(!h.app.voice.is_busy());
        assert_eq!(h.app.voice.history().len(), 2);
    }

    #[test]
    fn new_task_stays_local_unless_sync_is_on() {
        let mut h = harness();
        drain(&h.cmd_rx);
        let now = Utc::now();
        let mut form = TaskForm::new_task(TaskStatus::Entry, local_today(now));
        form.title = "Write notes".into();

        assert!(h.app.save_form(&mut form.clone(), now));
        assert!(drain(&h.cmd_rx).is_empty());
        assert_eq!(h.app.board.column(TaskStatus::Entry).len(), 1);

        h.app.settings.sync_creates = true;
        assert!(h.app.save_form(&mut form, now));
        assert_eq!(drain(&h.cmd_rx), vec!["create_task"]);
    }

    fn edit_title(h: &mut Harness, title: &str) -> MutationId {
        let now = Utc::now();
        h.app
            .handle_event(UiEvent::TasksLoaded(vec![record("1", TaskStatus::Entry)]), now);
        let task = h.app.board.task(&TaskId::new("1")).expect("task");
        let mut form = TaskForm::edit(task);
        form.title = title.into();

        assert!(!h.app.save_form(&mut form, now));
        let id = form.saving.expect("edit in flight");
        h.app.form = Some(form);
        id
    }

    #[test]
    fn rejected_edit_keeps_form_open_with_reason() {
        let mut h = harness();
        drain(&h.cmd_rx);
        let id = edit_title(&mut h, "Renamed");
        assert_eq!(drain(&h.cmd_rx), vec!["update_task"]);

        h.app.handle_event(
            UiEvent::MutationSettled(MutationResult {
                id,
                outcome: Err(MutationFailure {
                    message: "backend rejected request (500): boom".into(),
                    unauthorized: false,
                }),
            }),
            Utc::now(),
        );

        let form = h.app.form.as_ref().expect("form still open");
        assert_eq!(form.title, "Renamed");
        assert_eq!(form.saving, None);
        assert!(form.error.as_deref().is_some_and(|e| e.contains("boom")));
        assert_eq!(
            h.app.board.task(&TaskId::new("1")).map(|t| t.title.as_str()),
            Some("task 1")
        );
    }

    #[test]
    fn confirmed_edit_closes_form() {
        let mut h = harness();
        drain(&h.cmd_rx);
        let id = edit_title(&mut h, "Renamed");

        h.app.handle_event(
            UiEvent::MutationSettled(MutationResult {
                id,
                outcome: Ok(None),
            }),
            Utc::now(),
        );

        assert!(h.app.form.is_none());
        assert_eq!(
            h.app.board.task(&TaskId::new("1")).map(|t| t.title.as_str()),
            Some("Renamed")
        );
    }

    #[test]
    fn queue_failure_settles_the_mutation_locally() {
        let (cmd_tx, cmd_rx) = bounded(1);
        let (_ui_tx, ui_rx) = bounded(16);
        let mut app = TaskdeckApp::new(cmd_tx, ui_rx, &ClientSettings::default(), None, false);
        let now = Utc::now();
        app.handle_event(UiEvent::TasksLoaded(vec![record("1", TaskStatus::Entry)]), now);

        // startup load still occupies the only slot
        let mutation = app
            .board
            .drop_task(&TaskId::new("1"), Some("done"))
            .expect("move");
        app.submit(mutation);

        assert_eq!(app.board.ledger().pending_count(), 0);
        assert!(app.status.contains("queue is full"));
        drop(cmd_rx);
    }
}
