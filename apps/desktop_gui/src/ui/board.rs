//! Kanban columns with drag-and-drop, plus the task form and delete
//! confirmation windows.

use chrono::NaiveDate;
use client_core::{calendar::is_overdue, ledger::MutationId, TaskBoard, TaskDraft};
use eframe::egui;
use shared::domain::{parse_due_date, Task, TaskId, TaskPriority, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardAction {
    DragStarted(TaskId),
    /// `target` is a column id, a task id, or `None` for a release over
    /// nothing.
    Dropped {
        task_id: TaskId,
        target: Option<String>,
    },
    New(TaskStatus),
    Edit(TaskId),
    Delete(TaskId),
}

fn column_color(status: TaskStatus) -> egui::Color32 {
    match status {
        TaskStatus::Entry => egui::Color32::from_rgb(88, 101, 242),
        TaskStatus::Doing => egui::Color32::from_rgb(250, 166, 26),
        TaskStatus::Done => egui::Color32::from_rgb(59, 165, 93),
    }
}

fn priority_color(priority: TaskPriority) -> egui::Color32 {
    match priority {
        TaskPriority::Low => egui::Color32::from_rgb(120, 160, 120),
        TaskPriority::Medium => egui::Color32::from_rgb(200, 170, 90),
        TaskPriority::High => egui::Color32::from_rgb(215, 90, 90),
    }
}

/// Draws the three columns and reports what the user did this frame.
pub fn show_board(ui: &mut egui::Ui, board: &TaskBoard, today: NaiveDate) -> Vec<BoardAction> {
    let mut actions = Vec::new();
    let ctx = ui.ctx().clone();

    // Drag lifecycle is read from egui's payload: a new payload is a drag
    // start, a payload that vanished without a drop is a release over nothing.
    match egui::DragAndDrop::payload::<TaskId>(&ctx) {
        Some(payload) if board.dragging() != Some(payload.as_ref()) => {
            actions.push(BoardAction::DragStarted(payload.as_ref().clone()));
        }
        Some(_) => {}
        None => {
            if let Some(active) = board.dragging() {
                actions.push(BoardAction::Dropped {
                    task_id: active.clone(),
                    target: None,
                });
            }
        }
    }

    ui.columns(TaskStatus::ALL.len(), |columns| {
        for (ui, view) in columns.iter_mut().zip(board.columns()) {
            let status = view.status;
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(format!("{} ({})", status.label(), view.tasks.len()))
                        .strong()
                        .color(column_color(status)),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("+").on_hover_text("New task").clicked() {
                        actions.push(BoardAction::New(status));
                    }
                });
            });

            let zone_frame = egui::Frame::NONE
                .fill(ui.visuals().faint_bg_color)
                .stroke(egui::Stroke::new(1.0, column_color(status).gamma_multiply(0.5)))
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(8, 8));

            let (_, column_drop) = ui.dnd_drop_zone::<TaskId, ()>(zone_frame, |ui| {
                ui.set_min_height(ui.available_height().max(240.0));
                ui.set_min_width(ui.available_width());
                egui::ScrollArea::vertical()
                    .id_salt(("column_scroll", status.column_id()))
                    .show(ui, |ui| {
                        if view.tasks.is_empty() {
                            ui.weak("Drop tasks here");
                        }
                        for task in &view.tasks {
                            show_card(ui, task, today, &mut actions);
                            ui.add_space(6.0);
                        }
                    });
            });

            if let Some(payload) = column_drop {
                actions.push(BoardAction::Dropped {
                    task_id: payload.as_ref().clone(),
                    target: Some(status.column_id().to_string()),
                });
            }
        }
    });

    actions
}

fn show_card(ui: &mut egui::Ui, task: &Task, today: NaiveDate, actions: &mut Vec<BoardAction>) {
    let id = egui::Id::new(("task_card", task.id.as_str()));
    let response = ui
        .dnd_drag_source(id, task.id.clone(), |ui| {
            egui::Frame::NONE
                .fill(ui.visuals().extreme_bg_color)
                .stroke(egui::Stroke::new(1.0, priority_color(task.priority)))
                .corner_radius(6.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(egui::RichText::new(&task.title).strong());
                    if let Some(description) = &task.description {
                        ui.small(description);
                    }
                    ui.horizontal(|ui| {
                        ui.small(
                            egui::RichText::new(task.priority.label())
                                .color(priority_color(task.priority)),
                        );
                        let due = task.due_date.format("%d/%m/%Y").to_string();
                        if is_overdue(task, today) {
                            ui.small(
                                egui::RichText::new(format!("due {due}"))
                                    .color(egui::Color32::from_rgb(215, 90, 90)),
                            );
                        } else {
                            ui.small(format!("due {due}"));
                        }
                    });
                });
        })
        .response;

    if let Some(payload) = response.dnd_release_payload::<TaskId>() {
        actions.push(BoardAction::Dropped {
            task_id: payload.as_ref().clone(),
            target: Some(task.id.to_string()),
        });
    }

    ui.horizontal(|ui| {
        if ui.small_button("Edit").clicked() {
            actions.push(BoardAction::Edit(task.id.clone()));
        }
        if ui.small_button("Delete").clicked() {
            actions.push(BoardAction::Delete(task.id.clone()));
        }
    });
}

/// Editable copy of a task, or of a task being created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub editing: Option<TaskId>,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: String,
    pub error: Option<String>,
    /// Edit sent to the backend; the form closes once it is confirmed.
    pub saving: Option<MutationId>,
}

impl TaskForm {
    pub fn new_task(status: TaskStatus, today: NaiveDate) -> Self {
        Self {
            editing: None,
            title: String::new(),
            description: String::new(),
            status,
            priority: TaskPriority::Medium,
            due_date: today.format("%Y-%m-%d").to_string(),
            error: None,
            saving: None,
        }
    }

    pub fn edit(task: &Task) -> Self {
        Self {
            editing: Some(task.id.clone()),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            status: task.status,
            priority: task.priority,
            due_date: task.due_date.format("%Y-%m-%d").to_string(),
            error: None,
            saving: None,
        }
    }

    pub fn to_draft(&self) -> Result<TaskDraft, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Title is required".to_string());
        }
        let due_date = parse_due_date(&self.due_date).map_err(|e| e.to_string())?;
        Ok(TaskDraft {
            title: title.to_string(),
            description: Some(self.description.trim().to_string()).filter(|d| !d.is_empty()),
            status: self.status,
            priority: self.priority,
            due_date,
        })
    }

    /// The edited task, keeping fields the form does not show.
    pub fn apply_to(&self, task: &Task) -> Result<Task, String> {
        let draft = self.to_draft()?;
        Ok(Task {
            title: draft.title,
            description: draft.description,
            status: draft.status,
            priority: draft.priority,
            due_date: draft.due_date,
            ..task.clone()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    Open,
    Save,
    Cancel,
}

pub fn show_task_form(ctx: &egui::Context, form: &mut TaskForm) -> FormOutcome {
    let mut outcome = FormOutcome::Open;
    let title = if form.editing.is_some() {
        "Edit task"
    } else {
        "New task"
    };

    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            egui::Grid::new("task_form_grid")
                .num_columns(2)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label("Title");
                    ui.text_edit_singleline(&mut form.title);
                    ui.end_row();

                    ui.label("Description");
                    ui.add(egui::TextEdit::multiline(&mut form.description).desired_rows(3));
                    ui.end_row();

                    ui.label("Status");
                    egui::ComboBox::from_id_salt("task_form_status")
                        .selected_text(form.status.label())
                        .show_ui(ui, |ui| {
                            for status in TaskStatus::ALL {
                                ui.selectable_value(&mut form.status, status, status.label());
                            }
                        });
                    ui.end_row();

                    ui.label("Priority");
                    egui::ComboBox::from_id_salt("task_form_priority")
                        .selected_text(form.priority.label())
                        .show_ui(ui, |ui| {
                            for priority in TaskPriority::ALL {
                                ui.selectable_value(&mut form.priority, priority, priority.label());
                            }
                        });
                    ui.end_row();

                    ui.label("Due date");
                    ui.add(egui::TextEdit::singleline(&mut form.due_date).hint_text("YYYY-MM-DD"));
                    ui.end_row();
                });

            if let Some(error) = &form.error {
                ui.colored_label(egui::Color32::from_rgb(215, 90, 90), error);
            }

            ui.separator();
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(form.saving.is_none(), egui::Button::new("Save"))
                    .clicked()
                {
                    outcome = FormOutcome::Save;
                }
                if ui.button("Cancel").clicked() {
                    outcome = FormOutcome::Cancel;
                }
                if form.saving.is_some() {
                    ui.spinner();
                    ui.weak("Saving...");
                }
            });
        });

    outcome
}

/// Returns `Some(true)` to delete, `Some(false)` to keep.
pub fn show_delete_confirmation(ctx: &egui::Context, task: &Task) -> Option<bool> {
    let mut answer = None;
    egui::Window::new("Delete task")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.label(format!("Delete \"{}\"? This cannot be undone.", task.title));
            ui.horizontal(|ui| {
                if ui.button("Delete").clicked() {
                    answer = Some(true);
                }
                if ui.button("Keep").clicked() {
                    answer = Some(false);
                }
            });
        });
    answer
}
