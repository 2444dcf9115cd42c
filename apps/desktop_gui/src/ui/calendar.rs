use chrono::NaiveDate;
use client_core::{
    calendar::{is_overdue, month_view, MonthCursor},
    store::TaskStore,
};
use eframe::egui;
use shared::domain::{TaskId, TaskStatus};

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn month_title(cursor: MonthCursor) -> String {
    let name = MONTHS
        .get(cursor.month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?");
    format!("{name} {}", cursor.year)
}

/// Returns the task the user clicked, if any.
pub fn show_calendar(
    ui: &mut egui::Ui,
    store: &TaskStore,
    cursor: &mut MonthCursor,
    today: NaiveDate,
) -> Option<TaskId> {
    let mut clicked = None;

    ui.horizontal(|ui| {
        if ui.button("<").clicked() {
            *cursor = cursor.previous();
        }
        ui.heading(month_title(*cursor));
        if ui.button(">").clicked() {
            *cursor = cursor.next();
        }
        if ui.button("Today").clicked() {
            *cursor = MonthCursor::containing(today);
        }
    });
    ui.add_space(8.0);

    let Some(view) = month_view(store, cursor.year, cursor.month, today) else {
        ui.label("Invalid month");
        return None;
    };

    let cell_width = ((ui.available_width() - 6.0 * 6.0) / 7.0).max(60.0);
    egui::ScrollArea::vertical().show(ui, |ui| {
        egui::Grid::new("calendar_grid")
            .num_columns(7)
            .spacing([6.0, 6.0])
            .min_col_width(cell_width)
            .show(ui, |ui| {
                for weekday in WEEKDAYS {
                    ui.label(egui::RichText::new(weekday).strong());
                }
                ui.end_row();

                let mut cell = 0;
                for _ in 0..view.leading_blanks {
                    ui.label("");
                    cell += 1;
                }
                for day in &view.days {
                    let stroke = if day.is_today {
                        egui::Stroke::new(2.0, ui.visuals().selection.bg_fill)
                    } else {
                        egui::Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color)
                    };
                    egui::Frame::NONE
                        .stroke(stroke)
                        .corner_radius(6.0)
                        .inner_margin(egui::Margin::symmetric(6, 4))
                        .show(ui, |ui| {
                            ui.set_min_size(egui::vec2(cell_width - 12.0, 72.0));
                            ui.vertical(|ui| {
                                ui.label(day.date.format("%-d").to_string());
                                for task in &day.tasks {
                                    let mut text = egui::RichText::new(&task.title).small();
                                    if task.status == TaskStatus::Done {
                                        text = text.strikethrough();
                                    } else if is_overdue(task, today) {
                                        text = text.color(egui::Color32::from_rgb(215, 90, 90));
                                    }
                                    if ui.link(text).clicked() {
                                        clicked = Some(task.id.clone());
                                    }
                                }
                            });
                        });
                    cell += 1;
                    if cell % 7 == 0 {
                        ui.end_row();
                    }
                }
            });
    });

    clicked
}
