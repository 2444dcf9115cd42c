//! Plain-text rendering for the CLI.

use std::fmt::Write as _;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use client_core::{
    calendar::{is_overdue, month_view, MonthCursor},
    voice::{ConversationEntry, Speaker},
    TaskBoard,
};
use shared::domain::{Task, TaskStatus};

pub fn column(board: &TaskBoard, status: TaskStatus, today: NaiveDate) -> String {
    let tasks = board.column(status);
    let mut out = format!("{} ({})\n", status.label(), tasks.len());
    for task in tasks {
        out.push_str(&task_line(task, today));
    }
    out
}

pub fn board(board: &TaskBoard, today: NaiveDate) -> String {
    board
        .columns()
        .iter()
        .map(|view| column(board, view.status, today))
        .collect::<Vec<_>>()
        .join("\n")
}

fn task_line(task: &Task, today: NaiveDate) -> String {
    let overdue = if is_overdue(task, today) { " overdue" } else { "" };
    let mut line = format!(
        "  [{}] {} ({}, due {}{overdue})\n",
        task.id,
        task.title,
        task.priority.label(),
        task.due_date.format("%Y-%m-%d"),
    );
    if let Some(description) = &task.description {
        let _ = writeln!(line, "      {description}");
    }
    line
}

pub fn calendar(board: &TaskBoard, cursor: MonthCursor, today: NaiveDate) -> Result<String> {
    let view = month_view(board.store(), cursor.year, cursor.month, today)
        .ok_or_else(|| anyhow!("invalid month {}-{:02}", cursor.year, cursor.month))?;

    let mut out = format!("{}-{:02}\n Su  Mo  Tu  We  Th  Fr  Sa\n", view.year, view.month);
    let mut cell = 0;
    for _ in 0..view.leading_blanks {
        out.push_str("    ");
        cell += 1;
    }
    for day in &view.days {
        let marker = match (day.is_today, day.tasks.is_empty()) {
            (true, _) => '*',
            (false, false) => '+',
            (false, true) => ' ',
        };
        let _ = write!(out, "{:>3}{marker}", day.date.format("%-d"));
        cell += 1;
        if cell % 7 == 0 {
            out.push('\n');
        }
    }
    if cell % 7 != 0 {
        out.push('\n');
    }

    for day in view.days.iter().filter(|d| !d.tasks.is_empty()) {
        let _ = writeln!(out, "\n{}", day.date.format("%Y-%m-%d"));
        for task in &day.tasks {
            out.push_str(&task_line(task, today));
        }
    }
    Ok(out)
}

pub fn conversation(history: &[ConversationEntry]) -> String {
    history
        .iter()
        .map(|entry| {
            let who = match entry.speaker {
                Speaker::User => "you",
                Speaker::Agent => "assistant",
            };
            format!("{who}: {}\n", entry.message)
        })
        .collect()
}
