//! Month grid over the task store, keyed by due date.

use chrono::{Datelike, Months, NaiveDate};
use shared::domain::{Task, TaskStatus};

use crate::store::TaskStore;

#[derive(Debug, Clone)]
pub struct CalendarDay<'a> {
    pub date: NaiveDate,
    pub is_today: bool,
    pub tasks: Vec<&'a Task>,
}

#[derive(Debug, Clone)]
pub struct MonthView<'a> {
    pub year: i32,
    pub month: u32,
    /// Empty cells before the 1st in a Sunday-first week.
    pub leading_blanks: u32,
    pub days: Vec<CalendarDay<'a>>,
}

impl MonthView<'_> {
    pub fn task_count(&self) -> usize {
        self.days.iter().map(|d| d.tasks.len()).sum()
    }
}

/// `None` for an invalid year/month.
pub fn month_view(
    store: &TaskStore,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Option<MonthView<'_>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = first.checked_add_months(Months::new(1))?;
    let days = first
        .iter_days()
        .take_while(|date| *date < next_first)
        .map(|date| CalendarDay {
            date,
            is_today: date == today,
            tasks: tasks_on(store, date),
        })
        .collect();

    Some(MonthView {
        year,
        month,
        leading_blanks: first.weekday().num_days_from_sunday(),
        days,
    })
}

pub fn tasks_on(store: &TaskStore, date: NaiveDate) -> Vec<&Task> {
    store.iter().filter(|t| t.due_date == date).collect()
}

pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    task.status != TaskStatus::Done && task.due_date < today
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    pub year: i32,
    pub month: u32,
}

impl MonthCursor {
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn next(self) -> Self {
        if self.month >= 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn previous(self) -> Self {
        if self.month <= 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Parses `YYYY-MM`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (year, month) = raw.trim().split_once('-')?;
        let cursor = Self {
            year: year.parse().ok()?,
            month: month.parse().ok()?,
        };
        (1..=12).contains(&cursor.month).then_some(cursor)
    }
}
