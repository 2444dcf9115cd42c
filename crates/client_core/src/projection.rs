//! Per-column views of the store. Recomputed on demand, never cached.

use shared::domain::{Task, TaskStatus};

use crate::store::TaskStore;

#[derive(Debug, Clone)]
pub struct ColumnView<'a> {
    pub status: TaskStatus,
    pub tasks: Vec<&'a Task>,
}

pub fn column(store: &TaskStore, status: TaskStatus) -> Vec<&Task> {
    store.iter().filter(|t| t.status == status).collect()
}

pub fn columns(store: &TaskStore) -> [ColumnView<'_>; 3] {
    TaskStatus::ALL.map(|status| ColumnView {
        status,
        tasks: column(store, status),
    })
}

pub fn column_counts(store: &TaskStore) -> [(TaskStatus, usize); 3] {
    TaskStatus::ALL.map(|status| (status, store.iter().filter(|t| t.status == status).count()))
}
