//! Ordered in-memory task collection backing every board view.

use shared::domain::{Task, TaskId, TaskStatus};

#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later duplicates of an id are dropped so ids stay unique.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut store = Self::new();
        store.replace_all(tasks);
        store
    }

    pub fn replace_all(&mut self, tasks: impl IntoIterator<Item = Task>) {
        self.tasks.clear();
        for task in tasks {
            if !self.insert(task) {
                tracing::warn!("dropping task with duplicate id while replacing store");
            }
        }
    }

    /// Appends a task. Returns `false` and leaves the store untouched when the
    /// id is already present.
    pub fn insert(&mut self, task: Task) -> bool {
        if self.contains(&task.id) {
            return false;
        }
        self.tasks.push(task);
        true
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn status_of(&self, id: &TaskId) -> Option<TaskStatus> {
        self.get(id).map(|t| t.status)
    }

    /// Returns the previous status, or `None` if the task is unknown.
    pub fn set_status(&mut self, id: &TaskId, status: TaskStatus) -> Option<TaskStatus> {
        let task = self.tasks.iter_mut().find(|t| &t.id == id)?;
        Some(std::mem::replace(&mut task.status, status))
    }

    /// Replaces the task with the same id in place, keeping its position.
    pub fn replace(&mut self, task: Task) -> Option<Task> {
        let index = self.position(&task.id)?;
        Some(std::mem::replace(&mut self.tasks[index], task))
    }

    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let index = self.position(id)?;
        Some(self.tasks.remove(index))
    }

    /// Swaps a locally minted task for the server's copy, which may carry a
    /// different id. Position is preserved. Fails if `task.id` already
    /// belongs to some other task.
    pub fn rekey(&mut self, old_id: &TaskId, task: Task) -> bool {
        let Some(index) = self.position(old_id) else {
            return false;
        };
        if &task.id != old_id && self.contains(&task.id) {
            return false;
        }
        self.tasks[index] = task;
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| &t.id == id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use shared::domain::TaskPriority;

    pub(crate) fn task(id: &str, status: TaskStatus) -> Task {
        Task {
            id: TaskId::new(id),
            title: format!("task {id}"),
            description: None,
            status,
            priority: TaskPriority::Medium,
            due_date: NaiveDate::from_ymd_opt(2025, 3, 10).expect("date"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let mut store = TaskStore::new();
        assert!(store.insert(task("a", TaskStatus::Entry)));
        assert!(!store.insert(task("a", TaskStatus::Done)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.status_of(&TaskId::new("a")), Some(TaskStatus::Entry));
    }

    #[test]
    fn set_status_reports_previous_value() {
        let mut store = TaskStore::from_tasks([task("a", TaskStatus::Entry)]);
        assert_eq!(
            store.set_status(&TaskId::new("a"), TaskStatus::Done),
            Some(TaskStatus::Entry)
        );
        assert_eq!(store.set_status(&TaskId::new("missing"), TaskStatus::Done), None);
    }

    #[test]
    fn replace_and_rekey_keep_position() {
        let mut store = TaskStore::from_tasks([
            task("a", TaskStatus::Entry),
            task("tmp", TaskStatus::Entry),
            task("c", TaskStatus::Entry),
        ]);

        let mut edited = task("a", TaskStatus::Doing);
        edited.title = "edited".into();
        assert!(store.replace(edited).is_some());
        assert_eq!(store.as_slice()[0].title, "edited");

        assert!(store.rekey(&TaskId::new("tmp"), task("17", TaskStatus::Entry)));
        let ids: Vec<&str> = store.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "17", "c"]);

        assert!(!store.rekey(&TaskId::new("17"), task("c", TaskStatus::Entry)));
    }

    #[test]
    fn remove_returns_task() {
        let mut store = TaskStore::from_tasks([task("a", TaskStatus::Entry)]);
        assert!(store.remove(&TaskId::new("a")).is_some());
        assert!(store.is_empty());
        assert!(store.remove(&TaskId::new("a")).is_none());
    }
}
