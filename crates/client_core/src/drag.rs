//! Drag gesture tracking and drop-target resolution.

use shared::domain::{TaskId, TaskStatus};

use crate::store::TaskStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// Target resolved to a different column; the caller applies the move.
    Move {
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },
    /// Target resolved to the column the task is already in.
    SameColumn { task_id: TaskId, status: TaskStatus },
    /// Released over nothing recognisable.
    Unresolved { task_id: TaskId },
    /// The dragged task is no longer in the store.
    UnknownTask { task_id: TaskId },
}

/// Column ids take precedence over task ids, then the target task's current
/// status is used.
pub fn resolve_drop_target(store: &TaskStore, drop_target_id: &str) -> Option<TaskStatus> {
    TaskStatus::from_column_id(drop_target_id)
        .or_else(|| store.status_of(&TaskId::new(drop_target_id)))
}

/// At most one drag is active; pointer input serializes gestures, so a new
/// start simply supersedes a session that never saw its end.
#[derive(Debug, Default)]
pub struct DragSessionController {
    active: Option<TaskId>,
}

impl DragSessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_drag_start(&mut self, task_id: TaskId) {
        if let Some(previous) = self.active.replace(task_id.clone()) {
            tracing::debug!(%previous, %task_id, "drag superseded an unfinished session");
        }
    }

    pub fn active(&self) -> Option<&TaskId> {
        self.active.as_ref()
    }

    pub fn is_dragging(&self, task_id: &TaskId) -> bool {
        self.active.as_ref() == Some(task_id)
    }

    pub fn cancel(&mut self) -> Option<TaskId> {
        self.active.take()
    }

    /// Ends the session and resolves where the task should go. Nothing is
    /// mutated here.
    pub fn on_drag_end(
        &mut self,
        store: &TaskStore,
        task_id: &TaskId,
        drop_target_id: Option<&str>,
    ) -> DragOutcome {
        if self.active.take().is_some_and(|active| &active != task_id) {
            tracing::debug!(%task_id, "drag end for a task other than the active one");
        }

        let Some(current) = store.status_of(task_id) else {
            return DragOutcome::UnknownTask {
                task_id: task_id.clone(),
            };
        };

        match drop_target_id.and_then(|target| resolve_drop_target(store, target)) {
            Some(to) if to != current => DragOutcome::Move {
                task_id: task_id.clone(),
                from: current,
                to,
            },
            Some(status) => DragOutcome::SameColumn {
                task_id: task_id.clone(),
                status,
            },
            None => DragOutcome::Unresolved {
                task_id: task_id.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::task;

    fn store() -> TaskStore {
        TaskStore::from_tasks([task("A", TaskStatus::Entry), task("B", TaskStatus::Doing)])
    }

    #[test]
    fn column_target_resolves_directly() {
        let store = store();
        let mut drag = DragSessionController::new();
        drag.on_drag_start(TaskId::new("A"));
        assert_eq!(
            drag.on_drag_end(&store, &TaskId::new("A"), Some("concluida")),
            DragOutcome::Move {
                task_id: TaskId::new("A"),
                from: TaskStatus::Entry,
                to: TaskStatus::Done,
            }
        );
        assert!(drag.active().is_none());
    }

    #[test]
    fn task_target_resolves_to_that_tasks_status() {
        let store = store();
        let mut drag = DragSessionController::new();
        drag.on_drag_start(TaskId::new("A"));
        assert_eq!(
            drag.on_drag_end(&store, &TaskId::new("A"), Some("B")),
            DragOutcome::Move {
                task_id: TaskId::new("A"),
                from: TaskStatus::Entry,
                to: TaskStatus::Doing,
            }
        );
    }

    #[test]
    fn unknown_or_missing_target_is_unresolved() {
        let store = store();
        let mut drag = DragSessionController::new();
        drag.on_drag_start(TaskId::new("A"));
        assert_eq!(
            drag.on_drag_end(&store, &TaskId::new("A"), Some("nowhere")),
            DragOutcome::Unresolved {
                task_id: TaskId::new("A")
            }
        );
        assert_eq!(
            drag.on_drag_end(&store, &TaskId::new("A"), None),
            DragOutcome::Unresolved {
                task_id: TaskId::new("A")
            }
        );
    }

    #[test]
    fn dropping_onto_own_column_or_self_is_same_column() {
        let store = store();
        let mut drag = DragSessionController::new();
        assert_eq!(
            drag.on_drag_end(&store, &TaskId::new("A"), Some("A")),
            DragOutcome::SameColumn {
                task_id: TaskId::new("A"),
                status: TaskStatus::Entry,
            }
        );
        assert_eq!(
            drag.on_drag_end(&store, &TaskId::new("B"), Some("fazendo")),
            DragOutcome::SameColumn {
                task_id: TaskId::new("B"),
                status: TaskStatus::Doing,
            }
        );
    }

    #[test]
    fn column_id_wins_over_task_with_same_id() {
        let store = TaskStore::from_tasks([
            task("A", TaskStatus::Entry),
            task("concluida", TaskStatus::Doing),
        ]);
        assert_eq!(resolve_drop_target(&store, "concluida"), Some(TaskStatus::Done));
    }

    #[test]
    fn new_drag_supersedes_unfinished_one() {
        let mut drag = DragSessionController::new();
        drag.on_drag_start(TaskId::new("A"));
        drag.on_drag_start(TaskId::new("B"));
        assert!(drag.is_dragging(&TaskId::new("B")));
        assert!(!drag.is_dragging(&TaskId::new("A")));
        assert_eq!(drag.cancel(), Some(TaskId::new("B")));
    }

    #[test]
    fn vanished_task_reports_unknown() {
        let store = store();
        let mut drag = DragSessionController::new();
        drag.on_drag_start(TaskId::new("Z"));
        assert_eq!(
            drag.on_drag_end(&store, &TaskId::new("Z"), Some("entrada")),
            DragOutcome::UnknownTask {
                task_id: TaskId::new("Z")
            }
        );
    }
}
