//! The board owns the task store and is the only place it is mutated.
//!
//! Status changes from drag-and-drop are applied optimistically and then
//! confirmed remotely. Edits and deletes are applied only once the backend
//! has accepted them. Creates are local first and optionally pushed to the
//! backend afterwards. Each remote request carries a [`MutationId`] and is
//! settled through [`TaskBoard::apply_result`].

use std::{collections::HashMap, fmt, str::FromStr};

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{
    domain::{Task, TaskId, TaskPriority, TaskStatus},
    protocol::{TaskRecord, TaskUpsertRequest},
};
use tracing::{info, warn};

use crate::{
    drag::{DragOutcome, DragSessionController},
    error::{ClientError, ClientResult},
    ledger::{MutationId, MutationKind, MutationLedger},
    projection::{self, ColumnView},
    store::TaskStore,
};

/// What happens to an optimistic change the backend rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Leave the local state as the user left it.
    #[default]
    KeepLocal,
    /// Restore the pre-mutation state unless a newer change superseded it.
    Rollback,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::KeepLocal => f.write_str("keep_local"),
            FailurePolicy::Rollback => f.write_str("rollback"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "keep_local" | "keep" => Ok(FailurePolicy::KeepLocal),
            "rollback" => Ok(FailurePolicy::Rollback),
            other => Err(ClientError::Config(format!(
                "unknown failure policy '{other}', expected keep_local or rollback"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: NaiveDate,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: TaskStatus::Entry,
            priority: TaskPriority::Medium,
            due_date,
        }
    }
}

/// A request the board wants sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteMutation {
    PatchStatus {
        id: MutationId,
        task_id: TaskId,
        status: TaskStatus,
    },
    Update {
        id: MutationId,
        task_id: TaskId,
        payload: TaskUpsertRequest,
    },
    Delete {
        id: MutationId,
        task_id: TaskId,
    },
    Create {
        id: MutationId,
        local_id: TaskId,
        payload: TaskUpsertRequest,
    },
}

impl RemoteMutation {
    pub fn id(&self) -> MutationId {
        match self {
            RemoteMutation::PatchStatus { id, .. }
            | RemoteMutation::Update { id, .. }
            | RemoteMutation::Delete { id, .. }
            | RemoteMutation::Create { id, .. } => *id,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RemoteMutation::PatchStatus { .. } => "patch_status",
            RemoteMutation::Update { .. } => "update_task",
            RemoteMutation::Delete { .. } => "delete_task",
            RemoteMutation::Create { .. } => "create_task",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationFailure {
    pub message: String,
    pub unauthorized: bool,
}

impl From<&ClientError> for MutationFailure {
    fn from(err: &ClientError) -> Self {
        Self {
            message: err.to_string(),
            unauthorized: err.is_unauthorized(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MutationResult {
    pub id: MutationId,
    pub outcome: Result<Option<TaskRecord>, MutationFailure>,
}

/// How a settled mutation changed the board, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    StatusConfirmed {
        task_id: TaskId,
    },
    StatusFailed {
        task_id: TaskId,
        reason: String,
        rolled_back: bool,
    },
    Updated {
        task_id: TaskId,
    },
    UpdateFailed {
        task_id: TaskId,
        reason: String,
    },
    Deleted {
        task_id: TaskId,
    },
    DeleteFailed {
        task_id: TaskId,
        reason: String,
    },
    Created {
        local_id: TaskId,
        task_id: TaskId,
    },
    CreateFailed {
        local_id: TaskId,
        reason: String,
        removed: bool,
    },
    /// Unknown or already settled mutation id.
    Ignored,
}

impl Settlement {
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Settlement::StatusFailed { reason, .. }
            | Settlement::UpdateFailed { reason, .. }
            | Settlement::DeleteFailed { reason, .. }
            | Settlement::CreateFailed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct TaskBoard {
    store: TaskStore,
    drag: DragSessionController,
    ledger: MutationLedger,
    policy: FailurePolicy,
    pending_updates: HashMap<MutationId, Task>,
}

impl TaskBoard {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn ledger(&self) -> &MutationLedger {
        &self.ledger
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: FailurePolicy) {
        self.policy = policy;
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.store.get(id)
    }

    pub fn column(&self, status: TaskStatus) -> Vec<&Task> {
        projection::column(&self.store, status)
    }

    pub fn columns(&self) -> [ColumnView<'_>; 3] {
        projection::columns(&self.store)
    }

    /// Replaces the store with the backend's list. Records that cannot be
    /// mapped are skipped. Returns how many tasks were loaded.
    pub fn load_records(&mut self, records: Vec<TaskRecord>, now: DateTime<Utc>) -> usize {
        let today = local_today(now);
        let tasks = records.into_iter().filter_map(|record| {
            let id = record.id.clone();
            match record.into_task(today, now) {
                Ok(task) => Some(task),
                Err(err) => {
                    warn!(task_id = %id, "skipping task record: {err}");
                    None
                }
            }
        });
        self.store.replace_all(tasks);
        info!(count = self.store.len(), "task store loaded");
        self.store.len()
    }

    /// Local insert with a client-minted id (Unix millis). Blank titles are
    /// rejected and nothing is added.
    pub fn create_task(&mut self, draft: TaskDraft, now: DateTime<Utc>) -> Option<TaskId> {
        let title = draft.title.trim();
        if title.is_empty() {
            return None;
        }

        let mut millis = now.timestamp_millis();
        let mut id = TaskId::from(millis);
        while self.store.contains(&id) {
            millis += 1;
            id = TaskId::from(millis);
        }

        let task = Task {
            id: id.clone(),
            title: title.to_string(),
            description: draft.description.filter(|d| !d.trim().is_empty()),
            status: draft.status,
            priority: draft.priority,
            due_date: draft.due_date,
            created_at: now,
        };
        self.store.insert(task);
        info!(task_id = %id, "task created locally");
        Some(id)
    }

    /// Builds the request that pushes a locally created task to the backend.
    pub fn begin_remote_create(&mut self, local_id: &TaskId) -> Option<RemoteMutation> {
        let task = self.store.get(local_id)?;
        let payload = TaskUpsertRequest::from_task(task);
        let id = self.ledger.begin(MutationKind::Create {
            local_id: local_id.clone(),
        });
        Some(RemoteMutation::Create {
            id,
            local_id: local_id.clone(),
            payload,
        })
    }

    pub fn drag_started(&mut self, task_id: TaskId) {
        self.drag.on_drag_start(task_id);
    }

    pub fn dragging(&self) -> Option<&TaskId> {
        self.drag.active()
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    /// Finishes a drag. A resolved move is applied to the store right away
    /// and the returned request confirms it remotely.
    pub fn drop_task(
        &mut self,
        task_id: &TaskId,
        drop_target_id: Option<&str>,
    ) -> Option<RemoteMutation> {
        match self.drag.on_drag_end(&self.store, task_id, drop_target_id) {
            DragOutcome::Move { task_id, from, to } => {
                self.store.set_status(&task_id, to);
                let id = self.ledger.begin(MutationKind::StatusChange {
                    task_id: task_id.clone(),
                    from,
                    to,
                });
                info!(%task_id, %from, %to, mutation_id = id.0, "task moved");
                Some(RemoteMutation::PatchStatus {
                    id,
                    task_id,
                    status: to,
                })
            }
            DragOutcome::SameColumn { .. } => None,
            DragOutcome::Unresolved { task_id } => {
                info!(%task_id, target = ?drop_target_id, "drop target unresolved");
                None
            }
            DragOutcome::UnknownTask { task_id } => {
                warn!(%task_id, "dropped task is no longer on the board");
                None
            }
        }
    }

    /// Validates an edit and builds its request. The store is left alone
    /// until the backend accepts the change.
    pub fn begin_update(&mut self, task: Task) -> ClientResult<RemoteMutation> {
        if task.title.trim().is_empty() {
            return Err(ClientError::Validation("task title must not be empty".into()));
        }
        if !self.store.contains(&task.id) {
            return Err(ClientError::Validation(format!(
                "task {} is not on the board",
                task.id
            )));
        }

        let payload = TaskUpsertRequest::from_task(&task);
        let task_id = task.id.clone();
        let id = self.ledger.begin(MutationKind::Update {
            task_id: task_id.clone(),
        });
        self.pending_updates.insert(id, task);
        Ok(RemoteMutation::Update {
            id,
            task_id,
            payload,
        })
    }

    /// Builds a delete request; the task stays until the backend confirms.
    pub fn begin_delete(&mut self, task_id: &TaskId) -> Option<RemoteMutation> {
        if !self.store.contains(task_id) {
            return None;
        }
        let id = self.ledger.begin(MutationKind::Delete {
            task_id: task_id.clone(),
        });
        Some(RemoteMutation::Delete {
            id,
            task_id: task_id.clone(),
        })
    }

    pub fn apply_result(&mut self, result: MutationResult, now: DateTime<Utc>) -> Settlement {
        let kind = match &result.outcome {
            Ok(_) => self.ledger.confirm(result.id),
            Err(failure) => self.ledger.fail(result.id, failure.message.clone()),
        };
        let Some(kind) = kind else {
            return Settlement::Ignored;
        };

        match (kind, result.outcome) {
            (MutationKind::StatusChange { task_id, .. }, Ok(_)) => {
                Settlement::StatusConfirmed { task_id }
            }
            (MutationKind::StatusChange { task_id, from, to }, Err(failure)) => {
                let rolled_back = self.policy == FailurePolicy::Rollback
                    && self.ledger.is_latest_status_change(result.id)
                    && self.store.status_of(&task_id) == Some(to)
                    && self.store.set_status(&task_id, from).is_some();
                warn!(
                    %task_id,
                    mutation_id = result.id.0,
                    rolled_back,
                    "status change was not confirmed: {}",
                    failure.message
                );
                Settlement::StatusFailed {
                    task_id,
                    reason: failure.message,
                    rolled_back,
                }
            }
            (MutationKind::Update { task_id }, Ok(record)) => {
                let draft = self.pending_updates.remove(&result.id);
                let mut confirmed = record
                    .and_then(|record| record.into_task(local_today(now), now).ok())
                    .filter(|task| task.id == task_id)
                    .or(draft);
                // A move issued while the edit was in flight reaches the
                // backend after it, so its column wins.
                if self.ledger.has_status_change_after(result.id, &task_id) {
                    if let (Some(task), Some(current)) =
                        (confirmed.as_mut(), self.store.status_of(&task_id))
                    {
                        task.status = current;
                    }
                }
                let applied = confirmed.is_some_and(|task| self.store.replace(task).is_some());
                if applied {
                    info!(%task_id, "task update confirmed");
                } else {
                    warn!(%task_id, "confirmed update has no task left to apply to");
                }
                Settlement::Updated { task_id }
            }
            (MutationKind::Update { task_id }, Err(failure)) => {
                self.pending_updates.remove(&result.id);
                warn!(%task_id, "task update rejected: {}", failure.message);
                Settlement::UpdateFailed {
                    task_id,
                    reason: failure.message,
                }
            }
            (MutationKind::Delete { task_id }, Ok(_)) => {
                self.store.remove(&task_id);
                info!(%task_id, "task deleted");
                Settlement::Deleted { task_id }
            }
            (MutationKind::Delete { task_id }, Err(failure)) => {
                warn!(%task_id, "task delete rejected: {}", failure.message);
                Settlement::DeleteFailed {
                    task_id,
                    reason: failure.message,
                }
            }
            (MutationKind::Create { local_id }, Ok(record)) => {
                let server_task =
                    record.and_then(|record| match record.into_task(local_today(now), now) {
                        Ok(task) => Some(task),
                        Err(err) => {
                            warn!(%local_id, "unusable create response: {err}");
                            None
                        }
                    });
                let task_id = match server_task {
                    Some(task) => {
                        let server_id = task.id.clone();
                        if self.store.rekey(&local_id, task) {
                            self.ledger.rekey_task(&local_id, &server_id);
                            server_id
                        } else {
                            warn!(%local_id, %server_id, "could not re-key created task");
                            local_id.clone()
                        }
                    }
                    None => local_id.clone(),
                };
                info!(%local_id, %task_id, "task create confirmed");
                Settlement::Created { local_id, task_id }
            }
            (MutationKind::Create { local_id }, Err(failure)) => {
                let removed = self.policy == FailurePolicy::Rollback
                    && !self.ledger.has_pending_for(&local_id)
                    && self.store.remove(&local_id).is_some();
                warn!(%local_id, removed, "task create rejected: {}", failure.message);
                Settlement::CreateFailed {
                    local_id,
                    reason: failure.message,
                    removed,
                }
            }
        }
    }
}

pub fn local_today(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&Local).date_naive()
}

#[cfg(test)]
#[path = "tests/board_tests.rs"]
mod tests;
