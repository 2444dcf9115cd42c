//! Bookkeeping for remote mutations: every request the board issues is
//! tracked as pending until the backend confirms or rejects it.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use shared::domain::{TaskId, TaskStatus};

const DEFAULT_SETTLED_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MutationId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    StatusChange {
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },
    Update {
        task_id: TaskId,
    },
    Delete {
        task_id: TaskId,
    },
    Create {
        local_id: TaskId,
    },
}

impl MutationKind {
    pub fn task_id(&self) -> &TaskId {
        match self {
            MutationKind::StatusChange { task_id, .. }
            | MutationKind::Update { task_id }
            | MutationKind::Delete { task_id } => task_id,
            MutationKind::Create { local_id } => local_id,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MutationKind::StatusChange { .. } => "status_change",
            MutationKind::Update { .. } => "update",
            MutationKind::Delete { .. } => "delete",
            MutationKind::Create { .. } => "create",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationState {
    Pending,
    Confirmed,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct MutationEntry {
    pub id: MutationId,
    pub kind: MutationKind,
    pub state: MutationState,
}

#[derive(Debug)]
pub struct MutationLedger {
    next_id: u64,
    entries: VecDeque<MutationEntry>,
    settled_capacity: usize,
}

impl Default for MutationLedger {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_SETTLED_CAPACITY)
    }
}

impl MutationLedger {
    /// `settled_capacity` bounds how many confirmed/failed entries are
    /// retained; pending entries are never evicted.
    pub fn with_capacity(settled_capacity: usize) -> Self {
        Self {
            next_id: 1,
            entries: VecDeque::new(),
            settled_capacity,
        }
    }

    pub fn begin(&mut self, kind: MutationKind) -> MutationId {
        let id = MutationId(self.next_id);
        self.next_id += 1;
        tracing::debug!(mutation_id = id.0, kind = kind.label(), task_id = %kind.task_id(), "mutation pending");
        self.entries.push_back(MutationEntry {
            id,
            kind,
            state: MutationState::Pending,
        });
        id
    }

    pub fn get(&self, id: MutationId) -> Option<&MutationEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn state(&self, id: MutationId) -> Option<&MutationState> {
        self.get(id).map(|e| &e.state)
    }

    /// Returns the mutation kind if it was pending.
    pub fn confirm(&mut self, id: MutationId) -> Option<MutationKind> {
        self.settle(id, MutationState::Confirmed)
    }

    /// Returns the mutation kind if it was pending.
    pub fn fail(&mut self, id: MutationId, reason: impl Into<String>) -> Option<MutationKind> {
        self.settle(id, MutationState::Failed(reason.into()))
    }

    /// True when no status change for the same task was issued after `id`.
    pub fn is_latest_status_change(&self, id: MutationId) -> bool {
        let Some(entry) = self.get(id) else {
            return false;
        };
        !self.has_status_change_after(id, entry.kind.task_id())
    }

    /// True when a status change for `task_id` was issued after `id`.
    pub fn has_status_change_after(&self, id: MutationId, task_id: &TaskId) -> bool {
        self.entries.iter().any(|other| {
            other.id > id
                && matches!(&other.kind, MutationKind::StatusChange { task_id: other_task, .. } if other_task == task_id)
        })
    }

    /// Re-points pending and settled entries from a local id to the id the
    /// backend assigned.
    pub fn rekey_task(&mut self, old_id: &TaskId, new_id: &TaskId) {
        for entry in &mut self.entries {
            match &mut entry.kind {
                MutationKind::StatusChange { task_id, .. }
                | MutationKind::Update { task_id }
                | MutationKind::Delete { task_id }
                    if task_id == old_id =>
                {
                    *task_id = new_id.clone();
                }
                _ => {}
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == MutationState::Pending)
            .count()
    }

    pub fn has_pending_for(&self, task_id: &TaskId) -> bool {
        self.entries
            .iter()
            .any(|e| e.state == MutationState::Pending && e.kind.task_id() == task_id)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&MutationEntry, &str)> {
        self.entries.iter().filter_map(|e| match &e.state {
            MutationState::Failed(reason) => Some((e, reason.as_str())),
            _ => None,
        })
    }

    fn settle(&mut self, id: MutationId, state: MutationState) -> Option<MutationKind> {
        let entry = self.entries.iter_mut().find(|e| e.id == id)?;
        if entry.state != MutationState::Pending {
            tracing::warn!(mutation_id = id.0, "ignoring second settlement of mutation");
            return None;
        }
        entry.state = state;
        let kind = entry.kind.clone();
        self.evict_settled(id);
        Some(kind)
    }

    /// Drops the oldest settled entries beyond capacity, never `just_settled`:
    /// callers still inspect it after settling.
    fn evict_settled(&mut self, just_settled: MutationId) {
        let mut settled = self
            .entries
            .iter()
            .filter(|e| e.state != MutationState::Pending)
            .count();
        while settled > self.settled_capacity {
            let Some(index) = self
                .entries
                .iter()
                .position(|e| e.state != MutationState::Pending && e.id != just_settled)
            else {
                break;
            };
            self.entries.remove(index);
            settled -= 1;
        }
    }
}
