//! Command orchestration helpers from UI actions to backend command queue.

use client_core::Settlement;
use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) -> bool {
    let cmd_name = cmd.name();

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            true
        }
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
            false
        }
        Err(TrySendError::Disconnected(_)) => {
            *status =
                "Backend command processor disconnected (possible startup/runtime failure); restart the app"
                    .to_string();
            false
        }
    }
}

/// Status line for a settled mutation; `None` when nothing is worth saying.
pub fn settlement_status(settlement: &Settlement) -> Option<String> {
    let text = match settlement {
        Settlement::StatusConfirmed { .. } => return None,
        Settlement::StatusFailed {
            task_id,
            reason,
            rolled_back: true,
        } => format!("Could not move task {task_id}; restored its column ({reason})"),
        Settlement::StatusFailed {
            task_id, reason, ..
        } => format!("Could not save the move of task {task_id}: {reason}"),
        Settlement::Updated { task_id } => format!("Task {task_id} saved"),
        Settlement::UpdateFailed { task_id, reason } => {
            format!("Could not save task {task_id}: {reason}")
        }
        Settlement::Deleted { task_id } => format!("Task {task_id} deleted"),
        Settlement::DeleteFailed { task_id, reason } => {
            format!("Could not delete task {task_id}: {reason}")
        }
        Settlement::Created { task_id, .. } => format!("Task {task_id} synced"),
        Settlement::CreateFailed {
            local_id,
            reason,
            removed,
        } => {
            if *removed {
                format!("Could not create task {local_id}; removed it ({reason})")
            } else {
                format!("Task {local_id} kept locally; sync failed: {reason}")
            }
        }
        Settlement::Ignored => return None,
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use shared::domain::TaskId;

    #[test]
    fn full_queue_reports_status_instead_of_blocking() {
        let (tx, _rx) = bounded::<BackendCommand>(1);
        let mut status = String::new();
        assert!(dispatch_backend_command(&tx, BackendCommand::LoadTasks, &mut status));
        assert!(!dispatch_backend_command(&tx, BackendCommand::LoadTasks, &mut status));
        assert!(status.contains("queue is full"));
    }

    #[test]
    fn disconnected_worker_is_reported() {
        let (tx, rx) = bounded::<BackendCommand>(1);
        drop(rx);
        let mut status = String::new();
        assert!(!dispatch_backend_command(&tx, BackendCommand::Logout, &mut status));
        assert!(status.contains("disconnected"));
    }

    #[test]
    fn confirmed_moves_stay_quiet() {
        let confirmed = Settlement::StatusConfirmed {
            task_id: TaskId::new("1"),
        };
        assert_eq!(settlement_status(&confirmed), None);

        let failed = Settlement::StatusFailed {
            task_id: TaskId::new("1"),
            reason: "offline".into(),
            rolled_back: true,
        };
        assert!(settlement_status(&failed)
            .expect("status")
            .contains("restored"));
    }
}
