//! Runs board mutations against the backend and packages the outcome for
//! [`TaskBoard::apply_result`](crate::board::TaskBoard::apply_result).

use tracing::{info, warn};

use crate::{
    api::TaskApi,
    board::{MutationFailure, MutationResult, RemoteMutation},
};

pub async fn execute_mutation(api: &dyn TaskApi, mutation: &RemoteMutation) -> MutationResult {
    let outcome = match mutation {
        RemoteMutation::PatchStatus {
            task_id, status, ..
        } => api.patch_status(task_id, *status).await.map(|()| None),
        RemoteMutation::Update {
            task_id, payload, ..
        } => api.update_task(task_id, payload).await,
        RemoteMutation::Delete { task_id, .. } => api.delete_task(task_id).await.map(|()| None),
        RemoteMutation::Create { payload, .. } => api.create_task(payload).await,
    };

    let id = mutation.id();
    match outcome {
        Ok(record) => {
            info!(mutation_id = id.0, request = mutation.label(), "mutation confirmed");
            MutationResult {
                id,
                outcome: Ok(record),
            }
        }
        Err(err) => {
            warn!(mutation_id = id.0, request = mutation.label(), "mutation failed: {err}");
            MutationResult {
                id,
                outcome: Err(MutationFailure::from(&err)),
            }
        }
    }
}

/// Executes mutations in order. Later requests are still sent when an
/// earlier one fails.
pub async fn execute_all(api: &dyn TaskApi, mutations: &[RemoteMutation]) -> Vec<MutationResult> {
    let mut results = Vec::with_capacity(mutations.len());
    for mutation in mutations {
        results.push(execute_mutation(api, mutation).await);
    }
    results
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
