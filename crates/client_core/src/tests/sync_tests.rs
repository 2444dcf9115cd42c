use super::*;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    domain::{TaskId, TaskStatus},
    error::{ApiError, ErrorCode},
    protocol::{TaskRecord, TaskUpsertRequest},
};

use crate::{
    board::{FailurePolicy, Settlement, TaskBoard, TaskDraft},
    error::{ClientError, ClientResult},
    store::tests::task,
};

#[derive(Default)]
struct FakeTaskApi {
    calls: Mutex<Vec<String>>,
    reject_status_for: Option<TaskId>,
    unauthorized: bool,
}

impl FakeTaskApi {
    fn log(&self, call: String) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn check_auth(&self) -> ClientResult<()> {
        if self.unauthorized {
            return Err(ClientError::from_api(
                401,
                ApiError::new(ErrorCode::Unauthorized, "Missing Authorization Header"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskApi for FakeTaskApi {
    async fn list_tasks(&self) -> ClientResult<Vec<TaskRecord>> {
        self.check_auth()?;
        Ok(Vec::new())
    }

    async fn create_task(&self, payload: &TaskUpsertRequest) -> ClientResult<Option<TaskRecord>> {
        self.check_auth()?;
        self.log(format!("create {}", payload.title));
        Ok(Some(TaskRecord {
            id: TaskId::from(501),
            title: payload.title.clone(),
            description: None,
            status: payload.status,
            priority: payload.priority,
            due_date: Some(payload.due_date.clone()),
            created_at: None,
        }))
    }

    async fn update_task(
        &self,
        id: &TaskId,
        _payload: &TaskUpsertRequest,
    ) -> ClientResult<Option<TaskRecord>> {
        self.check_auth()?;
        self.log(format!("update {id}"));
        Ok(None)
    }

    async fn patch_status(&self, id: &TaskId, status: TaskStatus) -> ClientResult<()> {
        self.check_auth()?;
        self.log(format!("patch {id} {}", status.column_id()));
        if self.reject_status_for.as_ref() == Some(id) {
            return Err(ClientError::from_api(
                400,
                ApiError::new(ErrorCode::Validation, "Invalid status"),
            ));
        }
        Ok(())
    }

    async fn delete_task(&self, id: &TaskId) -> ClientResult<()> {
        self.check_auth()?;
        self.log(format!("delete {id}"));
        Ok(())
    }
}

fn board() -> TaskBoard {
    let mut board = TaskBoard::new(FailurePolicy::KeepLocal);
    board.load_records(Vec::new(), Utc::now());
    board
}

#[tokio::test]
async fn confirmed_move_settles_pending_entry() {
    let api = FakeTaskApi::default();
    let mut board = board();
    let id = board
        .create_task(TaskDraft::new("Ship it", Utc::now().date_naive()), Utc::now())
        .expect("task");

    board.drag_started(id.clone());
    let mutation = board.drop_task(&id, Some("fazendo")).expect("mutation");
    let result = execute_mutation(&api, &mutation).await;
    let settlement = board.apply_result(result, Utc::now());

    assert_eq!(settlement, Settlement::StatusConfirmed { task_id: id.clone() });
    assert_eq!(api.calls(), [format!("patch {id} fazendo")]);
    assert_eq!(board.ledger().pending_count(), 0);
}

#[tokio::test]
async fn rejected_move_is_recorded_as_failure() {
    let mut board = TaskBoard::new(FailurePolicy::KeepLocal);
    let api = FakeTaskApi {
        reject_status_for: Some(TaskId::new("A")),
        ..FakeTaskApi::default()
    };
    let mut store_task = task("A", TaskStatus::Entry);
    store_task.title = "Rejected".into();
    let record = TaskRecord {
        id: store_task.id.clone(),
        title: store_task.title.clone(),
        description: None,
        status: store_task.status,
        priority: store_task.priority,
        due_date: Some("2025-03-10".into()),
        created_at: None,
    };
    board.load_records(vec![record], Utc::now());

    board.drag_started(TaskId::new("A"));
    let mutation = board
        .drop_task(&TaskId::new("A"), Some("concluida"))
        .expect("mutation");
    let result = execute_mutation(&api, &mutation).await;
    let failure = result.outcome.as_ref().expect_err("rejected");
    assert!(!failure.unauthorized);
    assert!(failure.message.contains("Invalid status"));

    board.apply_result(result, Utc::now());
    assert_eq!(board.ledger().failures().count(), 1);
    assert_eq!(
        board.store().status_of(&TaskId::new("A")),
        Some(TaskStatus::Done)
    );
}

#[tokio::test]
async fn unauthorized_failures_are_flagged() {
    let api = FakeTaskApi {
        unauthorized: true,
        ..FakeTaskApi::default()
    };
    let mut board = board();
    let id = board
        .create_task(TaskDraft::new("Locked", Utc::now().date_naive()), Utc::now())
        .expect("task");
    let mutation = board.begin_delete(&id).expect("delete");

    let result = execute_mutation(&api, &mutation).await;
    assert!(result.outcome.as_ref().is_err_and(|f| f.unauthorized));
    assert!(matches!(
        board.apply_result(result, Utc::now()),
        Settlement::DeleteFailed { .. }
    ));
    assert!(board.task(&id).is_some());
}

#[tokio::test]
async fn execute_all_keeps_order_and_continues_after_failure() {
    let api = FakeTaskApi {
        reject_status_for: Some(TaskId::new("A")),
        ..FakeTaskApi::default()
    };
    let mut board = TaskBoard::new(FailurePolicy::KeepLocal);
    let now = Utc::now();
    let a = board
        .create_task(TaskDraft::new("first", now.date_naive()), now)
        .expect("a");
    let b = board
        .create_task(TaskDraft::new("second", now.date_naive()), now)
        .expect("b");
    let create = board.begin_remote_create(&a).expect("create");
    let delete = board.begin_delete(&b).expect("delete");

    let results = execute_all(&api, &[create, delete]).await;
    assert_eq!(results.len(), 2);
    assert_eq!(api.calls(), ["create first".to_string(), format!("delete {b}")]);

    let settlements: Vec<Settlement> = results
        .into_iter()
        .map(|result| board.apply_result(result, now))
        .collect();
    assert!(matches!(
        &settlements[0],
        Settlement::Created { task_id, .. } if task_id.as_str() == "501"
    ));
    assert_eq!(settlements[1], Settlement::Deleted { task_id: b });
    assert_eq!(board.store().len(), 1);
}
