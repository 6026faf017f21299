use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::{DateTime, Utc};
use entity::workflow::{ExecutionLog, ExecutionStatus};
use platform_api::ApiError;
use products_crm::{CrudService, WorkflowService};
use serde_json::{Value, json};
use suite_tests::{MockBackend, timestamp};
use uuid::Uuid;

const POLL: Duration = Duration::from_millis(10);

fn log_line(execution_id: Uuid, message: &str, status: Option<&str>, at: DateTime<Utc>) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "execution_id": execution_id,
        "node_id": null,
        "level": "info",
        "message": message,
        "status": status,
        "created_at": timestamp(at),
    })
}

#[tokio::test]
async fn test_run_streams_logs_until_terminal_line() -> Result<()> {
    let backend = MockBackend::start().await;
    let execution_id = Uuid::new_v4();
    backend.on_function("test-workflow", move |_, _| {
        Ok(json!({ "execution_id": execution_id, "status": "running" }))
    });
    let start = Utc::now();
    let at = |ms| start + chrono::Duration::milliseconds(ms);
    backend.seed(
        ExecutionLog::TABLE,
        [
            log_line(execution_id, "trigger fired", Some("running"), at(0)),
            log_line(execution_id, "sent welcome email", None, at(5)),
            log_line(execution_id, "workflow finished", Some("completed"), at(10)),
            log_line(execution_id, "late straggler", None, at(15)),
            log_line(Uuid::new_v4(), "other execution", Some("failed"), at(1)),
        ],
    );

    let workflows: WorkflowService = CrudService::new(backend.client());
    let workflow_id = Uuid::new_v4();
    let handle = workflows
        .test_run(workflow_id, &json!({ "contact_id": "c-1" }))
        .await?;
    assert_eq!(handle.execution_id, execution_id);
    assert_eq!(handle.status, ExecutionStatus::Running);
    let calls = backend.function_calls("test-workflow");
    assert_eq!(calls[0]["workflow_id"], json!(workflow_id));
    assert_eq!(calls[0]["payload"]["contact_id"], "c-1");

    let subscription = workflows.subscribe_logs(handle.execution_id, POLL);
    assert_eq!(subscription.execution_id(), execution_id);
    let lines = tokio::time::timeout(Duration::from_secs(5), subscription.collect()).await??;
    let messages: Vec<_> = lines.iter().map(|l| l.message.as_str()).collect();
    assert_eq!(
        messages,
        ["trigger fired", "sent welcome email", "workflow finished"]
    );
    assert!(lines.last().is_some_and(ExecutionLog::is_terminal));
    Ok(())
}

#[tokio::test]
async fn lines_written_during_the_run_arrive_once() -> Result<()> {
    let backend = Arc::new(MockBackend::start().await);
    let execution_id = Uuid::new_v4();
    let start = Utc::now();
    backend.seed(
        ExecutionLog::TABLE,
        [log_line(execution_id, "started", Some("running"), start)],
    );

    let workflows: WorkflowService = CrudService::new(backend.client());
    let mut subscription = workflows.subscribe_logs(execution_id, POLL);
    let first = subscription.next().await.expect("first line")?;
    assert_eq!(first.message, "started");

    let writer = Arc::clone(&backend);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(40)).await;
        // Same timestamp as the first line: the cursor is inclusive.
        writer.seed(
            ExecutionLog::TABLE,
            [log_line(execution_id, "step two", None, start)],
        );
        tokio::time::sleep(Duration::from_millis(40)).await;
        writer.seed(
            ExecutionLog::TABLE,
            [log_line(
                execution_id,
                "failed on step three",
                Some("failed"),
                start + chrono::Duration::seconds(1),
            )],
        );
    });

    let rest = tokio::time::timeout(Duration::from_secs(5), subscription.collect()).await??;
    let messages: Vec<_> = rest.iter().map(|l| l.message.as_str()).collect();
    assert_eq!(messages, ["step two", "failed on step three"]);
    Ok(())
}

#[tokio::test]
async fn unsubscribe_ends_an_open_stream() -> Result<()> {
    let backend = MockBackend::start().await;
    let execution_id = Uuid::new_v4();
    backend.seed(
        ExecutionLog::TABLE,
        [log_line(execution_id, "waiting on delay node", Some("running"), Utc::now())],
    );
    let workflows: WorkflowService = CrudService::new(backend.client());
    let mut subscription = workflows.subscribe_logs(execution_id, POLL);
    let first = subscription.next().await.expect("first line")?;
    assert!(!first.is_terminal());
    subscription.unsubscribe();
    Ok(())
}

#[tokio::test]
async fn poll_failure_is_forwarded_then_stream_ends() -> Result<()> {
    let backend = MockBackend::start().await;
    let workflows: WorkflowService = CrudService::new(backend.client_with_key("expired"));
    let mut subscription = workflows.subscribe_logs(Uuid::new_v4(), POLL);
    let first = tokio::time::timeout(Duration::from_secs(5), subscription.next()).await?;
    assert!(matches!(first, Some(Err(ApiError::Unauthorized))));
    assert!(subscription.next().await.is_none());
    Ok(())
}
