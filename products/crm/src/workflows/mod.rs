pub mod canvas;
mod logs;

use std::time::Duration;

use entity::workflow::{self, Execution, ExecutionStatus};
use platform_api::ApiResult;
use platform_client::Direction;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

pub use logs::LogSubscription;

use crate::service::CrudService;

pub type WorkflowService = CrudService<workflow::Model>;

pub const TEST_RUN_FUNCTION: &str = "test-workflow";
pub const EXECUTIONS_TABLE: &str = "workflow_executions";

#[derive(Serialize)]
struct TestRunRequest<'a> {
    workflow_id: Uuid,
    payload: &'a Value,
}

/// Execution started by a test run.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExecutionHandle {
    pub execution_id: Uuid,
    #[serde(default)]
    pub status: ExecutionStatus,
}

impl CrudService<workflow::Model> {
    pub async fn activate(&self, id: Uuid) -> ApiResult<workflow::Model> {
        self.set_status(id, workflow::Status::Active).await
    }

    pub async fn deactivate(&self, id: Uuid) -> ApiResult<workflow::Model> {
        self.set_status(id, workflow::Status::Inactive).await
    }

    async fn set_status(&self, id: Uuid, status: workflow::Status) -> ApiResult<workflow::Model> {
        let changes = workflow::Changes {
            status: Some(status),
            ..Default::default()
        };
        self.update(id, &changes).await
    }

    /// Asks the backend runner to execute the workflow once with `payload`
    /// as the trigger data.
    #[instrument(name = "crm.workflows.test_run", skip(self, payload))]
    pub async fn test_run(&self, id: Uuid, payload: &Value) -> ApiResult<ExecutionHandle> {
        let handle: ExecutionHandle = self
            .client()
            .invoke(
                TEST_RUN_FUNCTION,
                &TestRunRequest {
                    workflow_id: id,
                    payload,
                },
            )
            .await?;
        info!(execution_id = %handle.execution_id, "workflow test run started");
        Ok(handle)
    }

    pub async fn executions(&self, workflow_id: Uuid, limit: u64) -> ApiResult<Vec<Execution>> {
        self.client()
            .table(EXECUTIONS_TABLE)
            .eq("workflow_id", workflow_id)
            .order("started_at", Direction::Desc)
            .limit(limit)
            .select()
            .await
    }

    /// Streams the log lines of one execution until a terminal line arrives.
    pub fn subscribe_logs(&self, execution_id: Uuid, poll_interval: Duration) -> LogSubscription {
        LogSubscription::spawn(self.client().clone(), execution_id, poll_interval)
    }
}
