use chrono::{DateTime, Utc};
use entity::task::{self, Status};
use platform_api::ApiResult;
use platform_client::Direction;
use uuid::Uuid;

use crate::service::{CrudService, ListParams};

pub type TaskService = CrudService<task::Model>;

impl CrudService<task::Model> {
    pub async fn complete(&self, id: Uuid) -> ApiResult<task::Model> {
        let changes = task::Changes {
            status: Some(Status::Done),
            completed_at: Some(Utc::now()),
            ..Default::default()
        };
        self.update(id, &changes).await
    }

    /// Moves a finished task back to `todo`. The completion time is kept as
    /// history.
    pub async fn reopen(&self, id: Uuid) -> ApiResult<task::Model> {
        let changes = task::Changes {
            status: Some(Status::Todo),
            ..Default::default()
        };
        self.update(id, &changes).await
    }

    pub async fn for_contact(&self, contact_id: Uuid, params: ListParams) -> ApiResult<Vec<task::Model>> {
        params
            .apply(self.query().eq("contact_id", contact_id))
            .select()
            .await
    }

    /// Unfinished tasks due before `cutoff`, soonest first.
    pub async fn open_due_before(&self, cutoff: DateTime<Utc>) -> ApiResult<Vec<task::Model>> {
        self.query()
            .neq("status", Status::Done)
            .lt("due_at", cutoff)
            .order("due_at", Direction::Asc)
            .select()
            .await
    }
}
