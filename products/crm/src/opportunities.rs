use entity::opportunity::{self, Stage};
use platform_api::ApiResult;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::service::{CrudService, ListParams};

pub type OpportunityService = CrudService<opportunity::Model>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    pub stage: Stage,
    pub count: usize,
    pub value_cents: i64,
}

impl CrudService<opportunity::Model> {
    #[instrument(name = "crm.opportunities.move_stage", skip(self))]
    pub async fn move_stage(&self, id: Uuid, stage: Stage) -> ApiResult<opportunity::Model> {
        let changes = opportunity::Changes {
            stage: Some(stage),
            ..Default::default()
        };
        self.update(id, &changes).await
    }

    pub async fn for_pipeline(
        &self,
        pipeline_id: Uuid,
        params: ListParams,
    ) -> ApiResult<Vec<opportunity::Model>> {
        params
            .apply(self.query().eq("pipeline_id", pipeline_id))
            .select()
            .await
    }

    pub async fn in_stage(&self, stage: Stage, params: ListParams) -> ApiResult<Vec<opportunity::Model>> {
        params.apply(self.query().eq("stage", stage)).select().await
    }
}

/// Count and summed value per stage, in pipeline order, including empty stages.
pub fn stage_summary(opportunities: &[opportunity::Model]) -> Vec<StageSummary> {
    Stage::ALL
        .iter()
        .map(|&stage| {
            let in_stage = opportunities.iter().filter(|o| o.stage == stage);
            let (count, value_cents) =
                in_stage.fold((0, 0), |(count, value), o| (count + 1, value + o.value_cents));
            StageSummary {
                stage,
                count,
                value_cents,
            }
        })
        .collect()
}

/// Share of closed opportunities that were won, `None` when none are closed.
pub fn win_rate(opportunities: &[opportunity::Model]) -> Option<f64> {
    let closed = opportunities.iter().filter(|o| o.stage.is_closed()).count();
    if closed == 0 {
        return None;
    }
    let won = opportunities
        .iter()
        .filter(|o| o.stage == Stage::Won)
        .count();
    Some(won as f64 / closed as f64)
}
