use entity::{Validate, ab_test, campaign};
use platform_api::ApiResult;
use platform_client::{BackendClient, Direction};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    ab_test::VariantSet,
    service::{CrudService, ListParams},
};

pub type CampaignService = CrudService<campaign::Model>;

pub const CREATE_AB_TEST_FUNCTION: &str = "create-ab-test";
pub const DECLARE_WINNER_FUNCTION: &str = "declare-ab-test-winner";

impl CrudService<campaign::Model> {
    pub async fn schedule(
        &self,
        id: Uuid,
        at: chrono::DateTime<chrono::Utc>,
    ) -> ApiResult<campaign::Model> {
        let changes = campaign::Changes {
            status: Some(campaign::Status::Scheduled),
            scheduled_at: Some(at),
            ..Default::default()
        };
        self.update(id, &changes).await
    }

    pub async fn with_status(
        &self,
        status: campaign::Status,
        params: ListParams,
    ) -> ApiResult<Vec<campaign::Model>> {
        params.apply(self.query().eq("status", status)).select().await
    }
}

#[derive(Serialize)]
struct DeclareWinnerRequest {
    test_id: Uuid,
    variant_id: Uuid,
}

/// Function response for a declared winner.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct WinnerDeclared {
    pub test_id: Uuid,
    pub winner_variant_id: Uuid,
}

/// A/B tests are started and concluded through backend functions and read
/// back from the `ab_tests` table.
#[derive(Clone)]
pub struct AbTestService {
    records: CrudService<ab_test::Model>,
}

impl AbTestService {
    pub fn new(client: BackendClient) -> Self {
        Self {
            records: CrudService::new(client),
        }
    }

    /// Submits the variant set as a new test for `campaign_id`.
    #[instrument(name = "crm.ab_tests.create", skip(self, variants), fields(variants = variants.len()))]
    pub async fn create(
        &self,
        campaign_id: Uuid,
        name: &str,
        variants: VariantSet,
    ) -> ApiResult<ab_test::Model> {
        let draft = variants.into_draft(campaign_id, name);
        draft.validate()?;
        let created: ab_test::Model = self
            .records
            .client()
            .invoke(CREATE_AB_TEST_FUNCTION, &draft)
            .await?;
        info!(test_id = %created.id, "A/B test created");
        Ok(created)
    }

    #[instrument(name = "crm.ab_tests.declare_winner", skip(self))]
    pub async fn declare_winner(&self, test_id: Uuid, variant_id: Uuid) -> ApiResult<WinnerDeclared> {
        let declared: WinnerDeclared = self
            .records
            .client()
            .invoke(
                DECLARE_WINNER_FUNCTION,
                &DeclareWinnerRequest {
                    test_id,
                    variant_id,
                },
            )
            .await?;
        info!(winner = %declared.winner_variant_id, "A/B test winner declared");
        Ok(declared)
    }

    pub async fn get(&self, test_id: Uuid) -> ApiResult<ab_test::Model> {
        self.records.get(test_id).await
    }

    pub async fn for_campaign(&self, campaign_id: Uuid) -> ApiResult<Vec<ab_test::Model>> {
        self.records
            .query()
            .eq("campaign_id", campaign_id)
            .order("created_at", Direction::Desc)
            .select()
            .await
    }

    pub async fn rename(&self, test_id: Uuid, name: &str) -> ApiResult<ab_test::Model> {
        let changes = ab_test::Changes {
            name: Some(name.to_string()),
        };
        self.records.update(test_id, &changes).await
    }
}
