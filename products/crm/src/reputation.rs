use entity::reputation::{
    ConnectionDraft, Platform, PlatformConnection, Review, ReviewChanges,
};
use platform_api::ApiResult;
use platform_client::{BackendClient, Direction};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::service::{CrudService, ListParams};

pub use entity::reputation::average_rating;

/// Reviews pulled from review platforms plus the platform accounts they come from.
#[derive(Clone)]
pub struct ReputationService {
    reviews: CrudService<Review>,
    connections: CrudService<PlatformConnection>,
}

impl ReputationService {
    pub fn new(client: BackendClient) -> Self {
        Self {
            reviews: CrudService::new(client.clone()),
            connections: CrudService::new(client),
        }
    }

    pub async fn reviews(&self, params: ListParams) -> ApiResult<Vec<Review>> {
        self.reviews
            .list(params.ordered("posted_at", Direction::Desc))
            .await
    }

    pub async fn reviews_for(&self, platform: Platform, params: ListParams) -> ApiResult<Vec<Review>> {
        params
            .ordered("posted_at", Direction::Desc)
            .apply(self.reviews.query().eq("platform", platform))
            .select()
            .await
    }

    pub async fn reply(&self, review_id: Uuid, reply: &str) -> ApiResult<Review> {
        let changes = ReviewChanges {
            reply: Some(reply.to_string()),
        };
        self.reviews.update(review_id, &changes).await
    }

    pub async fn connections(&self) -> ApiResult<Vec<PlatformConnection>> {
        self.connections
            .query()
            .order("connected_at", Direction::Asc)
            .select()
            .await
    }

    #[instrument(name = "crm.reputation.connect", skip(self))]
    pub async fn connect(
        &self,
        platform: Platform,
        account_name: &str,
        external_id: &str,
    ) -> ApiResult<PlatformConnection> {
        let draft = ConnectionDraft {
            platform,
            account_name: account_name.to_string(),
            external_id: external_id.to_string(),
        };
        self.connections.create(&draft).await
    }

    #[instrument(name = "crm.reputation.disconnect", skip(self))]
    pub async fn disconnect(&self, connection_id: Uuid) -> ApiResult<PlatformConnection> {
        let removed = self.connections.delete(connection_id).await?;
        info!(platform = ?removed.platform, account = %removed.account_name, "platform disconnected");
        Ok(removed)
    }
}
