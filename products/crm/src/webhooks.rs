use entity::webhook::{self, TestDelivery};
use platform_api::ApiResult;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::service::CrudService;

pub type WebhookService = CrudService<webhook::Model>;

pub const TEST_WEBHOOK_FUNCTION: &str = "test-webhook";

#[derive(Serialize)]
struct TestRequest {
    webhook_id: Uuid,
}

impl CrudService<webhook::Model> {
    /// Asks the backend to deliver a sample event to the webhook URL.
    /// A failed delivery is reported in the result, not as an error.
    #[instrument(name = "crm.webhooks.test", skip(self))]
    pub async fn test(&self, id: Uuid) -> ApiResult<TestDelivery> {
        let delivery: TestDelivery = self
            .client()
            .invoke(TEST_WEBHOOK_FUNCTION, &TestRequest { webhook_id: id })
            .await?;
        if delivery.success {
            info!(status = ?delivery.status_code, "webhook test delivered");
        } else {
            warn!(status = ?delivery.status_code, "webhook test delivery failed");
        }
        Ok(delivery)
    }

    pub async fn enable(&self, id: Uuid) -> ApiResult<webhook::Model> {
        self.set_active(id, true).await
    }

    pub async fn disable(&self, id: Uuid) -> ApiResult<webhook::Model> {
        self.set_active(id, false).await
    }

    async fn set_active(&self, id: Uuid, active: bool) -> ApiResult<webhook::Model> {
        let changes = webhook::Changes {
            active: Some(active),
            ..Default::default()
        };
        self.update(id, &changes).await
    }
}
