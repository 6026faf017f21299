use std::collections::HashSet;

use entity::site::{self, Funnel, FunnelChanges, FunnelStep};
use platform_api::{ApiError, ApiResult};
use platform_client::{BackendClient, Direction};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::service::CrudService;

pub type SiteService = CrudService<site::Model>;

impl CrudService<site::Model> {
    #[instrument(name = "crm.sites.publish", skip(self))]
    pub async fn publish(&self, id: Uuid) -> ApiResult<site::Model> {
        let published = self.set_published(id, true).await?;
        info!(name = %published.name, "site published");
        Ok(published)
    }

    pub async fn unpublish(&self, id: Uuid) -> ApiResult<site::Model> {
        self.set_published(id, false).await
    }

    async fn set_published(&self, id: Uuid, published: bool) -> ApiResult<site::Model> {
        let changes = site::Changes {
            published: Some(published),
            ..Default::default()
        };
        self.update(id, &changes).await
    }

    /// Replaces the tracking snippet after checking it is a single script tag.
    pub async fn set_tracking_script(&self, id: Uuid, script: &str) -> ApiResult<site::Model> {
        site::validate_tracking_script(script)?;
        let changes = site::Changes {
            tracking_script: Some(script.to_string()),
            ..Default::default()
        };
        self.update(id, &changes).await
    }
}

#[derive(Clone)]
pub struct FunnelService {
    records: CrudService<Funnel>,
}

impl FunnelService {
    pub fn new(client: BackendClient) -> Self {
        Self {
            records: CrudService::new(client),
        }
    }

    pub fn records(&self) -> &CrudService<Funnel> {
        &self.records
    }

    pub async fn for_site(&self, site_id: Uuid) -> ApiResult<Vec<Funnel>> {
        self.records
            .query()
            .eq("site_id", site_id)
            .order("created_at", Direction::Asc)
            .select()
            .await
    }

    pub async fn reorder_steps(&self, funnel_id: Uuid, order: &[Uuid]) -> ApiResult<Funnel> {
        let funnel = self.records.get(funnel_id).await?;
        let steps = reorder(funnel.steps, order)?;
        let changes = FunnelChanges {
            steps: Some(steps),
            ..Default::default()
        };
        self.records.update(funnel_id, &changes).await
    }
}

/// Arranges `steps` in `order`, which must name every step exactly once.
pub fn reorder(steps: Vec<FunnelStep>, order: &[Uuid]) -> ApiResult<Vec<FunnelStep>> {
    let unique: HashSet<&Uuid> = order.iter().collect();
    if order.len() != steps.len() || unique.len() != order.len() {
        return Err(ApiError::invalid(
            "step order must list every funnel step exactly once",
        ));
    }
    let mut remaining = steps;
    let mut ordered = Vec::with_capacity(order.len());
    for id in order {
        let position = remaining
            .iter()
            .position(|step| step.id == *id)
            .ok_or_else(|| ApiError::invalid(format!("step {id} is not part of this funnel")))?;
        ordered.push(remaining.swap_remove(position));
    }
    Ok(ordered)
}
