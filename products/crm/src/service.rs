use std::marker::PhantomData;

use entity::{Resource, Validate};
use platform_api::{ApiError, ApiResult};
use platform_client::{BackendClient, Direction, TableQuery};
use tracing::{info, instrument};
use uuid::Uuid;

pub const DEFAULT_PAGE: u64 = 50;
pub const MAX_PAGE: u64 = 200;

/// Paging and ordering for list calls.
#[derive(Clone, Debug)]
pub struct ListParams {
    pub limit: u64,
    pub offset: u64,
    pub order_by: &'static str,
    pub direction: Direction,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE,
            offset: 0,
            order_by: "created_at",
            direction: Direction::Desc,
        }
    }
}

impl ListParams {
    pub fn page(limit: u64, offset: u64) -> Self {
        Self {
            limit,
            offset,
            ..Self::default()
        }
    }

    pub fn ordered(mut self, column: &'static str, direction: Direction) -> Self {
        self.order_by = column;
        self.direction = direction;
        self
    }

    pub(crate) fn apply(&self, query: TableQuery) -> TableQuery {
        query
            .order(self.order_by, self.direction)
            .limit(self.limit.clamp(1, MAX_PAGE))
            .offset(self.offset)
    }
}

/// CRUD over one resource table. Resource-specific operations live in
/// inherent impls next to each resource's module.
pub struct CrudService<R: Resource> {
    client: BackendClient,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for CrudService<R> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone())
    }
}

impl<R: Resource> CrudService<R> {
    pub fn new(client: BackendClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }

    pub(crate) fn query(&self) -> TableQuery {
        self.client.table(R::TABLE)
    }

    #[instrument(name = "crm.list", skip(self), fields(table = R::TABLE))]
    pub async fn list(&self, params: ListParams) -> ApiResult<Vec<R>> {
        params.apply(self.query()).select().await
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<R> {
        self.query().eq("id", id).single().await
    }

    #[instrument(name = "crm.create", skip_all, fields(table = R::TABLE))]
    pub async fn create(&self, draft: &R::Draft) -> ApiResult<R> {
        draft.validate()?;
        let rows: Vec<R> = self.query().insert(draft).await?;
        let created = rows
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Decode(format!("{} insert returned no rows", R::TABLE)))?;
        info!(id = %created.id(), "record created");
        Ok(created)
    }

    #[instrument(name = "crm.update", skip(self, changes), fields(table = R::TABLE))]
    pub async fn update(&self, id: Uuid, changes: &R::Changes) -> ApiResult<R> {
        changes.validate()?;
        let rows: Vec<R> = self.query().eq("id", id).update(changes).await?;
        rows.into_iter().next().ok_or(ApiError::NotFound)
    }

    #[instrument(name = "crm.delete", skip(self), fields(table = R::TABLE))]
    pub async fn delete(&self, id: Uuid) -> ApiResult<R> {
        let rows: Vec<R> = self.query().eq("id", id).delete().await?;
        let deleted = rows.into_iter().next().ok_or(ApiError::NotFound)?;
        info!("record deleted");
        Ok(deleted)
    }
}
