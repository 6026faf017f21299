use chrono::{NaiveDate, Utc};
use entity::invoice::{self, LineItem, Status};
use platform_api::{ApiError, ApiResult};
use platform_client::Direction;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::service::{CrudService, ListParams};

pub type InvoiceService = CrudService<invoice::Model>;

impl CrudService<invoice::Model> {
    pub async fn mark_sent(&self, id: Uuid) -> ApiResult<invoice::Model> {
        let changes = invoice::Changes {
            status: Some(Status::Sent),
            issued_on: Some(Utc::now().date_naive()),
            ..Default::default()
        };
        self.update(id, &changes).await
    }

    #[instrument(name = "crm.invoices.mark_paid", skip(self))]
    pub async fn mark_paid(&self, id: Uuid) -> ApiResult<invoice::Model> {
        let changes = invoice::Changes {
            status: Some(Status::Paid),
            paid_at: Some(Utc::now()),
            ..Default::default()
        };
        let paid = self.update(id, &changes).await?;
        info!(number = %paid.number, total_cents = paid.total_cents, "invoice paid");
        Ok(paid)
    }

    pub async fn void(&self, id: Uuid) -> ApiResult<invoice::Model> {
        let changes = invoice::Changes {
            status: Some(Status::Void),
            ..Default::default()
        };
        self.update(id, &changes).await
    }

    /// Sent invoices whose due date is before `today`.
    pub async fn overdue(&self, today: NaiveDate) -> ApiResult<Vec<invoice::Model>> {
        let sent: Vec<invoice::Model> = self
            .query()
            .eq("status", Status::Sent)
            .lt("due_on", today)
            .order("due_on", Direction::Asc)
            .select()
            .await?;
        Ok(sent.into_iter().filter(|i| i.is_overdue(today)).collect())
    }

    /// Replaces the line items and recomputes the stored total. Only draft
    /// invoices can be edited.
    pub async fn update_items(&self, id: Uuid, items: Vec<LineItem>) -> ApiResult<invoice::Model> {
        let current = self.get(id).await?;
        if current.status != Status::Draft {
            return Err(ApiError::Conflict(format!(
                "invoice {} is {:?} and can no longer be edited",
                current.number, current.status
            )));
        }
        let totals = invoice::compute_totals(&items, current.tax_rate_bps);
        let changes = invoice::Changes {
            line_items: Some(items),
            total_cents: Some(totals.total_cents),
            ..Default::default()
        };
        self.update(id, &changes).await
    }

    pub async fn for_contact(&self, contact_id: Uuid, params: ListParams) -> ApiResult<Vec<invoice::Model>> {
        params
            .apply(self.query().eq("contact_id", contact_id))
            .select()
            .await
    }
}
