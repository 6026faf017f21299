pub mod recurrence;

use chrono::{DateTime, Utc};
use entity::calendar::{self, Booking, BookingStatus, SyncStatus};
use platform_api::{ApiError, ApiResult};
use platform_client::{BackendClient, Direction};
use tracing::{info, instrument};
use uuid::Uuid;

pub use recurrence::{Frequency, RecurrenceError, RecurrenceRule, Weekday};

use crate::service::CrudService;

pub type CalendarService = CrudService<calendar::Model>;

impl CrudService<calendar::Model> {
    /// Records a sync state change. Moving to `active` stamps the sync time.
    #[instrument(name = "crm.calendars.set_sync_status", skip(self))]
    pub async fn set_sync_status(&self, id: Uuid, status: SyncStatus) -> ApiResult<calendar::Model> {
        let changes = calendar::Changes {
            sync_status: Some(status),
            last_synced_at: (status == SyncStatus::Active).then(Utc::now),
            ..Default::default()
        };
        self.update(id, &changes).await
    }
}

/// Bookings on calendars. Recurrence is stored as an RRULE value.
#[derive(Clone)]
pub struct BookingService {
    records: CrudService<Booking>,
}

impl BookingService {
    pub fn new(client: BackendClient) -> Self {
        Self {
            records: CrudService::new(client),
        }
    }

    pub fn records(&self) -> &CrudService<Booking> {
        &self.records
    }

    /// Books a slot. A recurrence rule, when given, is anchored at the
    /// booking start and checked before the request is issued; it is stored
    /// without the `RRULE:` prefix.
    pub async fn book(&self, mut draft: calendar::BookingDraft) -> ApiResult<Booking> {
        if let Some(value) = draft.recurrence.take() {
            value
                .parse::<RecurrenceRule>()
                .and_then(|rule| rule.validate(draft.starts_at))
                .map_err(|err| ApiError::invalid(format!("recurrence: {err}")))?;
            draft.recurrence = Some(recurrence::strip_prefix(&value).to_string());
        }
        self.records.create(&draft).await
    }

    /// Confirmed bookings on `calendar_id` that start within `[from, to)`.
    pub async fn between(
        &self,
        calendar_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ApiResult<Vec<Booking>> {
        if to <= from {
            return Err(ApiError::invalid("range end must be after its start"));
        }
        self.records
            .query()
            .eq("calendar_id", calendar_id)
            .eq("status", BookingStatus::Confirmed)
            .gte("starts_at", from)
            .lt("starts_at", to)
            .order("starts_at", Direction::Asc)
            .select()
            .await
    }

    pub async fn cancel(&self, id: Uuid) -> ApiResult<Booking> {
        let changes = calendar::BookingChanges {
            status: Some(BookingStatus::Cancelled),
            ..Default::default()
        };
        let cancelled = self.records.update(id, &changes).await?;
        info!(booking = %cancelled.id, "booking cancelled");
        Ok(cancelled)
    }
}
