//! CRM services over the hosted backend.
//!
//! Every service borrows one [`BackendClient`]; [`Crm`] builds the full set
//! from a single client so callers construct the client once at startup.

pub mod assets;
pub mod calendars;
pub mod campaigns;
pub mod contacts;
pub mod conversations;
pub mod invoices;
pub mod opportunities;
pub mod reputation;
pub mod service;
pub mod sites;
pub mod sms;
pub mod tasks;
pub mod webhooks;
pub mod workflows;

use platform_client::BackendClient;

pub use ab_test::{VariantDraft, VariantError, VariantSet};
pub use assets::AssetLibrary;
pub use calendars::{BookingService, CalendarService};
pub use campaigns::{AbTestService, CampaignService};
pub use contacts::{ContactAttachments, ContactService};
pub use conversations::ConversationService;
pub use invoices::InvoiceService;
pub use opportunities::OpportunityService;
pub use reputation::ReputationService;
pub use service::{CrudService, ListParams};
pub use sites::{FunnelService, SiteService};
pub use sms::SmsService;
pub use tasks::TaskService;
pub use webhooks::WebhookService;
pub use workflows::{LogSubscription, WorkflowService};

pub const DEFAULT_ASSETS_BUCKET: &str = "assets";
pub const DEFAULT_ATTACHMENTS_BUCKET: &str = "contact-attachments";

/// Storage bucket names used by the file-backed services.
#[derive(Clone, Debug)]
pub struct Buckets {
    pub assets: String,
    pub attachments: String,
}

impl Default for Buckets {
    fn default() -> Self {
        Self {
            assets: DEFAULT_ASSETS_BUCKET.to_string(),
            attachments: DEFAULT_ATTACHMENTS_BUCKET.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Crm {
    pub contacts: ContactService,
    pub attachments: ContactAttachments,
    pub opportunities: OpportunityService,
    pub workflows: WorkflowService,
    pub invoices: InvoiceService,
    pub tasks: TaskService,
    pub calendars: CalendarService,
    pub bookings: BookingService,
    pub sites: SiteService,
    pub funnels: FunnelService,
    pub reputation: ReputationService,
    pub campaigns: CampaignService,
    pub ab_tests: AbTestService,
    pub webhooks: WebhookService,
    pub sms: SmsService,
    pub conversations: ConversationService,
    pub assets: AssetLibrary,
}

impl Crm {
    pub fn new(client: BackendClient, buckets: &Buckets) -> Self {
        Self {
            contacts: CrudService::new(client.clone()),
            attachments: ContactAttachments::new(client.clone(), &buckets.attachments),
            opportunities: CrudService::new(client.clone()),
            workflows: CrudService::new(client.clone()),
            invoices: CrudService::new(client.clone()),
            tasks: CrudService::new(client.clone()),
            calendars: CrudService::new(client.clone()),
            bookings: BookingService::new(client.clone()),
            sites: CrudService::new(client.clone()),
            funnels: FunnelService::new(client.clone()),
            reputation: ReputationService::new(client.clone()),
            campaigns: CrudService::new(client.clone()),
            ab_tests: AbTestService::new(client.clone()),
            webhooks: CrudService::new(client.clone()),
            sms: SmsService::new(client.clone()),
            conversations: ConversationService::new(client.clone()),
            assets: AssetLibrary::new(client, &buckets.assets),
        }
    }
}
