//! Resource records shared by the suite services.
//!
//! Each module mirrors one backend table family: a persisted `Model`, an
//! insert payload (`Draft`) and a partial update payload (`Changes`). Payloads
//! are validated before they leave the process.

use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

pub mod ab_test;
pub mod asset;
pub mod calendar;
pub mod campaign;
pub mod contact;
pub mod conversation;
pub mod invoice;
pub mod opportunity;
pub mod reputation;
pub mod site;
pub mod task;
pub mod validate;
pub mod webhook;
pub mod workflow;

pub use validate::{Validate, ValidationError};

/// A record type persisted in one backend table.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Backend table name.
    const TABLE: &'static str;

    type Draft: Serialize + Validate + Send + Sync;
    type Changes: Serialize + Validate + Send + Sync;

    fn id(&self) -> Uuid;
}
