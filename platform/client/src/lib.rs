//! Client for the hosted backend: table CRUD, object storage and remote
//! functions. Construct one [`BackendClient`] at startup and hand clones to
//! the services that need it.

mod client;
mod settings;
mod storage;
mod table;

pub use client::BackendClient;
pub use settings::{BackendSettings, SettingsError};
pub use storage::{
    Bucket, ProgressCallback, StoredObject, UPLOAD_CHUNK_BYTES, UploadOptions, UploadProgress,
};
pub use table::{Direction, TableQuery};
