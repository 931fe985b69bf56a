pub mod auth;
pub mod client;
pub mod error;
pub mod resource;
pub mod retention;
pub mod storage;

pub use auth::OAuthToken;
pub use client::{DiskClient, DiskSettings};
pub use error::{Cause, DiskError};
pub use resource::{Resource, ResourceType};
pub use retention::{RetentionPolicy, RetentionReport};
pub use storage::StorageClient;
