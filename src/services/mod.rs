pub mod account_creator;
pub mod defaults_backfill;
pub mod import_service;
pub mod record_extractor;
pub mod tenant_resolver;

pub use import_service::{ImportService, StagedUpload};
