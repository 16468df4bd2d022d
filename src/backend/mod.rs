pub mod supabase;

pub use supabase::SupabaseClient;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::{NewAccount, ProfileChanges, TenantRow, UserProfile};

/// Failure reaching the backend or reading its answer.
///
/// The message keeps whatever text the backend sent back, since account
/// creation sometimes reports a success only inside such a message.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request to backend failed: {0}")]
    Transport(String),
    #[error("Backend returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Unexpected backend response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        BackendError::Transport(e.to_string())
    }
}

/// Raw answer of a remote procedure call, before any interpretation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RpcResponse {
    pub data: Option<Value>,
    pub error: Option<Value>,
}

impl RpcResponse {
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn error(error: Value) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }
}

/// Operations this service needs from the managed backend.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Rows of the companies table whose name equals `name` exactly.
    async fn find_tenants_by_name(&self, name: &str) -> Result<Vec<TenantRow>, BackendError>;

    /// One call to the account-creation procedure. The response is returned verbatim.
    async fn create_user_with_auth(
        &self,
        account: &NewAccount,
    ) -> Result<RpcResponse, BackendError>;

    async fn list_user_profiles(&self) -> Result<Vec<UserProfile>, BackendError>;

    /// Returns the rows the backend reports as updated.
    async fn update_user_profile(
        &self,
        id: &Value,
        changes: &ProfileChanges,
    ) -> Result<Vec<Value>, BackendError>;
}
