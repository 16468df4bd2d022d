//! In-memory `BackendClient` for unit tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::backend::{BackendClient, BackendError, RpcResponse};
use crate::models::{NewAccount, ProfileChanges, TenantId, TenantRow, UserProfile};

type CreateScript =
    Box<dyn Fn(usize, &NewAccount) -> Result<RpcResponse, BackendError> + Send + Sync>;

pub struct StubBackend {
    tenants: Vec<(String, Value)>,
    tenant_lookup_fails: bool,
    tenant_lookups: AtomicUsize,
    create_script: CreateScript,
    created: Mutex<Vec<NewAccount>>,
    profiles: Vec<UserProfile>,
    rejected_profile_ids: Vec<Value>,
    profile_updates: Mutex<Vec<(Value, ProfileChanges)>>,
}

impl StubBackend {
    /// Every creation succeeds until scripted otherwise.
    pub fn new() -> Self {
        Self {
            tenants: Vec::new(),
            tenant_lookup_fails: false,
            tenant_lookups: AtomicUsize::new(0),
            create_script: Box::new(|_, account| {
                Ok(RpcResponse::data(json!({"success": true, "email": account.p_email})))
            }),
            created: Mutex::new(Vec::new()),
            profiles: Vec::new(),
            rejected_profile_ids: Vec::new(),
            profile_updates: Mutex::new(Vec::new()),
        }
    }

    pub fn with_tenant(mut self, name: &str, id: Value) -> Self {
        self.tenants.push((name.to_string(), id));
        self
    }

    pub fn failing_tenant_lookup(mut self) -> Self {
        self.tenant_lookup_fails = true;
        self
    }

    /// `script` receives the 0-based call index and the account being created.
    pub fn with_create_script<F>(mut self, script: F) -> Self
    where
        F: Fn(usize, &NewAccount) -> Result<RpcResponse, BackendError> + Send + Sync + 'static,
    {
        self.create_script = Box::new(script);
        self
    }

    pub fn with_profiles(mut self, profiles: Vec<UserProfile>) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn rejecting_profile_update(mut self, id: Value) -> Self {
        self.rejected_profile_ids.push(id);
        self
    }

    pub fn tenant_lookups(&self) -> usize {
        self.tenant_lookups.load(Ordering::SeqCst)
    }

    pub fn created_accounts(&self) -> Vec<NewAccount> {
        self.created.lock().unwrap().clone()
    }

    pub fn profile_updates(&self) -> Vec<(Value, ProfileChanges)> {
        self.profile_updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackendClient for StubBackend {
    async fn find_tenants_by_name(&self, name: &str) -> Result<Vec<TenantRow>, BackendError> {
        self.tenant_lookups.fetch_add(1, Ordering::SeqCst);
        if self.tenant_lookup_fails {
            return Err(BackendError::Transport("connection refused".to_string()));
        }

        Ok(self
            .tenants
            .iter()
            .filter(|(tenant, _)| tenant == name)
            .map(|(_, id)| TenantRow {
                id: TenantId::from(id.clone()),
            })
            .collect())
    }

    async fn create_user_with_auth(
        &self,
        account: &NewAccount,
    ) -> Result<RpcResponse, BackendError> {
        let index = {
            let mut created = self.created.lock().unwrap();
            created.push(account.clone());
            created.len() - 1
        };
        (self.create_script)(index, account)
    }

    async fn list_user_profiles(&self) -> Result<Vec<UserProfile>, BackendError> {
        Ok(self.profiles.clone())
    }

    async fn update_user_profile(
        &self,
        id: &Value,
        changes: &ProfileChanges,
    ) -> Result<Vec<Value>, BackendError> {
        self.profile_updates
            .lock()
            .unwrap()
            .push((id.clone(), changes.clone()));

        if self.rejected_profile_ids.contains(id) {
            return Err(BackendError::Api {
                status: 403,
                body: "permission denied".to_string(),
            });
        }
        Ok(vec![json!({"id": id})])
    }
}
