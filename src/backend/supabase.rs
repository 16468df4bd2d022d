use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{BackendClient, BackendError, RpcResponse};
use crate::config::BackendConfig;
use crate::models::{NewAccount, ProfileChanges, TenantRow, UserProfile};

const COMPANIES_TABLE: &str = "companies";
const USERS_TABLE: &str = "users";
const CREATE_USER_RPC: &str = "create_user_with_auth";

/// PostgREST client for the managed backend, authenticated with the service-role key.
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        log::info!("🔌 Backend client ready for {}", config.url);

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
        })
    }

    fn request(&self, method: Method, path_and_query: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, path_and_query);
        self.http
            .request(method, url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Accept", "application/json")
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Vec<T>, BackendError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&body).map_err(|e| BackendError::Decode(format!("{}: {}", e, body)))
    }
}

#[async_trait]
impl BackendClient for SupabaseClient {
    async fn find_tenants_by_name(&self, name: &str) -> Result<Vec<TenantRow>, BackendError> {
        log::debug!("🔍 Looking up company '{}'", name);
        self.fetch_rows(self.request(Method::GET, &tenant_lookup_query(name)))
            .await
    }

    async fn create_user_with_auth(
        &self,
        account: &NewAccount,
    ) -> Result<RpcResponse, BackendError> {
        let response = self
            .request(Method::POST, &format!("rpc/{}", CREATE_USER_RPC))
            .json(account)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        interpret_rpc_body(status.as_u16(), &body)
    }

    async fn list_user_profiles(&self) -> Result<Vec<UserProfile>, BackendError> {
        let query = format!("{}?select=id,department,designation", USERS_TABLE);
        self.fetch_rows(self.request(Method::GET, &query)).await
    }

    async fn update_user_profile(
        &self,
        id: &Value,
        changes: &ProfileChanges,
    ) -> Result<Vec<Value>, BackendError> {
        let builder = self
            .request(Method::PATCH, &profile_update_query(id))
            .header("Prefer", "return=representation")
            .json(changes);
        self.fetch_rows(builder).await
    }
}

fn tenant_lookup_query(name: &str) -> String {
    format!(
        "{}?select=id&name=eq.{}",
        COMPANIES_TABLE,
        urlencoding::encode(name)
    )
}

fn profile_update_query(id: &Value) -> String {
    let id = match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!("{}?id=eq.{}", USERS_TABLE, urlencoding::encode(&id))
}

/// Maps an RPC answer onto `RpcResponse` without judging success.
///
/// 2xx JSON bodies become `data`, 2xx text bodies become string `data`,
/// non-2xx JSON bodies become `error`. Anything else is a fault carrying the body text.
fn interpret_rpc_body(status: u16, body: &str) -> Result<RpcResponse, BackendError> {
    let parsed = serde_json::from_str::<Value>(body).ok();

    if (200..300).contains(&status) {
        return Ok(match parsed {
            Some(value) => RpcResponse::data(value),
            None if body.trim().is_empty() => RpcResponse::default(),
            None => RpcResponse::data(Value::String(body.to_string())),
        });
    }

    match parsed {
        Some(error) => Ok(RpcResponse::error(error)),
        None => Err(BackendError::Api {
            status,
            body: body.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tenant_lookup_query_encodes_name() {
        assert_eq!(
            tenant_lookup_query("Acme & Sons"),
            "companies?select=id&name=eq.Acme%20%26%20Sons"
        );
    }

    #[test]
    fn test_profile_update_query() {
        assert_eq!(profile_update_query(&json!(42)), "users?id=eq.42");
        assert_eq!(
            profile_update_query(&json!("8f1c-aa")),
            "users?id=eq.8f1c-aa"
        );
    }

    #[test]
    fn test_rpc_success_body_is_data() {
        let response = interpret_rpc_body(200, r#"{"success": true, "user_id": "u1"}"#).unwrap();
        assert_eq!(response.data, Some(json!({"success": true, "user_id": "u1"})));
        assert!(response.error.is_none());
    }

    #[test]
    fn test_rpc_text_body_is_string_data() {
        let response = interpret_rpc_body(200, "not json").unwrap();
        assert_eq!(response.data, Some(json!("not json")));
    }

    #[test]
    fn test_rpc_error_json_is_error() {
        let body = r#"{"code": "P0001", "details": "b'{\"success\": true}'", "message": "oops"}"#;
        let response = interpret_rpc_body(400, body).unwrap();
        assert!(response.data.is_none());
        assert_eq!(response.error.unwrap()["code"], "P0001");
    }

    #[test]
    fn test_rpc_error_text_is_fault_with_body() {
        let err = interpret_rpc_body(502, "upstream 'success' : true").unwrap_err();
        assert!(err.to_string().contains("'success' : true"));
    }
}
