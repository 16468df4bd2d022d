use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::TenantId;

pub const DEFAULT_ROLE: &str = "user";
pub const DEFAULT_DEPARTMENT: &str = "No Department";
pub const DEFAULT_DESIGNATION: &str = "No Designation";

/// One data row of an import upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub email: String, // always lower-cased
    pub full_name: String,
    pub password: String,
}

/// Arguments of the backend's `create_user_with_auth` procedure.
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub p_email: String,
    pub p_password: String,
    pub p_full_name: String,
    pub p_role: String,
    pub p_company_id: TenantId,
    pub p_department: String,
    pub p_designation: String,
}

impl NewAccount {
    pub fn from_record(record: &UserRecord, company_id: &TenantId) -> Self {
        Self {
            p_email: record.email.clone(),
            p_password: record.password.clone(),
            p_full_name: record.full_name.clone(),
            p_role: DEFAULT_ROLE.to_string(),
            p_company_id: company_id.clone(),
            p_department: DEFAULT_DEPARTMENT.to_string(),
            p_designation: DEFAULT_DESIGNATION.to_string(),
        }
    }
}

/// Row of the backend `users` table, as far as the defaults backfill cares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Value,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
}

/// Partial update for a `users` row; unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.department.is_none() && self.designation.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_carries_fixed_defaults() {
        let record = UserRecord {
            email: "ada@example.com".to_string(),
            full_name: "Ada Lovelace".to_string(),
            password: "analytical".to_string(),
        };
        let account = NewAccount::from_record(&record, &TenantId::from(serde_json::json!(7)));
        let body = serde_json::to_value(&account).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "p_email": "ada@example.com",
                "p_password": "analytical",
                "p_full_name": "Ada Lovelace",
                "p_role": "user",
                "p_company_id": 7,
                "p_department": "No Department",
                "p_designation": "No Designation"
            })
        );
    }
}
