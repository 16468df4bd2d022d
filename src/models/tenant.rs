use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque company identifier as the backend returns it (uuid string or integer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(Value);

impl TenantId {
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for TenantId {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TenantRow {
    pub id: TenantId,
}
