use pkg_constants::token::SERVICE_ACCOUNT_TOKEN_TYPE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::meta::ObjectMeta;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    /// Secret data stored as base64-encoded values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl Secret {
    /// An empty `kubernetes.io/service-account-token` secret for the token controller to fill.
    pub fn service_account_token(metadata: ObjectMeta) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "Secret".to_string(),
            metadata,
            type_: Some(SERVICE_ACCOUNT_TOKEN_TYPE.to_string()),
            data: BTreeMap::new(),
        }
    }

    pub fn is_service_account_token(&self) -> bool {
        self.type_.as_deref() == Some(SERVICE_ACCOUNT_TOKEN_TYPE)
    }

    /// Base64 value for `key`, or `None` if it is missing or still empty.
    pub fn data_value(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}
