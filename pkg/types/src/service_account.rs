use serde::{Deserialize, Serialize};

use crate::meta::ObjectMeta;

/// Reference to a Secret listed under `serviceAccount.secrets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectReference {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<ObjectReference>,
}

impl ServiceAccount {
    pub fn new(metadata: ObjectMeta) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "ServiceAccount".to_string(),
            metadata,
            secrets: Vec::new(),
        }
    }
}
