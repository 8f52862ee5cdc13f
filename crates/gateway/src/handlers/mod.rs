//! API handlers module

pub mod health;
pub mod files;
pub mod publications;
pub mod summaries;

use serde::{Deserialize, Serialize};

/// `?limit=` for list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<u64>,
}

/// Body of successful write operations
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), id: None }
    }
}
