//! Response envelopes shared by every route

use serde::{Deserialize, Serialize};

/// API version reported in every envelope
pub const API_VERSION: &str = "v3";

/// Standard response envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BaseResponse {
    pub api_version: String,
    pub request_id: String,
    pub message: String,
    pub status_code: u16,
}

impl BaseResponse {
    pub fn new(request_id: impl Into<String>, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            request_id: request_id.into(),
            message: message.into(),
            status_code,
        }
    }

    /// Empty 200 envelope
    pub fn ok() -> Self {
        Self::new("", "", 200)
    }
}

/// Ping response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    pub api_version: String,
    pub timestamp: String,
    pub service_name: String,
}
