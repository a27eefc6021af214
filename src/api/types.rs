//! Request and response bodies of the registry API

use serde::{Deserialize, Serialize};

/// Response for GET /v1/health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Response for POST /v1/register
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub identifier: String,
}

/// One entry of a POST /v1/indicator-documents/:identifier/bulk_status body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// Indicator name
    pub name: String,
    pub status: String,
}
