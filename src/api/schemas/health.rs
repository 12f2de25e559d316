use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiHealth {
    pub status: String,
    pub message: String,
}
