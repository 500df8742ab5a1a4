use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Discriminator carried by every response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failed,
}

/// Envelope for operations that only report an outcome.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub status: Status,
    pub error: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            error: false,
            message: message.into(),
        }
    }
}

/// Envelope for failed requests.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FailureResponse {
    pub status: Status,
    pub error: bool,
    pub message: String,
}

impl FailureResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: Status::Failed,
            error: true,
            message: message.into(),
        }
    }
}
