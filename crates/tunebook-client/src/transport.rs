use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tunebook_types::{Principal, Reply};

use crate::catalog::Method;
use crate::error::ClientError;

/// Header carrying the caller's principal. Absent for anonymous calls.
pub const SENDER_HEADER: &str = "x-tunebook-sender";

/// One round trip: a method, its encoded positional arguments, and who is
/// asking.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub method: Method,
    pub sender: Option<Principal>,
    pub args: Vec<Value>,
}

/// Moves a [`CallRequest`] to the backend and brings back its [`Reply`].
///
/// Implementations perform exactly one attempt per call. Retries, caching
/// and batching are left to callers.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, request: CallRequest) -> Result<Reply, ClientError>;
}

/// Body of a successful gateway response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    pub reply: Reply,
}

/// Body of a rejected call. Gateways are not required to fill either field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RejectEnvelope {
    #[serde(default)]
    pub reject_code: Option<u32>,
    #[serde(default)]
    pub reject_message: Option<String>,
}
