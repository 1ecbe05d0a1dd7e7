use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use tunebook_types::{Reply, WireError};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::transport::{CallRequest, RejectEnvelope, ReplyEnvelope, SENDER_HEADER, Transport};

/// JSON-over-HTTP transport to a Tunebook gateway.
///
/// The gateway is a separate process that owns the replica connection:
/// it accepts `POST /api/canister/{id}/{query|call}/{method}` with a JSON
/// argument array and the caller in `x-tunebook-sender`, performs the
/// Candid call, and answers `{"reply": [...]}` or a reject envelope. This
/// transport cannot talk to a replica or boundary node directly.
#[derive(Clone)]
pub struct HttpTransport {
    config: ClientConfig,
    client: Client,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, request: CallRequest) -> Result<Reply, ClientError> {
        let method = request.method;
        let url = self.config.endpoint(method);

        let mut builder = self.client.post(&url).json(&request.args);
        if let Some(sender) = &request.sender {
            builder = builder.header(SENDER_HEADER, sender.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|source| ClientError::Transport { method, source })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::Transport { method, source })?;

        if !status.is_success() {
            let reject: RejectEnvelope = serde_json::from_slice(&body).unwrap_or_default();
            let code = reject.reject_code.unwrap_or(u32::from(status.as_u16()));
            let message = reject.reject_message.unwrap_or_else(|| {
                let text = String::from_utf8_lossy(&body).trim().to_string();
                if text.is_empty() {
                    status.to_string()
                } else {
                    text
                }
            });
            warn!(%method, %status, code, %message, "call rejected");
            return Err(ClientError::Rejected {
                method,
                code,
                message,
            });
        }

        let envelope: ReplyEnvelope = serde_json::from_slice(&body).map_err(|e| ClientError::Decode {
            method,
            source: WireError::Json(e),
        })?;

        debug!(%method, values = envelope.reply.len(), "reply received");
        Ok(envelope.reply)
    }
}
