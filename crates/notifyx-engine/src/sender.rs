use async_trait::async_trait;
use thiserror::Error;

/// A gateway send failure, surfaced as a generic message. There is no retry
/// anywhere on this path — a failed send is terminal for the invocation.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct SendError(pub String);

#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub message_id: String,
}

/// Boundary between the execution logic and the WhatsApp gateway. The real
/// implementation lives in notifyx-gateway; tests inject scripted senders.
#[async_trait]
pub trait TextSender: Send + Sync {
    async fn send_text(
        &self,
        instance: &str,
        to: &str,
        text: &str,
    ) -> Result<SendReceipt, SendError>;
}
