use std::time::Duration;

use chrono::Utc;
use notifyx_types::api::Recipient;
use notifyx_types::events::{SendProgress, SendStatus};
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;
use uuid::Uuid;

use crate::sender::TextSender;

/// Fixed pause between recipients during a bulk send. Not a backoff — just a
/// courtesy gap so the gateway is never hammered.
const INTER_RECIPIENT_PAUSE: Duration = Duration::from_millis(500);

/// Live progress goes through a caller-supplied sink so a UI can render it;
/// a dropped receiver never fails the send.
pub type ProgressSink = UnboundedSender<SendProgress>;

#[derive(Debug, Clone)]
pub struct BulkReport {
    pub successful: usize,
    pub failed: usize,
    /// One terminal entry per recipient, in input order.
    pub entries: Vec<SendProgress>,
}

#[derive(Debug, Clone)]
pub struct SequenceReport {
    pub total: usize,
    pub sent: usize,
    pub success: bool,
    pub entries: Vec<SendProgress>,
}

/// Strip the `@s.whatsapp.net` (or any other jid) suffix.
pub fn clean_number(number: &str) -> &str {
    number.split('@').next().unwrap_or(number)
}

fn progress(recipient: &str, status: SendStatus, message: String, error: Option<String>) -> SendProgress {
    SendProgress {
        id: Uuid::new_v4().to_string(),
        recipient: recipient.to_string(),
        status,
        message,
        error,
        timestamp: Utc::now(),
    }
}

fn emit(sink: &ProgressSink, entry: &SendProgress) {
    let _ = sink.send(entry.clone());
}

/// Send an ordered list of messages to one recipient, pausing `delay_secs`
/// between consecutive messages and stopping the whole chain on the first
/// failure.
pub async fn send_sequence(
    sender: &dyn TextSender,
    instance: &str,
    recipient: &Recipient,
    messages: &[String],
    delay_secs: f64,
    sink: &ProgressSink,
) -> SequenceReport {
    let number = clean_number(&recipient.number);
    let total = messages.len();
    let mut entries = Vec::with_capacity(total);
    let mut sent = 0;

    for (index, message) in messages.iter().enumerate() {
        let step = index + 1;
        emit(
            sink,
            &progress(
                &recipient.name,
                SendStatus::Sending,
                format!("sending message {step}/{total} to {}", recipient.name),
                None,
            ),
        );

        let entry = match sender.send_text(instance, number, message).await {
            Ok(_) => {
                sent += 1;
                progress(
                    &recipient.name,
                    SendStatus::Success,
                    format!("message {step}/{total} sent to {}", recipient.name),
                    None,
                )
            }
            Err(e) => progress(
                &recipient.name,
                SendStatus::Error,
                format!("failed to send message {step}/{total} to {}", recipient.name),
                Some(e.to_string()),
            ),
        };
        emit(sink, &entry);
        let failed = entry.status == SendStatus::Error;
        entries.push(entry);

        if failed {
            // first failure interrupts the chain
            return SequenceReport { total, sent, success: false, entries };
        }

        if step < total && delay_secs > 0.0 {
            emit(
                sink,
                &progress(
                    &recipient.name,
                    SendStatus::Pending,
                    format!("waiting {delay_secs}s before the next message"),
                    None,
                ),
            );
            tokio::time::sleep(Duration::from_secs_f64(delay_secs)).await;
        }
    }

    SequenceReport { total, sent, success: true, entries }
}

/// Send one message to each recipient sequentially, continuing past individual
/// failures and tallying the outcome. Every recipient ends in exactly one
/// terminal progress entry.
pub async fn send_bulk(
    sender: &dyn TextSender,
    instance: &str,
    recipients: &[Recipient],
    message: &str,
    sink: &ProgressSink,
) -> BulkReport {
    for recipient in recipients {
        emit(
            sink,
            &progress(
                &recipient.name,
                SendStatus::Pending,
                format!("waiting to send to {}", recipient.name),
                None,
            ),
        );
    }

    let mut successful = 0;
    let mut failed = 0;
    let mut entries = Vec::with_capacity(recipients.len());

    for (index, recipient) in recipients.iter().enumerate() {
        emit(
            sink,
            &progress(
                &recipient.name,
                SendStatus::Sending,
                format!("sending message to {}", recipient.name),
                None,
            ),
        );

        let number = clean_number(&recipient.number);
        let entry = match sender.send_text(instance, number, message).await {
            Ok(_) => {
                successful += 1;
                progress(
                    &recipient.name,
                    SendStatus::Success,
                    format!("message sent to {}", recipient.name),
                    None,
                )
            }
            Err(e) => {
                failed += 1;
                progress(
                    &recipient.name,
                    SendStatus::Error,
                    format!("failed to send to {}", recipient.name),
                    Some(e.to_string()),
                )
            }
        };
        emit(sink, &entry);
        entries.push(entry);

        if index + 1 < recipients.len() {
            tokio::time::sleep(INTER_RECIPIENT_PAUSE).await;
        }
    }

    info!(successful, failed, total = recipients.len(), "bulk send finished");
    BulkReport { successful, failed, entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::testing::ScriptedSender;
    use tokio::sync::mpsc;

    fn recipients(n: usize) -> Vec<Recipient> {
        (0..n)
            .map(|i| Recipient {
                id: format!("c{i}"),
                number: format!("55119990{i}"),
                name: format!("Contact {i}"),
            })
            .collect()
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<SendProgress>) -> Vec<SendProgress> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn bulk_continues_past_failures_and_tallies() {
        let sender = ScriptedSender::failing_at(&[1]);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let report = send_bulk(&sender, "main", &recipients(3), "hello", &tx).await;

        assert_eq!(report.successful, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.entries.len(), 3);
        assert!(report.entries.iter().all(|e| e.status.is_terminal()));
        assert_eq!(report.entries[1].status, SendStatus::Error);
        assert_eq!(sender.calls().len(), 3, "a failure must not stop the fan-out");

        // every recipient reaches exactly one terminal status through the sink
        let events = drain(&mut rx);
        for r in recipients(3) {
            let terminal: Vec<_> = events
                .iter()
                .filter(|e| e.recipient == r.name && e.status.is_terminal())
                .collect();
            assert_eq!(terminal.len(), 1, "recipient {}", r.name);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn bulk_paces_recipients_with_a_fixed_pause() {
        let sender = ScriptedSender::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        send_bulk(&sender, "main", &recipients(3), "hello", &tx).await;

        let calls = sender.calls();
        assert!(calls[1].at.duration_since(calls[0].at) >= INTER_RECIPIENT_PAUSE);
        assert!(calls[2].at.duration_since(calls[1].at) >= INTER_RECIPIENT_PAUSE);
    }

    #[tokio::test(start_paused = true)]
    async fn sequence_stops_on_first_failure() {
        let sender = ScriptedSender::failing_at(&[1]);
        let (tx, _rx) = mpsc::unbounded_channel();
        let recipient = recipients(1).remove(0);
        let messages: Vec<String> = ["first", "second", "third"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let report = send_sequence(&sender, "main", &recipient, &messages, 2.0, &tx).await;

        assert!(!report.success);
        assert_eq!(report.sent, 1);
        assert_eq!(report.total, 3);
        assert_eq!(sender.calls().len(), 2, "third message must never be attempted");
        assert_eq!(report.entries.last().unwrap().status, SendStatus::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn sequence_waits_between_messages() {
        let sender = ScriptedSender::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let recipient = recipients(1).remove(0);
        let messages: Vec<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();

        let report = send_sequence(&sender, "main", &recipient, &messages, 3.0, &tx).await;

        assert!(report.success);
        assert_eq!(report.sent, 2);
        let calls = sender.calls();
        assert!(calls[1].at.duration_since(calls[0].at) >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn jid_suffixes_are_stripped_before_sending() {
        let sender = ScriptedSender::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let recipient = Recipient {
            id: "c1".into(),
            number: "5511999@s.whatsapp.net".into(),
            name: "Ana".into(),
        };

        send_bulk(&sender, "main", &[recipient], "hi", &tx).await;

        assert_eq!(sender.calls()[0].to, "5511999");
    }

    #[tokio::test]
    async fn progress_survives_a_dropped_receiver() {
        let sender = ScriptedSender::new();
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        let report = send_bulk(&sender, "main", &recipients(2), "hi", &tx).await;
        assert_eq!(report.successful, 2);
    }
}
