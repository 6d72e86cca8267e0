use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info};

use crate::digest::DigestMessage;

const MAILERSEND_URL: &str = "https://api.mailersend.com/v1/email";
const SENDER_NAME: &str = "Company Scraper";

/// Delivers a rendered digest to one recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, message: &DigestMessage) -> Result<()>;
}

/// MailerSend transactional email API.
pub struct MailerSend {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

impl MailerSend {
    pub fn new(api_key: &str, from: &str) -> Self {
        MailerSend {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for MailerSend {
    async fn send(&self, recipient: &str, message: &DigestMessage) -> Result<()> {
        let sender = json!({ "email": self.from, "name": SENDER_NAME });
        let body = json!({
            "from": sender,
            "to": [{ "email": recipient, "name": recipient }],
            "reply_to": sender,
            "subject": message.subject,
            "html": message.html,
            "text": message.text,
        });

        let response = self
            .client
            .post(MAILERSEND_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("MailerSend returned {}: {}", status, detail);
        }
        Ok(())
    }
}

/// Writes the digest to the log instead of sending it.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &str, message: &DigestMessage) -> Result<()> {
        info!("[dry run] to {}: {}\n{}", recipient, message.subject, message.text);
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
}

/// Send to every recipient in turn. A failure is logged and does not stop the rest.
pub async fn deliver(
    notifier: &dyn Notifier,
    recipients: &[String],
    message: &DigestMessage,
) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    if recipients.is_empty() {
        info!("No recipients configured; digest not sent");
        return report;
    }

    info!("Sending digest to {} recipient(s)", recipients.len());
    for r in recipients {
        match notifier.send(r, message).await {
            Ok(()) => {
                info!("Digest sent to {}", r);
                report.sent += 1;
            }
            Err(e) => {
                error!("Failed to send digest to {}: {:#}", r, e);
                report.failed += 1;
            }
        }
    }
    report
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Records deliveries; recipients listed in `failing` error out.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub failing: Vec<String>,
        pub sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, recipient: &str, message: &DigestMessage) -> Result<()> {
            if self.failing.iter().any(|f| f == recipient) {
                bail!("mailbox unavailable");
            }
            self.sent
                .lock()
                .unwrap()
                .push((recipient.to_string(), message.subject.clone()));
            Ok(())
        }
    }
}

// ── Tests ──
