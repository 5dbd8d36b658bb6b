use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::error::{AppError, Result};

/// Outbound messaging used to deliver download links and confirmations.
///
/// Failures are the caller's to log; nothing in the order flows treats a
/// failed send as a hard error.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        resource_link: Option<&str>,
    ) -> Result<()>;
}

/// Transactional-email HTTP API client (Brevo-style JSON endpoint).
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    sender: String,
}

#[derive(Serialize)]
struct MailAddress<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MailRequest<'a> {
    sender: MailAddress<'a>,
    to: Vec<MailAddress<'a>>,
    subject: &'a str,
    html_content: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, sender: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            client,
            api_url,
            api_key,
            sender,
        }
    }

    fn html_body(body: &str, resource_link: Option<&str>) -> String {
        let paragraphs: String = body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| format!("<p>{}</p>", line))
            .collect();

        match resource_link {
            Some(link) => format!(
                "<html><body>{}\
                 <p><a href=\"{}\">Click here to download your book</a></p>\
                 <p>Or copy this link directly: {}</p></body></html>",
                paragraphs, link, link
            ),
            None => format!("<html><body>{}</body></html>", paragraphs),
        }
    }
}

#[async_trait]
impl Notifier for HttpMailer {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        resource_link: Option<&str>,
    ) -> Result<()> {
        let request = MailRequest {
            sender: MailAddress { email: &self.sender },
            to: vec![MailAddress { email: recipient }],
            subject,
            html_content: Self::html_body(body, resource_link),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Notifier(format!("mail request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Notifier(format!(
                "mail rejected ({}): {}",
                status,
                detail.trim()
            )));
        }

        info!(recipient, subject, "email sent");
        Ok(())
    }
}

/// Log-only notifier used when no mail credentials are configured, so
/// non-production environments are not blocked on email setup.
pub struct LogMailer;

#[async_trait]
impl Notifier for LogMailer {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        resource_link: Option<&str>,
    ) -> Result<()> {
        info!(recipient, subject, "email credentials not configured, logging instead");
        info!("message: {}", body.trim());
        if let Some(link) = resource_link {
            info!("download link: {}", link);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_body_wraps_lines_and_embeds_the_link() {
        let html = HttpMailer::html_body("Hello Alice,\n\nYour book is ready.\n", Some("https://example.com/book"));
        assert!(html.contains("<p>Hello Alice,</p>"));
        assert!(html.contains("<p>Your book is ready.</p>"));
        assert!(html.contains("href=\"https://example.com/book\""));
    }

    #[test]
    fn html_body_without_link_has_no_anchor() {
        let html = HttpMailer::html_body("Free access confirmed.", None);
        assert!(!html.contains("<a href"));
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let mailer = LogMailer;
        assert!(mailer
            .send("alice@x.com", "subject", "body", Some("https://example.com/book"))
            .await
            .is_ok());
    }
}
