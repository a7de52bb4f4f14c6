use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::{Event, Registration};

/// Errors that can occur when handing a notification to the mail relay
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Relay rejected notification: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Confirmation,
    Promotion,
}

/// Email sent when a registrant holds a confirmed seat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub recipient: String,
    pub name: String,
    #[serde(rename = "eventName")]
    pub event_name: String,
    #[serde(rename = "eventDate")]
    pub event_date: Option<String>,
    #[serde(rename = "eventTime")]
    pub event_time: Option<String>,
    #[serde(rename = "eventLocation")]
    pub event_location: Option<String>,
    #[serde(rename = "registrationRef")]
    pub registration_ref: String,
    #[serde(rename = "qrPayload")]
    pub qr_payload: String,
    #[serde(rename = "qrImageUrl")]
    pub qr_image_url: String,
}

impl Notification {
    pub fn for_registration(
        kind: NotificationKind,
        event: &Event,
        registration: &Registration,
        qr_base_url: &str,
    ) -> Self {
        Self {
            kind,
            recipient: registration.email.clone(),
            name: registration.full_name.clone(),
            event_name: event.name.clone(),
            event_date: event.date.clone(),
            event_time: event.time.clone(),
            event_location: event.location.clone(),
            registration_ref: registration.reference(),
            qr_payload: registration.qr_payload.clone(),
            qr_image_url: qr_image_url(qr_base_url, &registration.qr_payload),
        }
    }

    pub fn subject(&self) -> String {
        match self.kind {
            NotificationKind::Confirmation => format!("Registration Confirmed: {}", self.event_name),
            NotificationKind::Promotion => {
                format!("You're off the waitlist: {}", self.event_name)
            }
        }
    }
}

/// Link to a rendered QR image of the credential payload
pub fn qr_image_url(base_url: &str, payload: &str) -> String {
    format!(
        "{}?size=400x400&data={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(payload)
    )
}

/// Outbound channel for confirmation and promotion emails
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Posts notifications as JSON to a mail relay
pub struct HttpNotifier {
    endpoint: String,
    sender: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    subject: String,
    #[serde(flatten)]
    notification: &'a Notification,
}

impl HttpNotifier {
    pub fn new(
        endpoint: String,
        sender: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint,
            sender,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let payload = RelayPayload {
            from: &self.sender,
            subject: notification.subject(),
            notification,
        };

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            return Err(NotifyError::Rejected(format!("{} - {}", status, body)));
        }

        tracing::debug!(
            "Relayed {:?} notification to {}",
            notification.kind,
            notification.recipient
        );

        Ok(())
    }
}

/// Writes notifications to the log instead of sending them
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            kind = ?notification.kind,
            recipient = %notification.recipient,
            registration = %notification.registration_ref,
            "{}",
            notification.subject()
        );
        Ok(())
    }
}
