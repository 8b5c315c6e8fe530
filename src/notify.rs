//! Push notifications for interesting events.
//!
//! Notifications go out through Pushover. Credentials are kept in a small
//! JSON file next to the ZoneMinder config and are only read when a
//! notification is actually sent.

use anyhow::{bail, Context, Result};
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::NotifyConfig;

/// A push message ready to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub priority: i32,
    /// JPEG attached to the message, if present on disk
    pub attachment: Option<PathBuf>,
}

/// Anything that can deliver a `Notice`.
pub trait Notifier {
    fn notify(&self, notice: &Notice) -> Result<()>;
}

/// Pushover credentials file contents.
///
/// ```json
/// {"pushover_api_token": "...", "pushover_user_key": "...", "pushover_sound": "siren"}
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PushoverCredentials {
    pub pushover_api_token: String,
    pub pushover_user_key: String,
    pub pushover_sound: String,
}

impl PushoverCredentials {
    /// Parse credentials from a JSON string. Every key is required.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse Pushover credentials")
    }

    /// Loads credentials from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read Pushover file: {:?}", path))?;
        Self::from_json(&contents)
    }
}

/// Sends notices to the Pushover messages API.
pub struct PushoverNotifier {
    client: reqwest::blocking::Client,
    endpoint: String,
    credentials_file: PathBuf,
}

impl PushoverNotifier {
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            credentials_file: config.pushover_file.clone(),
        })
    }

    fn build_form(credentials: &PushoverCredentials, notice: &Notice) -> Result<Form> {
        let mut form = Form::new()
            .text("token", credentials.pushover_api_token.clone())
            .text("user", credentials.pushover_user_key.clone())
            .text("title", notice.title.clone())
            .text("message", notice.message.clone())
            .text("priority", notice.priority.to_string())
            .text("sound", credentials.pushover_sound.clone());

        if let Some(path) = &notice.attachment {
            let bytes = fs::read(path)
                .with_context(|| format!("Failed to read snapshot: {:?}", path))?;
            let part = Part::bytes(bytes)
                .file_name("image.jpg")
                .mime_str("image/jpeg")?;
            form = form.part("attachment", part);
        }

        Ok(form)
    }
}

impl Notifier for PushoverNotifier {
    fn notify(&self, notice: &Notice) -> Result<()> {
        let credentials = PushoverCredentials::from_file(&self.credentials_file)?;
        let form = Self::build_form(&credentials, notice)?;

        tracing::info!(title = %notice.title, "Sending notification");
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .context("Failed to reach Pushover")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("Failed to send message: HTTP {}: {}", status, body);
        }
        tracing::debug!("Notification sent");
        Ok(())
    }
}
