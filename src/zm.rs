//! Minimal ZoneMinder API client.
//!
//! Only event deletion is needed, so the client exposes a single
//! `EventStore::delete_event` and keeps the login handling internal.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use std::cell::RefCell;
use std::time::Duration;
use thiserror::Error;

use crate::config::ApiConfig;

/// Errors raised by the ZoneMinder API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Empty non-JSON reply. ZoneMinder answers deletes like this regularly,
    /// so callers treat it as success.
    #[error("BAD_IMAGE")]
    BadImage,

    /// Non-JSON reply with a body, usually a login page.
    #[error("RELOGIN")]
    Relogin,

    #[error("login failed: {0}")]
    Login(String),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    /// True for outcomes that do not mean the request failed.
    pub fn is_benign(&self) -> bool {
        matches!(self, ApiError::BadImage)
    }
}

/// Storage of recorded events on the surveillance server.
pub trait EventStore {
    fn delete_event(&self, event_id: &str) -> Result<(), ApiError>;
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
    version: Option<String>,
    apiversion: Option<String>,
}

/// Blocking client for the ZoneMinder REST API.
pub struct ZmClient {
    client: Client,
    config: ApiConfig,
    /// `None` until logged in; `Some("")` for cookie based legacy auth
    token: RefCell<Option<String>>,
}

impl ZmClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(config.allow_self_signed)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
            token: RefCell::new(None),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_portal.trim_end_matches('/'), path)
    }

    fn needs_login(&self) -> bool {
        self.config.user.is_some()
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.basic_user {
            Some(user) => builder.basic_auth(user, self.config.basic_password.as_deref()),
            None => builder,
        }
    }

    /// Logs in and stores the access token.
    pub fn login(&self) -> Result<(), ApiError> {
        let user = self.config.user.clone().unwrap_or_default();
        let pass = self.config.password.clone().unwrap_or_default();

        tracing::info!(api = %self.config.api_portal, "Connecting with ZM APIs");
        let response = self
            .with_auth(self.client.post(self.api_url("host/login.json")))
            .form(&[("user", user.as_str()), ("pass", pass.as_str())])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ApiError::Login(format!("HTTP {}: {}", status, body)));
        }

        let login: LoginResponse = response
            .json()
            .map_err(|e| ApiError::Login(format!("unexpected login response: {}", e)))?;

        match login.access_token {
            Some(token) if !token.is_empty() => {
                tracing::debug!(
                    version = login.version.as_deref().unwrap_or("?"),
                    api_version = login.apiversion.as_deref().unwrap_or("?"),
                    "Using token authentication"
                );
                *self.token.borrow_mut() = Some(token);
            }
            _ => {
                tracing::debug!("No access token in login reply, using session cookies");
                *self.token.borrow_mut() = Some(String::new());
            }
        }
        Ok(())
    }

    fn send(&self, method: Method, url: &str) -> Result<Response, ApiError> {
        let mut builder = self.with_auth(self.client.request(method, url));
        if let Some(token) = self.token.borrow().as_deref() {
            if !token.is_empty() {
                builder = builder.query(&[("token", token)]);
            }
        }
        Ok(builder.send()?)
    }

    /// Issues a request and classifies the reply. Retries once after a
    /// fresh login when the server asks for one.
    pub fn request(&self, method: Method, url: &str) -> Result<Option<serde_json::Value>, ApiError> {
        if self.needs_login() && self.token.borrow().is_none() {
            self.login()?;
        }

        match self.request_once(method.clone(), url) {
            Err(ApiError::Relogin) if self.needs_login() => {
                tracing::debug!(url, "Session expired, logging in again");
                self.login()?;
                self.request_once(method, url)
            }
            other => other,
        }
    }

    fn request_once(&self, method: Method, url: &str) -> Result<Option<serde_json::Value>, ApiError> {
        tracing::debug!(%method, url, "ZM API request");
        let response = self.send(method, url)?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Relogin);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text()?;

        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }

        if content_type.starts_with("application/json") && !body.is_empty() {
            let value = serde_json::from_str(&body).map_err(|_| ApiError::Status {
                status,
                body: body.clone(),
            })?;
            Ok(Some(value))
        } else if content_type.starts_with("image/") {
            Ok(None)
        } else if !body.is_empty() {
            Err(ApiError::Relogin)
        } else {
            Err(ApiError::BadImage)
        }
    }
}

impl EventStore for ZmClient {
    fn delete_event(&self, event_id: &str) -> Result<(), ApiError> {
        let url = self.api_url(&format!("events/{}.json", event_id));
        self.request(Method::DELETE, &url).map(|_| ())
    }
}
