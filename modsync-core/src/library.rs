//! VCV Rack Library client
//!
//! Three calls against the library API:
//! - `POST <token_url> {email, password}` exchanges credentials for a token
//! - `GET <modules_url>` with `Cookie: token=<token>` lists the account's modules
//! - `POST <modules_url> {token, pluginSlug, moduleSlug}` adds one module
//!
//! Authentication and listing failures are fatal. Adding never fails
//! loudly; the caller gets `false` and decides what to do with it.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::catalog::TargetCatalog;
use crate::config::{Credentials, LibraryConfig};
use crate::error::SyncError;

/// Opaque session token issued by the library
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// Operations the sync needs from the library
#[async_trait]
pub trait LibraryApi: Send + Sync {
    /// Exchange credentials for a session token
    async fn authenticate(&self, credentials: &Credentials) -> Result<Token, SyncError>;

    /// Fetch the modules the account already holds
    async fn get_modules(&self, token: &Token) -> Result<TargetCatalog, SyncError>;

    /// Add one module; `true` only when the library accepted it
    async fn add_module(&self, token: &Token, plugin: &str, module: &str) -> bool;
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModulesResponse {
    modules: Option<TargetCatalog>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddModuleRequest<'a> {
    token: &'a str,
    plugin_slug: &'a str,
    module_slug: &'a str,
}

/// Error text of a failed response
///
/// The `error` string of a JSON body when there is one, otherwise the
/// body verbatim.
pub fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|e| e.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

/// [`extract_error_message`], or `fallback` when the body is blank
fn body_error_or(body: &str, fallback: &str) -> String {
    if body.trim().is_empty() {
        fallback.to_string()
    } else {
        extract_error_message(body)
    }
}

/// Interpret the credential exchange response
pub fn parse_token_response(status: StatusCode, body: &str) -> Result<Token, SyncError> {
    if !status.is_success() {
        warn!("Token exchange returned HTTP {}", status);
        return Err(SyncError::authentication(extract_error_message(body)));
    }

    let response: TokenResponse = serde_json::from_str(body).map_err(|e| {
        debug!("Token response is not valid JSON: {}", e);
        SyncError::authentication(body_error_or(body, "empty token response"))
    })?;

    match response.token {
        Some(token) if !token.is_empty() => Ok(Token::new(token)),
        _ => Err(SyncError::authentication(body_error_or(
            body,
            "token response is missing the `token` field",
        ))),
    }
}

/// Interpret the modules listing response
pub fn parse_modules_response(status: StatusCode, body: &str) -> Result<TargetCatalog, SyncError> {
    if !status.is_success() {
        warn!("Library modules request returned HTTP {}", status);
        return Err(SyncError::catalog_fetch(extract_error_message(body)));
    }

    let response: ModulesResponse = serde_json::from_str(body).map_err(|e| {
        warn!("Invalid modules response: {}", e);
        SyncError::catalog_fetch(body_error_or(body, "empty modules response"))
    })?;

    response.modules.ok_or_else(|| {
        SyncError::catalog_fetch(body_error_or(
            body,
            "response is missing the `modules` field",
        ))
    })
}

/// [`LibraryApi`] over HTTP
pub struct HttpLibraryClient {
    client: reqwest::Client,
    token_url: String,
    modules_url: String,
}

impl HttpLibraryClient {
    pub fn new(config: &LibraryConfig, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("modsync/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token_url: config.token_url.clone(),
            modules_url: config.modules_url.clone(),
        })
    }

    fn token_request(&self, credentials: &Credentials) -> reqwest::RequestBuilder {
        self.client.post(&self.token_url).json(&TokenRequest {
            email: &credentials.email,
            password: &credentials.password,
        })
    }

    fn modules_request(&self, token: &Token) -> reqwest::RequestBuilder {
        self.client
            .get(&self.modules_url)
            .header(reqwest::header::COOKIE, format!("token={}", token.as_str()))
    }

    fn add_module_request(
        &self,
        token: &Token,
        plugin: &str,
        module: &str,
    ) -> reqwest::RequestBuilder {
        self.client.post(&self.modules_url).json(&AddModuleRequest {
            token: token.as_str(),
            plugin_slug: plugin,
            module_slug: module,
        })
    }
}

#[async_trait]
impl LibraryApi for HttpLibraryClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Token, SyncError> {
        debug!("POST {} (email: {})", self.token_url, credentials.email);

        let response = self
            .token_request(credentials)
            .send()
            .await
            .map_err(|e| {
                SyncError::authentication(format!("failed to reach {}: {e}", self.token_url))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            SyncError::authentication(format!("failed to read token response: {e}"))
        })?;

        parse_token_response(status, &body)
    }

    async fn get_modules(&self, token: &Token) -> Result<TargetCatalog, SyncError> {
        debug!("GET {}", self.modules_url);

        let response = self
            .modules_request(token)
            .send()
            .await
            .map_err(|e| {
                SyncError::catalog_fetch(format!("failed to reach {}: {e}", self.modules_url))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            SyncError::catalog_fetch(format!("failed to read modules response: {e}"))
        })?;

        parse_modules_response(status, &body)
    }

    async fn add_module(&self, token: &Token, plugin: &str, module: &str) -> bool {
        debug!("POST {} (plugin: {}, module: {})", self.modules_url, plugin, module);

        let result = self
            .add_module_request(token, plugin, module)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!(
                    "Library rejected module (plugin: {}, module: {}): HTTP {} - {}",
                    plugin,
                    module,
                    status,
                    extract_error_message(&body)
                );
                false
            }
            Err(e) => {
                warn!(
                    "Failed to send add request (plugin: {}, module: {}): {}",
                    plugin, module, e
                );
                false
            }
        }
    }
}
