//! Shared in-memory capabilities for pipeline tests

#![allow(dead_code)]

use async_trait::async_trait;
use modsync_core::catalog::TargetCatalog;
use modsync_core::config::Credentials;
use modsync_core::library::{parse_modules_response, parse_token_response, LibraryApi, Token};
use modsync_core::listing::ListingSource;
use modsync_core::SyncError;
use reqwest::StatusCode;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Serves canned HTML pages
pub struct StaticListing {
    plugins: String,
    modules: HashMap<String, String>,
    pub requests: Mutex<Vec<String>>,
}

impl StaticListing {
    pub fn new(plugins: &str, modules: &[(&str, &str)]) -> Self {
        Self {
            plugins: plugins.to_string(),
            modules: modules
                .iter()
                .map(|(id, html)| (id.to_string(), html.to_string()))
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Plugin page listing `ids`, each module page linking `modules`
    pub fn simple(plugins: &[(&str, &[&str])]) -> Self {
        let plugin_page: String = plugins
            .iter()
            .map(|(id, _)| format!(r#"<li id="{id}">{id}</li>"#))
            .collect();
        let pages: Vec<(String, String)> = plugins
            .iter()
            .map(|(id, modules)| {
                let links: String = modules
                    .iter()
                    .map(|m| format!(r#"<a href="/plugins/{id}/{m}">{m}</a>"#))
                    .collect();
                (id.to_string(), links)
            })
            .collect();

        let refs: Vec<(&str, &str)> = pages
            .iter()
            .map(|(id, html)| (id.as_str(), html.as_str()))
            .collect();
        Self::new(&format!("<ul>{plugin_page}</ul>"), &refs)
    }
}

#[async_trait]
impl ListingSource for StaticListing {
    async fn plugin_listing(&self) -> Result<String, SyncError> {
        Ok(self.plugins.clone())
    }

    async fn module_listing(&self, listing_id: &str) -> Result<String, SyncError> {
        self.requests.lock().unwrap().push(listing_id.to_string());
        self.modules
            .get(listing_id)
            .cloned()
            .ok_or_else(|| SyncError::scrape(format!("HTTP 404 for {listing_id}")))
    }
}

/// Listing whose plugin page cannot be fetched
pub struct FailingListing;

#[async_trait]
impl ListingSource for FailingListing {
    async fn plugin_listing(&self) -> Result<String, SyncError> {
        Err(SyncError::scrape("HTTP 503 from https://metamodule.info/plugins"))
    }

    async fn module_listing(&self, _listing_id: &str) -> Result<String, SyncError> {
        unreachable!("module listing requested after plugin listing failed")
    }
}

/// Library answering with canned HTTP responses
pub struct FakeLibrary {
    token_response: (StatusCode, String),
    modules_response: (StatusCode, String),
    reject: HashSet<(String, String)>,
    pub calls: Mutex<Vec<String>>,
    pub adds: Mutex<Vec<(String, String)>>,
}

impl FakeLibrary {
    /// Accepts any credentials and serves `modules_json` as the `modules` field
    pub fn with_modules(modules_json: &str) -> Self {
        Self {
            token_response: (StatusCode::OK, r#"{"token":"session-1"}"#.to_string()),
            modules_response: (StatusCode::OK, format!(r#"{{"modules":{modules_json}}}"#)),
            reject: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            adds: Mutex::new(Vec::new()),
        }
    }

    pub fn token_response(mut self, status: StatusCode, body: &str) -> Self {
        self.token_response = (status, body.to_string());
        self
    }

    pub fn modules_response(mut self, status: StatusCode, body: &str) -> Self {
        self.modules_response = (status, body.to_string());
        self
    }

    pub fn rejecting(mut self, plugin: &str, module: &str) -> Self {
        self.reject.insert((plugin.to_string(), module.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn adds(&self) -> Vec<(String, String)> {
        self.adds.lock().unwrap().clone()
    }
}

#[async_trait]
impl LibraryApi for FakeLibrary {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Token, SyncError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("authenticate:{}", credentials.email));
        let (status, body) = &self.token_response;
        parse_token_response(*status, body)
    }

    async fn get_modules(&self, token: &Token) -> Result<TargetCatalog, SyncError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("get_modules:{}", token.as_str()));
        let (status, body) = &self.modules_response;
        parse_modules_response(*status, body)
    }

    async fn add_module(&self, token: &Token, plugin: &str, module: &str) -> bool {
        assert_eq!(token.as_str(), "session-1");
        let pair = (plugin.to_string(), module.to_string());
        self.adds.lock().unwrap().push(pair.clone());
        !self.reject.contains(&pair)
    }
}

pub fn credentials() -> Credentials {
    Credentials::new("user@example.com", "secret")
}

pub fn pair(plugin: &str, module: &str) -> (String, String) {
    (plugin.to_string(), module.to_string())
}
