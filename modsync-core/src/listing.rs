//! MetaModule listing scraper
//!
//! Builds the [`SourceCatalog`] from two kinds of HTML page:
//! - the plugin listing, where every `<li id="...">` names a plugin
//! - the per-plugin module listing (an htmx fragment, scoped with the
//!   `HX-Target` header), where every `<a href=".../<module>">` names a module
//!
//! Fetching is all-or-nothing: the first transport, status or parse
//! failure aborts with [`SyncError::Scrape`] and no partial catalog escapes.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::catalog::{dedup_preserving_order, SourceCatalog};
use crate::config::SourceConfig;
use crate::error::SyncError;

/// Separator of compound listing ids; the plugin slug is what precedes it
pub const COMPOUND_ID_SEPARATOR: &str = "-/-";

/// Header naming the plugin whose module listing is requested
pub const HX_TARGET_HEADER: &str = "HX-Target";

/// Source of raw listing pages
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// HTML of the page listing every plugin
    async fn plugin_listing(&self) -> Result<String, SyncError>;

    /// HTML of the module listing for one plugin
    ///
    /// `listing_id` is the id exactly as it appeared in the plugin listing.
    async fn module_listing(&self, listing_id: &str) -> Result<String, SyncError>;
}

/// Fetches listing pages over HTTP
pub struct HttpListingSource {
    client: reqwest::Client,
    plugins_url: String,
    modules_url: String,
}

impl HttpListingSource {
    pub fn new(config: &SourceConfig, timeout: Duration) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("modsync/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            plugins_url: config.plugins_url.clone(),
            modules_url: config.modules_url.clone(),
        })
    }

    fn plugin_listing_request(&self) -> reqwest::RequestBuilder {
        self.client.get(&self.plugins_url)
    }

    fn module_listing_request(&self, listing_id: &str) -> reqwest::RequestBuilder {
        self.client
            .get(&self.modules_url)
            .header(HX_TARGET_HEADER, listing_id)
    }

    async fn fetch_text(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<String, SyncError> {
        let response = request
            .send()
            .await
            .map_err(|e| SyncError::scrape_transport(format!("failed to fetch {url}"), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::scrape(format!("HTTP {status} from {url}")));
        }

        response.text().await.map_err(|e| {
            SyncError::scrape_transport(format!("failed to read response body from {url}"), e)
        })
    }
}

#[async_trait]
impl ListingSource for HttpListingSource {
    async fn plugin_listing(&self) -> Result<String, SyncError> {
        debug!("GET {}", self.plugins_url);
        let request = self.plugin_listing_request();
        self.fetch_text(request, &self.plugins_url).await
    }

    async fn module_listing(&self, listing_id: &str) -> Result<String, SyncError> {
        debug!("GET {} ({}: {})", self.modules_url, HX_TARGET_HEADER, listing_id);
        let request = self.module_listing_request(listing_id);
        self.fetch_text(request, &self.modules_url).await
    }
}

/// Plugin slug of a listing id - everything before the first `-/-`
pub fn plugin_slug(listing_id: &str) -> &str {
    listing_id
        .split(COMPOUND_ID_SEPARATOR)
        .next()
        .unwrap_or(listing_id)
}

/// Ids of every `<li>` carrying one, deduplicated in document order
///
/// Ids are kept verbatim; blank ones are dropped.
pub fn extract_listing_ids(html: &str) -> Result<Vec<String>, SyncError> {
    let selector = parse_selector("li[id]")?;
    let document = Html::parse_document(html);

    let ids = document
        .select(&selector)
        .filter_map(|li| li.value().attr("id"))
        .filter(|id| !id.trim().is_empty())
        .map(String::from);

    Ok(dedup_preserving_order(ids.collect::<Vec<_>>()))
}

/// Last path segment of every `<a href>`, deduplicated in document order
pub fn extract_module_slugs(html: &str) -> Result<Vec<String>, SyncError> {
    let selector = parse_selector("a[href]")?;
    let document = Html::parse_document(html);

    let slugs = document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| href.rsplit('/').next())
        .filter(|slug| !slug.is_empty())
        .map(String::from);

    Ok(dedup_preserving_order(slugs.collect::<Vec<_>>()))
}

fn parse_selector(selector: &str) -> Result<Selector, SyncError> {
    Selector::parse(selector)
        .map_err(|e| SyncError::scrape(format!("invalid selector '{selector}': {e}")))
}

/// Builds the source catalog from a [`ListingSource`]
pub struct SourceCatalogFetcher<'a> {
    source: &'a dyn ListingSource,
}

impl<'a> SourceCatalogFetcher<'a> {
    pub fn new(source: &'a dyn ListingSource) -> Self {
        Self { source }
    }

    /// Scrape every plugin and its modules
    ///
    /// Listing ids that share a plugin slug are merged into one entry at
    /// the position of the first.
    pub async fn fetch_all(&self) -> Result<SourceCatalog, SyncError> {
        let page = self.source.plugin_listing().await?;
        let listing_ids = extract_listing_ids(&page)?;
        info!("Found {} plugins in MetaModule listing", listing_ids.len());

        let mut catalog = SourceCatalog::new();
        for listing_id in &listing_ids {
            let slug = plugin_slug(listing_id);
            if slug.is_empty() {
                warn!("Skipping listing id without a plugin slug: {}", listing_id);
                continue;
            }

            let page = self.source.module_listing(listing_id).await?;
            let modules = extract_module_slugs(&page)?;
            debug!("Plugin {}: {} modules", slug, modules.len());

            catalog.insert(slug, modules);
        }

        info!(
            "Scraped {} plugins with {} modules",
            catalog.len(),
            catalog.module_count()
        );
        Ok(catalog)
    }
}
