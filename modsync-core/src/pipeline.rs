//! The sync pipeline
//!
//! One explicit pass, each step either producing its value or stopping
//! the run:
//!
//! 1. scrape the source catalog            ([`SyncError::Scrape`])
//! 2. apply alias rules                    (total)
//! 3. narrow to the requested plugins      (total)
//! 4. authenticate against the library     ([`SyncError::Authentication`])
//! 5. fetch the library's modules          ([`SyncError::CatalogFetch`])
//! 6. reconcile                            (total, per-item outcomes)

use tracing::{info, warn};

use crate::alias::AliasResolver;
use crate::catalog::SourceCatalog;
use crate::config::{Credentials, SyncConfig};
use crate::error::SyncError;
use crate::library::{HttpLibraryClient, LibraryApi};
use crate::listing::{HttpListingSource, ListingSource, SourceCatalogFetcher};
use crate::sync::{ReconciliationEngine, SyncReport};

/// A configured sync run over a listing source and a library
pub struct Pipeline<'a> {
    listing: &'a dyn ListingSource,
    library: &'a dyn LibraryApi,
    aliases: AliasResolver,
    plugin_filter: Vec<String>,
    dry_run: bool,
}

impl<'a> Pipeline<'a> {
    /// Pipeline with the built-in alias rules, every plugin, real adds
    pub fn new(listing: &'a dyn ListingSource, library: &'a dyn LibraryApi) -> Self {
        Self {
            listing,
            library,
            aliases: AliasResolver::builtin(),
            plugin_filter: Vec::new(),
            dry_run: false,
        }
    }

    pub fn with_aliases(mut self, aliases: AliasResolver) -> Self {
        self.aliases = aliases;
        self
    }

    /// Only reconcile these plugins; empty means all
    pub fn with_plugin_filter(mut self, plugins: Vec<String>) -> Self {
        self.plugin_filter = plugins;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run every step in order
    pub async fn run(&self, credentials: &Credentials) -> Result<SyncReport, SyncError> {
        info!("Fetching MetaModule plugin listing");
        let scraped = SourceCatalogFetcher::new(self.listing).fetch_all().await?;

        let source = self.narrow(self.aliases.apply(scraped));

        info!("Authenticating with VCV Rack Library");
        let token = self.library.authenticate(credentials).await?;

        info!("Fetching VCV Rack Library modules");
        let target = self.library.get_modules(&token).await?;
        info!(
            "Library holds {} plugins ({} whitelisted)",
            target.len(),
            target.whitelisted_count()
        );

        let report = ReconciliationEngine::new(self.library, &token)
            .dry_run(self.dry_run)
            .sync(&source, &target)
            .await;

        Ok(report)
    }

    fn narrow(&self, mut catalog: SourceCatalog) -> SourceCatalog {
        if self.plugin_filter.is_empty() {
            return catalog;
        }

        for plugin in &self.plugin_filter {
            if !catalog.contains_plugin(plugin) {
                warn!("Requested plugin not in MetaModule listing: {}", plugin);
            }
        }

        catalog.retain_plugins(|plugin| self.plugin_filter.iter().any(|p| p == plugin));
        catalog
    }
}

/// Run a full sync over HTTP as described by `config`
pub async fn run(config: &SyncConfig, credentials: &Credentials) -> Result<SyncReport, SyncError> {
    config.validate()?;

    let timeout = config.timeout();
    let listing = HttpListingSource::new(&config.source, timeout)?;
    let library = HttpLibraryClient::new(&config.library, timeout)?;

    Pipeline::new(&listing, &library)
        .with_aliases(config.alias_resolver()?)
        .with_plugin_filter(config.plugins.clone())
        .dry_run(config.dry_run)
        .run(credentials)
        .await
}
