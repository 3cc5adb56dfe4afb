//! Reconciliation engine
//!
//! Walks the normalized source catalog in order and, per module, decides
//! between "already in the library" and "needs adding":
//!
//! | library entry for plugin | decision per module                      |
//! |--------------------------|------------------------------------------|
//! | absent                   | add                                      |
//! | `Whitelisted`            | already present, no request              |
//! | `ExplicitSet`            | present if in the set, otherwise add     |
//!
//! Adding is best-effort and append-only. A rejected add is recorded as
//! [`SyncOutcome::AddFailed`] and the walk carries on; nothing is retried,
//! rolled back or removed.

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{
    ModuleSlug, PluginSlug, SourceCatalog, TargetCatalog, TargetCatalogEntry,
};
use crate::library::{LibraryApi, Token};

/// What happened to one (plugin, module) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The library already holds the module
    AlreadyPresent,
    /// The library accepted the add request
    Added,
    /// The add request was rejected or never arrived
    AddFailed,
    /// Dry run: the module would have been added
    WouldAdd,
}

impl SyncOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOutcome::AlreadyPresent => "already present",
            SyncOutcome::Added => "added",
            SyncOutcome::AddFailed => "add failed",
            SyncOutcome::WouldAdd => "would add",
        }
    }
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one source module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub plugin: PluginSlug,
    pub module: ModuleSlug,
    pub outcome: SyncOutcome,
}

/// Counts per outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub already_present: usize,
    pub added: usize,
    pub add_failed: usize,
    pub would_add: usize,
}

impl SyncSummary {
    fn count(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::AlreadyPresent => self.already_present += 1,
            SyncOutcome::Added => self.added += 1,
            SyncOutcome::AddFailed => self.add_failed += 1,
            SyncOutcome::WouldAdd => self.would_add += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.already_present + self.added + self.add_failed + self.would_add
    }
}

/// Everything a run decided, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    pub items: Vec<ItemOutcome>,
    pub summary: SyncSummary,
}

impl SyncReport {
    fn record(&mut self, plugin: &str, module: &str, outcome: SyncOutcome) {
        self.summary.count(outcome);
        self.items.push(ItemOutcome {
            plugin: plugin.to_string(),
            module: module.to_string(),
            outcome,
        });
    }

    /// Items whose add request did not succeed
    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items
            .iter()
            .filter(|item| item.outcome == SyncOutcome::AddFailed)
    }

    pub fn has_failures(&self) -> bool {
        self.summary.add_failed > 0
    }

    /// Outcome recorded for a pair, if the pair was visited
    pub fn outcome_of(&self, plugin: &str, module: &str) -> Option<SyncOutcome> {
        self.items
            .iter()
            .find(|item| item.plugin == plugin && item.module == module)
            .map(|item| item.outcome)
    }
}

/// Diffs the source catalog against the library and adds what is missing
pub struct ReconciliationEngine<'a> {
    library: &'a dyn LibraryApi,
    token: &'a Token,
    dry_run: bool,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(library: &'a dyn LibraryApi, token: &'a Token) -> Self {
        Self {
            library,
            token,
            dry_run: false,
        }
    }

    /// Record [`SyncOutcome::WouldAdd`] instead of sending add requests
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Reconcile every source module, in source order
    ///
    /// Never fails: one outcome per (plugin, module) pair of `source`.
    pub async fn sync(&self, source: &SourceCatalog, target: &TargetCatalog) -> SyncReport {
        let mut report = SyncReport {
            dry_run: self.dry_run,
            ..Default::default()
        };

        for entry in source.iter() {
            let plugin = entry.plugin.as_str();

            match target.get(plugin) {
                None => {
                    info!("Plugin not in library (plugin: {})", plugin);
                    for module in &entry.modules {
                        let outcome = self.add(plugin, module).await;
                        report.record(plugin, module, outcome);
                    }
                }
                Some(TargetCatalogEntry::Whitelisted) => {
                    info!("Plugin whitelisted in library (plugin: {})", plugin);
                    for module in &entry.modules {
                        info!(
                            "Module already in library (plugin: {}, module: {})",
                            plugin, module
                        );
                        report.record(plugin, module, SyncOutcome::AlreadyPresent);
                    }
                }
                Some(TargetCatalogEntry::ExplicitSet(present)) => {
                    for module in &entry.modules {
                        let outcome = if present.contains(module) {
                            info!(
                                "Module already in library (plugin: {}, module: {})",
                                plugin, module
                            );
                            SyncOutcome::AlreadyPresent
                        } else {
                            self.add(plugin, module).await
                        };
                        report.record(plugin, module, outcome);
                    }
                }
            }
        }

        info!(
            "Sync finished: {} already present, {} added, {} failed, {} would add",
            report.summary.already_present,
            report.summary.added,
            report.summary.add_failed,
            report.summary.would_add
        );
        report
    }

    async fn add(&self, plugin: &str, module: &str) -> SyncOutcome {
        if self.dry_run {
            info!("Would add module (plugin: {}, module: {})", plugin, module);
            return SyncOutcome::WouldAdd;
        }

        info!("Adding module (plugin: {}, module: {})", plugin, module);
        if self.library.add_module(self.token, plugin, module).await {
            info!("  Added module (plugin: {}, module: {})", plugin, module);
            SyncOutcome::Added
        } else {
            warn!("  Failed to add module (plugin: {}, module: {})", plugin, module);
            SyncOutcome::AddFailed
        }
    }
}
