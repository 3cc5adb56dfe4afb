//! Module slug aliases
//!
//! MetaModule and the VCV Rack Library occasionally disagree on what a
//! module is called. Each [`AliasRule`] rewrites one plugin-scoped source
//! slug to the slug the library uses, before any comparison happens.
//!
//! The built-in table is always applied; a config file may append more
//! rules. Rules that chain (`a -> b`, `b -> c`) resolve to the end of the
//! chain, so applying the resolver twice gives the same catalog as
//! applying it once. Cyclic rule sets are rejected up front.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::catalog::{dedup_preserving_order, ModuleSlug, PluginSlug, SourceCatalog};
use crate::error::SyncError;

/// Renames known to differ between MetaModule and the library:
/// (plugin, source module slug, library module slug)
const BUILTIN_ALIASES: &[(&str, &str, &str)] = &[
    ("Bogaudio", "Bogaudio-PolyCon16", "Bogaudio-PolyCon"),
];

/// A single plugin-scoped rename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRule {
    /// Plugin the rule applies to
    pub plugin: PluginSlug,

    /// Module slug as it appears in the source listing
    pub from: ModuleSlug,

    /// Module slug the library knows it by
    pub to: ModuleSlug,
}

impl AliasRule {
    pub fn new(
        plugin: impl Into<PluginSlug>,
        from: impl Into<ModuleSlug>,
        to: impl Into<ModuleSlug>,
    ) -> Self {
        Self {
            plugin: plugin.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// The rules compiled into the binary
    pub fn builtin() -> Vec<AliasRule> {
        BUILTIN_ALIASES
            .iter()
            .map(|(plugin, from, to)| AliasRule::new(*plugin, *from, *to))
            .collect()
    }
}

/// Applies alias rules to a source catalog
#[derive(Debug, Clone)]
pub struct AliasResolver {
    rules: Vec<AliasRule>,
    /// plugin -> (from -> to)
    renames: HashMap<PluginSlug, HashMap<ModuleSlug, ModuleSlug>>,
}

impl Default for AliasResolver {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AliasResolver {
    /// Resolver holding only the built-in rules
    pub fn builtin() -> Self {
        let rules = AliasRule::builtin();
        let renames = index_rules(&rules);
        Self { rules, renames }
    }

    /// Resolver holding the built-in rules followed by `extra`
    ///
    /// Fails if two rules rename the same slug differently or if the
    /// rules form a cycle.
    pub fn with_rules<I>(extra: I) -> Result<Self, SyncError>
    where
        I: IntoIterator<Item = AliasRule>,
    {
        let mut rules = AliasRule::builtin();

        for rule in extra {
            if rule.from == rule.to {
                warn!(
                    "Ignoring no-op alias rule (plugin: {}, module: {})",
                    rule.plugin, rule.from
                );
                continue;
            }

            if let Some(existing) = rules
                .iter()
                .find(|r| r.plugin == rule.plugin && r.from == rule.from)
            {
                if existing.to == rule.to {
                    continue;
                }
                return Err(SyncError::config(format!(
                    "conflicting alias rules for plugin '{}': '{}' maps to both '{}' and '{}'",
                    rule.plugin, rule.from, existing.to, rule.to
                )));
            }

            rules.push(rule);
        }

        let renames = index_rules(&rules);
        check_acyclic(&renames)?;

        Ok(Self { rules, renames })
    }

    /// All rules in application order
    pub fn rules(&self) -> &[AliasRule] {
        &self.rules
    }

    /// The library slug for a source module
    pub fn canonical<'a>(&'a self, plugin: &str, module: &'a str) -> &'a str {
        let Some(renames) = self.renames.get(plugin) else {
            return module;
        };

        let mut current = module;
        while let Some(next) = renames.get(current) {
            current = next.as_str();
        }
        current
    }

    /// Rewrite every aliased module in the catalog
    ///
    /// Pure and total. A rewritten slug that already appears in the
    /// plugin's list collapses into the earlier occurrence.
    pub fn apply(&self, mut catalog: SourceCatalog) -> SourceCatalog {
        for (plugin, renames) in &self.renames {
            let Some(modules) = catalog.get_mut(plugin) else {
                continue;
            };

            if !modules.iter().any(|m| renames.contains_key(m)) {
                continue;
            }

            let rewritten = modules.iter().map(|module| {
                let canonical = self.canonical(plugin, module);
                if canonical != module.as_str() {
                    info!(
                        "Renamed module (plugin: {}, module: {} -> {})",
                        plugin, module, canonical
                    );
                }
                canonical.to_string()
            });
            let rewritten = dedup_preserving_order(rewritten.collect::<Vec<_>>());
            *modules = rewritten;
        }

        catalog
    }
}

fn index_rules(rules: &[AliasRule]) -> HashMap<PluginSlug, HashMap<ModuleSlug, ModuleSlug>> {
    let mut renames: HashMap<PluginSlug, HashMap<ModuleSlug, ModuleSlug>> = HashMap::new();
    for rule in rules {
        renames
            .entry(rule.plugin.clone())
            .or_default()
            .insert(rule.from.clone(), rule.to.clone());
    }
    renames
}

fn check_acyclic(
    renames: &HashMap<PluginSlug, HashMap<ModuleSlug, ModuleSlug>>,
) -> Result<(), SyncError> {
    for (plugin, table) in renames {
        for start in table.keys() {
            let mut seen = HashSet::new();
            let mut current = start.as_str();
            while let Some(next) = table.get(current) {
                if !seen.insert(current) {
                    return Err(SyncError::config(format!(
                        "alias rules for plugin '{plugin}' form a cycle through '{start}'"
                    )));
                }
                current = next.as_str();
            }
        }
    }
    Ok(())
}
