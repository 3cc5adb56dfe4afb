//! Target catalog - what the library account already holds
//!
//! The library API reports each plugin either as `true` (every module of
//! the plugin counts as present) or as a list of module slugs. That
//! union is decoded straight into [`TargetCatalogEntry`] so nothing
//! downstream ever sees a bare boolean.

use serde::{Deserialize, Deserializer};
use std::collections::{BTreeSet, HashMap};

use super::{ModuleSlug, PluginSlug};

/// Library state for one plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetCatalogEntry {
    /// All modules of the plugin are considered present
    Whitelisted,
    /// Only these modules are present
    ExplicitSet(BTreeSet<ModuleSlug>),
}

impl TargetCatalogEntry {
    /// Whether a module counts as already in the library
    pub fn contains(&self, module: &str) -> bool {
        match self {
            TargetCatalogEntry::Whitelisted => true,
            TargetCatalogEntry::ExplicitSet(modules) => modules.contains(module),
        }
    }

    pub fn is_whitelisted(&self) -> bool {
        matches!(self, TargetCatalogEntry::Whitelisted)
    }
}

impl From<Vec<ModuleSlug>> for TargetCatalogEntry {
    fn from(modules: Vec<ModuleSlug>) -> Self {
        TargetCatalogEntry::ExplicitSet(modules.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for TargetCatalogEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, SeqAccess, Visitor};

        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = TargetCatalogEntry;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a boolean or a list of module slugs")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                // `false` carries no modules
                Ok(if value {
                    TargetCatalogEntry::Whitelisted
                } else {
                    TargetCatalogEntry::ExplicitSet(BTreeSet::new())
                })
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut modules = BTreeSet::new();
                while let Some(module) = seq.next_element::<String>()? {
                    modules.insert(module);
                }
                Ok(TargetCatalogEntry::ExplicitSet(modules))
            }
        }

        deserializer.deserialize_any(EntryVisitor)
    }
}

/// Plugins known to the library account
///
/// Only ever read during a run. Additions change the remote library,
/// never this value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct TargetCatalog {
    entries: HashMap<PluginSlug, TargetCatalogEntry>,
}

impl TargetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for a plugin, `None` when the library has never seen it
    pub fn get(&self, plugin: &str) -> Option<&TargetCatalogEntry> {
        self.entries.get(plugin)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of whitelisted plugins
    pub fn whitelisted_count(&self) -> usize {
        self.entries.values().filter(|e| e.is_whitelisted()).count()
    }
}

impl<P> FromIterator<(P, TargetCatalogEntry)> for TargetCatalog
where
    P: Into<PluginSlug>,
{
    fn from_iter<T: IntoIterator<Item = (P, TargetCatalogEntry)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(p, e)| (p.into(), e)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_true_is_whitelisted() {
        let entry: TargetCatalogEntry = serde_json::from_str("true").unwrap();
        assert_eq!(entry, TargetCatalogEntry::Whitelisted);
        assert!(entry.contains("anything"));
    }

    #[test]
    fn test_deserialize_false_is_empty_set() {
        let entry: TargetCatalogEntry = serde_json::from_str("false").unwrap();
        assert_eq!(entry, TargetCatalogEntry::ExplicitSet(BTreeSet::new()));
        assert!(!entry.contains("anything"));
    }

    #[test]
    fn test_deserialize_list_is_explicit_set() {
        let entry: TargetCatalogEntry =
            serde_json::from_str(r#"["Bogaudio-VCO", "Bogaudio-LFO", "Bogaudio-VCO"]"#).unwrap();

        match &entry {
            TargetCatalogEntry::ExplicitSet(modules) => assert_eq!(modules.len(), 2),
            other => panic!("expected explicit set, got {other:?}"),
        }
        assert!(entry.contains("Bogaudio-LFO"));
        assert!(!entry.contains("Bogaudio-PolyCon"));
    }

    #[test]
    fn test_deserialize_rejects_other_shapes() {
        assert!(serde_json::from_str::<TargetCatalogEntry>("42").is_err());
        assert!(serde_json::from_str::<TargetCatalogEntry>(r#""Bogaudio""#).is_err());
        assert!(serde_json::from_str::<TargetCatalogEntry>("null").is_err());
        assert!(serde_json::from_str::<TargetCatalogEntry>("[1, 2]").is_err());
    }

    #[test]
    fn test_deserialize_catalog_with_mixed_entries() {
        let catalog: TargetCatalog = serde_json::from_str(
            r#"{"Bogaudio": true, "Befaco": ["EvenVCO"], "Fundamental": []}"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.whitelisted_count(), 1);
        assert_eq!(
            catalog.get("Befaco"),
            Some(&TargetCatalogEntry::from(vec!["EvenVCO".to_string()]))
        );
        assert!(catalog.get("AudibleInstruments").is_none());
    }
}
