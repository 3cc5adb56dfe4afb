//! Source catalog - ordered plugin to module mapping

use serde::Serialize;

use super::{dedup_preserving_order, ModuleSlug, PluginSlug};

/// One plugin and its modules, in first-seen order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginModules {
    pub plugin: PluginSlug,
    pub modules: Vec<ModuleSlug>,
}

/// Plugins scraped from the listing, in first-seen order
///
/// Plugin slugs are unique and every module list is duplicate-free.
/// Insertion goes through [`SourceCatalog::insert`], which merges
/// rather than duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SourceCatalog {
    plugins: Vec<PluginModules>,
}

impl SourceCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin with its modules
    ///
    /// A plugin already present keeps its position; new modules are
    /// appended after the existing ones, skipping any it already has.
    pub fn insert<I>(&mut self, plugin: impl Into<PluginSlug>, modules: I)
    where
        I: IntoIterator<Item = ModuleSlug>,
    {
        let plugin = plugin.into();
        match self.plugins.iter_mut().find(|p| p.plugin == plugin) {
            Some(existing) => {
                let current = std::mem::take(&mut existing.modules);
                existing.modules = dedup_preserving_order(current.into_iter().chain(modules));
            }
            None => self.plugins.push(PluginModules {
                plugin,
                modules: dedup_preserving_order(modules),
            }),
        }
    }

    /// Modules of a plugin, if it is in the catalog
    pub fn get(&self, plugin: &str) -> Option<&[ModuleSlug]> {
        self.plugins
            .iter()
            .find(|p| p.plugin == plugin)
            .map(|p| p.modules.as_slice())
    }

    pub(crate) fn get_mut(&mut self, plugin: &str) -> Option<&mut Vec<ModuleSlug>> {
        self.plugins
            .iter_mut()
            .find(|p| p.plugin == plugin)
            .map(|p| &mut p.modules)
    }

    pub fn contains_plugin(&self, plugin: &str) -> bool {
        self.plugins.iter().any(|p| p.plugin == plugin)
    }

    /// Iterate plugins in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &PluginModules> {
        self.plugins.iter()
    }

    /// Plugin slugs in insertion order
    pub fn plugin_slugs(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|p| p.plugin.as_str())
    }

    /// Keep only the plugins matching the predicate
    pub fn retain_plugins<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.plugins.retain(|p| keep(&p.plugin));
    }

    /// Number of plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Total number of (plugin, module) pairs
    pub fn module_count(&self) -> usize {
        self.plugins.iter().map(|p| p.modules.len()).sum()
    }
}

impl<P, M> FromIterator<(P, M)> for SourceCatalog
where
    P: Into<PluginSlug>,
    M: IntoIterator<Item = ModuleSlug>,
{
    fn from_iter<T: IntoIterator<Item = (P, M)>>(iter: T) -> Self {
        let mut catalog = SourceCatalog::new();
        for (plugin, modules) in iter {
            catalog.insert(plugin, modules);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn modules(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_insert_preserves_first_seen_plugin_order() {
        let mut catalog = SourceCatalog::new();
        catalog.insert("Befaco", modules(&["EvenVCO"]));
        catalog.insert("Bogaudio", modules(&["Bogaudio-VCO"]));
        catalog.insert("Befaco", modules(&["Kickall"]));

        let slugs: Vec<&str> = catalog.plugin_slugs().collect();
        assert_eq!(slugs, vec!["Befaco", "Bogaudio"]);
        assert_eq!(
            catalog.get("Befaco").unwrap(),
            &modules(&["EvenVCO", "Kickall"])[..]
        );
    }

    #[test]
    fn test_insert_dedups_modules() {
        let mut catalog = SourceCatalog::new();
        catalog.insert("X", modules(&["a", "b", "a", "c", "b"]));
        catalog.insert("X", modules(&["c", "d"]));

        assert_eq!(catalog.get("X").unwrap(), &modules(&["a", "b", "c", "d"])[..]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.module_count(), 4);
    }

    #[test]
    fn test_retain_plugins() {
        let mut catalog: SourceCatalog = vec![
            ("A", modules(&["a1"])),
            ("B", modules(&["b1"])),
            ("C", modules(&["c1"])),
        ]
        .into_iter()
        .collect();

        catalog.retain_plugins(|p| p != "B");

        let slugs: Vec<&str> = catalog.plugin_slugs().collect();
        assert_eq!(slugs, vec!["A", "C"]);
        assert!(!catalog.contains_plugin("B"));
    }

    #[test]
    fn test_serializes_as_ordered_list() {
        let catalog: SourceCatalog = vec![("X", modules(&["a"]))].into_iter().collect();
        let json = serde_json::to_value(&catalog).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"plugin": "X", "modules": ["a"]}])
        );
    }
}
