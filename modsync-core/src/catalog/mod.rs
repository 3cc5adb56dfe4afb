//! Catalog model
//!
//! Two catalogs meet during a run:
//! - [`SourceCatalog`] - plugins and modules scraped from the MetaModule listing,
//!   ordered by first appearance
//! - [`TargetCatalog`] - what the VCV Rack Library account already holds, keyed
//!   by plugin, each entry either whitelisted or an explicit module set
//!
//! Both are built fresh every run and dropped when it ends.

mod source;
mod target;

pub use source::{PluginModules, SourceCatalog};
pub use target::{TargetCatalog, TargetCatalogEntry};

/// Plugin identifier, unique within a catalog
pub type PluginSlug = String;

/// Module identifier, unique within one plugin's module list
pub type ModuleSlug = String;

/// Drop repeated items, keeping the first occurrence of each
pub fn dedup_preserving_order<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let items = ["b", "a", "b", "c", "a"].map(String::from);
        assert_eq!(dedup_preserving_order(items), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_dedup_empty() {
        assert!(dedup_preserving_order(Vec::new()).is_empty());
    }
}
