//! modsync core library
//!
//! Reconciles the MetaModule plugin listing (scraped HTML) against a
//! VCV Rack Library account (authenticated JSON API) and adds whatever
//! the library is missing.
//!
//! ```text
//! ListingSource ──► SourceCatalogFetcher ──► AliasResolver
//!                                                 │
//!                                                 ▼
//! LibraryApi ──► authenticate ──► get_modules ──► ReconciliationEngine
//!                                                       │
//!                                                       ▼
//!                                                   SyncReport
//! ```

pub mod alias;
pub mod catalog;
pub mod config;
pub mod error;
pub mod library;
pub mod listing;
pub mod pipeline;
pub mod sync;

pub use error::SyncError;
