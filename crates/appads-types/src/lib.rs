#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![allow(clippy::module_name_repetitions)]

//! Shared data model for the app-ads.txt resolution service.
//!
//! Layout: `bundle.rs` (bundle ids), `store.rs` (store detection),
//! `domain.rs` (canonical domains), `search.rs` (search terms), `appads.rs`
//! (parsed lines / analysis / search results), `result.rs` (per-bundle
//! pipeline results), `cache.rs` (TTL classes and cache entries), `error.rs`
//! (validation errors).

pub mod appads;
pub mod bundle;
pub mod cache;
pub mod domain;
pub mod error;
pub mod result;
pub mod search;
pub mod store;

pub use appads::{
    AppAdsAnalysis, AppAdsFields, AppAdsLine, InvalidLineSample, Relationship, RelationshipCounts,
    SearchResult, TermMatch,
};
pub use bundle::{BundleId, MAX_BUNDLE_ID_LEN};
pub use cache::{CacheEntry, TtlClass};
pub use domain::Domain;
pub use error::{ValidationError, ValidationResult};
pub use result::{AppAdsReport, ErrorKind, ExtractionResult, FetchAttemptError, ProcessingMethod};
pub use search::SearchTerm;
pub use store::StoreKind;
