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

//! Deduplicated, concurrency-ceilinged batch resolution (§4.8): dedup + cap,
//! bounded fan-out over the per-bundle orchestrator, pagination, and a
//! 5-minute result cache keyed by the hash of sorted ids and terms.
//!
//! Layout: `dedup.rs`/`cachekey.rs` (input normalisation and cache keying),
//! `facade.rs` (`resolve_many`, the bounded fan-out), `stats.rs` (post-batch
//! counts and analytics), `pagination.rs`, `resultcache.rs` (the 5-minute
//! complete-result cache, kept outside `TieredCache` — see its doc comment).

mod cachekey;
mod dedup;
mod facade;
mod pagination;
mod resultcache;
mod stats;

pub use cachekey::batch_cache_key;
pub use dedup::dedup_and_cap;
pub use facade::{resolve_many, BatchResult};
pub use pagination::{paginate, PageInfo};
pub use resultcache::ResultCache;
pub use stats::{compute_counts, compute_domain_analysis, compute_search_stats, Counts, DomainAnalysis, SharedDomain, TermStat};
