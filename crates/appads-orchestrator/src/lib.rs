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

//! Per-bundle resolution pipeline (§4.7): composes the store extractor (C6)
//! and the app-ads.txt analyser (C5) behind a fixed-order store-fallback
//! chain, never throwing to the caller boundary.
//!
//! Layout: `appads_fetch.rs` (app-ads.txt fetch, cache, and analysis over the
//! three execution paths), `resolve.rs` (`Orchestrator::resolve`, the
//! fallback chain).

mod appads_fetch;
mod resolve;

pub use appads_fetch::{fetch_and_analyse, FetchLimits};
pub use resolve::Orchestrator;
