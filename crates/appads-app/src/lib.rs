#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Application bootstrap wiring: loads [`appads_config::Settings`], builds
//! every pipeline dependency (HTTP client, rate limiter, tiered cache,
//! worker pool, analyser, store extractor, orchestrator), and hands them to
//! [`appads_api::ApiServer`].

/// Application bootstrap and environment loading.
pub mod bootstrap;
/// Bootstrap-time error type.
pub mod error;

pub use bootstrap::run_app;
