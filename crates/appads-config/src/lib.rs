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

//! Static store configuration and process-lifetime runtime settings.
//!
//! Layout: `store_table.rs` (the per-`StoreKind` scraping table from §3/§6),
//! `settings.rs` (environment-driven `Settings`), `error.rs` (validation
//! errors).

pub mod error;
pub mod settings;
pub mod store_table;

pub use error::{ConfigError, ConfigResult};
pub use settings::Settings;
pub use store_table::{RateLimitParams, StoreConfig, store_config};
