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

//! Per-resource-key fixed-window rate limiter with adaptive backoff (§4.2).
//!
//! One logical limiter exists per resource key (a `StoreKind` or
//! `app-ads-txt`). `acquire` blocks the caller until a slot in the current
//! window is available; `report_error`/`report_success` feed back observed
//! upstream status codes so a sustained run of `429`/`403` responses halves
//! the effective rate, restoring gradually on success and resetting fully
//! after one clean window.

mod limiter;
mod registry;

pub use limiter::{RateLimitStatus, WindowLimit};
pub use registry::RateLimiterRegistry;
