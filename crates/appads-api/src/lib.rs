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

//! HTTP surface (§6): the nine app-ads.txt endpoints, request-boundary
//! validation and error taxonomy (C10), and the chunk-streaming envelope
//! (§4.9).
//!
//! Layout: `dto.rs` (request/response shapes and flexible-field decoding),
//! `validation.rs` (batch-size caps and the validated-request type),
//! `errors.rs` (`ApiError`, the RFC 9457 problem-response mapping),
//! `state.rs` (`ApiState`, shared across every handler), `csv.rs`/
//! `streaming.rs` (CSV rendering and the chunked-JSON envelope),
//! `handlers/` (one module per endpoint group), `router.rs` (`ApiServer`,
//! route assembly and the bind/serve loop).

mod csv;
mod dto;
mod errors;
mod handlers;
mod router;
mod state;
mod streaming;
mod validation;

pub use errors::ApiError;
pub use router::ApiServer;
pub use state::ApiState;
