//! Bounded worker pool for CPU-heavy parse tasks (§4.4).
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod memory;
mod pool;
mod priority;

pub use error::WorkerError;
pub use memory::{MemorySample, MemorySampler, ProcessMemorySampler};
pub use pool::{WorkerPool, WorkerPoolConfig};
pub use priority::Priority;
