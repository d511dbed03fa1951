//! app-ads.txt line parser, search matcher, and streaming analyser (§4.5).
#![warn(missing_docs)]
#![warn(clippy::all)]

mod facade;
mod matcher;
mod parser;
mod path;
mod stream;

pub use facade::{AnalysisOutcome, Analyser};
pub use matcher::{search, MatchLimits};
pub use parser::parse;
pub use path::{select_buffered_path, should_stream};
pub use stream::{StreamingAnalyser, DEFAULT_HEAD_SAMPLE_BYTES};
