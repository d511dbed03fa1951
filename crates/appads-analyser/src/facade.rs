//! Ties the line parser, search matcher, and worker pool together behind
//! the three execution paths selected in [`crate::path`].

use std::sync::Arc;

use appads_types::{AppAdsAnalysis, AppAdsLine, ProcessingMethod, SearchResult, SearchTerm};
use appads_worker::{Priority, WorkerError, WorkerPool};
use bytes::Bytes;
use futures_util::Stream;

use crate::matcher::{self, MatchLimits};
use crate::parser;
use crate::stream::StreamingAnalyser;

/// Outcome of analysing one app-ads.txt body, however it was processed.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Line-level counters.
    pub analysis: AppAdsAnalysis,
    /// Search-term matches, present only when terms were supplied.
    pub search: Option<SearchResult>,
    /// Which path produced this outcome.
    pub processing_method: ProcessingMethod,
    /// A bounded prefix of the raw content, populated for the `stream` path.
    pub head_sample: Option<Vec<u8>>,
}

/// Runs the parse-and-search pipeline over the `sync`, `worker`, and
/// `stream` execution paths.
pub struct Analyser {
    worker_pool: Arc<WorkerPool>,
    streaming: StreamingAnalyser,
}

impl Analyser {
    /// Build an analyser backed by `worker_pool`, with a streaming head
    /// sample bounded to `head_sample_bytes`.
    #[must_use]
    pub fn new(worker_pool: Arc<WorkerPool>, head_sample_bytes: usize) -> Self {
        Self {
            worker_pool,
            streaming: StreamingAnalyser::new(head_sample_bytes),
        }
    }

    /// Parse `content` inline, on the calling task. Used for the `sync` path.
    #[must_use]
    pub fn analyse_sync(content: &str, terms: &[SearchTerm], limits: MatchLimits) -> AnalysisOutcome {
        let (analysis, lines) = parser::parse(content);
        let search = search_if_requested(&lines, terms, limits);
        AnalysisOutcome {
            analysis,
            search,
            processing_method: ProcessingMethod::Sync,
            head_sample: None,
        }
    }

    /// Parse `content` on the worker pool. Used for the `worker` path.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError`] if the task timed out, panicked, was refused
    /// for being over the memory budget, or the pool is shutting down.
    pub async fn analyse_on_worker(
        &self,
        content: String,
        terms: Vec<SearchTerm>,
        limits: MatchLimits,
    ) -> Result<AnalysisOutcome, WorkerError> {
        let rx = self.worker_pool.submit(Priority::Normal, move || {
            let (analysis, lines) = parser::parse(&content);
            let search = search_if_requested(&lines, &terms, limits);
            (analysis, search)
        })?;
        let (analysis, search) = rx.await.map_err(|_| WorkerError::Closed)??;
        Ok(AnalysisOutcome {
            analysis,
            search,
            processing_method: ProcessingMethod::Worker,
            head_sample: None,
        })
    }

    /// Stream `body` through the incremental line classifier without
    /// buffering it, then run the search pass over the parsed lines. Used
    /// for the `stream` path.
    pub async fn analyse_streaming<S, E>(
        &self,
        body: S,
        terms: &[SearchTerm],
        limits: MatchLimits,
    ) -> AnalysisOutcome
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: std::fmt::Display,
    {
        let (analysis, lines, head_sample) = self.streaming.analyse(body).await;
        let search = search_if_requested(&lines, terms, limits);
        AnalysisOutcome {
            analysis,
            search,
            processing_method: ProcessingMethod::Stream,
            head_sample: Some(head_sample),
        }
    }
}

fn search_if_requested(lines: &[AppAdsLine], terms: &[SearchTerm], limits: MatchLimits) -> Option<SearchResult> {
    if terms.is_empty() {
        None
    } else {
        Some(matcher::search(lines, terms, limits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appads_worker::WorkerPoolConfig;

    #[test]
    fn sync_path_parses_and_searches_inline() {
        let outcome = Analyser::analyse_sync(
            "google.com, pub-1, DIRECT\n",
            &[SearchTerm::Plain("google.com".into())],
            MatchLimits::default(),
        );
        assert_eq!(outcome.processing_method, ProcessingMethod::Sync);
        assert_eq!(outcome.analysis.valid_lines, 1);
        assert_eq!(outcome.search.unwrap().count, 1);
    }

    #[tokio::test]
    async fn worker_path_round_trips_through_the_pool() {
        let pool = Arc::new(WorkerPool::new(WorkerPoolConfig::default()));
        let analyser = Analyser::new(Arc::clone(&pool), 1024);
        let outcome = analyser
            .analyse_on_worker(
                "google.com, pub-1, DIRECT\n".to_string(),
                vec![SearchTerm::Plain("google.com".into())],
                MatchLimits::default(),
            )
            .await
            .unwrap();
        assert_eq!(outcome.processing_method, ProcessingMethod::Worker);
        assert_eq!(outcome.analysis.valid_lines, 1);
    }
}
