//! Chunked/streaming analyser: processes bytes as they arrive, never holding
//! the full body resident (§4.5).

use appads_types::{AppAdsAnalysis, AppAdsLine};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tracing::warn;

use crate::parser::LineAccumulator;

/// Default bound on the raw-content sample retained for caller inspection.
pub const DEFAULT_HEAD_SAMPLE_BYTES: usize = 100 * 1024;

/// Streams app-ads.txt bytes through the line classifier without buffering
/// the whole body, retaining only a bounded head sample of the raw content.
pub struct StreamingAnalyser {
    head_sample_bytes: usize,
}

impl Default for StreamingAnalyser {
    fn default() -> Self {
        Self::new(DEFAULT_HEAD_SAMPLE_BYTES)
    }
}

impl StreamingAnalyser {
    /// Build an analyser retaining up to `head_sample_bytes` of raw content.
    #[must_use]
    pub fn new(head_sample_bytes: usize) -> Self {
        Self { head_sample_bytes }
    }

    /// Consume `stream`, returning the aggregate analysis, the parsed valid
    /// lines (for a subsequent search pass), and the bounded head sample.
    ///
    /// A transport error on the stream aborts the analysis: the returned
    /// [`AppAdsAnalysis`] is zeroed except for `error`, so the caller can
    /// still cache the failure per §4.5's failure semantics.
    pub async fn analyse<S, E>(&self, mut stream: S) -> (AppAdsAnalysis, Vec<AppAdsLine>, Vec<u8>)
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: std::fmt::Display,
    {
        let mut accumulator = LineAccumulator::default();
        let mut residual = String::new();
        let mut head_sample: Vec<u8> = Vec::with_capacity(self.head_sample_bytes.min(1024));

        loop {
            let chunk = match stream.next().await {
                Some(chunk) => chunk,
                None => break,
            };

            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(%err, "app-ads.txt stream aborted with a transport error");
                    return (
                        AppAdsAnalysis {
                            error: Some(err.to_string()),
                            ..AppAdsAnalysis::default()
                        },
                        Vec::new(),
                        head_sample,
                    );
                }
            };

            if head_sample.len() < self.head_sample_bytes {
                let remaining = self.head_sample_bytes - head_sample.len();
                head_sample.extend(bytes.iter().take(remaining).copied());
            }

            match std::str::from_utf8(&bytes) {
                Ok(text) => residual.push_str(text),
                Err(_) => residual.push_str(&String::from_utf8_lossy(&bytes)),
            }

            while let Some(newline_at) = residual.find('\n') {
                let line = residual[..newline_at].strip_suffix('\r').unwrap_or(&residual[..newline_at]);
                accumulator.process_line(line);
                residual.drain(..=newline_at);
            }
        }

        if !residual.is_empty() {
            let line = residual.strip_suffix('\r').unwrap_or(&residual);
            accumulator.process_line(line);
        }

        let (analysis, lines) = accumulator.finish();
        (analysis, lines, head_sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[tokio::test]
    async fn reassembles_lines_split_across_chunk_boundaries() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"google.com, pub")),
            Ok(Bytes::from_static(b"-1, DIRECT\nfacebook.com, pub-2, RESELLER\n")),
        ];
        let analyser = StreamingAnalyser::default();
        let (analysis, lines, _sample) = analyser.analyse(stream::iter(chunks)).await;
        assert_eq!(analysis.valid_lines, 2);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].fields.publisher_id, "pub-1");
    }

    #[tokio::test]
    async fn head_sample_is_bounded() {
        let big_chunk = Bytes::from(vec![b'a'; 200 * 1024]);
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![Ok(big_chunk)];
        let analyser = StreamingAnalyser::new(1024);
        let (_analysis, _lines, sample) = analyser.analyse(stream::iter(chunks)).await;
        assert_eq!(sample.len(), 1024);
    }

    #[tokio::test]
    async fn transport_error_aborts_with_zeroed_counters() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"google.com, pub-1, DIRECT\n")),
            Err(std::io::Error::other("connection reset")),
        ];
        let analyser = StreamingAnalyser::default();
        let (analysis, lines, _sample) = analyser.analyse(stream::iter(chunks)).await;
        assert!(analysis.error.is_some());
        assert_eq!(analysis.valid_lines, 0);
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn trailing_content_without_a_final_newline_is_still_processed() {
        let chunks: Vec<Result<Bytes, std::io::Error>> =
            vec![Ok(Bytes::from_static(b"google.com, pub-1, DIRECT"))];
        let analyser = StreamingAnalyser::default();
        let (analysis, _lines, _sample) = analyser.analyse(stream::iter(chunks)).await;
        assert_eq!(analysis.valid_lines, 1);
    }
}
