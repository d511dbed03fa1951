//! Line parser for app-ads.txt content (§4.5 steps 1-6).

use std::collections::HashSet;

use appads_types::{AppAdsAnalysis, AppAdsFields, AppAdsLine, InvalidLineSample, Relationship};

const MAX_INVALID_SAMPLES: usize = 5;
const MAX_SAMPLE_CONTENT_LEN: usize = 200;

/// Parse a complete app-ads.txt body already resident in memory.
#[must_use]
pub fn parse(content: &str) -> (AppAdsAnalysis, Vec<AppAdsLine>) {
    let mut accumulator = LineAccumulator::default();
    for raw_line in split_lines(content) {
        accumulator.process_line(raw_line);
    }
    accumulator.finish()
}

/// Incremental line classifier shared by the buffered parser and the
/// streaming analyser so both paths apply identical per-line rules.
#[derive(Default)]
pub(crate) struct LineAccumulator {
    analysis: AppAdsAnalysis,
    lines: Vec<AppAdsLine>,
    publishers: HashSet<String>,
    next_line_number: usize,
}

impl LineAccumulator {
    pub(crate) fn process_line(&mut self, raw_line: &str) {
        self.next_line_number += 1;
        let line_number = self.next_line_number;
        self.analysis.total_lines += 1;

        let trimmed_start = raw_line.trim_start();
        if trimmed_start.is_empty() {
            self.analysis.empty_lines += 1;
            return;
        }
        if trimmed_start.starts_with('#') {
            self.analysis.comment_lines += 1;
            return;
        }

        let lhs = match trimmed_start.split_once('#') {
            Some((before, _)) => before.trim(),
            None => trimmed_start.trim_end(),
        };
        if lhs.is_empty() {
            self.analysis.empty_lines += 1;
            return;
        }

        let fields: Vec<&str> = lhs.split(',').map(str::trim).collect();
        if fields.len() < 3 {
            self.analysis.invalid_lines += 1;
            self.push_invalid_sample(line_number, lhs, "fewer than 3 comma-separated fields");
            return;
        }

        let exchange_domain = fields[0].to_ascii_lowercase();
        let publisher_id = fields[1].to_string();
        let relationship = Relationship::classify(fields[2]);
        let tag_id = fields
            .get(3)
            .copied()
            .filter(|field| !field.is_empty())
            .map(str::to_string);

        self.analysis.valid_lines += 1;
        self.analysis.relationships.record(relationship);
        self.publishers.insert(exchange_domain.clone());
        self.lines.push(AppAdsLine {
            line_number,
            content: lhs.to_string(),
            fields: AppAdsFields {
                exchange_domain,
                publisher_id,
                relationship,
                tag_id,
            },
        });
    }

    fn push_invalid_sample(&mut self, line_number: usize, content: &str, reason: &'static str) {
        if self.analysis.invalid_samples.len() >= MAX_INVALID_SAMPLES {
            return;
        }
        let truncated_content = if content.len() > MAX_SAMPLE_CONTENT_LEN {
            let mut end = MAX_SAMPLE_CONTENT_LEN;
            while !content.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}…", &content[..end])
        } else {
            content.to_string()
        };
        self.analysis.invalid_samples.push(InvalidLineSample {
            line_number,
            truncated_content,
            reason,
        });
    }

    pub(crate) fn finish(mut self) -> (AppAdsAnalysis, Vec<AppAdsLine>) {
        self.analysis.unique_publishers = self.publishers.len();
        (self.analysis, self.lines)
    }
}

/// Split on `\r\n | \n | \r`, without yielding a trailing empty line when the
/// content ends exactly on a line terminator.
fn split_lines(content: &str) -> Vec<&str> {
    let bytes = content.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&content[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&content[start..i]);
                i += 1;
                if i < bytes.len() && bytes[i] == b'\n' {
                    i += 1;
                }
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() {
        lines.push(&content[start..]);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_comments_blanks_and_valid_lines() {
        let body = "# header comment\n\ngoogle.com, pub-1234, DIRECT, f08c47fec0942fa0\nbad-line\n";
        let (analysis, lines) = parse(body);
        assert_eq!(analysis.total_lines, 4);
        assert_eq!(analysis.comment_lines, 1);
        assert_eq!(analysis.empty_lines, 1);
        assert_eq!(analysis.valid_lines, 1);
        assert_eq!(analysis.invalid_lines, 1);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].fields.exchange_domain, "google.com");
        assert_eq!(lines[0].fields.tag_id.as_deref(), Some("f08c47fec0942fa0"));
    }

    #[test]
    fn strips_trailing_inline_comment_before_splitting_fields() {
        let (analysis, lines) = parse("google.com, pub-1, DIRECT # trailing note\n");
        assert_eq!(analysis.valid_lines, 1);
        assert_eq!(lines[0].fields.publisher_id, "pub-1");
    }

    #[test]
    fn buckets_relationship_case_insensitively() {
        let body = "a.com,p1,direct\nb.com,p2,RESELLER\nc.com,p3,sponsored\n";
        let (analysis, _) = parse(body);
        assert_eq!(analysis.relationships.direct, 1);
        assert_eq!(analysis.relationships.reseller, 1);
        assert_eq!(analysis.relationships.other, 1);
        assert_eq!(analysis.relationships.total(), analysis.valid_lines as u64);
    }

    #[test]
    fn invalid_samples_are_capped_at_five() {
        let body = "bad1\nbad2\nbad3\nbad4\nbad5\nbad6\n";
        let (analysis, _) = parse(body);
        assert_eq!(analysis.invalid_lines, 6);
        assert_eq!(analysis.invalid_samples.len(), 5);
    }

    #[test]
    fn unique_publishers_dedupes_exchange_domain() {
        let body = "google.com,p1,direct\nGOOGLE.COM,p2,direct\nfacebook.com,p3,direct\n";
        let (analysis, _) = parse(body);
        assert_eq!(analysis.unique_publishers, 2);
    }

    #[test]
    fn handles_crlf_and_bare_cr_line_endings() {
        let body = "a.com,p1,direct\r\nb.com,p2,direct\rc.com,p3,direct\n";
        let (analysis, lines) = parse(body);
        assert_eq!(analysis.valid_lines, 3);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn no_trailing_empty_line_when_content_ends_on_a_newline() {
        let (analysis, _) = parse("a.com,p1,direct\n");
        assert_eq!(analysis.total_lines, 1);
    }
}
