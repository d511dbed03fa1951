//! CSV row rendering for `/api/export-csv` and `/api/stream/export-csv`
//! (§6). One row per resolved bundle id; nested app-ads.txt analytics are
//! flattened into scalar columns rather than nested structures, since CSV
//! has no nesting.

use appads_types::ExtractionResult;

/// Column header row, in the order [`row_for`] emits values.
pub const HEADER: &str = "bundleId,storeKind,success,domain,developerUrl,appAdsExists,totalLines,validLines,matchCount,error\n";

/// Render one CSV row for `result`, with values escaped per RFC 4180
/// (double quotes doubled, the whole field quoted if it contains a comma,
/// quote, or newline).
#[must_use]
pub fn row_for(result: &ExtractionResult) -> String {
    let report = result.app_ads_txt.as_ref();
    let analysis = report.and_then(|report| report.analysed.as_ref());

    let fields = [
        result.bundle_id.clone(),
        result.store_kind.as_str().to_string(),
        result.success.to_string(),
        result.domain.clone().unwrap_or_default(),
        result.developer_url.clone().unwrap_or_default(),
        report.map(|report| report.exists.to_string()).unwrap_or_default(),
        analysis.map(|analysis| analysis.total_lines.to_string()).unwrap_or_default(),
        analysis.map(|analysis| analysis.valid_lines.to_string()).unwrap_or_default(),
        report
            .and_then(|report| report.search.as_ref())
            .map(|search| search.count.to_string())
            .unwrap_or_default(),
        result.error.clone().unwrap_or_default(),
    ];

    let mut line = fields.iter().map(|field| escape(field)).collect::<Vec<_>>().join(",");
    line.push('\n');
    line
}

fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appads_types::{ProcessingMethod, StoreKind};

    #[test]
    fn plain_fields_are_not_quoted() {
        let result = ExtractionResult {
            bundle_id: "com.example.app".to_string(),
            store_kind: StoreKind::Googleplay,
            success: true,
            developer_url: Some("https://example.com".to_string()),
            domain: Some("example.com".to_string()),
            app_ads_txt: None,
            error: None,
            timestamp: chrono::Utc::now(),
            processing_method: ProcessingMethod::None,
            processing_time_ms: 10,
        };
        let row = row_for(&result);
        assert!(row.starts_with("com.example.app,googleplay,true,example.com,https://example.com"));
    }

    #[test]
    fn fields_containing_commas_are_quoted() {
        let result = ExtractionResult {
            bundle_id: "com.example.app".to_string(),
            store_kind: StoreKind::Googleplay,
            success: false,
            developer_url: None,
            domain: None,
            app_ads_txt: None,
            error: Some("timeout, retrying".to_string()),
            timestamp: chrono::Utc::now(),
            processing_method: ProcessingMethod::None,
            processing_time_ms: 5,
        };
        let row = row_for(&result);
        assert!(row.contains("\"timeout, retrying\""));
    }
}
