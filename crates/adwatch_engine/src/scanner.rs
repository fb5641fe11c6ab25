use std::sync::Arc;

use adwatch_core::{classify, KnownIds, ScanOutcome};
use engine_logging::{engine_debug, engine_info};

use crate::decode::decode_page;
use crate::extract::AdExtractor;
use crate::fetch::Fetcher;
use crate::FetchError;

/// Fetches one tracked page and diffs it against the known-ID set.
///
/// No notification decision is made here.
#[derive(Clone)]
pub struct PageScanner {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn AdExtractor>,
}

impl PageScanner {
    pub fn new(fetcher: Arc<dyn Fetcher>, extractor: Arc<dyn AdExtractor>) -> Self {
        Self { fetcher, extractor }
    }

    /// A failed fetch is returned as is; callers treat it as "nothing changed"
    /// and retry on the next cycle.
    pub async fn scan(&self, url: &str, known: &KnownIds) -> Result<ScanOutcome, FetchError> {
        let output = self.fetcher.fetch(url).await?;
        let html = decode_page(&output.bytes, output.metadata.content_type.as_deref());
        let listing = self.extractor.extract(&html, &output.metadata.final_url);
        let outcome = classify(&listing, known);

        engine_debug!(
            "[{}] {} ads visible ({} bytes), {} not seen before",
            url,
            listing.visible_ids.len(),
            output.metadata.byte_len,
            outcome.new_entries.len()
        );
        for entry in &outcome.new_entries {
            engine_info!("[{}] new ad {}: {} {}", url, entry.id, entry.headline(), entry.link);
        }
        Ok(outcome)
    }
}
