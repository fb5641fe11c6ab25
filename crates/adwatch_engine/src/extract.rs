use adwatch_core::{Entry, PageListing};
use scraper::{ElementRef, Html, Selector};
use url::Url;

const MIN_ID_DIGITS: usize = 7;
const PRICE_TESTID_PREFIX: &str = "search-result-entry-price-";
const NO_TITLE: &str = "(no title)";
const NO_PRICE: &str = "(no price)";

pub trait AdExtractor: Send + Sync {
    /// Find every ad on a search-result page. `page_url` resolves relative links.
    fn extract(&self, html: &str, page_url: &str) -> PageListing;
}

/// Extractor for the marketplace's search-result markup:
/// - an ad is a `div` whose `id` is a run of at least seven digits
/// - the first `a[href]` inside it is the detail link
/// - the first `h3` is the title
/// - `span[data-testid="search-result-entry-price-<id>"]` is the price.
///
/// Ads without a link still count as visible but produce no entry.
#[derive(Debug, Clone)]
pub struct ListingExtractor {
    min_id_digits: usize,
}

impl ListingExtractor {
    pub fn new() -> Self {
        Self {
            min_id_digits: MIN_ID_DIGITS,
        }
    }

    fn is_ad_id(&self, id: &str) -> bool {
        id.len() >= self.min_id_digits && id.bytes().all(|b| b.is_ascii_digit())
    }
}

impl Default for ListingExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl AdExtractor for ListingExtractor {
    fn extract(&self, html: &str, page_url: &str) -> PageListing {
        let doc = Html::parse_document(html);
        let base = Url::parse(page_url).ok();
        let (Ok(ad_sel), Ok(link_sel), Ok(title_sel), Ok(price_sel)) = (
            Selector::parse("div[id]"),
            Selector::parse("a[href]"),
            Selector::parse("h3"),
            Selector::parse("span[data-testid]"),
        ) else {
            return PageListing::default();
        };

        let mut listing = PageListing::default();
        for ad in doc.select(&ad_sel) {
            let Some(id) = ad.value().id().filter(|id| self.is_ad_id(id)) else {
                continue;
            };
            listing.visible_ids.push(id.to_string());

            let Some(link) = ad
                .select(&link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| resolve_link(href, base.as_ref()))
            else {
                continue;
            };

            let title = ad
                .select(&title_sel)
                .next()
                .map(element_text)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| NO_TITLE.to_string());

            let price_testid = format!("{PRICE_TESTID_PREFIX}{id}");
            let price = ad
                .select(&price_sel)
                .find(|span| span.value().attr("data-testid") == Some(price_testid.as_str()))
                .map(element_text)
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| NO_PRICE.to_string());

            listing.entries.push(Entry {
                id: id.to_string(),
                title,
                price,
                link,
            });
        }
        listing
    }
}

fn element_text(element: ElementRef) -> String {
    let raw = element.text().collect::<String>();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn resolve_link(reference: &str, base: Option<&Url>) -> Option<String> {
    let trimmed = reference.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url.into());
    }
    base.and_then(|base| base.join(trimmed).ok()).map(Into::into)
}
