use std::collections::HashSet;

use crate::KnownIds;

/// One ad listing found on a search-result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub price: String,
    pub link: String,
}

impl Entry {
    /// Short human-readable line used for logs and notification titles.
    pub fn headline(&self) -> String {
        format!("{} {}", self.price, self.title)
    }
}

/// What a page currently shows.
///
/// `visible_ids` holds every ad identifier on the page in page order,
/// including ads that could not be turned into a full [`Entry`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageListing {
    pub visible_ids: Vec<String>,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanOutcome {
    pub known_ids: KnownIds,
    pub new_entries: Vec<Entry>,
}

impl ScanOutcome {
    /// Outcome of a scan that produced no information.
    pub fn unchanged(known_ids: &KnownIds) -> Self {
        Self {
            known_ids: known_ids.clone(),
            new_entries: Vec::new(),
        }
    }
}

/// Split a page into already-known and newly discovered ads.
///
/// The refreshed set is the union of `known` and everything visible, so it
/// never shrinks. New entries keep page order and each identifier is
/// reported at most once.
pub fn classify(page: &PageListing, known: &KnownIds) -> ScanOutcome {
    let mut known_ids = known.clone();
    known_ids.extend(page.visible_ids.iter().cloned());
    known_ids.extend(page.entries.iter().map(|entry| entry.id.clone()));

    let mut reported = HashSet::new();
    let new_entries = page
        .entries
        .iter()
        .filter(|entry| !known.contains(&entry.id))
        .filter(|entry| reported.insert(entry.id.as_str()))
        .cloned()
        .collect();

    ScanOutcome {
        known_ids,
        new_entries,
    }
}
