use std::collections::{BTreeSet, HashMap};

use crate::view_model::{TargetRow, WatchView};

pub const DEFAULT_REFRESH_SECONDS: u64 = 180;
pub const MIN_REFRESH_SECONDS: u64 = 10;
pub const DEFAULT_CHANNEL: &str = "willhaben-crawler";

/// Ad identifiers already accounted for on one tracked URL.
pub type KnownIds = BTreeSet<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub refresh_seconds: u64,
    pub notifications_enabled: bool,
    pub channel: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_seconds: DEFAULT_REFRESH_SECONDS,
            notifications_enabled: true,
            channel: DEFAULT_CHANNEL.to_string(),
        }
    }
}

impl Settings {
    /// Clamp values that may have come from an older or hand-edited state file.
    fn sanitized(mut self) -> Self {
        self.refresh_seconds = self.refresh_seconds.max(MIN_REFRESH_SECONDS);
        let channel = self.channel.trim();
        self.channel = if channel.is_empty() {
            DEFAULT_CHANNEL.to_string()
        } else {
            channel.to_string()
        };
        self
    }
}

/// Everything the poller and the menu share: tracked targets in insertion
/// order, one known-ID set per target, and the global settings.
///
/// Every tracked target always has a known-ID set, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchState {
    targets: Vec<String>,
    known_ids: HashMap<String, KnownIds>,
    settings: Settings,
}

impl WatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from loosely shaped parts: blank and repeated targets are
    /// dropped, sets for untracked URLs are discarded, and missing sets are
    /// created empty.
    pub fn from_parts<I, S>(targets: Vec<String>, known_ids: I, settings: Settings) -> Self
    where
        I: IntoIterator<Item = (String, S)>,
        S: IntoIterator<Item = String>,
    {
        let mut state = Self {
            targets: Vec::with_capacity(targets.len()),
            known_ids: HashMap::new(),
            settings: settings.sanitized(),
        };
        for url in targets {
            if url.trim().is_empty() || state.is_tracked(&url) {
                continue;
            }
            state.known_ids.insert(url.clone(), KnownIds::new());
            state.targets.push(url);
        }
        for (url, ids) in known_ids {
            if let Some(set) = state.known_ids.get_mut(&url) {
                set.extend(ids);
            }
        }
        state
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_tracked(&self, url: &str) -> bool {
        self.known_ids.contains_key(url)
    }

    pub fn known_ids(&self, url: &str) -> Option<&KnownIds> {
        self.known_ids.get(url)
    }

    /// Targets in list order paired with their known-ID sets.
    pub fn tracked(&self) -> impl Iterator<Item = (&str, &KnownIds)> {
        self.targets
            .iter()
            .filter_map(|url| self.known_ids.get(url).map(|ids| (url.as_str(), ids)))
    }

    /// Fold a scan result into the stored set for `url`.
    ///
    /// Returns `true` when the stored set grew. A URL that is no longer
    /// tracked is left untouched so a late scan cannot resurrect it.
    pub fn merge_known_ids(&mut self, url: &str, ids: &KnownIds) -> bool {
        let Some(set) = self.known_ids.get_mut(url) else {
            return false;
        };
        let before = set.len();
        set.extend(ids.iter().cloned());
        set.len() != before
    }

    pub fn view(&self) -> WatchView {
        WatchView {
            targets: self
                .tracked()
                .enumerate()
                .map(|(index, (url, ids))| TargetRow {
                    position: index + 1,
                    url: url.to_string(),
                    known_count: ids.len(),
                })
                .collect(),
            settings: self.settings.clone(),
        }
    }

    pub(crate) fn push_target(&mut self, url: String) {
        self.known_ids.insert(url.clone(), KnownIds::new());
        self.targets.push(url);
    }

    pub(crate) fn remove_target_at(&mut self, index: usize) -> String {
        let url = self.targets.remove(index);
        self.known_ids.remove(&url);
        url
    }

    pub(crate) fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> KnownIds {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn from_parts_sanitizes_loose_input() {
        let state = WatchState::from_parts(
            vec![
                "https://a.example/s".to_string(),
                "  ".to_string(),
                "https://a.example/s".to_string(),
                "https://b.example/s".to_string(),
            ],
            vec![
                ("https://a.example/s".to_string(), vec!["1".to_string(), "1".to_string()]),
                ("https://gone.example/s".to_string(), vec!["9".to_string()]),
            ],
            Settings {
                refresh_seconds: 3,
                notifications_enabled: false,
                channel: "  ".to_string(),
            },
        );

        assert_eq!(state.targets(), ["https://a.example/s", "https://b.example/s"]);
        assert_eq!(state.known_ids("https://a.example/s"), Some(&ids(&["1"])));
        assert_eq!(state.known_ids("https://b.example/s"), Some(&KnownIds::new()));
        assert!(state.known_ids("https://gone.example/s").is_none());
        assert_eq!(state.settings().refresh_seconds, MIN_REFRESH_SECONDS);
        assert_eq!(state.settings().channel, DEFAULT_CHANNEL);
        assert!(!state.settings().notifications_enabled);
    }

    #[test]
    fn merge_reports_growth_only() {
        let mut state = WatchState::new();
        state.push_target("u".to_string());

        assert!(state.merge_known_ids("u", &ids(&["1", "2"])));
        assert!(!state.merge_known_ids("u", &ids(&["2"])));
        assert!(state.merge_known_ids("u", &ids(&["3"])));
        assert_eq!(state.known_ids("u"), Some(&ids(&["1", "2", "3"])));
    }

    #[test]
    fn merge_ignores_untracked_url() {
        let mut state = WatchState::new();
        assert!(!state.merge_known_ids("u", &ids(&["1"])));
        assert!(!state.is_tracked("u"));
    }
}
