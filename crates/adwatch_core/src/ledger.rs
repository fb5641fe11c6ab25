use std::collections::HashMap;

/// Notification eligibility of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// First scan since start, or nothing was known yet: discoveries are
    /// recorded silently.
    Baseline,
    /// Discoveries are new ads and may be notified.
    Steady,
}

impl ScanPhase {
    pub fn notify_eligible(self) -> bool {
        self == ScanPhase::Steady
    }
}

/// Per-URL scan counters held only for the lifetime of one poller.
///
/// Counters reset with the process, so the first scan after a restart is a
/// baseline scan again even for URLs that already have known IDs.
#[derive(Debug, Clone, Default)]
pub struct ScanLedger {
    counts: HashMap<String, u64>,
}

impl ScanLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counters for newly tracked URLs and drop those no longer tracked.
    pub fn reconcile(&mut self, targets: &[String]) {
        self.counts.retain(|url, _| targets.contains(url));
        for url in targets {
            self.counts.entry(url.clone()).or_insert(0);
        }
    }

    /// Decide the phase of the scan about to run and count the attempt.
    ///
    /// The attempt counts even if the fetch later fails.
    pub fn begin_scan(&mut self, url: &str, prior_known_empty: bool) -> ScanPhase {
        let count = self.counts.entry(url.to_string()).or_insert(0);
        let phase = if *count > 0 && !prior_known_empty {
            ScanPhase::Steady
        } else {
            ScanPhase::Baseline
        };
        *count += 1;
        phase
    }

    pub fn scan_count(&self, url: &str) -> u64 {
        self.counts.get(url).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
