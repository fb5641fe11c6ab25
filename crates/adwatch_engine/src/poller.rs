use std::io;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use adwatch_core::{Entry, ScanLedger, ScanOutcome};
use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use tokio_util::sync::CancellationToken;

use crate::notify::{Notification, Notifier};
use crate::scanner::PageScanner;
use crate::store::StateStore;
use crate::CycleReport;

#[derive(Debug, Clone)]
pub struct PollerSettings {
    /// Pause between two consecutive URLs of one cycle.
    pub url_delay: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            url_delay: Duration::from_secs(2),
        }
    }
}

/// Background scan loop over every tracked target.
///
/// The first scan of a URL after start, and any scan of a URL with no known
/// IDs, only records what it sees. Later scans notify for each ad that was
/// not known before.
pub struct Poller {
    store: Arc<StateStore>,
    scanner: PageScanner,
    notifier: Arc<dyn Notifier>,
    ledger: ScanLedger,
    settings: PollerSettings,
    cycles: u64,
}

impl Poller {
    pub fn new(
        store: Arc<StateStore>,
        scanner: PageScanner,
        notifier: Arc<dyn Notifier>,
        settings: PollerSettings,
    ) -> Self {
        Self {
            store,
            scanner,
            notifier,
            ledger: ScanLedger::new(),
            settings,
            cycles: 0,
        }
    }

    pub fn ledger(&self) -> &ScanLedger {
        &self.ledger
    }

    /// Scan every tracked target once, in list order.
    ///
    /// `cancel` is checked before each URL; a cancelled cycle ends early.
    pub async fn run_cycle(&mut self, cancel: &CancellationToken) -> CycleReport {
        self.cycles += 1;
        engine_logging::set_cycle(self.cycles);

        let targets = self.store.targets();
        self.ledger.reconcile(&targets);

        let mut report = CycleReport::default();
        for (index, url) in targets.iter().enumerate() {
            if cancel.is_cancelled() {
                engine_info!("Stop requested; ending cycle early");
                break;
            }
            let Some(prior) = self.store.known_ids(url) else {
                engine_debug!("[{}] removed during cycle; skipping", url);
                continue;
            };

            let phase = self.ledger.begin_scan(url, prior.is_empty());
            report.scanned += 1;
            let outcome = match self.scanner.scan(url, &prior).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    engine_warn!("[{}] fetch failed: {}", url, err);
                    report.failed += 1;
                    ScanOutcome::unchanged(&prior)
                }
            };

            report.new_entries += outcome.new_entries.len();
            if !outcome.new_entries.is_empty() {
                if phase.notify_eligible() {
                    report.notified += self.deliver(url, &outcome.new_entries).await;
                } else {
                    engine_info!(
                        "[{}] baseline scan: recorded {} ads without notifying",
                        url,
                        outcome.new_entries.len()
                    );
                }
            }

            if outcome.known_ids != prior {
                if let Err(err) = self.store.record_scan(url, &outcome.known_ids) {
                    engine_error!("[{}] could not persist known ids: {}", url, err);
                }
            }

            if index + 1 < targets.len() && !pause(self.settings.url_delay, cancel).await {
                break;
            }
        }

        engine_info!(
            "Cycle done: {} scanned, {} failed, {} new, {} notified",
            report.scanned,
            report.failed,
            report.new_entries,
            report.notified
        );
        engine_logging::set_cycle(0);
        report
    }

    /// Repeat cycles until cancelled, sleeping the live refresh interval in between.
    pub async fn run(mut self, cancel: CancellationToken) {
        engine_info!("Poller started");
        while !cancel.is_cancelled() {
            self.run_cycle(&cancel).await;
            let refresh = Duration::from_secs(self.store.settings().refresh_seconds);
            if !pause(refresh, &cancel).await {
                break;
            }
        }
        engine_info!("Poller stopped after {} cycles", self.cycles);
    }

    /// Send one notification per entry in order. Returns how many were delivered.
    async fn deliver(&self, url: &str, entries: &[Entry]) -> usize {
        let settings = self.store.settings();
        if !settings.notifications_enabled {
            engine_info!(
                "[{}] notifications are off; {} new ads not sent",
                url,
                entries.len()
            );
            return 0;
        }

        let mut delivered = 0;
        for entry in entries {
            match self
                .notifier
                .notify(&settings.channel, &Notification::from(entry))
                .await
            {
                Ok(()) => delivered += 1,
                Err(err) => {
                    engine_warn!("[{}] notification for ad {} failed: {}", url, entry.id, err)
                }
            }
        }
        delivered
    }
}

/// Sleep for `duration` unless cancelled first. Returns `false` on cancel.
async fn pause(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// Owner of the poller thread.
pub struct PollerHandle {
    cancel: CancellationToken,
    done_rx: mpsc::Receiver<()>,
    thread: JoinHandle<()>,
}

impl PollerHandle {
    /// Run `poller` on its own thread with a single-threaded tokio runtime.
    pub fn spawn(poller: Poller) -> io::Result<Self> {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let (done_tx, done_rx) = mpsc::channel();

        let thread = thread::Builder::new()
            .name("adwatch-poller".to_string())
            .spawn(move || {
                match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime.block_on(poller.run(token)),
                    Err(err) => engine_error!("Failed to start poller runtime: {}", err),
                }
                let _ = done_tx.send(());
            })?;

        Ok(Self {
            cancel,
            done_rx,
            thread,
        })
    }

    /// Ask the poller to stop and wait at most `grace` for it.
    ///
    /// An in-flight fetch is not interrupted; if it outlasts `grace` the
    /// thread is left to wind down on its own and `false` is returned.
    pub fn stop(self, grace: Duration) -> bool {
        self.cancel.cancel();
        match self.done_rx.recv_timeout(grace) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let _ = self.thread.join();
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                engine_warn!("Poller still busy after {:?}; not waiting any longer", grace);
                false
            }
        }
    }
}
