use std::io;
use std::sync::Arc;
use std::time::Duration;

use adwatch_core::Effect;
use adwatch_engine::{
    FetchSettings, ListingExtractor, NtfyNotifier, NtfySettings, PageScanner, Poller,
    PollerHandle, PollerSettings, ReqwestFetcher, StateStore,
};
use anyhow::Context;
use engine_logging::{engine_info, engine_warn};

use crate::cli::Args;
use crate::menu::run_menu;

/// Load state, start the poller in the background and hand the terminal to
/// the menu until the user quits.
pub fn run(args: &Args) -> anyhow::Result<()> {
    let store = Arc::new(StateStore::load(&args.state));
    store
        .save()
        .with_context(|| format!("cannot write state file {}", args.state.display()))?;

    let fetcher = ReqwestFetcher::new(FetchSettings::default())?;
    let notifier = NtfyNotifier::new(NtfySettings {
        server: args.ntfy_server.clone(),
        ..NtfySettings::default()
    })?;
    let scanner = PageScanner::new(Arc::new(fetcher), Arc::new(ListingExtractor::new()));
    let poller = Poller::new(
        store.clone(),
        scanner,
        Arc::new(notifier),
        PollerSettings::default(),
    );
    let handle = PollerHandle::spawn(poller).context("failed to start poller thread")?;
    engine_info!(
        "Watching {} urls; state in {:?}",
        store.targets().len(),
        store.path()
    );

    let menu_result = run_menu(&store, io::stdin().lock(), io::stdout().lock());

    // A broken terminal ends the menu too; the poller must not outlive it.
    let effects = match &menu_result {
        Ok(effects) => effects.clone(),
        Err(_) => vec![Effect::StopPoller],
    };
    apply_exit_effects(&effects, handle, Duration::from_secs(args.stop_grace_secs));

    menu_result.context("menu input/output failed")?;
    Ok(())
}

fn apply_exit_effects(effects: &[Effect], handle: PollerHandle, grace: Duration) {
    if effects.contains(&Effect::StopPoller) && !handle.stop(grace) {
        engine_warn!("Exiting while a scan is still in flight");
    }
}
