//! Adwatch core: pure watch state, control commands and scan bookkeeping.
mod command;
mod diff;
mod effect;
mod error;
mod ledger;
mod state;
mod update;
mod view_model;

pub use command::{Command, SettingsUpdate};
pub use diff::{classify, Entry, PageListing, ScanOutcome};
pub use effect::Effect;
pub use error::CommandError;
pub use ledger::{ScanLedger, ScanPhase};
pub use state::{
    KnownIds, Settings, WatchState, DEFAULT_CHANNEL, DEFAULT_REFRESH_SECONDS,
    MIN_REFRESH_SECONDS,
};
pub use update::update;
pub use view_model::{TargetRow, WatchView};
