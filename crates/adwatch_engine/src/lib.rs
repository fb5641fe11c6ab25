//! Adwatch engine: page fetching, ad extraction, notification delivery,
//! durable state and the background poller.
mod decode;
mod extract;
mod fetch;
mod notify;
mod persist;
mod poller;
mod scanner;
mod store;
mod types;

pub use decode::decode_page;
pub use extract::{AdExtractor, ListingExtractor};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, DEFAULT_USER_AGENT};
pub use notify::{
    Notification, Notifier, NotifyError, NtfyNotifier, NtfySettings, DEFAULT_NTFY_SERVER,
};
pub use persist::{ensure_parent_dir, set_aside, write_atomically, PersistError};
pub use poller::{Poller, PollerHandle, PollerSettings};
pub use scanner::PageScanner;
pub use store::{StateStore, StoreError, DEFAULT_STATE_FILE};
pub use types::{CycleReport, FailureKind, FetchError, FetchMetadata, FetchOutput};
