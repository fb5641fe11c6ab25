use crate::Settings;

/// Consistent snapshot used by the menu listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchView {
    pub targets: Vec<TargetRow>,
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRow {
    /// One-based position as shown to the user.
    pub position: usize,
    pub url: String,
    pub known_count: usize,
}
