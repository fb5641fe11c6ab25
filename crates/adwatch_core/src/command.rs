#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start tracking a search-result URL.
    AddTarget(String),
    /// Stop tracking the target at a zero-based position.
    RemoveTarget(usize),
    /// Flip the notification-enabled flag.
    ToggleNotifications,
    /// Change one or more settings; all fields are validated before any is applied.
    UpdateSettings(SettingsUpdate),
    /// User asked to stop polling and exit.
    Stop,
}

/// Partial settings change. `None` leaves the current value untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsUpdate {
    pub refresh_seconds: Option<u64>,
    pub notifications_enabled: Option<bool>,
    pub channel: Option<String>,
}

impl SettingsUpdate {
    pub fn refresh_seconds(seconds: u64) -> Self {
        Self {
            refresh_seconds: Some(seconds),
            ..Self::default()
        }
    }

    pub fn channel(channel: impl Into<String>) -> Self {
        Self {
            channel: Some(channel.into()),
            ..Self::default()
        }
    }

    pub fn notifications_enabled(enabled: bool) -> Self {
        Self {
            notifications_enabled: Some(enabled),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.refresh_seconds.is_none()
            && self.notifications_enabled.is_none()
            && self.channel.is_none()
    }
}
