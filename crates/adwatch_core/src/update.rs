use url::Url;

use crate::{Command, CommandError, Effect, SettingsUpdate, WatchState, MIN_REFRESH_SECONDS};

/// Applies a control command to state and returns any effects.
///
/// Validation happens before mutation, so an `Err` leaves `state` untouched.
pub fn update(state: &mut WatchState, command: Command) -> Result<Vec<Effect>, CommandError> {
    let effects = match command {
        Command::AddTarget(raw) => {
            let url = raw.trim();
            if url.is_empty() {
                return Err(CommandError::EmptyUrl);
            }
            validate_url(url)?;
            if state.is_tracked(url) {
                return Err(CommandError::AlreadyTracked(url.to_string()));
            }
            state.push_target(url.to_string());
            vec![Effect::Persist]
        }
        Command::RemoveTarget(index) => {
            let len = state.targets().len();
            if index >= len {
                return Err(CommandError::InvalidIndex { index, len });
            }
            state.remove_target_at(index);
            vec![Effect::Persist]
        }
        Command::ToggleNotifications => {
            let settings = state.settings_mut();
            settings.notifications_enabled = !settings.notifications_enabled;
            vec![Effect::Persist]
        }
        Command::UpdateSettings(change) => {
            let change = validate_settings(change)?;
            if apply_settings(state, change) {
                vec![Effect::Persist]
            } else {
                Vec::new()
            }
        }
        Command::Stop => vec![Effect::StopPoller],
    };

    Ok(effects)
}

fn validate_url(url: &str) -> Result<(), CommandError> {
    let parsed =
        Url::parse(url).map_err(|err| CommandError::InvalidValue(format!("{url}: {err}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(CommandError::InvalidValue(format!(
            "unsupported url scheme {other}"
        ))),
    }
}

fn validate_settings(mut change: SettingsUpdate) -> Result<SettingsUpdate, CommandError> {
    if let Some(seconds) = change.refresh_seconds {
        if seconds < MIN_REFRESH_SECONDS {
            return Err(CommandError::InvalidValue(format!(
                "refresh interval must be at least {MIN_REFRESH_SECONDS} seconds, got {seconds}"
            )));
        }
    }
    if let Some(channel) = change.channel.take() {
        let channel = channel.trim();
        if channel.is_empty() {
            return Err(CommandError::InvalidValue(
                "notification channel must not be empty".to_string(),
            ));
        }
        change.channel = Some(channel.to_string());
    }
    Ok(change)
}

fn apply_settings(state: &mut WatchState, change: SettingsUpdate) -> bool {
    let settings = state.settings_mut();
    let before = settings.clone();
    if let Some(seconds) = change.refresh_seconds {
        settings.refresh_seconds = seconds;
    }
    if let Some(enabled) = change.notifications_enabled {
        settings.notifications_enabled = enabled;
    }
    if let Some(channel) = change.channel {
        settings.channel = channel;
    }
    *settings != before
}
