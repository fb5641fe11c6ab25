//! Line-based control menu over the shared [`StateStore`].

use std::io::{self, BufRead, Write};

use adwatch_core::{Command, CommandError, Effect, SettingsUpdate, MIN_REFRESH_SECONDS};
use adwatch_engine::{StateStore, StoreError};

const MENU: &str = "\n--- adwatch ---\n\
1) List tracked URLs\n\
2) Add URL\n\
3) Remove URL\n\
4) Toggle notifications\n\
5) Change notification channel\n\
6) Change refresh interval\n\
7) Quit\n";

enum Flow {
    Continue,
    Exit,
}

/// Run the menu until the user quits or input ends. Returns the effects of
/// the final stop command for the caller to carry out.
pub fn run_menu<R: BufRead, W: Write>(
    store: &StateStore,
    input: R,
    output: W,
) -> io::Result<Vec<Effect>> {
    let mut menu = Menu {
        store,
        input,
        output,
    };
    loop {
        write!(menu.output, "{MENU}")?;
        let Some(choice) = menu.prompt("Option: ")? else {
            return menu.quit();
        };
        let flow = match choice.as_str() {
            "1" => menu.list_targets(),
            "2" => menu.add_target(),
            "3" => menu.remove_target(),
            "4" => menu.toggle_notifications(),
            "5" => menu.change_channel(),
            "6" => menu.change_interval(),
            "7" => return menu.quit(),
            _ => {
                writeln!(menu.output, "Unknown option.")?;
                Ok(Flow::Continue)
            }
        }?;
        if let Flow::Exit = flow {
            return menu.quit();
        }
    }
}

struct Menu<'a, R, W> {
    store: &'a StateStore,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Menu<'_, R, W> {
    /// Print `label` and read one trimmed line. `None` means end of input.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn list_targets(&mut self) -> io::Result<Flow> {
        let view = self.store.view();
        if view.targets.is_empty() {
            writeln!(self.output, "No URLs tracked.")?;
        }
        for row in &view.targets {
            writeln!(
                self.output,
                " {}) {}   ({} IDs known)",
                row.position, row.url, row.known_count
            )?;
        }
        let settings = &view.settings;
        writeln!(
            self.output,
            "Notifications {} on channel '{}', refresh every {} s",
            on_off(settings.notifications_enabled),
            settings.channel,
            settings.refresh_seconds
        )?;
        Ok(Flow::Continue)
    }

    fn add_target(&mut self) -> io::Result<Flow> {
        let Some(url) = self.prompt("New URL: ")? else {
            return Ok(Flow::Exit);
        };
        match self.store.add_target(&url) {
            Ok(()) => writeln!(self.output, "Added.")?,
            Err(err) => self.report(err)?,
        }
        Ok(Flow::Continue)
    }

    fn remove_target(&mut self) -> io::Result<Flow> {
        for row in self.store.view().targets {
            writeln!(self.output, " {}) {}", row.position, row.url)?;
        }
        let Some(raw) = self.prompt("Index to remove: ")? else {
            return Ok(Flow::Exit);
        };
        let index = match raw.parse::<usize>() {
            Ok(position) if position > 0 => position - 1,
            _ => {
                writeln!(self.output, "Invalid selection.")?;
                return Ok(Flow::Continue);
            }
        };
        match self.store.remove_target(index) {
            Ok(()) => writeln!(self.output, "Removed.")?,
            Err(StoreError::Command(CommandError::InvalidIndex { .. })) => {
                writeln!(self.output, "Invalid selection.")?
            }
            Err(err) => self.report(err)?,
        }
        Ok(Flow::Continue)
    }

    fn toggle_notifications(&mut self) -> io::Result<Flow> {
        match self.store.toggle_notifications() {
            Ok(enabled) => writeln!(self.output, "Notifications are now {}.", on_off(enabled))?,
            Err(err) => self.report(err)?,
        }
        Ok(Flow::Continue)
    }

    fn change_channel(&mut self) -> io::Result<Flow> {
        let Some(channel) = self.prompt("New channel: ")? else {
            return Ok(Flow::Exit);
        };
        match self.store.update_settings(SettingsUpdate::channel(channel.as_str())) {
            Ok(()) => writeln!(self.output, "Channel set to '{channel}'.")?,
            Err(err) => self.report(err)?,
        }
        Ok(Flow::Continue)
    }

    fn change_interval(&mut self) -> io::Result<Flow> {
        let label = format!("Seconds (>= {MIN_REFRESH_SECONDS}): ");
        let Some(raw) = self.prompt(&label)? else {
            return Ok(Flow::Exit);
        };
        let Ok(seconds) = raw.parse::<u64>() else {
            writeln!(self.output, "Invalid number.")?;
            return Ok(Flow::Continue);
        };
        match self
            .store
            .update_settings(SettingsUpdate::refresh_seconds(seconds))
        {
            Ok(()) => writeln!(
                self.output,
                "Refresh interval set to {seconds} s; applies from the next cycle."
            )?,
            Err(err) => self.report(err)?,
        }
        Ok(Flow::Continue)
    }

    fn quit(&mut self) -> io::Result<Vec<Effect>> {
        let effects = match self.store.dispatch(Command::Stop) {
            Ok(effects) => effects,
            Err(err) => {
                self.report(err)?;
                vec![Effect::StopPoller]
            }
        };
        writeln!(self.output, "Stopping ...")?;
        self.output.flush()?;
        Ok(effects)
    }

    fn report(&mut self, err: StoreError) -> io::Result<()> {
        match err {
            StoreError::Command(err) => writeln!(self.output, "Rejected: {err}."),
            StoreError::Persist(err) => writeln!(self.output, "Warning: {err}"),
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "ON"
    } else {
        "OFF"
    }
}
