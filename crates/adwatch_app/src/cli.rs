use std::path::PathBuf;

use adwatch_engine::{DEFAULT_NTFY_SERVER, DEFAULT_STATE_FILE};
use clap::Parser;
use log::LevelFilter;

use crate::logging::LogDestination;

/// Watch marketplace search pages and push new ads to ntfy.
#[derive(Debug, Parser)]
#[command(name = "adwatch", version, about)]
pub struct Args {
    /// JSON file holding tracked URLs, settings and known ad IDs
    #[arg(long, default_value = DEFAULT_STATE_FILE)]
    pub state: PathBuf,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    pub log: LogDestination,

    /// Most verbose level to log (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", value_parser = parse_level)]
    pub log_level: LevelFilter,

    /// ntfy server that notifications are published to
    #[arg(long, default_value = DEFAULT_NTFY_SERVER)]
    pub ntfy_server: String,

    /// Seconds to wait for the poller to finish its current step on exit
    #[arg(long, default_value_t = 2)]
    pub stop_grace_secs: u64,
}

fn parse_level(raw: &str) -> Result<LevelFilter, String> {
    raw.parse()
        .map_err(|_| format!("unknown log level '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_without_options() {
        let args = Args::parse_from(["adwatch"]);
        assert_eq!(args.state, PathBuf::from("config.json"));
        assert_eq!(args.log, LogDestination::Terminal);
        assert_eq!(args.log_level, LevelFilter::Info);
        assert_eq!(args.ntfy_server, "https://ntfy.sh");
        assert_eq!(args.stop_grace_secs, 2);
    }

    #[test]
    fn options_override_defaults() {
        let args = Args::parse_from([
            "adwatch",
            "--state",
            "/tmp/watch.json",
            "--log",
            "both",
            "--log-level",
            "debug",
            "--ntfy-server",
            "http://localhost:8080",
        ]);
        assert_eq!(args.state, PathBuf::from("/tmp/watch.json"));
        assert_eq!(args.log, LogDestination::Both);
        assert_eq!(args.log_level, LevelFilter::Debug);
        assert_eq!(args.ntfy_server, "http://localhost:8080");
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        assert!(Args::try_parse_from(["adwatch", "--log-level", "loud"]).is_err());
    }
}
