//! zm-event-hook: ZoneMinder event-end hook.
//!
//! Called by zmeventnotification with the event details as positional
//! arguments. Prints `INTERESTING` or `USELESS`, sends a push notification
//! for people seen during the start pass, and deletes useless events
//! during the end pass.
//!
//! Usage: zm-event-hook [--config PATH] [--dry-run] HOOK_RESULT EVENT_ID
//!        MONITOR_ID MONITOR_NAME CAUSE CAUSE_JSON EVENT_PATH [END_PHASE]
//!
//! The process always exits 0 so ZoneMinder never treats the hook as failed.

use std::path::PathBuf;
use std::process;

use chrono::{Local, Timelike};
use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use zm_event_hook::{AlarmState, Config, Event, Hook, Phase, PushoverNotifier, ZmClient};

/// Env var holding the log filter, e.g. `debug` or `zm_event_hook=trace`.
const LOG_ENV: &str = "ZM_EVENT_HOOK_LOG";

/// Keeps interesting ZoneMinder events and deletes useless ones.
#[derive(Debug, Parser)]
#[command(
    name = "zm-event-hook",
    version,
    about,
    long_about = "\
ZoneMinder event-end hook.\n\n\
Classifies an event as INTERESTING or USELESS from its alarm cause, the\n\
monitor, the alarm state file and the time of day. Useless events are\n\
deleted through the ZoneMinder API in the end pass.\n\n\
Environment variables:\n  \
ZM_EVENT_HOOK_CONFIG       Config file (default /etc/zm/zm-event-hook.toml)\n  \
ZM_EVENT_HOOK_ALARM_STATE  Alarm state file override\n  \
ZM_EVENT_HOOK_LOG          Log filter (default info)"
)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Classify only; never notify or delete
    #[arg(long)]
    dry_run: bool,

    /// Result of the preceding hook (ignored)
    hook_result: String,

    event_id: String,

    monitor_id: String,

    monitor_name: String,

    /// Alarm cause, e.g. "Motion All detected:person:87%"
    #[arg(allow_hyphen_values = true)]
    cause: String,

    /// Alarm cause as JSON (ignored)
    #[arg(allow_hyphen_values = true)]
    cause_json: String,

    /// Event directory, passed when hook_pass_image_path is enabled
    event_path: String,

    /// 1 for the end pass, 0 for the start pass
    #[arg(default_value = "1")]
    end_phase: Phase,

    /// Further arguments from newer zmeventnotification releases (ignored)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    extra: Vec<String>,
}

impl Cli {
    fn into_event(self) -> Event {
        if !self.extra.is_empty() {
            tracing::debug!(extra = ?self.extra, "Ignoring extra arguments");
        }
        let event_path = if self.event_path.is_empty() {
            None
        } else {
            Some(PathBuf::from(self.event_path))
        };
        Event {
            hook_result: self.hook_result,
            id: self.event_id,
            monitor_id: self.monitor_id,
            monitor_name: self.monitor_name,
            cause: self.cause,
            cause_json: self.cause_json,
            event_path,
            phase: self.end_phase,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = e.print();
                }
                _ => tracing::error!("Invalid arguments: {}", e),
            }
            // Exit 0 to not block ZoneMinder
            process::exit(0);
        }
    };

    let config = Config::load(cli.config.as_deref());
    let dry_run = cli.dry_run;
    let event = cli.into_event();

    let span = tracing::info_span!("zmes_cleanup", monitor = %event.monitor_id);
    let _guard = span.enter();
    tracing::debug!(
        event = %event.id,
        monitor_name = %event.monitor_name,
        phase = %event.phase,
        cause = %event.cause,
        "Hook invoked"
    );

    if event.phase == Phase::Unknown {
        tracing::warn!(
            event = %event.id,
            "Unexpected end phase flag, classifying without notifying or deleting"
        );
    }

    let alarm = AlarmState::read_or_unknown(&config.state.alarm_state_file);
    let hour = Local::now().hour();

    let notifier = match PushoverNotifier::new(&config.notify) {
        Ok(notifier) => Some(notifier),
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Notifications unavailable");
            None
        }
    };

    let mut hook = Hook::new(&config).dry_run(dry_run);
    if let Some(notifier) = &notifier {
        hook = hook.with_notifier(notifier);
    }

    let outcome = hook.handle(&event, alarm, hour, || ZmClient::new(&config.api));
    println!("{}", outcome.verdict.label());
    tracing::debug!(?outcome, "Hook finished");
}
