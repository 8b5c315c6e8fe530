//! Event-end hook handling.
//!
//! Ties the pieces together: classify the event, notify during the start
//! pass, and delete useless events during the end pass. Nothing in here
//! returns an error; failures are logged and reported in the `Outcome`.

use crate::alarm::AlarmState;
use crate::config::Config;
use crate::event::Event;
use crate::notify::{Notice, Notifier};
use crate::rules::{self, Observation, Verdict};
use crate::zm::EventStore;

/// What happened to the event on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deletion {
    /// Event kept, or not the end pass
    NotRequested,
    /// Useless, but running with `--dry-run`
    Skipped,
    Deleted,
    Failed(String),
}

/// Result of handling one hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub verdict: Verdict,
    pub notified: bool,
    pub deletion: Deletion,
}

/// Runs the hook for one event.
///
/// The event store is opened through the `connect` closure given to
/// `handle`, so no API connection is made unless an event is deleted.
pub struct Hook<'a> {
    config: &'a Config,
    notifier: Option<&'a dyn Notifier>,
    dry_run: bool,
}

impl<'a> Hook<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            notifier: None,
            dry_run: false,
        }
    }

    pub fn with_notifier(mut self, notifier: &'a dyn Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Classifies the event without side effects.
    pub fn classify(&self, event: &Event, alarm: AlarmState, hour: u32) -> Verdict {
        let obs = Observation {
            cause: &event.cause,
            monitor_id: &event.monitor_id,
            alarm,
            hour,
        };
        let verdict = rules::evaluate(&obs, &self.config.rules);
        tracing::info!(
            event = %event.id,
            interesting = verdict.interesting,
            "Event {}: {}",
            event.id,
            verdict.reason
        );
        verdict
    }

    /// Builds the push message for a person detection on this event.
    pub fn notice_for(&self, event: &Event) -> Notice {
        let notify = &self.config.notify;
        let message = if event.monitor_id == self.config.rules.front_monitor_id {
            notify.front_message.clone()
        } else {
            notify.back_message.clone()
        };
        let attachment = event
            .snapshot_path(&notify.snapshot_file)
            .filter(|path| {
                let exists = path.exists();
                if !exists {
                    tracing::warn!(path = %path.display(), "Snapshot missing, sending without image");
                }
                exists
            });
        Notice {
            title: notify.title.clone(),
            message,
            priority: notify.priority,
            attachment,
        }
    }

    fn should_notify(&self, event: &Event, verdict: &Verdict) -> bool {
        verdict.interesting
            && verdict.reason.is_person()
            && event.phase.is_start()
            && self.config.notify.enabled
    }

    fn notify(&self, event: &Event) -> bool {
        let Some(notifier) = self.notifier else {
            tracing::debug!("No notifier configured");
            return false;
        };
        if self.dry_run {
            tracing::info!(event = %event.id, "Dry run, not sending notification");
            return false;
        }
        let notice = self.notice_for(event);
        match notifier.notify(&notice) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(event = %event.id, error = %format!("{:#}", e), "Failed to notify");
                false
            }
        }
    }

    fn delete<S, F>(&self, event: &Event, connect: F) -> Deletion
    where
        S: EventStore,
        F: FnOnce() -> Result<S, crate::zm::ApiError>,
    {
        if self.dry_run {
            tracing::info!(event = %event.id, "Dry run, not deleting event");
            return Deletion::Skipped;
        }

        tracing::info!(event = %event.id, "Deleting event {}", event.id);
        let result = connect().and_then(|store| store.delete_event(&event.id));
        match result {
            Ok(()) => Deletion::Deleted,
            Err(e) if e.is_benign() => {
                tracing::debug!(event = %event.id, "Ignoring {} reply to delete", e);
                Deletion::Deleted
            }
            Err(e) => {
                tracing::error!(event = %event.id, error = %e, "Error during deletion");
                Deletion::Failed(e.to_string())
            }
        }
    }

    /// Handles the event: classify, maybe notify, maybe delete.
    pub fn handle<S, F>(&self, event: &Event, alarm: AlarmState, hour: u32, connect: F) -> Outcome
    where
        S: EventStore,
        F: FnOnce() -> Result<S, crate::zm::ApiError>,
    {
        let verdict = self.classify(event, alarm, hour);

        let notified = self.should_notify(event, &verdict) && self.notify(event);

        let deletion = if !verdict.interesting && event.phase.is_end() {
            self.delete(event, connect)
        } else {
            Deletion::NotRequested
        };

        Outcome {
            verdict,
            notified,
            deletion,
        }
    }
}
