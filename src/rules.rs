//! Interestingness rules.
//!
//! Decides whether an event is worth keeping from its cause string, the
//! monitor it came from, the alarm state and the hour of day. Everything
//! here is pure so the rules can be tested without clocks or files.

use std::fmt;

use crate::alarm::AlarmState;
use crate::config::{RuleSet, RulesConfig};

const ALARM_KEYWORD: &str = "ALARM";
const DOOR_BELL_KEYWORD: &str = "DOOR BELL";
const MOTION_KEYWORD: &str = "Motion";
const PERSON_KEYWORD: &str = "detected:person";

/// The rule that decided an event's fate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// Cause mentions ALARM
    Alarm,
    /// Cause mentions DOOR BELL
    DoorBell,
    /// Cause is neither alarm, door bell nor motion
    UnknownCause,
    /// No person among the detected objects
    NoPerson,
    /// Person on the front monitor with `front_always_interesting` set
    PersonOnFront,
    /// Person while the alarm is armed
    PersonWhileArmed,
    /// Person inside the night window
    PersonAtNight,
    /// Person in daytime with the alarm disarmed
    PersonInDaytime,
}

impl Reason {
    /// True for the reasons that come out of person detection.
    pub fn is_person(&self) -> bool {
        matches!(
            self,
            Reason::PersonOnFront
                | Reason::PersonWhileArmed
                | Reason::PersonAtNight
                | Reason::PersonInDaytime
        )
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Reason::Alarm => "triggered by ALARM",
            Reason::DoorBell => "triggered by DOOR BELL",
            Reason::UnknownCause => "triggered by UNKNOWN cause",
            Reason::NoPerson => "NO person detected",
            Reason::PersonOnFront => "DETECTED person(s) on front",
            Reason::PersonWhileArmed => "DETECTED person(s), alarm is NOT inactive",
            Reason::PersonAtNight => "DETECTED person(s) AT night time",
            Reason::PersonInDaytime => "DETECTED person(s) NOT at night time",
        };
        f.write_str(text)
    }
}

/// Classification of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub interesting: bool,
    pub reason: Reason,
}

impl Verdict {
    fn keep(reason: Reason) -> Self {
        Self {
            interesting: true,
            reason,
        }
    }

    fn discard(reason: Reason) -> Self {
        Self {
            interesting: false,
            reason,
        }
    }

    /// The token printed on stdout for this verdict.
    pub fn label(&self) -> &'static str {
        if self.interesting {
            "INTERESTING"
        } else {
            "USELESS"
        }
    }
}

/// Everything the rules look at.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    pub cause: &'a str,
    pub monitor_id: &'a str,
    pub alarm: AlarmState,
    /// Local hour of day, 0-23
    pub hour: u32,
}

/// Returns true when `hour` falls in `[start, end)`.
///
/// The window wraps past midnight when `start > end` and is empty when
/// `start == end`.
pub fn is_night(hour: u32, start: u32, end: u32) -> bool {
    if start <= end {
        hour >= start && hour < end
    } else {
        hour >= start || hour < end
    }
}

/// Evaluates an event against the configured rule set.
pub fn evaluate(obs: &Observation<'_>, rules: &RulesConfig) -> Verdict {
    match rules.rule_set {
        RuleSet::Layered => evaluate_layered(obs, rules),
        RuleSet::PersonOnly => evaluate_person_only(obs, rules),
    }
}

fn evaluate_layered(obs: &Observation<'_>, rules: &RulesConfig) -> Verdict {
    if obs.cause.contains(ALARM_KEYWORD) {
        return Verdict::keep(Reason::Alarm);
    }
    if obs.cause.contains(DOOR_BELL_KEYWORD) {
        return Verdict {
            interesting: rules.door_bell_interesting,
            reason: Reason::DoorBell,
        };
    }
    if !obs.cause.contains(MOTION_KEYWORD) {
        return Verdict::keep(Reason::UnknownCause);
    }
    if !obs.cause.contains(PERSON_KEYWORD) {
        return Verdict::discard(Reason::NoPerson);
    }

    let on_front = obs.monitor_id == rules.front_monitor_id;
    if on_front && rules.front_always_interesting {
        return Verdict::keep(Reason::PersonOnFront);
    }
    // Anything but a disarmed alarm keeps back-side detections; the front
    // monitor still goes through the night check.
    if !obs.alarm.is_inactive() && !on_front {
        return Verdict::keep(Reason::PersonWhileArmed);
    }
    night_verdict(obs.hour, rules)
}

fn evaluate_person_only(obs: &Observation<'_>, rules: &RulesConfig) -> Verdict {
    if !obs.cause.contains(PERSON_KEYWORD) {
        return Verdict::discard(Reason::NoPerson);
    }
    // Only an explicit `1` counts as armed here.
    if obs.alarm.is_active() {
        return Verdict::keep(Reason::PersonWhileArmed);
    }
    night_verdict(obs.hour, rules)
}

fn night_verdict(hour: u32, rules: &RulesConfig) -> Verdict {
    if is_night(hour, rules.night_start_hour, rules.night_end_hour) {
        Verdict::keep(Reason::PersonAtNight)
    } else {
        Verdict::discard(Reason::PersonInDaytime)
    }
}
