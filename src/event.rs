//! Event data model for zm-event-hook.
//!
//! An `Event` is built once per invocation from the positional arguments
//! zmeventnotification passes to its hooks.

use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which pass of the hook this invocation belongs to.
///
/// zmeventnotification runs the hook once while the event is recording
/// (start) and once after it closed (end). The end pass is the default.
/// Any other flag value still gets the event classified, but neither
/// notifies nor deletes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    Start,
    #[default]
    End,
    Unknown,
}

impl Phase {
    /// Maps the "in end phase" flag: `"1"` is end, `"0"` is start.
    pub fn from_end_flag(flag: &str) -> Phase {
        match flag.trim() {
            "1" => Phase::End,
            "0" => Phase::Start,
            _ => Phase::Unknown,
        }
    }

    pub fn is_start(&self) -> bool {
        *self == Phase::Start
    }

    pub fn is_end(&self) -> bool {
        *self == Phase::End
    }
}

impl FromStr for Phase {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Phase::from_end_flag(s))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Start => write!(f, "start"),
            Phase::End => write!(f, "end"),
            Phase::Unknown => write!(f, "unknown"),
        }
    }
}

/// A detected recording clip handed to the hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Result code of the preceding hook; always "0" in practice
    pub hook_result: String,
    pub id: String,
    pub monitor_id: String,
    pub monitor_name: String,
    /// Free-text cause, e.g. "Motion All detected:person:87%"
    pub cause: String,
    /// Only passed for symmetry with zmeventnotification, usually empty
    pub cause_json: String,
    /// Event directory on disk, when `hook_pass_image_path` is enabled
    pub event_path: Option<PathBuf>,
    pub phase: Phase,
}

impl Event {
    pub fn new(id: impl Into<String>, monitor_id: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            hook_result: "0".to_string(),
            id: id.into(),
            monitor_id: monitor_id.into(),
            monitor_name: String::new(),
            cause: cause.into(),
            cause_json: String::new(),
            event_path: None,
            phase: Phase::End,
        }
    }

    /// Path of the snapshot image inside the event directory, if known.
    pub fn snapshot_path(&self, file_name: &str) -> Option<PathBuf> {
        self.event_path.as_deref().map(|dir| dir.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_from_end_flag() {
        assert_eq!(Phase::from_end_flag("1"), Phase::End);
        assert_eq!(Phase::from_end_flag("0"), Phase::Start);
        assert_eq!(Phase::from_end_flag(" 1\n"), Phase::End);
        assert_eq!(Phase::from_end_flag("2"), Phase::Unknown);
        assert_eq!(Phase::from_end_flag(""), Phase::Unknown);
    }

    #[test]
    fn test_phase_from_str() {
        assert_eq!("0".parse::<Phase>().unwrap(), Phase::Start);
        assert_eq!("1".parse::<Phase>().unwrap(), Phase::End);
        assert_eq!("yes".parse::<Phase>().unwrap(), Phase::Unknown);
    }

    #[test]
    fn test_phase_default_is_end() {
        assert_eq!(Phase::default(), Phase::End);
        assert!(Phase::End.is_end());
        assert!(Phase::Start.is_start());
        assert!(!Phase::Unknown.is_start());
        assert!(!Phase::Unknown.is_end());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Start.to_string(), "start");
        assert_eq!(Phase::End.to_string(), "end");
        assert_eq!(Phase::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_snapshot_path() {
        let mut event = Event::new("42", "8", "Motion");
        assert_eq!(event.snapshot_path("objdetect.jpg"), None);

        event.event_path = Some(PathBuf::from("/var/cache/zoneminder/events/8/42"));
        assert_eq!(
            event.snapshot_path("objdetect.jpg"),
            Some(PathBuf::from("/var/cache/zoneminder/events/8/42/objdetect.jpg"))
        );
    }
}
