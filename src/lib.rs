pub mod alarm;
pub mod config;
pub mod event;
pub mod hook;
pub mod notify;
pub mod rules;
pub mod zm;

pub use alarm::AlarmState;
pub use config::{Config, RuleSet, RulesConfig};
pub use event::{Event, Phase};
pub use hook::{Deletion, Hook, Outcome};
pub use notify::{Notice, Notifier, PushoverNotifier};
pub use rules::{evaluate, Observation, Reason, Verdict};
pub use zm::{ApiError, EventStore, ZmClient};
