//! Scheduled announcement record.

use chrono::{NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};

use crate::core::catalog::model::ReminderSpec;
use crate::core::clock;
use crate::core::fanout::Alert;

/// A reminder waiting to be sent before an event.
///
/// Serialized field-for-field into the store file; timestamps are local
/// ISO-8601 without an offset (`2024-01-01T12:00:00`). Loaded timestamps
/// are truncated to whole seconds like constructed ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredAnnouncement")]
pub struct ScheduledAnnouncement {
    /// Catalog event type; at most one pending announcement per type
    pub event_type: String,
    pub announcement_time: NaiveDateTime,
    pub event_time: NaiveDateTime,
    pub role_name: String,
    /// Contains `{role}` and `{timestamp}` placeholders
    pub message_template: String,
}

/// On-disk shape, before truncation
#[derive(Deserialize)]
struct StoredAnnouncement {
    event_type: String,
    announcement_time: NaiveDateTime,
    event_time: NaiveDateTime,
    role_name: String,
    message_template: String,
}

impl From<StoredAnnouncement> for ScheduledAnnouncement {
    fn from(stored: StoredAnnouncement) -> Self {
        Self::new(
            stored.event_type,
            stored.announcement_time,
            stored.event_time,
            stored.role_name,
            stored.message_template,
        )
    }
}

impl ScheduledAnnouncement {
    pub fn new(
        event_type: impl Into<String>,
        announcement_time: NaiveDateTime,
        event_time: NaiveDateTime,
        role_name: impl Into<String>,
        message_template: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            announcement_time: announcement_time.trunc_subsecs(0),
            event_time: event_time.trunc_subsecs(0),
            role_name: role_name.into(),
            message_template: message_template.into(),
        }
    }

    /// Reminder for an event triggered at `triggered_at`.
    pub fn from_reminder(spec: &ReminderSpec, role_name: &str, triggered_at: NaiveDateTime) -> Self {
        let event_time = triggered_at + spec.cycle;
        Self::new(
            spec.event_type,
            event_time - spec.lead,
            event_time,
            role_name,
            spec.template,
        )
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.announcement_time <= now
    }

    /// Fan-out alert; `{role}` is filled per group.
    pub fn to_alert(&self) -> Alert {
        Alert::new(self.role_name.clone(), self.message_template.clone()).with_var(
            "timestamp",
            clock::discord_timestamp(self.event_time, chrono::Duration::zero()),
        )
    }
}
