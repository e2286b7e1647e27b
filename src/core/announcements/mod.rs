// Announcements: reminders scheduled ahead of in-game events.
//
// Architecture:
// - model.rs: ScheduledAnnouncement record
// - store.rs: JSON file persistence
// - scheduler.rs: Pending set, due-check ticker and fan-out of fired entries

pub mod model;
pub mod scheduler;
pub mod store;

pub use model::ScheduledAnnouncement;
pub use scheduler::{AnnouncementScheduler, CheckReport, SchedulerHandle};
pub use store::{AnnouncementStore, StoreError};
