//! Durable reminder scheduler.
//!
//! Pending announcements and their store sit behind one async mutex so every
//! mutation is followed by a full snapshot write before the lock is released.
//! Fired and discarded entries are persisted as gone *before* anything is
//! sent, so a crash mid-delivery can lose a reminder but never repeat one.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::model::ScheduledAnnouncement;
use super::store::AnnouncementStore;
use crate::core::clock;
use crate::core::fanout::{self, AlertRoute, FanOutReport};
use crate::core::platform::ChatPlatform;

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

struct Pending {
    entries: Vec<ScheduledAnnouncement>,
    store: AnnouncementStore,
}

impl Pending {
    /// Snapshot to disk on the blocking pool. Callers hold the lock
    /// throughout, so writes never interleave.
    async fn persist(&self) {
        let store = self.store.clone();
        let entries = self.entries.clone();
        match tokio::task::spawn_blocking(move || store.save(&entries)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::error!("Error saving announcements: {}", e),
            Err(e) => log::error!("Announcement save task failed: {}", e),
        }
    }
}

/// Result of one due-check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub fired: usize,
    pub discarded: usize,
    pub delivery: FanOutReport,
}

pub struct AnnouncementScheduler<P: ChatPlatform> {
    platform: Arc<P>,
    route: AlertRoute,
    interval: Duration,
    pending: Mutex<Pending>,
}

impl<P: ChatPlatform> AnnouncementScheduler<P> {
    /// Build a scheduler, restoring whatever the store still holds.
    pub fn new(platform: Arc<P>, route: AlertRoute, store: AnnouncementStore) -> Self {
        let entries = store.load();
        Self {
            platform,
            route,
            interval: DEFAULT_CHECK_INTERVAL,
            pending: Mutex::new(Pending { entries, store }),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Add `announcement`, replacing any pending one of the same event type.
    pub async fn schedule(&self, announcement: ScheduledAnnouncement) {
        let mut pending = self.pending.lock().await;
        pending
            .entries
            .retain(|a| a.event_type != announcement.event_type);
        log::info!(
            "Scheduled {} announcement for {} (event at {})",
            announcement.event_type,
            announcement.announcement_time,
            announcement.event_time
        );
        pending.entries.push(announcement);
        pending.persist().await;
    }

    /// Drop pending announcements of `event_type`. Returns how many were removed.
    pub async fn cancel(&self, event_type: &str) -> usize {
        let mut pending = self.pending.lock().await;
        let before = pending.entries.len();
        pending.entries.retain(|a| a.event_type != event_type);
        let removed = before - pending.entries.len();
        if removed > 0 {
            log::info!("Cancelled {} announcement", event_type);
        }
        pending.persist().await;
        removed
    }

    /// Snapshot of the pending list
    pub async fn pending(&self) -> Vec<ScheduledAnnouncement> {
        self.pending.lock().await.entries.clone()
    }

    pub async fn check_due(&self) -> CheckReport {
        self.check_due_at(clock::now()).await
    }

    /// Fire everything due at `now`.
    pub async fn check_due_at(&self, now: NaiveDateTime) -> CheckReport {
        let (due, discarded) = {
            let mut pending = self.pending.lock().await;
            let (due, mut rest): (Vec<_>, Vec<_>) =
                pending.entries.drain(..).partition(|a| a.is_due(now));

            let before = rest.len();
            rest.retain(|a| {
                let stale = a.announcement_time < now;
                if stale {
                    log::warn!("Discarding stale {} announcement", a.event_type);
                }
                !stale
            });
            let discarded = before - rest.len();

            pending.entries = rest;
            if !due.is_empty() || discarded > 0 {
                pending.persist().await;
            }
            (due, discarded)
        };

        let mut report = CheckReport {
            fired: due.len(),
            discarded,
            ..CheckReport::default()
        };
        if due.is_empty() {
            return report;
        }

        for announcement in &due {
            log::info!("Sending {} announcement", announcement.event_type);
        }
        let alerts = due.iter().map(ScheduledAnnouncement::to_alert).collect();
        let groups = self.platform.destination_groups().await;
        report.delivery = fanout::fan_out(&self.platform, &self.route, groups, alerts).await;
        report
    }

    /// Spawn the periodic due-check. It waits for platform readiness first.
    pub fn start(self: &Arc<Self>) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let scheduler = Arc::clone(self);

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = scheduler.platform.wait_until_ready() => {}
                _ = stop_rx.changed() => return,
            }
            log::info!(
                "Announcement checks running every {}s",
                scheduler.interval.as_secs_f64()
            );

            let mut ticker = tokio::time::interval(scheduler.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        scheduler.check_due().await;
                    }
                    _ = stop_rx.changed() => break,
                }
            }
            log::info!("Announcement checks stopped");
        });

        SchedulerHandle { stop_tx, handle }
    }
}

/// Stops the ticker started by [`AnnouncementScheduler::start`].
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the ticker and wait for it. A check already underway finishes first.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.handle.await {
            log::error!("Announcement ticker ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::standard::{BIG_SANTA_EVENT, BIG_SANTA_REMINDER};
    use crate::core::model::GroupId;
    use crate::core::platform::fake::{FakeGroup, FakePlatform};
    use crate::core::roles::SEASONAL_EVENT_ROLE_NAME;
    use chrono::{Duration as ChronoDuration, NaiveDate};
    use tempfile::{tempdir, TempDir};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 12, 24)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn platform() -> Arc<FakePlatform> {
        Arc::new(
            FakePlatform::new()
                .with_source_group(FakeGroup::new(1, "Source").with_channel("rm2-alerts", 10))
                .with_group(
                    FakeGroup::new(2, "Alpha")
                        .with_channel("rm2-alerts", 20)
                        .with_role(SEASONAL_EVENT_ROLE_NAME, 200),
                )
                .with_group(FakeGroup::new(3, "Beta").with_channel("rm2-alerts", 30)),
        )
    }

    fn route() -> AlertRoute {
        AlertRoute {
            alerts_channel: "rm2-alerts".to_string(),
            source_group: Some(GroupId(1)),
        }
    }

    fn scheduler(platform: &Arc<FakePlatform>) -> (TempDir, AnnouncementScheduler<FakePlatform>) {
        let dir = tempdir().unwrap();
        let store = AnnouncementStore::new(dir.path().join("scheduled.json"));
        let scheduler = AnnouncementScheduler::new(Arc::clone(platform), route(), store);
        (dir, scheduler)
    }

    fn santa(triggered_at: NaiveDateTime) -> ScheduledAnnouncement {
        let event_time = triggered_at + ChronoDuration::hours(7);
        ScheduledAnnouncement::new(
            BIG_SANTA_EVENT,
            event_time - ChronoDuration::minutes(15),
            event_time,
            SEASONAL_EVENT_ROLE_NAME,
            BIG_SANTA_REMINDER,
        )
    }

    fn stored(dir: &TempDir) -> Vec<ScheduledAnnouncement> {
        let content = std::fs::read_to_string(dir.path().join("scheduled.json")).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    #[tokio::test]
    async fn test_schedule_keeps_one_per_event_type() {
        let platform = platform();
        let (dir, scheduler) = scheduler(&platform);

        for hours in 1..=3 {
            scheduler.schedule(santa(t0() + ChronoDuration::hours(hours))).await;
        }
        scheduler
            .schedule(ScheduledAnnouncement::new("other", t0(), t0(), "r", "{role}"))
            .await;

        let pending = scheduler.pending().await;
        assert_eq!(pending.len(), 2);
        let latest = pending.iter().find(|a| a.event_type == BIG_SANTA_EVENT).unwrap();
        assert_eq!(*latest, santa(t0() + ChronoDuration::hours(3)));
        assert_eq!(stored(&dir), pending);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let platform = platform();
        let (dir, scheduler) = scheduler(&platform);
        scheduler.schedule(santa(t0())).await;

        assert_eq!(scheduler.cancel(BIG_SANTA_EVENT).await, 1);
        assert_eq!(scheduler.cancel(BIG_SANTA_EVENT).await, 0);
        assert!(scheduler.pending().await.is_empty());
        assert!(stored(&dir).is_empty());
    }

    #[tokio::test]
    async fn test_big_santa_reminder_fires_once() {
        let platform = platform();
        let (dir, scheduler) = scheduler(&platform);
        scheduler.schedule(santa(t0())).await;

        let early = scheduler
            .check_due_at(t0() + ChronoDuration::minutes(6 * 60 + 44))
            .await;
        assert_eq!(early, CheckReport::default());
        assert!(platform.sent().is_empty());

        let report = scheduler
            .check_due_at(t0() + ChronoDuration::minutes(6 * 60 + 46))
            .await;
        assert_eq!(report.fired, 1);
        assert_eq!(report.delivery.delivered, 2);

        let unix = clock::unix_timestamp(t0() + ChronoDuration::hours(7));
        assert_eq!(
            platform.sent_to(2),
            vec![format!(
                "<@&200> Big Santa will spawn in 15 minutes! (at <t:{}:F>)",
                unix
            )]
        );
        assert_eq!(
            platform.sent_to(3),
            vec![format!(
                "@{} Big Santa will spawn in 15 minutes! (at <t:{}:F>)",
                SEASONAL_EVENT_ROLE_NAME, unix
            )]
        );
        assert!(platform.sent_to(1).is_empty());
        assert!(stored(&dir).is_empty());

        let later = scheduler
            .check_due_at(t0() + ChronoDuration::minutes(6 * 60 + 50))
            .await;
        assert_eq!(later.fired, 0);
        assert_eq!(platform.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_only_due_entries_fire() {
        let platform = platform();
        let (dir, scheduler) = scheduler(&platform);
        let soon = ScheduledAnnouncement::new("soon", t0(), t0(), "r", "{role} soon");
        let later = ScheduledAnnouncement::new(
            "later",
            t0() + ChronoDuration::hours(1),
            t0() + ChronoDuration::hours(1),
            "r",
            "{role} later",
        );
        scheduler.schedule(soon).await;
        scheduler.schedule(later.clone()).await;

        let report = scheduler.check_due_at(t0()).await;
        assert_eq!(report.fired, 1);
        assert_eq!(report.discarded, 0);
        assert_eq!(platform.sent_to(2), vec!["@r soon"]);
        assert_eq!(scheduler.pending().await, vec![later.clone()]);
        assert_eq!(stored(&dir), vec![later]);
    }

    #[tokio::test]
    async fn test_restart_restores_future_entries() {
        let platform = platform();
        let dir = tempdir().unwrap();
        let path = dir.path().join("scheduled.json");
        let future = santa(clock::now());

        {
            let first = AnnouncementScheduler::new(
                Arc::clone(&platform),
                route(),
                AnnouncementStore::new(&path),
            );
            first.schedule(future.clone()).await;
        }

        let second =
            AnnouncementScheduler::new(Arc::clone(&platform), route(), AnnouncementStore::new(&path));
        assert_eq!(second.pending().await, vec![future]);
    }

    #[tokio::test]
    async fn test_ticker_waits_for_readiness() {
        let platform = Arc::new(
            FakePlatform::new()
                .with_group(FakeGroup::new(2, "Alpha").with_channel("rm2-alerts", 20))
                .not_ready(),
        );
        let (_dir, scheduler) = scheduler(&platform);
        let scheduler = Arc::new(scheduler.with_interval(Duration::from_millis(10)));
        let past = clock::now() - ChronoDuration::minutes(1);
        scheduler
            .schedule(ScheduledAnnouncement::new("due", past, past, "r", "{role} due"))
            .await;

        let handle = scheduler.start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(platform.sent().is_empty());
        assert_eq!(scheduler.pending().await.len(), 1);

        platform.mark_ready();
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop().await;

        assert_eq!(platform.sent_to(2), vec!["@r due"]);
        assert!(scheduler.pending().await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_schedules_persist_complete_snapshots() {
        let platform = platform();
        let (dir, scheduler) = scheduler(&platform);
        let scheduler = Arc::new(scheduler);

        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..8 {
            let scheduler = Arc::clone(&scheduler);
            tasks.spawn(async move {
                scheduler
                    .schedule(ScheduledAnnouncement::new(
                        format!("event_{}", i),
                        t0(),
                        t0(),
                        "r",
                        "{role}",
                    ))
                    .await;
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap();
        }

        let pending = scheduler.pending().await;
        assert_eq!(pending.len(), 8);
        assert_eq!(stored(&dir), pending);
    }

    #[tokio::test]
    async fn test_stop_before_ready() {
        let platform = Arc::new(FakePlatform::new().not_ready());
        let (_dir, scheduler) = scheduler(&platform);
        let handle = Arc::new(scheduler).start();
        handle.stop().await;
    }
}
