//! Classifies source-channel shouts and relays them to every group.

use std::sync::Arc;

use chrono::NaiveDateTime;

use super::announcements::{AnnouncementScheduler, ScheduledAnnouncement};
use super::catalog::EventCatalog;
use super::clock;
use super::fanout::{self, Alert, AlertRoute, FanOutReport};
use super::model::{ChannelId, GroupInfo, InboundMessage, UserId};
use super::platform::ChatPlatform;

/// Which messages count as game shouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFilter {
    pub channel: ChannelId,
    pub author: UserId,
}

impl SourceFilter {
    pub fn accepts(&self, message: &InboundMessage) -> bool {
        message.channel == self.channel && message.author == self.author
    }
}

/// Outcome of dispatching one message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Ids of matched signatures, in catalog order
    pub matched: Vec<&'static str>,
    pub reminders_scheduled: usize,
    pub delivery: FanOutReport,
}

pub struct EventDispatcher<P: ChatPlatform> {
    catalog: EventCatalog,
    platform: Arc<P>,
    scheduler: Arc<AnnouncementScheduler<P>>,
    route: AlertRoute,
    source: Option<SourceFilter>,
}

impl<P: ChatPlatform> EventDispatcher<P> {
    pub fn new(
        catalog: EventCatalog,
        platform: Arc<P>,
        scheduler: Arc<AnnouncementScheduler<P>>,
        route: AlertRoute,
    ) -> Self {
        Self {
            catalog,
            platform,
            scheduler,
            route,
            source: None,
        }
    }

    /// Only relay messages from this channel and author.
    pub fn with_source_filter(mut self, filter: SourceFilter) -> Self {
        self.source = Some(filter);
        self
    }

    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }

    /// Entry point for inbound chat messages.
    ///
    /// Returns `None` when the message is not a game shout.
    pub async fn handle_message(&self, message: &InboundMessage) -> Option<DispatchReport> {
        if message.author == self.platform.self_id() {
            return None;
        }
        if let Some(filter) = &self.source {
            if !filter.accepts(message) {
                return None;
            }
        }
        let groups = self.platform.destination_groups().await;
        Some(self.dispatch(&message.text, groups).await)
    }

    pub async fn dispatch(&self, text: &str, groups: Vec<GroupInfo>) -> DispatchReport {
        self.dispatch_at(text, groups, clock::now()).await
    }

    /// Relay `text` to `groups`, scheduling reminders relative to `now`.
    pub async fn dispatch_at(
        &self,
        text: &str,
        groups: Vec<GroupInfo>,
        now: NaiveDateTime,
    ) -> DispatchReport {
        let classified = self.catalog.classify(text);
        let mut report = DispatchReport::default();
        if classified.is_empty() {
            return report;
        }

        let mut alerts = Vec::with_capacity(classified.len());
        for hit in classified {
            let signature = hit.signature;
            log::info!("Detected {} event", signature.id);
            report.matched.push(signature.id);

            if let Some(reminder) = &signature.reminder {
                let announcement =
                    ScheduledAnnouncement::from_reminder(reminder, signature.role_name, now);
                self.scheduler.schedule(announcement).await;
                report.reminders_scheduled += 1;
            }

            alerts.push(Alert::new(signature.role_name, signature.template).with_vars(hit.fields));
        }

        report.delivery = fanout::fan_out(&self.platform, &self.route, groups, alerts).await;
        log::info!(
            "Relayed {:?} to {} group(s), {} failed",
            report.matched,
            report.delivery.delivered,
            report.delivery.failed
        );
        report
    }
}
