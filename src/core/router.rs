//! Routes host events to the component that owns them.

use std::sync::Arc;

use super::admin::AdminCommands;
use super::dispatch::{DispatchReport, EventDispatcher};
use super::model::{InboundMessage, ReactionEvent};
use super::platform::ChatPlatform;
use super::subscriptions::{ReactionOutcome, SubscriptionManager};

/// What the router did with a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Ignored,
    /// Direct message answered with this many replies
    Direct(usize),
    Relayed(DispatchReport),
}

pub struct Router<P: ChatPlatform> {
    platform: Arc<P>,
    dispatcher: EventDispatcher<P>,
    subscriptions: SubscriptionManager<P>,
    admin: AdminCommands<P>,
}

impl<P: ChatPlatform> Router<P> {
    pub fn new(
        platform: Arc<P>,
        dispatcher: EventDispatcher<P>,
        subscriptions: SubscriptionManager<P>,
        admin: AdminCommands<P>,
    ) -> Self {
        Self {
            platform,
            dispatcher,
            subscriptions,
            admin,
        }
    }

    pub fn dispatcher(&self) -> &EventDispatcher<P> {
        &self.dispatcher
    }

    pub async fn on_message(&self, message: &InboundMessage) -> Routed {
        if message.author == self.platform.self_id() {
            return Routed::Ignored;
        }
        if message.is_direct() {
            return Routed::Direct(self.admin.handle_direct(message).await);
        }
        match self.dispatcher.handle_message(message).await {
            Some(report) => Routed::Relayed(report),
            None => Routed::Ignored,
        }
    }

    pub async fn on_reaction_add(&self, event: &ReactionEvent) -> ReactionOutcome {
        self.subscriptions.on_reaction_add(event).await
    }

    pub async fn on_reaction_remove(&self, event: &ReactionEvent) -> ReactionOutcome {
        self.subscriptions.on_reaction_remove(event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::admin::GREETING;
    use crate::core::announcements::{AnnouncementScheduler, AnnouncementStore};
    use crate::core::catalog::{EventCatalog, Seasons};
    use crate::core::dispatch::SourceFilter;
    use crate::core::fanout::AlertRoute;
    use crate::core::model::{ChannelId, GroupId, UserId};
    use crate::core::platform::fake::{FakeGroup, FakePlatform, FAKE_BOT_ID};
    use crate::core::roles::HQWAR_ROLE_NAME;
    use tempfile::{tempdir, TempDir};

    const SHOUT_CHANNEL: ChannelId = ChannelId(10);
    const SHOUT_AUTHOR: UserId = UserId(42);
    const ADMIN: UserId = UserId(7);

    fn router() -> (TempDir, Arc<FakePlatform>, Router<FakePlatform>) {
        let dir = tempdir().unwrap();
        let platform = Arc::new(
            FakePlatform::new()
                .with_source_group(FakeGroup::new(1, "RM2").with_channel("global", 10))
                .with_group(
                    FakeGroup::new(2, "Alpha")
                        .with_channel("rm2-alerts", 20)
                        .with_channel("rm2-alerts-setup", 21)
                        .with_role(HQWAR_ROLE_NAME, 200),
                ),
        );
        let route = AlertRoute {
            alerts_channel: "rm2-alerts".to_string(),
            source_group: Some(GroupId(1)),
        };
        let scheduler = Arc::new(AnnouncementScheduler::new(
            Arc::clone(&platform),
            route.clone(),
            AnnouncementStore::new(dir.path().join("scheduled.json")),
        ));
        let dispatcher = EventDispatcher::new(
            EventCatalog::standard(&Seasons::default()),
            Arc::clone(&platform),
            scheduler,
            route,
        )
        .with_source_filter(SourceFilter {
            channel: SHOUT_CHANNEL,
            author: SHOUT_AUTHOR,
        });
        let router = Router::new(
            Arc::clone(&platform),
            dispatcher,
            SubscriptionManager::new(Arc::clone(&platform), "rm2-alerts-setup"),
            AdminCommands::new(Arc::clone(&platform), Some(ADMIN)),
        );
        (dir, platform, router)
    }

    fn message(group: Option<u64>, channel: ChannelId, author: UserId, text: &str) -> InboundMessage {
        InboundMessage {
            text: text.to_string(),
            group: group.map(GroupId),
            channel,
            author,
        }
    }

    #[tokio::test]
    async fn test_source_shout_is_relayed() {
        let (_dir, platform, router) = router();
        let shout = message(Some(1), SHOUT_CHANNEL, SHOUT_AUTHOR, "**HQ War starting in 5 minutes!**");

        match router.on_message(&shout).await {
            Routed::Relayed(report) => assert_eq!(report.matched, vec!["hq_war"]),
            other => panic!("expected relay, got {:?}", other),
        }
        assert_eq!(platform.sent_to(2), vec!["<@&200> HQ War starts in 5 minutes!"]);
    }

    #[tokio::test]
    async fn test_direct_messages_go_to_admin_commands() {
        let (_dir, platform, router) = router();

        let routed = router.on_message(&message(None, ChannelId(99), UserId(3), "hi")).await;
        assert_eq!(routed, Routed::Direct(1));
        assert_eq!(platform.directs(), vec![(UserId(3), GREETING.to_string())]);
        assert!(platform.sent().is_empty());
    }

    #[tokio::test]
    async fn test_own_and_unrelated_messages_ignored() {
        let (_dir, platform, router) = router();

        let own = message(None, ChannelId(99), FAKE_BOT_ID, "!servers");
        assert_eq!(router.on_message(&own).await, Routed::Ignored);

        let chatter = message(Some(2), ChannelId(20), UserId(3), "**HQ War starting in 5 minutes!**");
        assert_eq!(router.on_message(&chatter).await, Routed::Ignored);

        assert!(platform.sent().is_empty());
        assert!(platform.directs().is_empty());
    }

    #[tokio::test]
    async fn test_reactions_toggle_roles() {
        let (_dir, platform, router) = router();
        let event = ReactionEvent {
            group: GroupId(2),
            channel: ChannelId(21),
            user: UserId(3),
            emoji: "🏢".to_string(),
        };

        assert_eq!(router.on_reaction_add(&event).await, ReactionOutcome::Subscribed);
        assert!(platform.has_role(2, UserId(3), 200));
        assert_eq!(router.on_reaction_remove(&event).await, ReactionOutcome::Unsubscribed);
        assert!(!platform.has_role(2, UserId(3), 200));
    }
}
