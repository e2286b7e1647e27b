//! Chat platform seam.
//!
//! The gateway connection lives outside this crate; the core only needs the
//! lookups and sends below. `fake` records calls for tests, `console` backs
//! the command-line binary.

use async_trait::async_trait;
use thiserror::Error;

use super::model::{
    BotStanding, ChannelId, GroupId, GroupInfo, GroupSummary, RoleId, RoleInfo, UserId,
};

pub mod console;
#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use console::ConsolePlatform;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Capabilities the alert core consumes from the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync + 'static {
    /// Resolves once the connection is usable.
    async fn wait_until_ready(&self);

    /// The bot's own user id
    fn self_id(&self) -> UserId;

    /// Groups that receive alerts. Never includes the source group.
    async fn destination_groups(&self) -> Vec<GroupInfo>;

    /// Every group the bot is in, source included.
    async fn all_groups(&self) -> Vec<GroupSummary>;

    async fn group_name(&self, group: GroupId) -> Option<String>;

    async fn find_channel(&self, group: GroupId, name: &str) -> Option<ChannelId>;

    async fn channel_name(&self, channel: ChannelId) -> Option<String>;

    async fn find_role(&self, group: GroupId, name: &str) -> Option<RoleInfo>;

    async fn bot_standing(&self, group: GroupId) -> BotStanding;

    async fn send_message(&self, channel: ChannelId, text: &str) -> Result<(), DeliveryError>;

    async fn send_direct(&self, user: UserId, text: &str) -> Result<(), DeliveryError>;

    /// Adding a role the member already holds is a no-op.
    async fn add_role(&self, group: GroupId, user: UserId, role: RoleId)
        -> Result<(), DeliveryError>;

    /// Removing a role the member does not hold is a no-op.
    async fn remove_role(
        &self,
        group: GroupId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), DeliveryError>;
}
