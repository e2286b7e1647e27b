//! Stdout-backed platform for running the relay without a gateway.
//!
//! Every configured group gets an alerts channel and the full alert role
//! table. Sends are printed instead of delivered.

use async_trait::async_trait;

use super::{ChatPlatform, DeliveryError};
use crate::core::model::{
    BotStanding, ChannelId, GroupId, GroupInfo, GroupSummary, RoleId, RoleInfo, UserId,
};
use crate::core::roles::ALERT_ROLES;

const CONSOLE_BOT_ID: UserId = UserId(0);
const IDS_PER_GROUP: u64 = 100;

pub struct ConsolePlatform {
    groups: Vec<GroupInfo>,
    alerts_channel_name: String,
}

impl ConsolePlatform {
    pub fn new(group_names: &[String], alerts_channel_name: impl Into<String>) -> Self {
        let groups = group_names
            .iter()
            .zip(1u64..)
            .map(|(name, id)| GroupInfo::new(GroupId(id), name.clone()))
            .collect();
        Self {
            groups,
            alerts_channel_name: alerts_channel_name.into(),
        }
    }

    fn alerts_channel(group: GroupId) -> ChannelId {
        ChannelId(group.0 * IDS_PER_GROUP)
    }

    fn group_of(&self, channel: ChannelId) -> Option<&GroupInfo> {
        self.groups
            .iter()
            .find(|g| Self::alerts_channel(g.id) == channel)
    }
}

#[async_trait]
impl ChatPlatform for ConsolePlatform {
    async fn wait_until_ready(&self) {}

    fn self_id(&self) -> UserId {
        CONSOLE_BOT_ID
    }

    async fn destination_groups(&self) -> Vec<GroupInfo> {
        self.groups.clone()
    }

    async fn all_groups(&self) -> Vec<GroupSummary> {
        self.groups
            .iter()
            .map(|g| GroupSummary {
                id: g.id,
                name: g.name.clone(),
                member_count: 1,
                owner: None,
            })
            .collect()
    }

    async fn group_name(&self, group: GroupId) -> Option<String> {
        self.groups
            .iter()
            .find(|g| g.id == group)
            .map(|g| g.name.clone())
    }

    async fn find_channel(&self, group: GroupId, name: &str) -> Option<ChannelId> {
        let known = self.groups.iter().any(|g| g.id == group);
        (known && name == self.alerts_channel_name).then(|| Self::alerts_channel(group))
    }

    async fn channel_name(&self, channel: ChannelId) -> Option<String> {
        self.group_of(channel)
            .map(|_| self.alerts_channel_name.clone())
    }

    async fn find_role(&self, group: GroupId, name: &str) -> Option<RoleInfo> {
        if !self.groups.iter().any(|g| g.id == group) {
            return None;
        }
        ALERT_ROLES
            .iter()
            .zip(1u64..)
            .find(|(role, _)| role.name == name)
            .map(|(_, offset)| RoleInfo {
                id: RoleId(group.0 * IDS_PER_GROUP + offset),
                position: 1,
            })
    }

    async fn bot_standing(&self, _group: GroupId) -> BotStanding {
        BotStanding {
            manage_roles: true,
            top_role_position: u32::MAX,
        }
    }

    async fn send_message(&self, channel: ChannelId, text: &str) -> Result<(), DeliveryError> {
        let group = self
            .group_of(channel)
            .ok_or_else(|| DeliveryError::Transport(format!("unknown channel {}", channel)))?;
        println!("[{} #{}] {}", group.name, self.alerts_channel_name, text);
        Ok(())
    }

    async fn send_direct(&self, user: UserId, text: &str) -> Result<(), DeliveryError> {
        println!("[DM {}] {}", user, text);
        Ok(())
    }

    async fn add_role(&self, group: GroupId, user: UserId, role: RoleId) -> Result<(), DeliveryError> {
        log::info!("Console: role {} added to {} in group {}", role, user, group);
        Ok(())
    }

    async fn remove_role(
        &self,
        group: GroupId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), DeliveryError> {
        log::info!("Console: role {} removed from {} in group {}", role, user, group);
        Ok(())
    }
}
