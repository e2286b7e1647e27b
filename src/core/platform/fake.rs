//! Recording platform for tests

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;

use super::{ChatPlatform, DeliveryError};
use crate::core::model::{
    BotStanding, ChannelId, GroupId, GroupInfo, GroupSummary, RoleId, RoleInfo, UserId,
};

pub const FAKE_BOT_ID: UserId = UserId(999);

/// A configurable group
#[derive(Debug, Clone)]
pub struct FakeGroup {
    pub id: GroupId,
    pub name: String,
    pub member_count: u64,
    pub owner: Option<String>,
    channels: Vec<(String, ChannelId)>,
    roles: Vec<(String, RoleInfo)>,
    standing: BotStanding,
    send_failure: Option<DeliveryError>,
}

impl FakeGroup {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: GroupId(id),
            name: name.into(),
            member_count: 0,
            owner: None,
            channels: Vec::new(),
            roles: Vec::new(),
            standing: BotStanding {
                manage_roles: true,
                top_role_position: 100,
            },
            send_failure: None,
        }
    }

    pub fn with_channel(mut self, name: impl Into<String>, id: u64) -> Self {
        self.channels.push((name.into(), ChannelId(id)));
        self
    }

    pub fn with_role(self, name: impl Into<String>, id: u64) -> Self {
        self.with_role_at(name, id, 1)
    }

    pub fn with_role_at(mut self, name: impl Into<String>, id: u64, position: u32) -> Self {
        self.roles.push((
            name.into(),
            RoleInfo {
                id: RoleId(id),
                position,
            },
        ));
        self
    }

    pub fn with_standing(mut self, manage_roles: bool, top_role_position: u32) -> Self {
        self.standing = BotStanding {
            manage_roles,
            top_role_position,
        };
        self
    }

    pub fn with_members(mut self, member_count: u64, owner: impl Into<String>) -> Self {
        self.member_count = member_count;
        self.owner = Some(owner.into());
        self
    }

    /// Every send into this group fails with `error`
    pub fn failing(mut self, error: DeliveryError) -> Self {
        self.send_failure = Some(error);
        self
    }
}

/// A message delivered to a group channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub group: GroupId,
    pub channel: ChannelId,
    pub text: String,
}

#[derive(Default)]
struct FakeState {
    sent: Vec<SentMessage>,
    directs: Vec<(UserId, String)>,
    member_roles: HashSet<(GroupId, UserId, RoleId)>,
}

/// In-memory `ChatPlatform` that records every call.
#[derive(Clone)]
pub struct FakePlatform {
    groups: Vec<FakeGroup>,
    source_group: Option<GroupId>,
    ready: Arc<watch::Sender<bool>>,
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl FakePlatform {
    pub fn new() -> Self {
        let (ready, _) = watch::channel(true);
        Self {
            groups: Vec::new(),
            source_group: None,
            ready: Arc::new(ready),
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    pub fn with_group(mut self, group: FakeGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// A group present on the platform but excluded from destinations
    pub fn with_source_group(mut self, group: FakeGroup) -> Self {
        self.source_group = Some(group.id);
        self.groups.push(group);
        self
    }

    /// Start in the not-ready state until `mark_ready` is called
    pub fn not_ready(self) -> Self {
        self.ready.send_replace(false);
        self
    }

    pub fn mark_ready(&self) {
        self.ready.send_replace(true);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn sent_to(&self, group: u64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|m| m.group == GroupId(group))
            .map(|m| m.text)
            .collect()
    }

    pub fn directs(&self) -> Vec<(UserId, String)> {
        self.state.lock().unwrap().directs.clone()
    }

    pub fn has_role(&self, group: u64, user: UserId, role: u64) -> bool {
        self.state
            .lock()
            .unwrap()
            .member_roles
            .contains(&(GroupId(group), user, RoleId(role)))
    }

    fn group(&self, id: GroupId) -> Option<&FakeGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    fn channel_owner(&self, channel: ChannelId) -> Option<(&FakeGroup, &str)> {
        self.groups.iter().find_map(|g| {
            g.channels
                .iter()
                .find(|(_, id)| *id == channel)
                .map(|(name, _)| (g, name.as_str()))
        })
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn wait_until_ready(&self) {
        let mut rx = self.ready.subscribe();
        let _ = rx.wait_for(|ready| *ready).await;
    }

    fn self_id(&self) -> UserId {
        FAKE_BOT_ID
    }

    async fn destination_groups(&self) -> Vec<GroupInfo> {
        self.groups
            .iter()
            .filter(|g| Some(g.id) != self.source_group)
            .map(|g| GroupInfo::new(g.id, g.name.clone()))
            .collect()
    }

    async fn all_groups(&self) -> Vec<GroupSummary> {
        self.groups
            .iter()
            .map(|g| GroupSummary {
                id: g.id,
                name: g.name.clone(),
                member_count: g.member_count,
                owner: g.owner.clone(),
            })
            .collect()
    }

    async fn group_name(&self, group: GroupId) -> Option<String> {
        self.group(group).map(|g| g.name.clone())
    }

    async fn find_channel(&self, group: GroupId, name: &str) -> Option<ChannelId> {
        self.group(group)?
            .channels
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }

    async fn channel_name(&self, channel: ChannelId) -> Option<String> {
        self.channel_owner(channel).map(|(_, name)| name.to_string())
    }

    async fn find_role(&self, group: GroupId, name: &str) -> Option<RoleInfo> {
        self.group(group)?
            .roles
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, role)| *role)
    }

    async fn bot_standing(&self, group: GroupId) -> BotStanding {
        self.group(group).map(|g| g.standing).unwrap_or_default()
    }

    async fn send_message(&self, channel: ChannelId, text: &str) -> Result<(), DeliveryError> {
        let group = match self.channel_owner(channel) {
            Some((group, _)) => group,
            None => return Err(DeliveryError::Transport(format!("unknown channel {}", channel))),
        };
        if let Some(err) = &group.send_failure {
            return Err(err.clone());
        }
        self.state.lock().unwrap().sent.push(SentMessage {
            group: group.id,
            channel,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_direct(&self, user: UserId, text: &str) -> Result<(), DeliveryError> {
        self.state
            .lock()
            .unwrap()
            .directs
            .push((user, text.to_string()));
        Ok(())
    }

    async fn add_role(
        &self,
        group: GroupId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), DeliveryError> {
        if let Some(err) = self.group(group).and_then(|g| g.send_failure.clone()) {
            return Err(err);
        }
        self.state
            .lock()
            .unwrap()
            .member_roles
            .insert((group, user, role));
        Ok(())
    }

    async fn remove_role(
        &self,
        group: GroupId,
        user: UserId,
        role: RoleId,
    ) -> Result<(), DeliveryError> {
        if let Some(err) = self.group(group).and_then(|g| g.send_failure.clone()) {
            return Err(err);
        }
        self.state
            .lock()
            .unwrap()
            .member_roles
            .remove(&(group, user, role));
        Ok(())
    }
}
