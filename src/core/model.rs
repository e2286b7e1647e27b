use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake_id!(
    /// A destination group (a "guild" on the chat platform)
    GroupId
);
snowflake_id!(ChannelId);
snowflake_id!(RoleId);
snowflake_id!(UserId);

/// Identity of a destination group, name kept for log lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub id: GroupId,
    pub name: String,
}

impl GroupInfo {
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Server-list entry shown to the admin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary {
    pub id: GroupId,
    pub name: String,
    pub member_count: u64,
    pub owner: Option<String>,
}

/// A role as seen by the bot inside one group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleInfo {
    pub id: RoleId,
    /// Position in the group's role hierarchy (higher outranks lower)
    pub position: u32,
}

impl RoleInfo {
    pub fn mention(&self) -> String {
        format!("<@&{}>", self.id)
    }
}

/// What the bot may do with roles in a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BotStanding {
    pub manage_roles: bool,
    pub top_role_position: u32,
}

/// A chat message delivered by the host integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub text: String,
    /// `None` for direct messages
    pub group: Option<GroupId>,
    pub channel: ChannelId,
    pub author: UserId,
}

impl InboundMessage {
    pub fn is_direct(&self) -> bool {
        self.group.is_none()
    }
}

/// A reaction added to or removed from a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionEvent {
    pub group: GroupId,
    pub channel: ChannelId,
    pub user: UserId,
    pub emoji: String,
}
