//! Alert roles and role-mention resolution.
//!
//! Every alert targets one subscriber role per group. Roles are looked up by
//! name since each group owns its own role ids.

use super::model::GroupId;
use super::platform::ChatPlatform;

pub const FSWAR_ROLE_NAME: &str = "rm2-alerts-fswar";
pub const HQWAR_ROLE_NAME: &str = "rm2-alerts-hqwar";
pub const PVP_TOURNAMENT_ROLE_NAME: &str = "rm2-alerts-pvpt";
pub const UNI_ROLE_NAME: &str = "rm2-alerts-uni";
pub const BD_ROLE_NAME: &str = "rm2-alerts-bd";
pub const BSIM_ROLE_NAME: &str = "rm2-alerts-bsim";
pub const FV_ROLE_NAME: &str = "rm2-alerts-fv";
pub const MI_ROLE_NAME: &str = "rm2-alerts-mi";
pub const PVP_BATTLE_ROLE_NAME: &str = "rm2-alerts-pvpbattle";
pub const OUTLAW_ROLE_NAME: &str = "rm2-alerts-outlaw";
pub const SEASONAL_EVENT_ROLE_NAME: &str = "rm2-alerts-seasonal-event";

/// A subscribable alert role and the setup-channel reaction that toggles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertRole {
    pub name: &'static str,
    /// Human readable name used in DMs
    pub label: &'static str,
    pub emoji: &'static str,
}

pub const ALERT_ROLES: &[AlertRole] = &[
    AlertRole { name: FSWAR_ROLE_NAME, label: "Food Shop War", emoji: "🍔" },
    AlertRole { name: HQWAR_ROLE_NAME, label: "HQ War", emoji: "🏢" },
    AlertRole { name: PVP_TOURNAMENT_ROLE_NAME, label: "PvP Tournament", emoji: "💪" },
    AlertRole { name: UNI_ROLE_NAME, label: "Uni", emoji: "🎓" },
    AlertRole { name: BD_ROLE_NAME, label: "Battle Dimension / Battle Match", emoji: "⚔️" },
    AlertRole { name: BSIM_ROLE_NAME, label: "Battle Simulation", emoji: "🎮" },
    AlertRole { name: FV_ROLE_NAME, label: "Freedom Village", emoji: "🏘️" },
    AlertRole { name: MI_ROLE_NAME, label: "Monster Invasion", emoji: "👹" },
    AlertRole { name: PVP_BATTLE_ROLE_NAME, label: "Open PvP Battle", emoji: "🔥" },
    AlertRole { name: OUTLAW_ROLE_NAME, label: "Player became an outlaw", emoji: "👮" },
    AlertRole { name: SEASONAL_EVENT_ROLE_NAME, label: "Seasonal Event", emoji: "🎉" },
];

/// Find the alert role toggled by a reaction emoji.
pub fn role_for_emoji(emoji: &str) -> Option<&'static AlertRole> {
    ALERT_ROLES.iter().find(|role| role.emoji == emoji)
}

/// Plain-text stand-in when a group lacks the role.
pub fn fallback_mention(role_name: &str) -> String {
    format!("@{}", role_name)
}

/// Resolves role names to displayable mentions per group.
pub struct RoleMentionResolver;

impl RoleMentionResolver {
    /// `<@&ROLE_ID>` when the group has the role, `@role-name` otherwise.
    pub async fn mention<P: ChatPlatform + ?Sized>(
        platform: &P,
        group: GroupId,
        role_name: &str,
    ) -> String {
        match platform.find_role(group, role_name).await {
            Some(role) => role.mention(),
            None => fallback_mention(role_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::RoleId;
    use crate::core::platform::fake::{FakeGroup, FakePlatform};
    use std::collections::HashSet;

    #[test]
    fn test_role_table_is_consistent() {
        let names: HashSet<_> = ALERT_ROLES.iter().map(|r| r.name).collect();
        let emojis: HashSet<_> = ALERT_ROLES.iter().map(|r| r.emoji).collect();
        assert_eq!(names.len(), ALERT_ROLES.len());
        assert_eq!(emojis.len(), ALERT_ROLES.len());
        assert!(ALERT_ROLES.iter().all(|r| r.name.starts_with("rm2-alerts-")));
    }

    #[test]
    fn test_role_for_emoji() {
        assert_eq!(role_for_emoji("🏢").map(|r| r.name), Some(HQWAR_ROLE_NAME));
        assert!(role_for_emoji("🦀").is_none());
    }

    #[tokio::test]
    async fn test_mention_present_and_fallback() {
        let platform = FakePlatform::new().with_group(
            FakeGroup::new(1, "Guild").with_role(HQWAR_ROLE_NAME, 777),
        );
        let group = GroupId(1);

        let mention = RoleMentionResolver::mention(&platform, group, HQWAR_ROLE_NAME).await;
        assert_eq!(mention, format!("<@&{}>", RoleId(777)));

        let mention = RoleMentionResolver::mention(&platform, group, UNI_ROLE_NAME).await;
        assert_eq!(mention, "@rm2-alerts-uni");
    }
}
