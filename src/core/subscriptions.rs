//! Reaction-driven role subscriptions in the setup channel.
//!
//! Reacting with an alert role's emoji subscribes the member to that role;
//! removing the reaction unsubscribes. Every outcome is reported to the
//! member by direct message.

use std::sync::Arc;

use super::model::{GroupId, ReactionEvent, UserId};
use super::platform::{ChatPlatform, DeliveryError};
use super::roles::{role_for_emoji, AlertRole};

/// What a reaction ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// Not a subscription reaction
    Ignored,
    Subscribed,
    Unsubscribed,
    RoleMissing,
    CannotManageRoles,
    /// The role sits at or above the bot's highest role
    RoleOutranksBot,
    Failed,
}

pub struct SubscriptionManager<P: ChatPlatform> {
    platform: Arc<P>,
    setup_channel: String,
}

impl<P: ChatPlatform> SubscriptionManager<P> {
    pub fn new(platform: Arc<P>, setup_channel: impl Into<String>) -> Self {
        Self {
            platform,
            setup_channel: setup_channel.into(),
        }
    }

    async fn subscription_role(&self, event: &ReactionEvent) -> Option<&'static AlertRole> {
        if event.user == self.platform.self_id() {
            return None;
        }
        let channel = self.platform.channel_name(event.channel).await?;
        if channel != self.setup_channel {
            return None;
        }
        role_for_emoji(&event.emoji)
    }

    async fn group_name(&self, group: GroupId) -> String {
        self.platform
            .group_name(group)
            .await
            .unwrap_or_else(|| group.to_string())
    }

    async fn notify(&self, user: UserId, text: String) {
        if let Err(e) = self.platform.send_direct(user, &text).await {
            log::warn!("Could not DM {}: {}", user, e);
        }
    }

    pub async fn on_reaction_add(&self, event: &ReactionEvent) -> ReactionOutcome {
        let alert_role = match self.subscription_role(event).await {
            Some(role) => role,
            None => return ReactionOutcome::Ignored,
        };
        let group = self.group_name(event.group).await;
        let role_name = alert_role.name;

        let role = match self.platform.find_role(event.group, role_name).await {
            Some(role) => role,
            None => {
                self.notify(
                    event.user,
                    format!(
                        "Sorry, the {} role doesn't exist in {}. Please ask an administrator to create it.",
                        role_name, group
                    ),
                )
                .await;
                return ReactionOutcome::RoleMissing;
            }
        };

        let standing = self.platform.bot_standing(event.group).await;
        if !standing.manage_roles {
            self.notify(
                event.user,
                format!(
                    "Sorry, I don't have the 'Manage Roles' permission in {}. Please ask an administrator to give me this permission.",
                    group
                ),
            )
            .await;
            return ReactionOutcome::CannotManageRoles;
        }
        if role.position >= standing.top_role_position {
            self.notify(
                event.user,
                format!(
                    "Sorry, I can't assign the {} role in {} because it's higher than my role. Please ask an administrator to move my role higher in the role list.",
                    role_name, group
                ),
            )
            .await;
            return ReactionOutcome::RoleOutranksBot;
        }

        match self.platform.add_role(event.group, event.user, role.id).await {
            Ok(()) => {
                log::info!("{} subscribed to {} in {}", event.user, role_name, group);
                self.notify(
                    event.user,
                    format!("You have subscribed to {} alerts in {}!", alert_role.label, group),
                )
                .await;
                ReactionOutcome::Subscribed
            }
            Err(DeliveryError::PermissionDenied(_)) => {
                self.notify(
                    event.user,
                    format!(
                        "Sorry, I don't have permission to assign the {} role in {}. Please ask an administrator to give me the 'Manage Roles' permission.",
                        role_name, group
                    ),
                )
                .await;
                ReactionOutcome::Failed
            }
            Err(e) => {
                log::error!("Error assigning role in {}: {}", group, e);
                self.notify(
                    event.user,
                    format!(
                        "Sorry, there was an error assigning the role in {}. Please try again later.",
                        group
                    ),
                )
                .await;
                ReactionOutcome::Failed
            }
        }
    }

    pub async fn on_reaction_remove(&self, event: &ReactionEvent) -> ReactionOutcome {
        let alert_role = match self.subscription_role(event).await {
            Some(role) => role,
            None => return ReactionOutcome::Ignored,
        };
        let group = self.group_name(event.group).await;
        let role_name = alert_role.name;

        let role = match self.platform.find_role(event.group, role_name).await {
            Some(role) => role,
            None => {
                self.notify(
                    event.user,
                    format!("The {} role doesn't exist in {}.", role_name, group),
                )
                .await;
                return ReactionOutcome::RoleMissing;
            }
        };

        match self.platform.remove_role(event.group, event.user, role.id).await {
            Ok(()) => {
                log::info!("{} unsubscribed from {} in {}", event.user, role_name, group);
                self.notify(
                    event.user,
                    format!("You have unsubscribed from {} alerts in {}!", alert_role.label, group),
                )
                .await;
                ReactionOutcome::Unsubscribed
            }
            Err(DeliveryError::PermissionDenied(_)) => {
                self.notify(
                    event.user,
                    format!(
                        "Sorry, I don't have permission to remove the {} role in {}. Please ask an administrator to give me the 'Manage Roles' permission.",
                        role_name, group
                    ),
                )
                .await;
                ReactionOutcome::Failed
            }
            Err(e) => {
                log::error!("Error removing role in {}: {}", group, e);
                self.notify(
                    event.user,
                    format!(
                        "Sorry, there was an error removing the role in {}. Please try again later.",
                        group
                    ),
                )
                .await;
                ReactionOutcome::Failed
            }
        }
    }
}
