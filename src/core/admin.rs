//! Direct-message commands.
//!
//! Only the configured admin gets command handling; everyone else (and any
//! unknown command) receives the greeting.

use std::sync::Arc;

use super::model::{GroupSummary, InboundMessage, UserId};
use super::platform::ChatPlatform;

pub const GREETING: &str = "Hi! I'm here to defeat the Sun!";
pub const SERVER_LIST_COMMANDS: &[&str] = &["!servers", "!serverlist", "!guilds"];

/// Hard cap on a single chat message
pub const MESSAGE_LIMIT: usize = 2000;
/// Chunks are flushed before reaching this many characters
pub const CHUNK_TARGET: usize = 1900;
const CONTINUED_PREFIX: &str = "**Continued...**\n\n";

fn describe(group: &GroupSummary) -> String {
    format!(
        "**{}** (ID: {})\n   Members: {}\n   Owner: {}",
        group.name,
        group.id,
        group.member_count,
        group.owner.as_deref().unwrap_or("Unknown")
    )
}

/// Render the server list as one or more chat messages.
pub fn server_list_messages(groups: &[GroupSummary]) -> Vec<String> {
    if groups.is_empty() {
        return vec!["I'm not in any servers right now.".to_string()];
    }

    let header = format!("I'm currently in {} server(s):\n\n", groups.len());
    let entries: Vec<String> = groups.iter().map(describe).collect();

    let whole = format!("{}{}", header, entries.join("\n\n"));
    if whole.chars().count() <= MESSAGE_LIMIT {
        return vec![whole];
    }

    let mut chunks = Vec::new();
    let mut current = header;
    for entry in entries {
        let block = format!("{}\n\n", entry);
        if current.chars().count() + block.chars().count() > CHUNK_TARGET {
            chunks.push(std::mem::take(&mut current));
        }
        current.push_str(&block);
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            if i == 0 {
                chunk
            } else {
                format!("{}{}", CONTINUED_PREFIX, chunk)
            }
        })
        .collect()
}

pub struct AdminCommands<P: ChatPlatform> {
    platform: Arc<P>,
    admin: Option<UserId>,
}

impl<P: ChatPlatform> AdminCommands<P> {
    pub fn new(platform: Arc<P>, admin: Option<UserId>) -> Self {
        Self { platform, admin }
    }

    /// Replies a direct message would get, in send order.
    pub async fn replies(&self, message: &InboundMessage) -> Vec<String> {
        if Some(message.author) != self.admin {
            return vec![GREETING.to_string()];
        }
        let command = message.text.trim().to_lowercase();
        if SERVER_LIST_COMMANDS.contains(&command.as_str()) {
            log::info!("Server list requested by {}", message.author);
            server_list_messages(&self.platform.all_groups().await)
        } else {
            vec![GREETING.to_string()]
        }
    }

    /// Answer a direct message. Returns how many replies went out.
    pub async fn handle_direct(&self, message: &InboundMessage) -> usize {
        let mut sent = 0;
        for reply in self.replies(message).await {
            match self.platform.send_direct(message.author, &reply).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    log::error!("Error replying to {}: {}", message.author, e);
                    break;
                }
            }
        }
        sent
    }
}
