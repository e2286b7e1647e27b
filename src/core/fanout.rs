//! Per-group alert delivery.
//!
//! Each destination group is served by its own task so a slow or failing
//! group never holds up the others. Failures are logged and counted, never
//! propagated.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;

use super::model::{GroupId, GroupInfo};
use super::platform::ChatPlatform;
use super::roles::RoleMentionResolver;
use super::template;

/// Where alerts go inside each group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertRoute {
    pub alerts_channel: String,
    /// The source-of-truth group; never receives alerts
    pub source_group: Option<GroupId>,
}

/// One alert to render per group; `{role}` is filled in per group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub role_name: String,
    pub template: String,
    pub vars: HashMap<String, String>,
}

impl Alert {
    pub fn new(role_name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            role_name: role_name.into(),
            template: template.into(),
            vars: HashMap::new(),
        }
    }

    pub fn with_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.vars.extend(vars);
        self
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn render(&self, role_mention: &str) -> String {
        let mut vars = self.vars.clone();
        vars.insert("role".to_string(), role_mention.to_string());
        template::render(&self.template, &vars)
    }
}

/// What happened across all groups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub delivered: usize,
    pub failed: usize,
    /// Groups without an alerts channel
    pub missing_channel: usize,
    pub skipped_source: usize,
}

impl FanOutReport {
    fn absorb(&mut self, group: GroupReport) {
        self.delivered += group.delivered;
        self.failed += group.failed;
        if group.missing_channel {
            self.missing_channel += 1;
        }
    }
}

#[derive(Default)]
struct GroupReport {
    delivered: usize,
    failed: usize,
    missing_channel: bool,
}

/// Deliver `alerts`, in order, to every group in `groups`.
pub async fn fan_out<P: ChatPlatform>(
    platform: &Arc<P>,
    route: &AlertRoute,
    groups: Vec<GroupInfo>,
    alerts: Vec<Alert>,
) -> FanOutReport {
    let mut report = FanOutReport::default();
    if alerts.is_empty() {
        return report;
    }

    let alerts: Arc<[Alert]> = alerts.into();
    let mut tasks = JoinSet::new();

    for group in groups {
        if Some(group.id) == route.source_group {
            report.skipped_source += 1;
            continue;
        }
        let platform = Arc::clone(platform);
        let alerts = Arc::clone(&alerts);
        let channel_name = route.alerts_channel.clone();
        tasks.spawn(async move {
            deliver_to_group(platform.as_ref(), &group, &channel_name, &alerts).await
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(group_report) => report.absorb(group_report),
            Err(e) => {
                log::error!("Alert delivery task failed: {}", e);
                report.failed += 1;
            }
        }
    }

    report
}

async fn deliver_to_group<P: ChatPlatform>(
    platform: &P,
    group: &GroupInfo,
    channel_name: &str,
    alerts: &[Alert],
) -> GroupReport {
    let mut report = GroupReport::default();

    let channel = match platform.find_channel(group.id, channel_name).await {
        Some(channel) => channel,
        None => {
            log::warn!("Could not find '{}' channel in group: {}", channel_name, group.name);
            report.missing_channel = true;
            return report;
        }
    };

    for alert in alerts {
        let mention = RoleMentionResolver::mention(platform, group.id, &alert.role_name).await;
        let text = alert.render(&mention);
        match platform.send_message(channel, &text).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                log::error!("Error sending alert to {}: {}", group.name, e);
                report.failed += 1;
            }
        }
    }

    report
}
