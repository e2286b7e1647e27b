use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::catalog::Seasons;
use super::model::{ChannelId, GroupId, UserId};

/// Environment variable naming the settings directory
pub const CONFIG_DIR_ENV: &str = "RM2_ALERTS_CONFIG_DIR";

pub const RM2_SERVER_ID: GroupId = GroupId(859_685_499_441_512_478);
pub const RM2_GLOBAL_CHANNEL_ID: ChannelId = ChannelId(939_091_598_216_675_338);
pub const RM2_GLOBAL_SHOUT_USER_ID: UserId = UserId(939_082_155_483_598_858);

/// Where game shouts come from
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SourceSettings {
    pub group_id: GroupId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            group_id: RM2_SERVER_ID,
            channel_id: RM2_GLOBAL_CHANNEL_ID,
            author_id: RM2_GLOBAL_SHOUT_USER_ID,
        }
    }
}

/// Application settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Pending announcement file; relative paths resolve against the
    /// config directory
    pub storage_path: PathBuf,
    pub check_interval_seconds: u64,
    pub alerts_channel_name: String,
    pub setup_channel_name: String,
    pub source: SourceSettings,
    /// Only this user may run DM commands
    pub admin_user_id: Option<UserId>,
    pub seasons: Seasons,
    /// Groups served by the console platform
    pub console_groups: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("scheduled_announcements.json"),
            check_interval_seconds: 60,
            alerts_channel_name: "rm2-alerts".to_string(),
            setup_channel_name: "rm2-alerts-setup".to_string(),
            source: SourceSettings::default(),
            admin_user_id: None,
            seasons: Seasons::default(),
            console_groups: vec!["Console".to_string()],
        }
    }
}

pub struct ConfigManager {
    config_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(app_config_dir: PathBuf) -> Self {
        Self {
            config_path: app_config_dir.join("settings.json"),
            config_dir: app_config_dir,
        }
    }

    /// Manager for the directory named by `RM2_ALERTS_CONFIG_DIR`, or the
    /// working directory.
    pub fn from_env() -> Self {
        let dir = std::env::var_os(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir)
    }

    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Where `settings` keeps pending announcements.
    pub fn storage_path(&self, settings: &Settings) -> PathBuf {
        // Joining an absolute path yields it unchanged
        self.config_dir.join(&settings.storage_path)
    }

    pub fn load(&self) -> Settings {
        if self.config_path.exists() {
            match fs::read_to_string(&self.config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(settings) => return settings,
                    Err(e) => log::warn!(
                        "Ignoring malformed {}: {}",
                        self.config_path.display(),
                        e
                    ),
                },
                Err(e) => log::warn!("Could not read {}: {}", self.config_path.display(), e),
            }
        }
        Settings::default()
    }

    pub fn save(&self, settings: &Settings) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.config_path, content)
    }
}
