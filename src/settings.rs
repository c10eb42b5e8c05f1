use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::Error;

/// Per-guild settings, loaded once at startup from the JSON file pointed to
/// by the `SETTINGS_FILE` environment variable.
///
/// The file maps guild ids (as strings, the way Discord serializes
/// snowflakes) to a [`GuildSettings`] block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    guilds: HashMap<String, GuildSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuildSettings {
    pub welcome: Option<GreetingConfig>,
    pub farewell: Option<GreetingConfig>,
    pub verification: Option<VerificationConfig>,
}

/// Configuration for one greeting event type (welcome or farewell).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GreetingConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Target channel id. `None` (or a channel missing from the guild)
    /// suppresses the event entirely.
    pub channel: Option<u64>,
    /// Plain-text message template.
    pub content: Option<String>,
    #[serde(default)]
    pub embed: EmbedConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbedConfig {
    pub description: Option<String>,
    pub color: Option<u32>,
    #[serde(default)]
    pub thumbnail: bool,
    pub footer: Option<String>,
    pub image: Option<String>,
}

/// Identifiers the verification workflow needs. Every guild configures its
/// own; without this block the workflow never starts.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationConfig {
    /// Channel where staff review requests are posted.
    pub review_channel: u64,
    /// Role granted once staff confirms the member.
    pub verified_role: u64,
    /// Role revoked once staff confirms the member.
    pub unverified_role: u64,
    /// Role pinged in the review request message.
    pub mention_role: u64,
}

impl Settings {
    /// Load settings from a JSON file. A missing file is not an error: the
    /// bot then runs with greetings disabled everywhere.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!(
                "Settings file {} not found, greetings are disabled",
                path.display()
            );
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let mut settings: Settings = serde_json::from_str(&raw)?;
        settings.sanitize();
        log::info!(
            "Loaded settings for {} guild(s) from {}",
            settings.guilds.len(),
            path.display()
        );
        Ok(settings)
    }

    pub fn guild(&self, guild_id: u64) -> Option<&GuildSettings> {
        self.guilds.get(&guild_id.to_string())
    }

    /// Drop verification blocks carrying a zero id. The id wrappers
    /// (`ChannelId`, `RoleId`) reject zero, so a block like that could
    /// never run; better to lose it at load time with a warning than
    /// mid-workflow.
    fn sanitize(&mut self) {
        for (guild_id, guild) in &mut self.guilds {
            if guild.verification.as_ref().is_some_and(|v| !v.is_valid()) {
                log::warn!(
                    "Dropping verification settings for guild {guild_id}: all ids must be non-zero"
                );
                guild.verification = None;
            }
        }
    }
}

impl VerificationConfig {
    fn is_valid(&self) -> bool {
        [
            self.review_channel,
            self.verified_role,
            self.unverified_role,
            self.mention_role,
        ]
        .iter()
        .all(|&id| id != 0)
    }
}

impl GreetingConfig {
    /// Whether this event should produce any side effect at all.
    pub fn is_active(&self) -> bool {
        self.enabled && self.channel.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Settings {
        serde_json::from_str(json).expect("settings should deserialize")
    }

    #[test]
    fn test_empty_settings() {
        let settings = parse("{}");
        assert!(settings.guild(123).is_none());
    }

    #[test]
    fn test_full_guild_block() {
        let settings = parse(
            r#"{
                "guilds": {
                    "42": {
                        "welcome": {
                            "enabled": true,
                            "channel": 100,
                            "content": "Hi {member:name}",
                            "embed": {
                                "description": "Welcome!",
                                "color": 7506394,
                                "thumbnail": true,
                                "footer": "Member #{count}"
                            }
                        },
                        "verification": {
                            "review_channel": 200,
                            "verified_role": 300,
                            "unverified_role": 301,
                            "mention_role": 302
                        }
                    }
                }
            }"#,
        );

        let guild = settings.guild(42).expect("guild 42 configured");
        let welcome = guild.welcome.as_ref().expect("welcome configured");
        assert!(welcome.is_active());
        assert_eq!(welcome.channel, Some(100));
        assert_eq!(welcome.content.as_deref(), Some("Hi {member:name}"));
        assert_eq!(welcome.embed.color, Some(0x72_89_DA));
        assert!(welcome.embed.thumbnail);
        assert!(welcome.embed.image.is_none());

        let verification = guild.verification.as_ref().expect("verification configured");
        assert_eq!(verification.review_channel, 200);
        assert!(guild.farewell.is_none());
    }

    #[test]
    fn test_disabled_config_is_inactive() {
        let settings = parse(
            r#"{"guilds": {"1": {"farewell": {"enabled": false, "channel": 5}}}}"#,
        );
        let farewell = settings.guild(1).unwrap().farewell.as_ref().unwrap();
        assert!(!farewell.is_active());
    }

    #[test]
    fn test_sanitize_drops_zero_id_verification() {
        let mut settings = parse(
            r#"{
                "guilds": {
                    "1": {
                        "verification": {
                            "review_channel": 0,
                            "verified_role": 300,
                            "unverified_role": 301,
                            "mention_role": 302
                        }
                    }
                }
            }"#,
        );
        settings.sanitize();
        assert!(settings.guild(1).unwrap().verification.is_none());
    }

    #[test]
    fn test_sanitize_keeps_valid_verification() {
        let mut settings = parse(
            r#"{
                "guilds": {
                    "1": {
                        "verification": {
                            "review_channel": 200,
                            "verified_role": 300,
                            "unverified_role": 301,
                            "mention_role": 302
                        }
                    }
                }
            }"#,
        );
        settings.sanitize();
        assert!(settings.guild(1).unwrap().verification.is_some());
    }

    #[test]
    fn test_missing_channel_is_inactive() {
        let settings = parse(r#"{"guilds": {"1": {"welcome": {"enabled": true}}}}"#);
        let welcome = settings.guild(1).unwrap().welcome.as_ref().unwrap();
        assert!(!welcome.is_active());
    }
}
