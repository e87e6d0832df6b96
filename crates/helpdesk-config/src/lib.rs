use anyhow::Context;
use helpdesk_core::{Clock, HelpDesk, TagRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use time::UtcOffset;

/// Simple configuration for the help desk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub clock: ClockConfig,

    #[serde(default)]
    pub tags: TagConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Fixed zone timestamps are parsed and displayed in
    #[serde(default)]
    pub utc_offset_hours: i8,

    /// Initial clock setting, `M/d/yy H:mm`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagConfig {
    /// alias -> canonical tag
    #[serde(default)]
    pub synonyms: BTreeMap<String, String>,

    /// Preferred display forms, e.g. "GitHub"
    #[serde(default)]
    pub capitalizations: Vec<String>,
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            Self::from_path(&path)
        } else {
            // Create default config file
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(&path, content)?;
            tracing::info!(path = %path.display(), "Wrote default config");
            Ok(config)
        }
    }

    /// Load config from an explicit file
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "helpdesk", "helpdesk") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.helpdesk/config.toml")
        }
    }

    pub fn utc_offset(&self) -> anyhow::Result<UtcOffset> {
        UtcOffset::from_hms(self.clock.utc_offset_hours, 0, 0).with_context(|| {
            format!(
                "utc_offset_hours is out of range: {}",
                self.clock.utc_offset_hours
            )
        })
    }

    /// Clock in the configured zone, set to the configured start if any
    pub fn clock(&self) -> anyhow::Result<Clock> {
        let clock = Clock::with_offset(self.utc_offset()?);
        if let Some(start) = &self.clock.start {
            clock.set_time_str(start)?;
        }
        Ok(clock)
    }

    /// Registry preloaded with the configured synonyms and capitalizations
    pub fn tag_registry(&self) -> TagRegistry {
        let registry = TagRegistry::new();
        for (alias, target) in &self.tags.synonyms {
            registry.add_synonym(alias, target);
        }
        for preferred in &self.tags.capitalizations {
            registry.add_capitalization(preferred);
        }
        registry
    }

    /// An empty desk wired to this configuration
    pub fn help_desk(&self) -> anyhow::Result<HelpDesk> {
        Ok(HelpDesk::with_services(self.clock()?, self.tag_registry()))
    }
}
