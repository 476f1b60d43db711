use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::GoalCategory;

fn default_prayer_weight() -> f64 {
    40.0
}
fn default_quran_weight() -> f64 {
    25.0
}
fn default_dhikr_weight() -> f64 {
    25.0
}
fn default_fasting_weight() -> f64 {
    10.0
}
fn default_tasbih_target() -> u32 {
    100
}
fn default_quran_pages() -> u32 {
    2
}
fn default_fasting_days() -> u32 {
    2
}
fn default_recompute_secs() -> u64 {
    30
}
fn default_sync_secs() -> u64 {
    300
}
fn default_sync_table() -> String {
    "iman_state".to_string()
}
fn default_api_key_env() -> String {
    "IMAN_SYNC_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    5
}
fn default_true() -> bool {
    true
}

/// Relative weight of each section in the overall Iman score. Only the
/// ratios matter; weights of inactive sections are redistributed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_prayer_weight")]
    pub prayer: f64,
    #[serde(default = "default_quran_weight")]
    pub quran: f64,
    #[serde(default = "default_dhikr_weight")]
    pub dhikr: f64,
    #[serde(default = "default_fasting_weight")]
    pub fasting: f64,
}

impl ScoringConfig {
    pub fn weight(&self, category: GoalCategory) -> f64 {
        let w = match category {
            GoalCategory::Prayer => self.prayer,
            GoalCategory::Quran => self.quran,
            GoalCategory::Dhikr => self.dhikr,
            GoalCategory::Fasting => self.fasting,
        };
        w.max(0.0)
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            prayer: default_prayer_weight(),
            quran: default_quran_weight(),
            dhikr: default_dhikr_weight(),
            fasting: default_fasting_weight(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CustomDhikr {
    pub name: String,
    /// "checkbox" or "counter"
    pub dhikr_type: String,
    pub target: u32,
    pub frequency: String,
}

/// Targets used when a user's goals are created for the first time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalsConfig {
    #[serde(default = "default_tasbih_target")]
    pub tasbih_target: u32,
    #[serde(default = "default_quran_pages")]
    pub quran_pages: u32,
    #[serde(default)]
    pub quran_verses: u32,
    #[serde(default = "default_fasting_days")]
    pub fasting_days_per_week: u32,
    #[serde(default)]
    pub custom_dhikr: Vec<CustomDhikr>,
}

impl Default for GoalsConfig {
    fn default() -> Self {
        Self {
            tasbih_target: default_tasbih_target(),
            quran_pages: default_quran_pages(),
            quran_verses: 0,
            fasting_days_per_week: default_fasting_days(),
            custom_dhikr: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_recompute_secs")]
    pub recompute_secs: u64,
    #[serde(default = "default_sync_secs")]
    pub sync_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            recompute_secs: default_recompute_secs(),
            sync_secs: default_sync_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Base URL of the PostgREST endpoint, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_sync_table")]
    pub table: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_true")]
    pub push_on_change: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            table: default_sync_table(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            push_on_change: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub goals: GoalsConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl AppConfig {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", "iman")
            .context("Could not determine project directories")
    }

    pub fn config_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn db_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("iman.db"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(&path).with_context(|| format!("Reading {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content).context("Parsing config.toml")?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Serializing config")?;
        std::fs::write(&path, content).with_context(|| format!("Writing {:?}", path))?;
        Ok(())
    }

    pub fn ensure_data_dir() -> Result<PathBuf> {
        let dir = Self::data_dir()?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
