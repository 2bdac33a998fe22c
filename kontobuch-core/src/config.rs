//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "import": { "atomic": true, "defaultCategory": "uncategorized", "promptForNames": true }
//! }
//! ```
//! Keys this crate does not know about are kept when saving.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::DEFAULT_CATEGORY;

/// Environment variable that disables interactive account naming
pub const HEADLESS_ENV: &str = "KONTOBUCH_HEADLESS";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    import: ImportSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Import behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSettings {
    /// Commit each file as one transaction
    #[serde(default = "default_true")]
    pub atomic: bool,
    /// Category given to imported transactions
    #[serde(default = "default_category")]
    pub default_category: String,
    /// Ask for a name when an unknown account is imported
    #[serde(default = "default_true")]
    pub prompt_for_names: bool,
}

fn default_true() -> bool {
    true
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            atomic: true,
            default_category: default_category(),
            prompt_for_names: true,
        }
    }
}

/// Kontobuch configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub import: ImportSettings,
    /// Set by `KONTOBUCH_HEADLESS`, never saved
    pub headless: bool,
}

impl Config {
    /// Load config from the data directory
    ///
    /// Headless mode can be enabled via the environment variable
    /// KONTOBUCH_HEADLESS (for CI and scripted imports).
    pub fn load(kontobuch_dir: &Path) -> Result<Self> {
        let raw = read_settings(kontobuch_dir)?;

        let headless = matches!(
            std::env::var(HEADLESS_ENV).ok().as_deref(),
            Some("true" | "1" | "yes" | "TRUE" | "YES")
        );

        Ok(Self {
            import: raw.import,
            headless,
        })
    }

    /// Save config to the data directory
    /// Preserves other settings that this crate doesn't manage
    pub fn save(&self, kontobuch_dir: &Path) -> Result<()> {
        let mut settings = read_settings(kontobuch_dir)?;
        settings.import = self.import.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(kontobuch_dir.join("settings.json"), content)?;
        Ok(())
    }

    /// Whether new accounts should be named interactively
    pub fn interactive_naming(&self) -> bool {
        self.import.prompt_for_names && !self.headless
    }
}

fn read_settings(kontobuch_dir: &Path) -> Result<SettingsFile> {
    let settings_path = kontobuch_dir.join("settings.json");
    if !settings_path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(&settings_path)?;
    Ok(serde_json::from_str(&content).unwrap_or_default())
}
