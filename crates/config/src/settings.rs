// Application settings
// Loaded from ~/.config/vendhub/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured database path.
pub const DATABASE_ENV: &str = "VENDHUB_DB";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Storage
    #[serde(rename = "database.path")]
    pub database_path: Option<PathBuf>,  // None = <data_dir>/vendhub/vendhub.db

    // Records
    #[serde(rename = "records.pageSize")]
    pub default_page_size: u32,

    // Logging
    #[serde(rename = "log.level")]
    pub log_level: Option<String>,  // None = warn

    // Export
    #[serde(rename = "export.sheetTitle")]
    pub export_sheet_title: String,

    #[serde(rename = "export.headerFill")]
    pub export_header_fill: String,

    #[serde(rename = "export.filenamePrefix")]
    pub export_filename_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Storage
            database_path: None,
            // Records
            default_page_size: 50,
            // Logging
            log_level: None,
            // Export
            export_sheet_title: "VendHub Database".to_string(),
            export_header_fill: "#667eea".to_string(),
            export_filename_prefix: "VendHub_Export".to_string(),
        }
    }
}

const DEFAULT_CONFIG: &str = r##"{
    // Storage (null = platform data directory)
    "database.path": null,

    // Records listing
    "records.pageSize": 50,

    // Logging: "error", "warn", "info", "debug", "trace" (null = warn)
    "log.level": null,

    // Export
    "export.sheetTitle": "VendHub Database",
    "export.headerFill": "#667eea",
    "export.filenamePrefix": "VendHub_Export"
}
"##;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vendhub");
        config_dir.join("settings.json")
    }

    /// Default database location when neither settings, env nor flag set one
    pub fn default_database_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vendhub")
            .join("vendhub.db")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from a specific file. A missing file is created with
    /// commented defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            let settings = Self::default();
            create_default_file(path);
            return settings;
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    eprintln!("Error parsing {}: {}", path.display(), e);
                    eprintln!("Using default settings");
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON, ignoring lines that start with `//`
    pub fn parse(contents: &str) -> Result<Self, String> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        serde_json::from_str(&cleaned).map_err(|e| e.to_string())
    }

    /// Database path by precedence: flag, settings, default. The CLI folds
    /// [`DATABASE_ENV`] into the flag.
    pub fn database_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.database_path.clone())
            .unwrap_or_else(Self::default_database_path)
    }

    /// Header fill as 0xRRGGBB. Accepts `#667eea` or `667eea`.
    pub fn header_fill_rgb(&self) -> Option<u32> {
        let hex = self.export_header_fill.trim().trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        u32::from_str_radix(hex, 16).ok()
    }
}

/// Create default settings file with comments
fn create_default_file(path: &Path) {
    // Ensure directory exists
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Error creating config directory: {}", e);
            return;
        }
    }

    if let Err(e) = fs::write(path, DEFAULT_CONFIG) {
        eprintln!("Error writing default settings.json: {}", e);
    }
}
