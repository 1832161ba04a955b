use anyhow::{bail, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONCURRENCY: usize = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_APP_NAME: &str = "repo-board";

/// Persistent user settings loaded from ~/.config/repo-board.toml
#[derive(Debug, Deserialize, Default)]
pub struct Settings {
    /// Directory scanned one level deep for git repositories
    pub projects_root: Option<String>,

    /// Max concurrent git probes
    pub scan_concurrency: Option<i64>,

    /// Per-repository git timeout in seconds
    pub git_timeout_secs: Option<i64>,

    /// Name shown in screen headers
    pub app_name: Option<String>,

    #[serde(default)]
    pub theme: ThemeSettings,

    #[serde(default)]
    pub ui: UiSettings,
}

#[derive(Debug, Deserialize, Default)]
pub struct ThemeSettings {
    pub name: Option<String>,
    pub dark: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UiSettings {
    pub alt_screen: Option<bool>,
    pub mouse: Option<bool>,
    pub window_title: Option<String>,
}

impl Settings {
    /// Read the settings file, if there is one. A missing or unparseable
    /// file falls back to defaults so a bad edit never blocks startup.
    pub fn load() -> Self {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        toml::from_str(&content).unwrap_or_else(|err| {
            eprintln!("Warning: ignoring {}: {}", path.display(), err);
            Self::default()
        })
    }
}

/// Where the settings file lives: repo-board.toml under the platform
/// config directory.
pub fn config_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("repo-board.toml"))
}

/// Fully resolved configuration the engine runs on. Paths are absolute and
/// validated; numeric fields have their defaults applied.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub projects_root: PathBuf,
    pub scan_concurrency: usize,
    pub probe_timeout: Duration,
    pub app_name: String,
    pub theme_name: String,
    pub theme_dark: bool,
    pub alt_screen: bool,
    pub mouse_enabled: bool,
    pub window_title: String,
}

impl AppConfig {
    /// Merge CLI overrides over settings, expand `~`, apply defaults, and
    /// validate the projects root. The root check is the only hard failure.
    pub fn resolve(
        settings: Settings,
        root_override: Option<String>,
        concurrency_override: Option<usize>,
        timeout_override: Option<u64>,
    ) -> Result<Self> {
        let raw_root = root_override
            .or(settings.projects_root)
            .unwrap_or_else(|| "~/projects".to_string());
        let projects_root = expand_tilde(&raw_root);

        if !projects_root.is_dir() {
            bail!(
                "projects root {} does not exist or is not a directory",
                projects_root.display()
            );
        }

        let scan_concurrency =
            concurrency_override.unwrap_or_else(|| match settings.scan_concurrency {
                Some(n) if n > 0 => n as usize,
                _ => DEFAULT_CONCURRENCY,
            });

        let timeout_secs = timeout_override.unwrap_or_else(|| match settings.git_timeout_secs {
            Some(n) if n > 0 => n as u64,
            _ => DEFAULT_TIMEOUT_SECS,
        });

        let app_name = settings
            .app_name
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string());
        let window_title = settings.ui.window_title.unwrap_or_else(|| app_name.clone());

        Ok(AppConfig {
            projects_root,
            scan_concurrency,
            probe_timeout: Duration::from_secs(timeout_secs),
            app_name,
            theme_name: settings.theme.name.unwrap_or_else(|| "default".to_string()),
            theme_dark: settings.theme.dark.unwrap_or(false),
            alt_screen: settings.ui.alt_screen.unwrap_or(true),
            mouse_enabled: settings.ui.mouse.unwrap_or(false),
            window_title,
        })
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
