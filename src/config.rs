use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::{DEFAULT_USER_AGENT, WIKI_BASE_URL};
use crate::internal::fetch_loop::RetryPolicy;
use crate::utils::storage_root::StorageRoot;

pub const CONFIG_FILE: &str = "config.ron";

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// Where `seen_pages.txt` and `activity_log.txt` are kept.
    pub storage_root: StorageRoot,
    /// Sub-folder created under the documents directory.
    #[serde(default = "default_folder_name")]
    pub folder_name: String,
    /// Wikipedia host used for the API, the category redirects and article links.
    #[serde(default = "default_wiki_base_url")]
    pub wiki_base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Retry budget of the terminal UI.
    #[serde(default = "RetryConfig::interactive")]
    pub interactive: RetryConfig,
    /// Retry budget of `wiki-roll launch`.
    #[serde(default = "RetryConfig::launcher")]
    pub launcher: RetryConfig,
    /// Topics offered in the UI after "Any (Totally Random)".
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    /// Topic selected when the UI last rolled.
    pub last_category: Option<String>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub error_backoff_ms: u64,
    pub duplicate_delay_ms: u64,
}

impl RetryConfig {
    fn interactive() -> Self {
        RetryPolicy::interactive().into()
    }

    fn launcher() -> Self {
        RetryPolicy::launcher().into()
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            error_backoff: Duration::from_millis(self.error_backoff_ms),
            duplicate_delay: Duration::from_millis(self.duplicate_delay_ms),
        }
    }
}

impl From<RetryPolicy> for RetryConfig {
    fn from(policy: RetryPolicy) -> Self {
        Self {
            max_attempts: policy.max_attempts,
            error_backoff_ms: policy.error_backoff.as_millis() as u64,
            duplicate_delay_ms: policy.duplicate_delay.as_millis() as u64,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for the tracing filter, e.g. "info".
    pub level: String,
    /// Per-module overrides, e.g. {"wiki_roll::api": "debug"}.
    pub module_levels: HashMap<String, String>,
    /// Directory for the rolling diagnostic log. Defaults to `<storage>/logs`.
    pub log_directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            module_levels: HashMap::new(),
            log_directory: None,
        }
    }
}

impl LoggingConfig {
    /// Filter directive string: the base level followed by module overrides.
    pub fn filter_directives(&self) -> String {
        let mut modules: Vec<_> = self.module_levels.iter().collect();
        modules.sort();

        let mut filter_str = self.level.clone();
        for (module, level) in modules {
            filter_str.push_str(&format!(",{}={}", module, level));
        }
        filter_str
    }
}

fn default_folder_name() -> String {
    "Random-Wiki-Logs".to_string()
}

fn default_wiki_base_url() -> String {
    WIKI_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_categories() -> Vec<String> {
    [
        "Natural_sciences",
        "Applied_sciences",
        "Modern_philosophy",
        "World_history",
        "Human_geography",
        "Computer_science",
        "Astronomy",
        "Cognitive_psychology",
        "Visual_arts",
        "Literature",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_root: StorageRoot::default(),
            folder_name: default_folder_name(),
            wiki_base_url: default_wiki_base_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            interactive: RetryConfig::interactive(),
            launcher: RetryConfig::launcher(),
            categories: default_categories(),
            last_category: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Look for `config.ron` in the working directory, then next to the
    /// executable. Falls back to defaults.
    pub fn load() -> (Self, Option<PathBuf>) {
        let mut candidates = vec![PathBuf::from(CONFIG_FILE)];

        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            candidates.push(dir.join(CONFIG_FILE));
        }

        for path in candidates {
            if path.exists()
                && let Some(config) = Self::load_from(&path)
            {
                return (config, Some(path));
            }
        }

        tracing::info!("No config file found, using defaults");
        (Self::default(), None)
    }

    /// Parse a specific file. Read or parse failures are logged and yield `None`.
    pub fn load_from(path: &Path) -> Option<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("Failed to read config at {}: {}", path.display(), e);
                return None;
            }
        };

        match ron::from_str::<AppConfig>(&content) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                Some(config)
            }
            Err(e) => {
                tracing::error!("Failed to parse config at {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Directory holding the history and activity files.
    pub fn storage_dir(&self) -> PathBuf {
        self.storage_root
            .resolve(&self.folder_name)
            .unwrap_or_else(|| PathBuf::from(&self.folder_name))
    }

    /// Directory for the diagnostic tracing log.
    pub fn log_dir(&self) -> PathBuf {
        match &self.logging.log_directory {
            Some(dir) => PathBuf::from(dir),
            None => self.storage_dir().join("logs"),
        }
    }

    /// Topics in display order, "Any" first.
    pub fn topics(&self) -> Vec<String> {
        std::iter::once(crate::api::ANY_TOPIC.to_string())
            .chain(self.categories.iter().cloned())
            .collect()
    }

    /// Write the config to `path`. When the file already exists only the
    /// `last_category` value is rewritten so hand-written comments survive.
    pub fn save_to(&self, path: &Path) {
        let existing_content = fs::read_to_string(path).unwrap_or_default();

        if existing_content.is_empty() {
            let pretty = ron::ser::PrettyConfig::default()
                .depth_limit(3)
                .separate_tuple_members(true);

            match ron::ser::to_string_pretty(self, pretty) {
                Ok(content) => match fs::write(path, content) {
                    Ok(()) => tracing::info!("Saved config to {}", path.display()),
                    Err(e) => {
                        tracing::error!("Failed to write config to {}: {}", path.display(), e)
                    }
                },
                Err(e) => tracing::error!("Failed to serialize config: {}", e),
            }
            return;
        }

        let value = match &self.last_category {
            Some(category) => format!("Some({:?})", category),
            None => "None".to_string(),
        };

        // Matches `last_category: None` or `last_category: Some("...")`.
        let re = match RegexBuilder::new(r#"(\s*last_category\s*:\s*)(None|Some\("[^"]*"\))"#)
            .build()
        {
            Ok(re) => re,
            Err(e) => {
                tracing::error!("Invalid config rewrite pattern: {}", e);
                return;
            }
        };

        let new_content = match re.is_match(&existing_content) {
            true => re
                .replace(&existing_content, format!("${{1}}{}", value))
                .to_string(),
            // Key absent: insert it before the closing parenthesis.
            false => match existing_content.rfind(')') {
                Some(idx) => {
                    let (head, tail) = existing_content.split_at(idx);
                    let head = head.trim_end();
                    let sep = if head.ends_with(',') || head.ends_with('(') {
                        ""
                    } else {
                        ","
                    };
                    format!("{}{}\n    last_category: {},\n{}", head, sep, value, tail)
                }
                None => existing_content.clone(),
            },
        };

        match fs::write(path, new_content) {
            Ok(()) => tracing::info!("Updated config at {} (preserving comments)", path.display()),
            Err(e) => tracing::error!("Failed to update config at {}: {}", path.display(), e),
        }
    }
}
