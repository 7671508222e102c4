// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::domain::{ChangeType, ComparisonStrategy, ProviderKind, RangeDefaults, WritingStyle};
use crate::error::{Error, Result};

/// Per-backend settings under `[providers.<name>]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BackendConfig {
    /// Model name; the backend default when unset
    #[serde(default)]
    pub model: Option<String>,

    /// Base URL override for proxies and compatible gateways
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: BackendConfig,
    #[serde(default)]
    pub anthropic: BackendConfig,
    #[serde(default)]
    pub gemini: BackendConfig,
}

impl ProvidersConfig {
    pub fn get(&self, kind: ProviderKind) -> Option<&BackendConfig> {
        match kind {
            ProviderKind::OpenAI => Some(&self.openai),
            ProviderKind::Anthropic => Some(&self.anthropic),
            ProviderKind::Gemini => Some(&self.gemini),
            ProviderKind::Offline => None,
        }
    }

    pub fn get_mut(&mut self, kind: ProviderKind) -> Option<&mut BackendConfig> {
        match kind {
            ProviderKind::OpenAI => Some(&mut self.openai),
            ProviderKind::Anthropic => Some(&mut self.anthropic),
            ProviderKind::Gemini => Some(&mut self.gemini),
            ProviderKind::Offline => None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Writing register for generated descriptions
    #[serde(default)]
    pub style: WritingStyle,

    #[serde(default = "default_commit_count")]
    pub default_commit_count: usize,

    /// Types kept in the rendered changelog
    #[serde(default = "default_included_types")]
    pub included_types: Vec<ChangeType>,

    /// Drop `style` entries from the output
    #[serde(default)]
    pub skip_formatting_commits: bool,

    #[serde(default)]
    pub group_by_author: bool,

    #[serde(default)]
    pub comparison_strategy: ComparisonStrategy,

    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    #[serde(default)]
    pub include_merge_commits: bool,

    #[serde(default = "default_true")]
    pub include_unmerged: bool,

    #[serde(default)]
    pub primary_provider: ProviderKind,

    /// Provider tried after the primary; `"none"` disables it.
    #[serde(default = "default_fallback_provider", with = "fallback_serde")]
    pub fallback_provider: Option<ProviderKind>,

    /// LLM temperature (0.0-2.0, default 0.3)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate per request (default 500)
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Transport timeout in seconds (default 300)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum diff lines retrieved per commit
    #[serde(default = "default_max_diff_lines")]
    pub max_diff_lines: usize,

    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,

    #[serde(default)]
    pub providers: ProvidersConfig,
}

fn default_commit_count() -> usize {
    10
}
fn default_included_types() -> Vec<ChangeType> {
    ChangeType::VARIANTS.to_vec()
}
fn default_base_branch() -> String {
    "main".into()
}
fn default_fallback_provider() -> Option<ProviderKind> {
    Some(ProviderKind::Anthropic)
}

mod fallback_serde {
    use serde::{Deserialize, Deserializer, Serializer, de};

    use crate::domain::ProviderKind;

    pub fn serialize<S: Serializer>(
        value: &Option<ProviderKind>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.map_or("none", |kind| kind.as_str()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ProviderKind>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.trim() {
            s if s.is_empty() || s.eq_ignore_ascii_case("none") => Ok(None),
            s => s.parse().map(Some).map_err(de::Error::custom),
        }
    }
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_output_tokens() -> u32 {
    500
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_max_diff_lines() -> usize {
    500
}
fn default_output_file() -> PathBuf {
    PathBuf::from("RELEASE_NOTES.md")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            style: WritingStyle::default(),
            default_commit_count: default_commit_count(),
            included_types: default_included_types(),
            skip_formatting_commits: false,
            group_by_author: false,
            comparison_strategy: ComparisonStrategy::default(),
            base_branch: default_base_branch(),
            include_merge_commits: false,
            include_unmerged: true,
            primary_provider: ProviderKind::default(),
            fallback_provider: default_fallback_provider(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
            max_diff_lines: default_max_diff_lines(),
            output_file: default_output_file(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl Config {
    /// Load with priority: CLI > ENV > user config > project config > defaults
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Project-level config (.changewise.toml in the working directory)
        if let Ok(cwd) = std::env::current_dir() {
            let project_config = cwd.join(".changewise.toml");
            if project_config.exists() {
                figment = figment.merge(Toml::file(&project_config));
            }
        }

        if let Some(path) = Self::config_path()
            && path.exists()
        {
            figment = figment.merge(Toml::file(&path));
        }

        // CHANGEWISE_STYLE, CHANGEWISE_PROVIDERS__OPENAI__MODEL, ...
        // The API key variables belong to the secret store, not to Config.
        figment = figment.merge(
            Env::prefixed("CHANGEWISE_")
                .ignore(&["openai_api_key", "anthropic_api_key", "gemini_api_key"])
                .split("__"),
        );

        let mut config: Config = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "changewise").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(style) = cli.style {
            self.style = style;
        }
        if let Some(provider) = cli.provider {
            self.primary_provider = provider;
        }
    }

    pub fn model_for(&self, kind: ProviderKind) -> String {
        self.providers
            .get(kind)
            .and_then(|b| b.model.clone())
            .unwrap_or_else(|| kind.default_model().to_string())
    }

    pub fn base_url_for(&self, kind: ProviderKind) -> Option<String> {
        self.providers.get(kind).and_then(|b| b.base_url.clone())
    }

    pub fn range_defaults(&self) -> RangeDefaults {
        RangeDefaults {
            count: self.default_commit_count,
            strategy: self.comparison_strategy,
            base_branch: self.base_branch.clone(),
            include_merge_commits: self.include_merge_commits,
            include_unmerged: self.include_unmerged,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=10_000).contains(&self.default_commit_count) {
            return Err(Error::Config(format!(
                "default_commit_count must be 1–10000, got {}",
                self.default_commit_count
            )));
        }

        if !(10..=10_000).contains(&self.max_diff_lines) {
            return Err(Error::Config(format!(
                "max_diff_lines must be 10–10000, got {}",
                self.max_diff_lines
            )));
        }

        if !(1..=3600).contains(&self.timeout_secs) {
            return Err(Error::Config(format!(
                "timeout_secs must be 1–3600, got {}",
                self.timeout_secs
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Config(format!(
                "temperature must be 0.0–2.0, got {}",
                self.temperature
            )));
        }

        if !(16..=8_192).contains(&self.max_output_tokens) {
            return Err(Error::Config(format!(
                "max_output_tokens must be 16–8192, got {}",
                self.max_output_tokens
            )));
        }

        if self.included_types.is_empty() {
            return Err(Error::Config("included_types cannot be empty".into()));
        }

        if self.base_branch.trim().is_empty() {
            return Err(Error::Config("base_branch cannot be empty".into()));
        }

        for kind in ProviderKind::HOSTED {
            if let Some(raw) = self.base_url_for(kind) {
                let parsed = url::Url::parse(&raw).map_err(|e| {
                    Error::Config(format!("providers.{kind}.base_url is not a URL: {e}"))
                })?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(Error::Config(format!(
                        "providers.{kind}.base_url must use http:// or https://, got '{raw}'"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Persist one setting to the user config file. Dotted keys address
    /// nested tables (`providers.openai.model`). The value is parsed as a
    /// TOML literal when possible, else stored as a string; the resulting
    /// file must still deserialize into a valid `Config`.
    pub fn update(key: &str, value: &str) -> Result<PathBuf> {
        let path = Self::config_path()
            .ok_or_else(|| Error::Config("Cannot determine config directory".into()))?;
        Self::update_file(&path, key, value)?;
        Ok(path)
    }

    pub fn update_file(path: &Path, key: &str, value: &str) -> Result<()> {
        let mut table: toml::Table = if path.exists() {
            fs::read_to_string(path)?
                .parse()
                .map_err(|e: toml::de::Error| Error::Config(e.to_string()))?
        } else {
            toml::Table::new()
        };

        let parsed = parse_toml_value(value);
        let segments: Vec<&str> = key.split('.').collect();
        let Some((leaf, parents)) = segments.split_last() else {
            return Err(Error::Config("empty config key".into()));
        };

        let mut cursor = &mut table;
        for segment in parents {
            let entry = cursor
                .entry(segment.to_string())
                .or_insert_with(|| toml::Value::Table(toml::Table::new()));
            cursor = entry
                .as_table_mut()
                .ok_or_else(|| Error::Config(format!("'{segment}' is not a table")))?;
        }
        cursor.insert(leaf.to_string(), parsed);

        let rendered =
            toml::to_string_pretty(&table).map_err(|e| Error::Config(e.to_string()))?;

        let candidate: Config =
            toml::from_str(&rendered).map_err(|e| Error::Config(format!("{key}: {e}")))?;
        candidate.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, rendered)?;
        set_owner_only(path)?;
        Ok(())
    }

    /// Create default config file with secure permissions
    pub fn create_default() -> Result<PathBuf> {
        let Some(dir) = Self::config_dir() else {
            return Err(Error::Config("Cannot determine config directory".into()));
        };

        fs::create_dir_all(&dir)?;

        let path = dir.join("config.toml");
        let content = r#"# changewise configuration

# Writing register: formal, dev-friendly, pm-style
style = "formal"

# Commits to read when no range is given
default_commit_count = 10

# Types kept in the rendered notes
included_types = ["feat", "fix", "refactor", "docs", "style", "test", "chore"]
skip_formatting_commits = false
group_by_author = false

# Branch comparison: one-way, symmetric, merge-base
comparison_strategy = "one-way"
base_branch = "main"
include_merge_commits = false
include_unmerged = true

# Hosted providers: openai, anthropic, gemini (offline is always available)
primary_provider = "openai"
fallback_provider = "anthropic"   # or "none"

temperature = 0.3
max_output_tokens = 500
output_file = "RELEASE_NOTES.md"

[providers.openai]
# model = "gpt-4o-mini"
# base_url = "https://api.openai.com/v1"

[providers.anthropic]
# model = "claude-3-5-haiku-latest"

[providers.gemini]
# model = "gemini-1.5-flash"
"#;

        fs::write(&path, content)?;
        set_owner_only(&path)?;

        Ok(path)
    }
}

fn parse_toml_value(raw: &str) -> toml::Value {
    let wrapped = format!("v = {raw}");
    match wrapped.parse::<toml::Table>() {
        Ok(mut t) => t.remove("v").unwrap_or_else(|| toml::Value::String(raw.to_string())),
        Err(_) => toml::Value::String(raw.to_string()),
    }
}

fn set_owner_only(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
