// Configuration loading and parsing (deep_dive.toml).

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Name of the config file under `config/` (and `defaults/`).
pub const CONFIG_FILE: &str = "deep_dive.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// deep_dive.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub fangraphs: FangraphsConfig,
    pub savant: SavantConfig,
    pub http: HttpConfig,
    pub cache: CacheConfig,
    pub ids: IdsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FangraphsConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavantConfig {
    pub base_url: String,
    /// Earliest season with pitch-level data; event years before it are
    /// never requested.
    pub first_season: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub user_agent: String,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdsConfig {
    /// Register CSV, relative to the base directory unless absolute.
    pub register_path: String,
    /// MLBAM id (as a TOML string key) -> FanGraphs id.
    #[serde(default)]
    pub overrides: HashMap<String, u32>,
}

impl IdsConfig {
    /// Overrides keyed by numeric MLBAM id. Keys are checked by `validate`.
    pub fn override_map(&self) -> HashMap<u32, u32> {
        self.overrides
            .iter()
            .filter_map(|(mlbam, fg)| mlbam.trim().parse().ok().map(|m| (m, *fg)))
            .collect()
    }

    pub fn resolve_register_path(&self, base_dir: &Path) -> PathBuf {
        let path = Path::new(&self.register_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/deep_dive.toml` relative to
/// the given `base_dir`.
///
/// This does not copy defaults; see `load_config_in`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the crate root or pass --base-dir",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Copy defaults if needed, then load config relative to `base_dir`.
pub fn load_config_in(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let urls: &[(&str, &str)] = &[
        ("fangraphs.base_url", config.fangraphs.base_url.as_str()),
        ("savant.base_url", config.savant.base_url.as_str()),
    ];
    for (name, url) in urls {
        if url.trim().is_empty() {
            return Err(invalid(name, "must not be empty"));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(invalid(name, format!("must be an http(s) URL, got {url}")));
        }
    }

    if config.savant.first_season < 1900 {
        return Err(invalid(
            "savant.first_season",
            format!("must be >= 1900, got {}", config.savant.first_season),
        ));
    }

    let http = &config.http;
    if http.timeout_secs == 0 {
        return Err(invalid("http.timeout_secs", "must be > 0"));
    }
    if http.max_attempts == 0 {
        return Err(invalid("http.max_attempts", "must be > 0"));
    }
    if http.user_agent.trim().is_empty() {
        return Err(invalid("http.user_agent", "must not be empty"));
    }

    if config.ids.register_path.trim().is_empty() {
        return Err(invalid("ids.register_path", "must not be empty"));
    }
    for key in config.ids.overrides.keys() {
        if key.trim().parse::<u32>().is_err() {
            return Err(invalid(
                "ids.overrides",
                format!("key `{key}` is not a numeric MLBAM id"),
            ));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Helper: returns the path to the deep-dive crate root
    /// (works whether `cargo test` runs from the crate root or repo root).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("deep-dive/defaults").exists() {
            cwd.join("deep-dive")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    /// Fresh temp dir with `config/deep_dive.toml` built from the defaults
    /// with one textual substitution.
    fn config_dir_with(name: &str, from: &str, to: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let config_dir = tmp.join("config");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&config_dir).unwrap();

        let text = fs::read_to_string(project_root().join("defaults").join(CONFIG_FILE)).unwrap();
        assert!(from.is_empty() || text.contains(from), "defaults missing `{from}`");
        fs::write(config_dir.join(CONFIG_FILE), text.replace(from, to)).unwrap();
        tmp
    }

    fn expect_invalid(tmp: &Path, expected_field: &str) {
        let err = load_config_from(tmp).unwrap_err();
        match &err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected_field),
            other => panic!("expected ValidationError, got: {other}"),
        }
        let _ = fs::remove_dir_all(tmp);
    }

    #[test]
    fn load_valid_config_from_defaults() {
        let tmp = config_dir_with("deep_dive_config_valid", "", "");
        let config = load_config_from(&tmp).expect("should load valid config");

        assert_eq!(
            config.fangraphs.base_url,
            "https://www.fangraphs.com/api/players/stats"
        );
        assert!(config.savant.base_url.contains("statcast_search"));
        assert_eq!(config.savant.first_season, 2008);
        assert_eq!(config.http.timeout(), Duration::from_secs(20));
        assert_eq!(config.http.max_attempts, 5);
        assert_eq!(config.http.backoff(), Duration::from_millis(750));
        assert_eq!(config.cache.ttl(), Duration::from_secs(1800));
        assert_eq!(config.ids.register_path, "data/people.csv");
        assert!(config.ids.overrides.is_empty());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn overrides_are_parsed_to_numeric_ids() {
        let tmp = config_dir_with(
            "deep_dive_config_overrides",
            "# \"123456\" = 7890",
            "\"123456\" = 7890",
        );
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.ids.override_map().get(&123456), Some(&7890));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn register_path_resolves_against_base_dir() {
        let tmp = config_dir_with("deep_dive_config_register", "", "");
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(
            config.ids.resolve_register_path(&tmp),
            tmp.join("data/people.csv")
        );
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_file_is_reported() {
        let tmp = std::env::temp_dir().join("deep_dive_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        match load_config_from(&tmp).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with(CONFIG_FILE)),
            other => panic!("expected FileNotFound, got: {other}"),
        }
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let tmp = config_dir_with(
            "deep_dive_config_parse",
            "timeout_secs = 20",
            "timeout_secs = \"soon\"",
        );
        assert!(matches!(
            load_config_from(&tmp).unwrap_err(),
            ConfigError::ParseError { .. }
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_timeout() {
        let tmp =
            config_dir_with("deep_dive_config_timeout", "timeout_secs = 20", "timeout_secs = 0");
        expect_invalid(&tmp, "http.timeout_secs");
    }

    #[test]
    fn rejects_zero_attempts() {
        let tmp =
            config_dir_with("deep_dive_config_attempts", "max_attempts = 5", "max_attempts = 0");
        expect_invalid(&tmp, "http.max_attempts");
    }

    #[test]
    fn rejects_non_http_url() {
        let tmp = config_dir_with(
            "deep_dive_config_url",
            "https://www.fangraphs.com/api/players/stats",
            "ftp://example.invalid",
        );
        expect_invalid(&tmp, "fangraphs.base_url");
    }

    #[test]
    fn rejects_ancient_first_season() {
        let tmp = config_dir_with(
            "deep_dive_config_season",
            "first_season = 2008",
            "first_season = 1850",
        );
        expect_invalid(&tmp, "savant.first_season");
    }

    #[test]
    fn rejects_non_numeric_override_key() {
        let tmp = config_dir_with(
            "deep_dive_config_override_key",
            "# \"123456\" = 7890",
            "\"ohtani\" = 7890",
        );
        expect_invalid(&tmp, "ids.overrides");
    }

    #[test]
    fn ensure_config_files_copies_then_skips() {
        let tmp = std::env::temp_dir().join("deep_dive_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::copy(
            project_root().join("defaults").join(CONFIG_FILE),
            tmp.join("defaults").join(CONFIG_FILE),
        )
        .unwrap();
        fs::write(tmp.join("defaults/notes.toml.example"), "").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied, vec![tmp.join("config").join(CONFIG_FILE)]);
        assert!(!tmp.join("config/notes.toml.example").exists());

        let again = ensure_config_files(&tmp).unwrap();
        assert!(again.is_empty());

        load_config_in(&tmp).expect("copied defaults should load");
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_without_any_dirs_fails() {
        let tmp = std::env::temp_dir().join("deep_dive_config_no_dirs");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        assert!(matches!(
            ensure_config_files(&tmp).unwrap_err(),
            ConfigError::DefaultsCopyError { .. }
        ));
        let _ = fs::remove_dir_all(&tmp);
    }
}
