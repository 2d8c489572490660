use std::env;
use std::fmt;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::workflows::performance::{
    AssessmentScope, CalibrationConfig, GroupConfig, NormalizationMethod, ReviewEngineConfig,
    ScoringConfig, SubScoreDomain,
};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub review: ReviewConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            review: ReviewConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Scoring and calibration parameters plus the optional HR settings file.
#[derive(Debug, Clone, Default)]
pub struct ReviewConfig {
    pub engine: ReviewEngineConfig,
    pub settings_path: Option<PathBuf>,
}

impl ReviewConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = CalibrationConfig::default();

        let sub_score_domain = match env::var("PERF_SUBSCORE_DOMAIN") {
            Ok(value) => SubScoreDomain::parse(&value)
                .ok_or_else(|| ConfigError::invalid("PERF_SUBSCORE_DOMAIN", value))?,
            Err(_) => SubScoreDomain::default(),
        };

        let method = match env::var("PERF_NORMALIZATION_METHOD") {
            Ok(value) => NormalizationMethod::parse(&value)
                .ok_or_else(|| ConfigError::invalid("PERF_NORMALIZATION_METHOD", value))?,
            Err(_) => defaults.method,
        };

        let minimum_sample_size = match env::var("PERF_CALIBRATION_MIN_SAMPLE") {
            Ok(value) => match value.trim().parse::<usize>() {
                Ok(parsed) if parsed > 0 => parsed,
                _ => return Err(ConfigError::invalid("PERF_CALIBRATION_MIN_SAMPLE", value)),
            },
            Err(_) => defaults.minimum_sample_size,
        };

        let strictness_multiplier =
            non_negative("PERF_STRICTNESS_MULTIPLIER", defaults.strictness_multiplier)?;
        let flat_stddev_threshold =
            non_negative("PERF_FLAT_STDDEV_THRESHOLD", defaults.flat_stddev_threshold)?;

        let normalize = match env::var("PERF_NORMALIZE") {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(ConfigError::invalid("PERF_NORMALIZE", value)),
            },
            Err(_) => defaults.normalize,
        };

        let settings_path = env::var("PERF_SETTINGS_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            engine: ReviewEngineConfig {
                scoring: ScoringConfig { sub_score_domain },
                calibration: CalibrationConfig {
                    minimum_sample_size,
                    strictness_multiplier,
                    flat_stddev_threshold,
                    normalize,
                    method,
                },
            },
            settings_path,
        })
    }

    /// Read the HR settings file, or the built-in defaults when none is configured.
    pub fn load_settings(&self) -> Result<SettingsFile, ConfigError> {
        match &self.settings_path {
            Some(path) => SettingsFile::load(path),
            None => Ok(SettingsFile::default()),
        }
    }
}

fn non_negative(var: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(var) {
        Ok(value) => match value.trim().parse::<f64>() {
            Ok(parsed) if parsed.is_finite() && parsed >= 0.0 => Ok(parsed),
            _ => Err(ConfigError::invalid(var, value)),
        },
        Err(_) => Ok(default),
    }
}

/// HR-editable settings persisted as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub group_config: GroupConfig,
    #[serde(default = "AssessmentScope::unrestricted")]
    pub assessment_scope: AssessmentScope,
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            group_config: GroupConfig::default(),
            assessment_scope: AssessmentScope::unrestricted(),
        }
    }
}

impl SettingsFile {
    /// A missing file yields the defaults; an unreadable or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::SettingsParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidSetting {
        var: &'static str,
        value: String,
    },
    SettingsIo {
        path: PathBuf,
        source: std::io::Error,
    },
    SettingsParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: String) -> Self {
        Self::InvalidSetting { var, value }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSetting { var, value } => {
                write!(f, "{var} has an unsupported value '{value}'")
            }
            ConfigError::SettingsIo { path, .. } => {
                write!(f, "unable to read settings file {}", path.display())
            }
            ConfigError::SettingsParse { path, .. } => {
                write!(f, "settings file {} is not valid JSON", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidSetting { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::SettingsIo { source, .. } => Some(source),
            ConfigError::SettingsParse { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for var in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "PERF_SUBSCORE_DOMAIN",
            "PERF_CALIBRATION_MIN_SAMPLE",
            "PERF_STRICTNESS_MULTIPLIER",
            "PERF_FLAT_STDDEV_THRESHOLD",
            "PERF_NORMALIZE",
            "PERF_NORMALIZATION_METHOD",
            "PERF_SETTINGS_PATH",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.review.engine, ReviewEngineConfig::default());
        assert!(config.review.settings_path.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn review_overrides_are_read_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PERF_SUBSCORE_DOMAIN", "bounded");
        env::set_var("PERF_CALIBRATION_MIN_SAMPLE", "5");
        env::set_var("PERF_STRICTNESS_MULTIPLIER", "0.75");
        env::set_var("PERF_NORMALIZE", "off");
        env::set_var("PERF_NORMALIZATION_METHOD", "min-max");

        let config = AppConfig::load().expect("config loads");
        let engine = config.review.engine;
        assert_eq!(engine.scoring.sub_score_domain, SubScoreDomain::Bounded);
        assert_eq!(engine.calibration.minimum_sample_size, 5);
        assert_eq!(engine.calibration.strictness_multiplier, 0.75);
        assert!(!engine.calibration.normalize);
        assert_eq!(engine.calibration.method, NormalizationMethod::MinMax);
        reset_env();
    }

    #[test]
    fn invalid_review_value_names_the_variable() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PERF_STRICTNESS_MULTIPLIER", "-1");

        let error = AppConfig::load().expect_err("negative multiplier rejected");
        assert!(error.to_string().contains("PERF_STRICTNESS_MULTIPLIER"));
        reset_env();
    }

    #[test]
    fn missing_settings_file_falls_back_to_defaults() {
        let path = env::temp_dir().join("perf-review-settings-that-does-not-exist.json");
        let settings = SettingsFile::load(&path).expect("defaults");
        assert_eq!(settings, SettingsFile::default());
        assert!(settings.assessment_scope.include_all);
    }

    #[test]
    fn settings_file_is_parsed() {
        let path = env::temp_dir().join(format!("perf-review-settings-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{
                "group_config": { "cross_dept_groups": ["Testing"] },
                "assessment_scope": { "root_departments": ["Engineering"] }
            }"#,
        )
        .expect("write settings");

        let settings = SettingsFile::load(&path).expect("settings parse");
        fs::remove_file(&path).ok();

        assert_eq!(settings.group_config.cross_dept_groups, vec!["Testing".to_string()]);
        assert_eq!(
            settings.group_config.high_levels,
            GroupConfig::default().high_levels
        );
        assert!(!settings.assessment_scope.include_all);
        assert!(settings
            .assessment_scope
            .root_departments
            .contains("Engineering"));
    }
}
