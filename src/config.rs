use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Rate applied when the user has not chosen one, in $/kWh.
pub const DEFAULT_RATE: f64 = 0.41;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub account: Option<AccountConfig>,
    #[serde(default = "default_preferences_path")]
    pub preferences_path: PathBuf,
    #[serde(default = "default_rate")]
    pub default_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Memory,
    Rest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// YAML fixture loaded into the in-memory backend at startup
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub email: String,
    pub password: String,
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from("preferences.json")
}

fn default_rate() -> f64 {
    DEFAULT_RATE
}

fn default_poll_interval_secs() -> u64 {
    5
}

impl Config {
    /// Load YAML from disk, substitute $(VAR)/${VAR} with env vars, then parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let expanded = expand_env_placeholders(raw)?;
        let mut cfg: Self = serde_yaml::from_str(&expanded)?;

        if let Ok(key) = std::env::var("FIREBASE_API_KEY") {
            cfg.backend.api_key = Some(key);
        }
        if let Ok(project) = std::env::var("FIREBASE_PROJECT_ID") {
            cfg.backend.project_id = Some(project);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.backend.kind == BackendKind::Rest {
            let missing = |v: &Option<String>| v.as_deref().map(str::is_empty).unwrap_or(true);
            if missing(&self.backend.project_id) {
                return Err(AppError::Config(
                    "backend.project_id is required for the rest backend".to_string(),
                ));
            }
            if missing(&self.backend.api_key) {
                return Err(AppError::Config(
                    "backend.api_key is required for the rest backend".to_string(),
                ));
            }
        }

        if self.backend.poll_interval_secs == 0 {
            return Err(AppError::Config(
                "backend.poll_interval_secs cannot be 0".to_string(),
            ));
        }

        if !(self.default_rate.is_finite() && self.default_rate >= 0.0) {
            return Err(AppError::Config(
                "default_rate must be a non-negative number".to_string(),
            ));
        }

        Ok(())
    }
}

/// Expand $(VAR) and ${VAR} placeholders using environment variables.
/// "$$" escapes a literal dollar sign.
fn expand_env_placeholders(input: &str) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut it = input.chars().peekable();

    while let Some(c) = it.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        let close = match it.peek().copied() {
            Some('$') => {
                it.next();
                out.push('$');
                continue;
            }
            Some('(') => ')',
            Some('{') => '}',
            _ => {
                out.push('$');
                continue;
            }
        };

        it.next();
        let mut var = String::new();
        let mut terminated = false;
        for ch in it.by_ref() {
            if ch == close {
                terminated = true;
                break;
            }
            var.push(ch);
        }

        if !terminated {
            return Err(AppError::Config(format!(
                "unterminated env placeholder: missing '{}'",
                close
            )));
        }

        let value = std::env::var(&var)
            .map_err(|_| AppError::Config(format!("missing environment variable: {}", var)))?;
        out.push_str(&value);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_expand_both_placeholder_forms() {
        std::env::set_var("HEC_TEST_A", "alpha");
        std::env::set_var("HEC_TEST_B", "beta");

        let output = expand_env_placeholders("a: $(HEC_TEST_A)\nb: ${HEC_TEST_B}").unwrap();
        assert_eq!(output, "a: alpha\nb: beta");

        std::env::remove_var("HEC_TEST_A");
        std::env::remove_var("HEC_TEST_B");
    }

    #[test]
    fn test_expand_escaped_dollar() {
        let output = expand_env_placeholders("price: $$5 and $ alone").unwrap();
        assert_eq!(output, "price: $5 and $ alone");
    }

    #[test]
    #[serial]
    fn test_expand_missing_variable_fails() {
        std::env::remove_var("HEC_TEST_MISSING");
        let result = expand_env_placeholders("key: $(HEC_TEST_MISSING)");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_expand_unterminated_placeholder_fails() {
        let result = expand_env_placeholders("key: ${NEVER_CLOSED");
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_memory_backend_defaults() {
        std::env::remove_var("FIREBASE_API_KEY");
        std::env::remove_var("FIREBASE_PROJECT_ID");

        let cfg = Config::from_yaml("backend:\n  kind: memory\n").unwrap();
        assert_eq!(cfg.backend.kind, BackendKind::Memory);
        assert_eq!(cfg.backend.poll_interval_secs, 5);
        assert_eq!(cfg.default_rate, DEFAULT_RATE);
        assert!(cfg.account.is_none());
    }

    #[test]
    #[serial]
    fn test_rest_backend_requires_credentials() {
        std::env::remove_var("FIREBASE_API_KEY");
        std::env::remove_var("FIREBASE_PROJECT_ID");

        let result = Config::from_yaml("backend:\n  kind: rest\n  project_id: demo\n");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_env_overrides_api_key() {
        std::env::set_var("FIREBASE_API_KEY", "from-env");
        std::env::remove_var("FIREBASE_PROJECT_ID");

        let cfg =
            Config::from_yaml("backend:\n  kind: rest\n  project_id: demo\n  api_key: from-file\n")
                .unwrap();
        assert_eq!(cfg.backend.api_key.as_deref(), Some("from-env"));

        std::env::remove_var("FIREBASE_API_KEY");
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let result = Config::from_yaml("backend:\n  kind: memory\n  poll_interval_secs: 0\n");
        assert!(result.is_err());
    }
}
