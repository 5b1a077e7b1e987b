//! Environment configuration.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::NavvyError;

pub const PROVIDER_ENV_VAR: &str = "NAVVY_PROVIDER";
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";
pub const MODEL_ENV_VAR: &str = "NAVVY_MODEL";
pub const BASE_URL_ENV_VAR: &str = "OPENAI_BASE_URL";
pub const TIMEOUT_ENV_VAR: &str = "NAVVY_TIMEOUT_SEC";
pub const SYSTEM_MESSAGE_ENV_VAR: &str = "NAVVY_SYSTEM_MESSAGE";

pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Which chat provider backs a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Mock,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = NavvyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            unknown => Err(NavvyError::Config(format!(
                "Unsupported provider '{unknown}'. Available providers: openai, mock"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavvyConfig {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
    pub system_message: Option<String>,
}

impl Default for NavvyConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            timeout: None,
            system_message: None,
        }
    }
}

impl NavvyConfig {
    /// Reads configuration from the process environment; blank values count as unset.
    pub fn from_env() -> Result<Self, NavvyError> {
        let provider = match env_string_opt(PROVIDER_ENV_VAR) {
            Some(value) => value.parse()?,
            None => ProviderKind::default(),
        };

        let timeout = match env_string_opt(TIMEOUT_ENV_VAR) {
            Some(value) => Some(parse_timeout_secs(&value)?),
            None => None,
        };

        Ok(Self {
            provider,
            api_key: env_string_opt(API_KEY_ENV_VAR),
            model: env_string_opt(MODEL_ENV_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: env_string_opt(BASE_URL_ENV_VAR),
            timeout,
            system_message: env_string_opt(SYSTEM_MESSAGE_ENV_VAR),
        })
    }

    #[must_use]
    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

fn parse_timeout_secs(value: &str) -> Result<Duration, NavvyError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(NavvyError::Config(format!(
            "{TIMEOUT_ENV_VAR} must be a positive number of seconds, got '{value}'"
        ))),
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    const ALL_KEYS: [&str; 6] = [
        PROVIDER_ENV_VAR,
        API_KEY_ENV_VAR,
        MODEL_ENV_VAR,
        BASE_URL_ENV_VAR,
        TIMEOUT_ENV_VAR,
        SYSTEM_MESSAGE_ENV_VAR,
    ];

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    fn clear_all() -> Vec<EnvGuard> {
        ALL_KEYS
            .iter()
            .map(|key| set_env_guard(key, None))
            .collect()
    }

    #[test]
    fn env_defaults_select_openai_and_gpt_4o() {
        let _lock = env_lock();
        let _guards = clear_all();

        let config = NavvyConfig::from_env().expect("defaults parse");
        assert_eq!(config, NavvyConfig::default());
        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert_eq!(config.model, "gpt-4o");
    }

    #[test]
    fn env_values_are_read() {
        let _lock = env_lock();
        let _guards = clear_all();
        let _g1 = set_env_guard(PROVIDER_ENV_VAR, Some("Mock"));
        let _g2 = set_env_guard(API_KEY_ENV_VAR, Some("sk-test"));
        let _g3 = set_env_guard(MODEL_ENV_VAR, Some("gpt-4o-mini"));
        let _g4 = set_env_guard(BASE_URL_ENV_VAR, Some("http://localhost:11434/v1"));
        let _g5 = set_env_guard(TIMEOUT_ENV_VAR, Some("30"));
        let _g6 = set_env_guard(SYSTEM_MESSAGE_ENV_VAR, Some("Be terse."));

        let config = NavvyConfig::from_env().expect("config parses");
        assert_eq!(config.provider, ProviderKind::Mock);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.system_message.as_deref(), Some("Be terse."));
    }

    #[test]
    fn blank_values_are_ignored() {
        let _lock = env_lock();
        let _guards = clear_all();
        let _g1 = set_env_guard(API_KEY_ENV_VAR, Some("   "));
        let _g2 = set_env_guard(MODEL_ENV_VAR, Some(""));

        let config = NavvyConfig::from_env().expect("config parses");
        assert!(config.api_key.is_none());
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let _lock = env_lock();
        let _guards = clear_all();
        let _g1 = set_env_guard(PROVIDER_ENV_VAR, Some("custom"));

        let error = NavvyConfig::from_env().expect_err("unknown provider");
        assert!(error.to_string().contains("Unsupported provider 'custom'"));
    }

    #[test]
    fn zero_or_garbage_timeout_is_rejected() {
        let _lock = env_lock();
        let _guards = clear_all();

        for value in ["0", "soon", "-5"] {
            let _g = set_env_guard(TIMEOUT_ENV_VAR, Some(value));
            assert!(NavvyConfig::from_env().is_err(), "timeout {value:?} should fail");
        }
    }
}
