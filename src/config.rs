use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Production Starling API host.
pub const STARLING_PROD_URL: &str = "https://api.starlingbank.com";

/// Sandbox Starling API host.
pub const STARLING_SANDBOX_URL: &str = "https://api-sandbox.starlingbank.com";

/// Default cache key holding the last processed webhook event uid.
pub const DEFAULT_DEDUP_KEY: &str = "last_processed_event_uid";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {name}: {value}")]
    InvalidOverride { name: &'static str, value: String },

    #[error("No savings goal set")]
    NoGoal,

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub log: LogConfig,
    pub bank: BankConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub signature: SignatureConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogConfig {
    pub level: String,
    /// Directory for the rolling log file; stdout only when unset
    #[serde(default)]
    pub dir: Option<String>,
    pub file: String,
    pub use_json: bool,
    pub rotation: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
            file: "starling_sweep.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BankConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub account_uid: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    STARLING_PROD_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: String::new(),
            account_uid: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Which transfers the service makes and where they go.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct PolicyConfig {
    /// Savings goal receiving card round-ups
    #[serde(default)]
    pub round_up_goal: Option<String>,
    /// Savings goal receiving sweeps
    #[serde(default)]
    pub sweep_goal: Option<String>,
    /// Minor units; zero or negative disables sweeping
    #[serde(default)]
    pub sweep_threshold: i64,
}

impl PolicyConfig {
    pub fn has_any_goal(&self) -> bool {
        self.round_up_goal.is_some() || self.sweep_goal.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SignatureScheme {
    /// RSA PKCS#1 v1.5 over SHA-512 with the platform's public key
    #[default]
    Rsa,
    /// Legacy base64(SHA-512(secret || body))
    SharedSecret,
}

/// What the webhook endpoint answers when signature verification fails.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailureResponse {
    /// 200 OK, so the platform does not redeliver
    #[default]
    Acknowledge,
    /// 401 Unauthorized
    Reject,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SignatureConfig {
    #[serde(default)]
    pub scheme: SignatureScheme,
    /// Base64 DER SubjectPublicKeyInfo
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub shared_secret: Option<String>,
    /// Skips verification entirely. Test environments only.
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub on_failure: AuthFailureResponse,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    #[default]
    Redis,
    Memory,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DedupMode {
    /// Plain get then set; concurrent duplicates can both pass
    #[default]
    ReadThenWrite,
    /// Single atomic set-if-different on the cache
    Atomic,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_dedup_key")]
    pub key: String,
    #[serde(default)]
    pub ttl_secs: Option<u64>,
    #[serde(default)]
    pub mode: DedupMode,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_dedup_key() -> String {
    DEFAULT_DEDUP_KEY.to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            url: default_redis_url(),
            key: default_dedup_key(),
            ttl_secs: None,
            mode: DedupMode::default(),
        }
    }
}

impl AppConfig {
    /// Load `config/{env}.yaml`, apply process environment overrides and validate.
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        Self::load_from(format!("config/{}.yaml", env))
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_yaml(&content)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Overlay settings from environment-style variables.
    ///
    /// `lookup` is usually `std::env::var`; tests pass a map instead.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("PERSONAL_ACCESS_TOKEN") {
            self.bank.access_token = v;
        }
        if let Some(v) = get("ACCOUNT_UID") {
            self.bank.account_uid = v;
        }
        if let Some(v) = get("SAVING_GOAL") {
            self.policy.round_up_goal = Some(v);
        }
        if let Some(v) = get("SWEEP_GOAL") {
            self.policy.sweep_goal = Some(v);
        }
        if let Some(v) = get("SWEEP_THRESHOLD") {
            self.policy.sweep_threshold =
                v.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidOverride {
                        name: "SWEEP_THRESHOLD",
                        value: v.clone(),
                    })?;
        }
        if let Some(v) = get("PUBLIC_KEY") {
            self.signature.public_key = Some(v);
        }
        if let Some(v) = get("WEBHOOK_SECRET") {
            self.signature.shared_secret = Some(v);
        }
        // Presence alone enables the bypass
        if lookup("SKIP_SIG").is_some() {
            self.signature.skip = true;
        }
        if let Some(v) = get("REDIS_URL") {
            self.cache.url = v;
        }
        if let Some(v) = get("FUNCTIONS_CUSTOMHANDLER_PORT") {
            self.server.port = v.trim().parse().map_err(|_| ConfigError::InvalidOverride {
                name: "FUNCTIONS_CUSTOMHANDLER_PORT",
                value: v.clone(),
            })?;
        }

        // Blank goals in YAML mean "not set"
        self.policy.round_up_goal = self.policy.round_up_goal.take().filter(|g| !g.is_empty());
        self.policy.sweep_goal = self.policy.sweep_goal.take().filter(|g| !g.is_empty());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.policy.has_any_goal() {
            return Err(ConfigError::NoGoal);
        }
        if self.bank.access_token.is_empty() {
            return Err(ConfigError::Missing("bank.access_token"));
        }
        if self.bank.account_uid.is_empty() {
            return Err(ConfigError::Missing("bank.account_uid"));
        }
        if !self.signature.skip {
            match self.signature.scheme {
                SignatureScheme::Rsa if self.signature.public_key.is_none() => {
                    return Err(ConfigError::Missing("signature.public_key"));
                }
                SignatureScheme::SharedSecret if self.signature.shared_secret.is_none() => {
                    return Err(ConfigError::Missing("signature.shared_secret"));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const MINIMAL: &str = r#"
bank:
  access_token: "token"
  account_uid: "acc-1"
policy:
  sweep_goal: "goal-sweep"
  sweep_threshold: 100000
signature:
  skip: true
"#;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_minimal_yaml_defaults() {
        let config = AppConfig::from_yaml(MINIMAL).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.bank.base_url, STARLING_PROD_URL);
        assert_eq!(config.bank.timeout_secs, 30);
        assert_eq!(config.cache.key, DEFAULT_DEDUP_KEY);
        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(config.cache.mode, DedupMode::ReadThenWrite);
        assert_eq!(config.cache.ttl_secs, None);
        assert_eq!(config.signature.on_failure, AuthFailureResponse::Acknowledge);
        assert_eq!(config.policy.round_up_goal, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 9000
log:
  level: "debug"
  dir: "./logs"
  file: "sweep.log"
  use_json: true
  rotation: "hourly"
bank:
  base_url: "https://api-sandbox.starlingbank.com"
  access_token: "token"
  account_uid: "acc-1"
  timeout_secs: 5
policy:
  round_up_goal: "goal-round"
signature:
  scheme: shared_secret
  shared_secret: "s3cret"
  on_failure: reject
cache:
  backend: memory
  key: "custom_key"
  ttl_secs: 86400
  mode: atomic
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.log.dir.as_deref(), Some("./logs"));
        assert!(config.log.use_json);
        assert_eq!(config.bank.base_url, STARLING_SANDBOX_URL);
        assert_eq!(config.signature.scheme, SignatureScheme::SharedSecret);
        assert_eq!(config.signature.on_failure, AuthFailureResponse::Reject);
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.mode, DedupMode::Atomic);
        assert_eq!(config.cache.ttl_secs, Some(86400));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::from_yaml(MINIMAL).unwrap();
        config
            .apply_overrides(lookup(&[
                ("PERSONAL_ACCESS_TOKEN", "env-token"),
                ("SAVING_GOAL", "env-round"),
                ("SWEEP_THRESHOLD", "50000"),
                ("REDIS_URL", "redis://cache:6379"),
                ("FUNCTIONS_CUSTOMHANDLER_PORT", "7071"),
            ]))
            .unwrap();

        assert_eq!(config.bank.access_token, "env-token");
        assert_eq!(config.bank.account_uid, "acc-1");
        assert_eq!(config.policy.round_up_goal.as_deref(), Some("env-round"));
        assert_eq!(config.policy.sweep_threshold, 50000);
        assert_eq!(config.cache.url, "redis://cache:6379");
        assert_eq!(config.server.port, 7071);
    }

    #[test]
    fn test_bad_threshold_override() {
        let mut config = AppConfig::from_yaml(MINIMAL).unwrap();
        let err = config
            .apply_overrides(lookup(&[("SWEEP_THRESHOLD", "1000.50")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidOverride {
                name: "SWEEP_THRESHOLD",
                ..
            }
        ));
    }

    #[test]
    fn test_skip_sig_presence_enables_bypass() {
        let yaml = MINIMAL.replace("skip: true", "skip: false");
        let mut config = AppConfig::from_yaml(&yaml).unwrap();
        assert!(!config.signature.skip);

        config.apply_overrides(lookup(&[("SKIP_SIG", "")])).unwrap();
        assert!(config.signature.skip);
    }

    #[test]
    fn test_validate_requires_a_goal() {
        let mut config = AppConfig::from_yaml(MINIMAL).unwrap();
        config.policy.sweep_goal = Some(String::new());
        config.apply_overrides(lookup(&[])).unwrap();

        assert!(matches!(config.validate(), Err(ConfigError::NoGoal)));
    }

    #[test]
    fn test_validate_requires_key_material() {
        let yaml = MINIMAL.replace("skip: true", "skip: false");
        let config = AppConfig::from_yaml(&yaml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("signature.public_key"))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.yaml");
        std::fs::write(&path, MINIMAL).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.policy.sweep_goal.as_deref(), Some("goal-sweep"));

        let missing = AppConfig::load_from(dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
