use crate::utils::error::{DispenserError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// token 有效期上限：一天
pub const MAX_TOKEN_TTL_SECONDS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispenserConfig {
    pub server: ServerConfig,
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub actuators: ActuatorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub login_url: String,
    pub orders_url: String,
    pub bump_url: String,
    pub request_timeout_seconds: Option<u64>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// 登入時送出的裝置資訊
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub device: String,
    pub os: String,
    pub imei: String,
    pub protocol: String,
    pub language: String,
    pub version: String,
    pub app_type: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device: "web".to_string(),
            os: "os".to_string(),
            imei: "imei".to_string(),
            protocol: "2.1".to_string(),
            language: "en-US".to_string(),
            version: String::new(),
            app_type: "kds".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub poll_interval_ms: u64,
    pub collect_delay_ms: u64,
    pub token_ttl_seconds: u64,
    pub bump_attempts: u32,
    pub bump_retry_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            collect_delay_ms: 5_000,
            token_ttl_seconds: 15 * 60,
            bump_attempts: 3,
            bump_retry_delay_ms: 1_000,
        }
    }
}

impl TimingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn collect_delay(&self) -> Duration {
        Duration::from_millis(self.collect_delay_ms)
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.token_ttl_seconds.min(MAX_TOKEN_TTL_SECONDS) as i64)
    }

    pub fn bump_retry_delay(&self) -> Duration {
        Duration::from_millis(self.bump_retry_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorsConfig {
    pub cup_channel: u8,
    pub capsules: BTreeMap<String, u8>,
    pub timing: ServoTimingConfig,
}

impl Default for ActuatorsConfig {
    fn default() -> Self {
        let capsules = [("Ristretto", 17), ("Ispirazione", 27), ("Volluto", 22)]
            .into_iter()
            .map(|(name, pin)| (name.to_string(), pin))
            .collect();

        Self {
            cup_channel: 4,
            capsules,
            timing: ServoTimingConfig::default(),
        }
    }
}

/// 模擬 servo 的單次動作時間（毫秒）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoTimingConfig {
    pub capsule_press_ms: u64,
    pub capsule_release_ms: u64,
    pub cup_open_ms: u64,
    pub cup_shake_ms: u64,
    pub cup_shakes: u32,
    pub cup_close_ms: u64,
}

impl Default for ServoTimingConfig {
    fn default() -> Self {
        Self {
            capsule_press_ms: 300,
            capsule_release_ms: 500,
            cup_open_ms: 300,
            cup_shake_ms: 100,
            cup_shakes: 5,
            cup_close_ms: 300,
        }
    }
}

impl DispenserConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DispenserError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DispenserError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${KDS_PASSWORD})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DispenserError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.server.request_timeout_seconds.map(Duration::from_secs)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("server.login_url", &self.server.login_url)?;
        validation::validate_url("server.orders_url", &self.server.orders_url)?;
        validation::validate_url("server.bump_url", &self.server.bump_url)?;

        validation::validate_non_empty_string("credentials.username", &self.credentials.username)?;
        validation::validate_non_empty_string("credentials.password", &self.credentials.password)?;

        validation::validate_positive_number(
            "timing.bump_attempts",
            self.timing.bump_attempts as u64,
            1,
        )?;
        validation::validate_range(
            "timing.token_ttl_seconds",
            self.timing.token_ttl_seconds,
            1,
            MAX_TOKEN_TTL_SECONDS,
        )?;

        if self.actuators.capsules.is_empty() {
            return Err(DispenserError::ConfigValidationError {
                field: "actuators.capsules".to_string(),
                message: "At least one capsule channel must be configured".to_string(),
            });
        }

        let channels = self
            .actuators
            .capsules
            .iter()
            .map(|(name, pin)| (name.as_str(), *pin))
            .chain(std::iter::once(("cups", self.actuators.cup_channel)));
        validation::validate_unique_channels("actuators", channels)?;

        Ok(())
    }
}

impl Validate for DispenserConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[server]
login_url = "https://kds.example.com/api/login"
orders_url = "https://kds.example.com/api/orders"
bump_url = "https://kds.example.com/api/orders/bump"

[credentials]
username = "kiosk"
password = "secret"
"#;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = DispenserConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.server.login_url, "https://kds.example.com/api/login");
        assert_eq!(config.timing.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.timing.collect_delay(), Duration::from_secs(5));
        assert_eq!(config.timing.token_ttl(), chrono::Duration::minutes(15));
        assert_eq!(config.timing.bump_attempts, 3);
        assert_eq!(config.actuators.cup_channel, 4);
        assert_eq!(config.actuators.capsules.get("Ristretto"), Some(&17));
        assert!(config.actuators.capsules.contains_key("Volluto"));
        assert_eq!(config.device.protocol, "2.1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_custom_actuators_and_timing() {
        let toml_content = format!(
            "{}\n{}",
            MINIMAL,
            r#"
[timing]
poll_interval_ms = 250
bump_attempts = 5

[actuators]
cup_channel = 5

[actuators.capsules]
Arpeggio = 6
"#
        );

        let config = DispenserConfig::from_toml_str(&toml_content).unwrap();

        assert_eq!(config.timing.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.timing.bump_attempts, 5);
        assert_eq!(config.timing.collect_delay_ms, 5_000);
        assert_eq!(config.actuators.cup_channel, 5);
        assert_eq!(config.actuators.capsules.len(), 1);
        assert!(config.actuators.capsules.contains_key("Arpeggio"));
        assert!(!config.actuators.capsules.contains_key("Ristretto"));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CAPSULE_TEST_KDS_PASSWORD", "from-env");

        let toml_content = MINIMAL.replace("\"secret\"", "\"${CAPSULE_TEST_KDS_PASSWORD}\"");
        let config = DispenserConfig::from_toml_str(&toml_content).unwrap();
        assert_eq!(config.credentials.password, "from-env");

        std::env::remove_var("CAPSULE_TEST_KDS_PASSWORD");
    }

    #[test]
    fn test_config_validation_rejects_bad_values() {
        let bad_url = MINIMAL.replace("https://kds.example.com/api/orders\"", "invalid-url\"");
        let config = DispenserConfig::from_toml_str(&bad_url).unwrap();
        assert!(config.validate().is_err());

        let clash = format!("{}\n[actuators]\ncup_channel = 17\n", MINIMAL);
        let config = DispenserConfig::from_toml_str(&clash).unwrap();
        assert!(config.validate().is_err());

        let no_retries = format!("{}\n[timing]\nbump_attempts = 0\n", MINIMAL);
        let config = DispenserConfig::from_toml_str(&no_retries).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_token_ttl_is_bounded() {
        let huge = format!("{}\n[timing]\ntoken_ttl_seconds = {}\n", MINIMAL, i64::MAX);
        let config = DispenserConfig::from_toml_str(&huge).unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timing.token_ttl_seconds"));
        assert_eq!(config.timing.token_ttl(), chrono::Duration::days(1));

        let zero = format!("{}\n[timing]\ntoken_ttl_seconds = 0\n", MINIMAL);
        let config = DispenserConfig::from_toml_str(&zero).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_hides_password() {
        let config = DispenserConfig::from_toml_str(MINIMAL).unwrap();
        let rendered = format!("{:?}", config.credentials);

        assert!(rendered.contains("kiosk"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = DispenserConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.credentials.username, "kiosk");
    }

    #[test]
    fn test_example_config_parses() {
        let config =
            DispenserConfig::from_toml_str(include_str!("../../dispenser.example.toml")).unwrap();

        assert_eq!(config.server.request_timeout_seconds, Some(10));
        assert_eq!(config.device.os, "os");
        assert_eq!(config.actuators.capsules.len(), 3);
        assert_eq!(config.timing.bump_retry_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_missing_section_is_parse_error() {
        let err = DispenserConfig::from_toml_str("[server]\nlogin_url = \"x\"\n").unwrap_err();
        assert!(matches!(err, DispenserError::ConfigValidationError { .. }));
    }
}
