use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tally_receipt::OpenAiConfig;
use tally_storage::RetryPolicy;

const DEFAULT_CONFIG_FILE: &str = "tally.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub receipts: ReceiptsConfig,
    pub ai: AiConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            path: default_data_dir().join("tally.db"),
            max_retries: policy.max_retries,
            base_delay_ms: policy.base_delay.as_millis() as u64,
        }
    }
}

impl DatabaseConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.base_delay_ms))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReceiptsConfig {
    pub upload_dir: PathBuf,
    pub virtual_prefix: String,
}

impl Default for ReceiptsConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_data_dir().join("uploads"),
            virtual_prefix: "/uploads".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub base_url: String,
    pub model: String,
    pub vision_model: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        let openai = OpenAiConfig::default();
        Self {
            base_url: openai.base_url,
            model: openai.model,
            vision_model: openai.vision_model,
            api_key: openai.api_key,
            timeout_secs: openai.timeout.as_secs(),
        }
    }
}

impl AiConfig {
    pub fn to_openai(&self) -> OpenAiConfig {
        OpenAiConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            vision_model: self.vision_model.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// `~/.local/share/tally` on Linux, or the platform equivalent.
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "tally", "Tally")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("data"))
}

impl AppConfig {
    /// File named by `TALLY_CONFIG`, else `tally.toml` when present, else
    /// defaults. Environment variables override the file.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("TALLY_CONFIG")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                local.exists().then_some(local)
            });

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("TALLY_BIND") {
            self.server.bind = v;
        }
        if let Some(v) = var("TALLY_DATABASE") {
            self.database.path = PathBuf::from(v);
        }
        if let Some(v) = var("TALLY_UPLOAD_DIR") {
            self.receipts.upload_dir = PathBuf::from(v);
        }
        if let Some(v) = var("TALLY_AI_BASE_URL") {
            self.ai.base_url = v;
        }
        if let Some(v) = var("TALLY_AI_MODEL") {
            self.ai.model = v.clone();
            self.ai.vision_model = v;
        }
        if let Some(v) = var("TALLY_AI_API_KEY") {
            self.ai.api_key = v;
        }
        if let Some(v) = var("TALLY_JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            bind = "0.0.0.0:9000"

            [database]
            max_retries = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.database.max_retries, 5);
        assert_eq!(config.database.base_delay_ms, 100);
        assert_eq!(config.receipts.virtual_prefix, "/uploads");
        assert_eq!(config.ai.timeout_secs, 60);
        assert!(config.auth.jwt_secret.is_empty());
    }

    #[test]
    fn retry_policy_from_database_section() {
        let config = DatabaseConfig {
            max_retries: 2,
            base_delay_ms: 50,
            ..Default::default()
        };
        let policy = config.retry_policy();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.base_delay, Duration::from_millis(50));
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TALLY_BIND", "0.0.0.0:1234"),
            ("TALLY_DATABASE", "/tmp/t.db"),
            ("TALLY_AI_MODEL", "local-llava"),
            ("TALLY_JWT_SECRET", "s3cret"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.server.bind, "0.0.0.0:1234");
        assert_eq!(config.database.path, PathBuf::from("/tmp/t.db"));
        assert_eq!(config.ai.model, "local-llava");
        assert_eq!(config.ai.vision_model, "local-llava");
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.receipts.virtual_prefix, "/uploads");
    }

    #[test]
    fn from_file_reports_missing_file() {
        let err = AppConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
