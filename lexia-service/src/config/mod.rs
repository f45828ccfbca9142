use lexia_core::config as core_config;
use lexia_core::error::AppError;
use serde::Deserialize;
use std::env;

use crate::services::quota::QuotaLimits;

#[derive(Debug, Clone, Deserialize)]
pub struct LexiaConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: String,
    pub database: DatabaseConfig,
    pub groq: GroqApiConfig,
    pub security: SecurityConfig,
    #[serde(skip, default)]
    pub quotas: QuotaLimits,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroqApiConfig {
    /// May be empty: the chat route then answers with setup instructions
    /// instead of calling the API.
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: i32,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
    pub admin_access_key: String,
    pub admin_secret_key: String,
    pub admin_session_hours: i64,
    pub user_jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub chat_ip_limit: u32,
    pub chat_ip_window_seconds: u64,
    pub admin_login_attempts: u32,
    pub admin_login_window_seconds: u64,
}

impl LexiaConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = LexiaConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("lexia-service"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").unwrap_or_default(),
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", Some("postgres://localhost/lexia"), is_prod)?,
                max_connections: get_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
                min_connections: get_env("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?
                    .parse()
                    .unwrap_or(1),
            },
            groq: GroqApiConfig {
                // Intentionally optional in every environment.
                api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
                model: get_env("GROQ_MODEL", Some("llama-3.3-70b-versatile"), is_prod)?,
                temperature: get_env("GROQ_TEMPERATURE", Some("0.3"), is_prod)?
                    .parse()
                    .unwrap_or(0.3),
                max_tokens: get_env("GROQ_MAX_TOKENS", Some("2000"), is_prod)?
                    .parse()
                    .unwrap_or(2000),
                base_url: get_env(
                    "GROQ_BASE_URL",
                    Some("https://api.groq.com/openai/v1"),
                    is_prod,
                )?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
                admin_access_key: get_env(
                    "ADMIN_ACCESS_KEY",
                    Some("lexia-admin-x7k9m2p5-2024"),
                    is_prod,
                )?,
                admin_secret_key: get_env(
                    "ADMIN_SECRET_KEY",
                    Some("change-this-in-production-super-secret-key-lexia-admin-2024"),
                    is_prod,
                )?,
                admin_session_hours: get_env("ADMIN_SESSION_HOURS", Some("24"), is_prod)?
                    .parse()
                    .unwrap_or(24),
                user_jwt_secret: get_env(
                    "USER_JWT_SECRET",
                    Some("your-secret-key-min-32-chars-change-in-production"),
                    is_prod,
                )?,
            },
            quotas: QuotaLimits {
                max_messages_per_conversation: get_env(
                    "MAX_MESSAGES_PER_CONVERSATION",
                    Some("50"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(50),
                max_messages_per_day: get_env("MAX_MESSAGES_PER_DAY", Some("100"), is_prod)?
                    .parse()
                    .unwrap_or(100),
                max_conversations_per_user: get_env(
                    "MAX_CONVERSATIONS_PER_USER",
                    Some("20"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(20),
                auto_delete_after_days: get_env("AUTO_DELETE_AFTER_DAYS", Some("30"), is_prod)?
                    .parse()
                    .unwrap_or(30),
                warning_threshold: get_env("QUOTA_WARNING_THRESHOLD", Some("0.8"), is_prod)?
                    .parse()
                    .unwrap_or(0.8),
            },
            rate_limit: RateLimitConfig {
                chat_ip_limit: get_env("RATE_LIMIT_CHAT_IP_LIMIT", Some("30"), is_prod)?
                    .parse()
                    .unwrap_or(30),
                chat_ip_window_seconds: get_env(
                    "RATE_LIMIT_CHAT_IP_WINDOW_SECONDS",
                    Some("60"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(60),
                admin_login_attempts: get_env("RATE_LIMIT_ADMIN_LOGIN_ATTEMPTS", Some("5"), is_prod)?
                    .parse()
                    .unwrap_or(5),
                admin_login_window_seconds: get_env(
                    "RATE_LIMIT_ADMIN_LOGIN_WINDOW_SECONDS",
                    Some("900"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(900),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 && self.environment == Environment::Prod {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0 in production"
            )));
        }

        if self.quotas.max_messages_per_conversation <= 0
            || self.quotas.max_messages_per_day <= 0
            || self.quotas.max_conversations_per_user <= 0
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Quota limits must be positive"
            )));
        }

        if !(0.0..=1.0).contains(&self.quotas.warning_threshold)
            || self.quotas.warning_threshold == 0.0
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "QUOTA_WARNING_THRESHOLD must be in (0, 1]"
            )));
        }

        if self.environment == Environment::Prod
            && self.security.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Wildcard CORS origin not allowed in production"
            )));
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
