use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct InventoryConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub secrets: SecretsConfig,
    pub tasks: TaskConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Deserialize)]
pub struct SecretsConfig {
    /// Base64 AES-256 key for credential fields. Without it secret fields
    /// can be neither stored nor read.
    pub encryption_key: Option<Secret<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub scratch_path: PathBuf,
}

impl InventoryConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        Self::from_lookup(common_config, |key| env::var(key).ok())
    }

    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_prod = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()) == "prod";
        let default_scratch = env::temp_dir().join("inventory-tasks");

        let encryption_key = lookup("CREDENTIAL_ENCRYPTION_KEY").map(Secret::new);
        if is_prod && encryption_key.is_none() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "CREDENTIAL_ENCRYPTION_KEY is required in production but not set"
            )));
        }

        Ok(InventoryConfig {
            common,
            mongodb: MongoConfig {
                uri: get_env(&lookup, "MONGODB_URI", None, is_prod)?,
                database: get_env(&lookup, "MONGODB_DATABASE", Some("inventory_db"), is_prod)?,
            },
            secrets: SecretsConfig { encryption_key },
            tasks: TaskConfig {
                scratch_path: lookup("TASK_SCRATCH_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(default_scratch),
            },
        })
    }
}

fn get_env<F>(lookup: &F, key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => Ok(val),
        None => {
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
