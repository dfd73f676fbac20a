use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub jwt_secret: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_media_root")]
    pub media_root: String,

    #[serde(default = "default_media_url")]
    pub media_url: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    database_url: Option<String>,
    jwt_secret: Option<String>,
    listen_addr: Option<String>,
    media_root: Option<String>,
    media_url: Option<String>,
    log_dir: Option<String>,
    max_upload_bytes: Option<usize>,
    bcrypt_cost: Option<u32>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_media_root() -> String {
    "media".to_string()
}

fn default_media_url() -> String {
    "/media".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config: PartialServerConfig = if let Some(path_str) = config_path {
            let path = Path::new(path_str);
            if path.exists() {
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                toml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))?
            } else {
                PartialServerConfig::default()
            }
        } else {
            PartialServerConfig::default()
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        // 3. Merge: environment overrides file
        Self::merge(env_config, file_config)
    }

    fn merge(primary: PartialServerConfig, fallback: PartialServerConfig) -> Result<Self, String> {
        let media_url = primary
            .media_url
            .or(fallback.media_url)
            .unwrap_or_else(default_media_url);

        Ok(ServerConfig {
            database_url: primary.database_url.or(fallback.database_url)
                .ok_or("DATABASE_URL is required")?,
            jwt_secret: primary.jwt_secret.or(fallback.jwt_secret)
                .ok_or("JWT_SECRET is required")?,
            listen_addr: primary.listen_addr.or(fallback.listen_addr)
                .unwrap_or_else(default_listen_addr),
            media_root: primary.media_root.or(fallback.media_root)
                .unwrap_or_else(default_media_root),
            media_url: normalize_media_url(&media_url),
            log_dir: primary.log_dir.or(fallback.log_dir)
                .unwrap_or_else(default_log_dir),
            max_upload_bytes: primary.max_upload_bytes.or(fallback.max_upload_bytes)
                .unwrap_or_else(default_max_upload_bytes),
            bcrypt_cost: primary.bcrypt_cost.or(fallback.bcrypt_cost)
                .unwrap_or_else(default_bcrypt_cost),
        })
    }
}

/// `media/` and `/media/` both become `/media`, which is what the router nests on.
fn normalize_media_url(raw: &str) -> String {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        default_media_url()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial_from_toml(contents: &str) -> PartialServerConfig {
        toml::from_str(contents).unwrap()
    }

    #[test]
    fn test_file_values_fill_defaults() {
        let file = partial_from_toml(
            r#"
            database_url = "sqlite::memory:"
            jwt_secret = "secret"
            media_root = "/var/lib/recipes"
            "#,
        );
        let config = ServerConfig::merge(PartialServerConfig::default(), file).unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.media_root, "/var/lib/recipes");
        assert_eq!(config.listen_addr, "0.0.0.0:8000");
        assert_eq!(config.media_url, "/media");
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn test_primary_overrides_fallback() {
        let file = partial_from_toml(
            r#"
            database_url = "postgres://file"
            jwt_secret = "file-secret"
            listen_addr = "127.0.0.1:9000"
            "#,
        );
        let env = PartialServerConfig {
            jwt_secret: Some("env-secret".to_string()),
            media_url: Some("uploads/".to_string()),
            ..Default::default()
        };
        let config = ServerConfig::merge(env, file).unwrap();

        assert_eq!(config.database_url, "postgres://file");
        assert_eq!(config.jwt_secret, "env-secret");
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.media_url, "/uploads");
    }

    #[test]
    fn test_missing_required_values() {
        let result = ServerConfig::merge(PartialServerConfig::default(), PartialServerConfig::default());
        assert_eq!(result.unwrap_err(), "DATABASE_URL is required");

        let only_db = PartialServerConfig {
            database_url: Some("sqlite::memory:".to_string()),
            ..Default::default()
        };
        let result = ServerConfig::merge(only_db, PartialServerConfig::default());
        assert_eq!(result.unwrap_err(), "JWT_SECRET is required");
    }
}
