use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default storage subdirectory under the project root
pub const DEFAULT_MOCK_DATA_ROOT_DIR_NAME: &str = "cookerMockData";

#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub project_root: PathBuf,
    pub mock_data_dir_name: String,

    // Server
    pub host: String,
    pub port: u16,
    pub websocket_port: u16,

    // Text completion
    pub openai_base_url: String,
    pub openai_model: String,

    // Change watcher
    pub watch_stability: Duration,
    pub watch_poll_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if exists

        let cwd = env::current_dir().map_err(|_| ConfigError::Invalid("current directory"))?;

        Ok(Self {
            // Storage
            project_root: match env::var("USER_PROJECT_PATH") {
                Ok(path) if !path.is_empty() => cwd.join(path),
                _ => cwd,
            },
            mock_data_dir_name: env::var("MOCK_DATA_ROOT_DIR_NAME")
                .unwrap_or_else(|_| DEFAULT_MOCK_DATA_ROOT_DIR_NAME.to_string()),

            // Server
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 8088)?,
            websocket_port: parse_var("WEBSOCKET_PORT", 8089)?,

            // Text completion
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),

            // Change watcher
            watch_stability: Duration::from_millis(parse_var("WATCH_STABILITY_MS", 2000)?),
            watch_poll_interval: Duration::from_millis(parse_var("WATCH_POLL_MS", 100)?),
        })
    }

    /// Defaults for everything, rooted at `project_root`
    pub fn for_project(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            mock_data_dir_name: DEFAULT_MOCK_DATA_ROOT_DIR_NAME.to_string(),
            host: "127.0.0.1".to_string(),
            port: 8088,
            websocket_port: 8089,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            watch_stability: Duration::from_millis(2000),
            watch_poll_interval: Duration::from_millis(100),
        }
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get notification channel address as "host:port"
    pub fn websocket_addr(&self) -> String {
        format!("{}:{}", self.host, self.websocket_port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_share_host() {
        let mut config = Config::for_project("/tmp/project");
        config.host = "0.0.0.0".to_string();

        assert_eq!(config.server_addr(), "0.0.0.0:8088");
        assert_eq!(config.websocket_addr(), "0.0.0.0:8089");
    }

    #[test]
    fn test_unparsable_number_names_the_variable() {
        let err = "not-a-port"
            .parse::<u16>()
            .map_err(|_| ConfigError::Invalid("PORT"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid environment variable: PORT");
    }
}
