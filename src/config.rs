use config::{Config, ConfigError, File};
use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;
use std::time;

// Shipped in config/development.yaml, never valid outside development
const DEVELOPMENT_ADMIN_TOKEN: &str = "dev-admin-token";

#[derive(Debug)]
pub enum Environment {
    Development,
    Production,
}

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub content_store: ContentStoreSettings,
    pub webhook: WebhookSettings,
    pub rate_limit: RateLimitSettings,
    pub redis: RedisSettings,
    pub site: SiteSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub base_url: String,
    // Bearer token required by the administrative CSV export
    pub admin_token: Secret<String>,
}

#[derive(serde::Deserialize, Clone)]
pub struct ContentStoreSettings {
    pub base_url: String,
    pub api_token: Option<Secret<String>>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub revalidate_seconds: u32,
}

#[derive(serde::Deserialize, Clone)]
pub struct WebhookSettings {
    // When missing, subscriptions are stored without notifying anybody
    pub url: Option<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitBackend {
    Memory,
    Redis,
}

#[derive(serde::Deserialize, Clone)]
pub struct RateLimitSettings {
    pub backend: RateLimitBackend,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_requests: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub window_seconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_tracked_clients: usize,
}

#[derive(serde::Deserialize, Clone)]
pub struct RedisSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct SiteSettings {
    pub name: String,
    pub description: String,
    pub language: String,
    pub contact_email: String,
}

impl Settings {
    pub fn get_address(&self) -> String {
        format!(
            "{}:{}",
            self.application.get_host(),
            self.application.get_port()
        )
    }

    pub fn get_app_base_url(&self) -> String {
        self.application.get_base_url()
    }

    pub fn get_admin_token(&self) -> Secret<String> {
        self.application.admin_token.clone()
    }

    pub fn get_content_store_base_url(&self) -> String {
        self.content_store.get_base_url()
    }

    pub fn get_content_store_api_token(&self) -> Option<Secret<String>> {
        self.content_store.api_token.clone()
    }

    pub fn get_content_store_timeout(&self) -> time::Duration {
        self.content_store.get_timeout()
    }

    pub fn get_revalidate_seconds(&self) -> u32 {
        self.content_store.revalidate_seconds
    }

    pub fn get_webhook_url(&self) -> Option<String> {
        self.webhook.url.clone()
    }

    pub fn get_webhook_timeout(&self) -> time::Duration {
        self.webhook.get_timeout()
    }

    pub fn set_app_port(&mut self, port: u16) {
        self.application.port = port;
    }

    pub fn set_content_store_base_url(&mut self, new_base_url: String) {
        self.content_store.set_base_url(new_base_url)
    }

    pub fn set_webhook_url(&mut self, url: Option<String>) {
        self.webhook.url = url;
    }

    pub fn set_rate_limit_backend(&mut self, backend: RateLimitBackend) {
        self.rate_limit.backend = backend;
    }

    pub fn get_redis_address(&self) -> String {
        self.redis.get_address()
    }
}

impl ApplicationSettings {
    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_host(&self) -> String {
        self.host.clone()
    }

    pub fn get_base_url(&self) -> String {
        self.base_url.clone()
    }

    pub fn check_admin_token(&self, environment: &Environment) -> Result<(), ConfigError> {
        let token = self.admin_token.expose_secret().trim();

        if token.is_empty() {
            return Err(ConfigError::Message(String::from(
                "application.admin_token must not be empty",
            )));
        }
        if matches!(environment, Environment::Production) && token == DEVELOPMENT_ADMIN_TOKEN {
            return Err(ConfigError::Message(String::from(
                "application.admin_token still holds the development token, set APP_APPLICATION__ADMIN_TOKEN",
            )));
        }

        Ok(())
    }
}

impl ContentStoreSettings {
    pub fn get_base_url(&self) -> String {
        self.base_url.clone()
    }

    pub fn get_timeout(&self) -> time::Duration {
        time::Duration::from_millis(self.timeout_milliseconds)
    }

    pub fn set_base_url(&mut self, new_base_url: String) {
        self.base_url = new_base_url
    }
}

impl WebhookSettings {
    pub fn get_timeout(&self) -> time::Duration {
        time::Duration::from_millis(self.timeout_milliseconds)
    }
}

impl RateLimitSettings {
    pub fn get_window(&self) -> time::Duration {
        time::Duration::from_secs(self.window_seconds)
    }
}

impl RedisSettings {
    pub fn get_address(&self) -> String {
        format!("redis://{}:{}", self.host, self.port)
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            unknown_env => Err(format!(
                "{} is not supported environment. Use either 'development' or 'production'.",
                unknown_env
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let root_path = std::env::current_dir()
        .map_err(|err| ConfigError::Message(format!("Failed to determine the current directory: {}", err)))?;
    let config_directory = root_path.join("config");
    // Uses development environment by default
    let enviroment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "development".into())
        .try_into()
        .map_err(ConfigError::Message)?;
    let config_base_filepath = config_directory.join("base");
    let config_env_filepath = config_directory.join(enviroment.as_str());

    // It merges the base configuration file with the one from the specific environment (development or production)
    let settings = Config::builder()
        .add_source(File::from(config_base_filepath).required(true))
        .add_source(File::from(config_env_filepath).required(true))
        // Merge settings from environment variables with a prefix of APP and "__" separator
        // E.g APP_APPLICATION__PORT would set Settings.application.port
        .add_source(config::Environment::with_prefix("app").separator("__"))
        .build()?;

    tracing::info!("Application environment = {:?}", enviroment);

    // Try to convert the value from the configuration file into a Settings type
    let settings: Settings = settings.try_deserialize()?;
    settings.application.check_admin_token(&enviroment)?;

    Ok(settings)
}
