//! Configuration file handling
//!
//! Configuration is an explicit value handed to the runner and the built-in
//! flows. It is layered: defaults, then the TOML file, then `PROBE_*`
//! environment variables, then command-line flags.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API location and transport settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Login credentials for the first step of every built-in flow
    #[serde(default)]
    pub credentials: Credentials,

    /// Fixed identifiers used to seed runs
    #[serde(default)]
    pub fixtures: Fixtures,

    /// Booking request details
    #[serde(default)]
    pub booking: BookingConfig,

    /// Endpoint path templates
    #[serde(default)]
    pub endpoints: Endpoints,

    /// Payment flow settings
    #[serde(default)]
    pub payment: PaymentConfig,
}

/// API location and timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every step path is joined onto
    pub base_url: Option<String>,

    /// Default per-call timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Fixtures {
    pub tour_id: Option<String>,
    pub schedule_id: Option<String>,
}

/// Details sent with the create-booking request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub special_requests: Option<String>,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            adults: default_adults(),
            children: 0,
            contact_name: None,
            contact_email: None,
            contact_phone: None,
            special_requests: None,
        }
    }
}

fn default_adults() -> u32 {
    1
}

/// Endpoint path templates
///
/// `{{key}}` placeholders are filled from the run context
/// (`tourId`, `scheduleId`, `bookingId`, `appTransId`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub login: String,
    pub customer: String,
    pub tour: String,
    pub schedule: String,
    pub booking: String,
    pub momo_create: String,
    pub zalopay_create: String,
    pub zalopay_status: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/api/auth/login".to_string(),
            customer: "/api/customers/profile".to_string(),
            tour: "/api/tours/{{tourId}}".to_string(),
            schedule: "/api/schedules/{{scheduleId}}".to_string(),
            booking: "/api/bookings".to_string(),
            momo_create: "/api/payments/momo/create".to_string(),
            zalopay_create: "/api/payments/zalopay/create".to_string(),
            zalopay_status: "/api/payments/zalopay/status/{{appTransId}}".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaymentConfig {
    /// Where the payment gateway redirects after checkout
    pub return_url: Option<String>,
}

/// Environment variables consulted by [`Config::apply_env`]
pub const ENV_BASE_URL: &str = "PROBE_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "PROBE_TIMEOUT_SECS";
pub const ENV_EMAIL: &str = "PROBE_EMAIL";
pub const ENV_PASSWORD: &str = "PROBE_PASSWORD";
pub const ENV_TOUR_ID: &str = "PROBE_TOUR_ID";
pub const ENV_SCHEDULE_ID: &str = "PROBE_SCHEDULE_ID";

impl Config {
    /// Load configuration from `path`, or from the default config file
    ///
    /// Returns default configuration if no file exists at the default
    /// location. An explicitly given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match config_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path).map_err(|e| Error::file_read(&path, &e))?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> Result<()> {
        if self.api.timeout_secs == 0 {
            return Err(Error::Config("api.timeout_secs must be at least 1 second".to_string()));
        }
        Ok(())
    }

    /// Apply `PROBE_*` environment overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.api.base_url = Some(url);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.api.timeout_secs = raw.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be a number of seconds, got '{}'", ENV_TIMEOUT_SECS, raw))
            })?;
        }
        if let Some(email) = lookup(ENV_EMAIL) {
            self.credentials.email = Some(email);
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.credentials.password = Some(password);
        }
        if let Some(id) = lookup(ENV_TOUR_ID) {
            self.fixtures.tour_id = Some(id);
        }
        if let Some(id) = lookup(ENV_SCHEDULE_ID) {
            self.fixtures.schedule_id = Some(id);
        }
        self.validate()
    }

    /// The configured base URL, or an actionable error
    pub fn base_url(&self) -> Result<&str> {
        self.api
            .base_url
            .as_deref()
            .ok_or(Error::MissingSetting("api.base_url", ENV_BASE_URL))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Login email and password, or an actionable error
    pub fn login(&self) -> Result<(&str, &str)> {
        let email = self
            .credentials
            .email
            .as_deref()
            .ok_or(Error::MissingSetting("credentials.email", ENV_EMAIL))?;
        let password = self
            .credentials
            .password
            .as_deref()
            .ok_or(Error::MissingSetting("credentials.password", ENV_PASSWORD))?;
        Ok((email, password))
    }

    /// Copy of this configuration that is safe to print
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.credentials.password.is_some() {
            copy.credentials.password = Some(crate::runner::redact::ELIDED.to_string());
        }
        copy
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_without_file_content() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.booking.adults, 1);
        assert_eq!(config.endpoints.login, "/api/auth/login");
        assert!(config.base_url().is_err());
    }

    #[test]
    fn test_parse_sections() {
        let config = Config::parse(
            r#"
            [api]
            base_url = "https://api.example.test"
            timeout_secs = 45

            [credentials]
            email = "tester@example.test"
            password = "hunter2"

            [fixtures]
            tour_id = "tour-1"

            [endpoints]
            customer = "/api/users/me"
            "#,
        )
        .unwrap();

        assert_eq!(config.base_url().unwrap(), "https://api.example.test");
        assert_eq!(config.timeout(), Duration::from_secs(45));
        assert_eq!(config.login().unwrap(), ("tester@example.test", "hunter2"));
        assert_eq!(config.fixtures.tour_id.as_deref(), Some("tour-1"));
        assert_eq!(config.endpoints.customer, "/api/users/me");
        // Unlisted endpoints keep their defaults
        assert_eq!(config.endpoints.booking, "/api/bookings");
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config::parse("[api]\nbase_url = \"http://file\"\n").unwrap();
        let env: HashMap<&str, &str> = [
            (ENV_BASE_URL, "http://env"),
            (ENV_TIMEOUT_SECS, "5"),
            (ENV_SCHEDULE_ID, "sch-9"),
        ]
        .into_iter()
        .collect();

        config
            .apply_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.base_url().unwrap(), "http://env");
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.fixtures.schedule_id.as_deref(), Some("sch-9"));
    }

    #[test]
    fn test_bad_timeout_override() {
        let mut config = Config::default();
        let result = config.apply_overrides(|name| {
            (name == ENV_TIMEOUT_SECS).then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = Config::parse("[api]\ntimeout_secs = 0\n");
        assert!(matches!(result, Err(Error::Config(_))));

        let mut config = Config::default();
        let result = config.apply_overrides(|name| (name == ENV_TIMEOUT_SECS).then(|| "0".to_string()));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_redacted_hides_password() {
        let mut config = Config::default();
        config.credentials.password = Some("hunter2".to_string());
        let text = config.redacted().to_toml().unwrap();
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn test_missing_credentials_name_the_variable() {
        let err = Config::default().login().unwrap_err();
        assert!(err.to_string().contains(ENV_EMAIL));
    }
}
