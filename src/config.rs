//! Server-wide settings, carried by every request.
//!
//! Nothing in here is global. A frontend loads the settings once and places a copy into each
//! `Request`, so handlers see exactly the configuration of the request they serve.
use ::config::{Config, ConfigError, Environment};
use serde_derive::Deserialize;

/// Prefix of the environment variables read by [`Settings::from_env`].
pub const ENV_PREFIX: &str = "OXIDE_AUTH";

/// Longest accepted lifetime of any credential, in seconds. Roughly a century.
pub const MAX_LIFETIME: i64 = 100 * 365 * 86400;

/// Lifetimes, token sizes and transport policy of the authorization server.
///
/// Every field has a default, a source only needs to name the values it changes. Keys are
/// accepted in lower and upper case.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Lifetime of access tokens in seconds.
    #[serde(alias = "TOKEN_EXPIRES_IN")]
    pub token_expires_in: i64,

    /// Lifetime of refresh tokens in seconds.
    #[serde(alias = "REFRESH_TOKEN_EXPIRES_IN")]
    pub refresh_token_expires_in: i64,

    /// Lifetime of authorization codes in seconds.
    #[serde(alias = "AUTHORIZATION_CODE_EXPIRES_IN")]
    pub authorization_code_expires_in: i64,

    /// Accept requests over plain http. Only sensible for local development.
    #[serde(alias = "INSECURE_TRANSPORT")]
    pub insecure_transport: bool,

    /// Base of the `error_uri` attached to error responses, empty for none.
    ///
    /// The error code is joined onto this url, so it should end in a slash.
    #[serde(alias = "ERROR_URI")]
    pub error_uri: String,

    /// When unset every request is answered with `temporarily_unavailable`.
    #[serde(alias = "AVAILABLE")]
    pub available: bool,

    /// Random bytes in each access and refresh token.
    #[serde(alias = "TOKEN_LENGTH")]
    pub token_length: usize,

    /// Random bytes in each authorization code.
    #[serde(alias = "CODE_LENGTH")]
    pub code_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            token_expires_in: 86400,
            refresh_token_expires_in: 86400 * 2,
            authorization_code_expires_in: 300,
            insecure_transport: false,
            error_uri: String::new(),
            available: true,
            token_length: 42,
            code_length: 32,
        }
    }
}

impl Settings {
    /// Read the settings from `OXIDE_AUTH_*` environment variables.
    ///
    /// For example `OXIDE_AUTH_TOKEN_EXPIRES_IN=3600` shortens the access token lifetime.
    pub fn from_env() -> Result<Settings, ConfigError> {
        let config = Config::builder().add_source(environment()).build()?;
        Settings::from_config(&config)
    }

    /// Deserialize and validate the settings from an already assembled configuration.
    pub fn from_config(config: &Config) -> Result<Settings, ConfigError> {
        let settings = config.clone().try_deserialize::<Settings>()?;
        settings.validate()?;
        log::debug!(
            "Loaded settings: token lifetime {}s, code lifetime {}s, insecure transport {}",
            settings.token_expires_in,
            settings.authorization_code_expires_in,
            settings.insecure_transport
        );
        Ok(settings)
    }

    /// Check that lifetimes are positive and at most [`MAX_LIFETIME`] and that generated values
    /// are not empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lifetimes = [
            ("token_expires_in", self.token_expires_in),
            ("refresh_token_expires_in", self.refresh_token_expires_in),
            ("authorization_code_expires_in", self.authorization_code_expires_in),
        ];
        for (key, seconds) in lifetimes {
            if !(1..=MAX_LIFETIME).contains(&seconds) {
                return Err(ConfigError::Message(format!(
                    "{} must be between 1 and {} seconds, got {}",
                    key, MAX_LIFETIME, seconds
                )));
            }
        }

        let lengths = [("token_length", self.token_length), ("code_length", self.code_length)];
        for (key, length) in lengths {
            if length == 0 {
                return Err(ConfigError::Message(format!("{} must not be zero", key)));
            }
        }

        Ok(())
    }

    /// Whether a configured error documentation base exists.
    pub fn has_error_uri(&self) -> bool {
        !self.error_uri.is_empty()
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).try_parsing(true)
}
