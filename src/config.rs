//! # Application settings
//!
//! Settings are read once from the process environment at startup (after a
//! `.env` file, if any, has been loaded by `dotenvy`) and are read-only after
//! that.
//!
//! | Variable         | Default                                            |
//! |------------------|----------------------------------------------------|
//! | `MONGODB_URI`    | required                                           |
//! | `JWT_SECRET`     | required                                           |
//! | `APP_ENV`        | `development`                                      |
//! | `PORT`           | `8000`                                             |
//! | `JWT_EXPIRES_IN` | `604800` (7 days, in seconds)                      |
//! | `CORS_ORIGINS`   | `http://localhost:5173`, `http://localhost:3000`   |
//!
//! `CORS_ORIGINS` accepts either a JSON array of strings or a comma-separated
//! list.
//!
//! Extraction goes through Figment (re-exported by Rocket): the listed
//! variables are read with `Env::raw().only(..)` and deserialized into
//! [`Settings`], with serde defaults for the optional keys. Figment matches
//! variable names case-insensitively.

use std::fmt;

use rocket::figment::{Figment, error::Kind, providers::Env};
use serde::{Deserialize, Deserializer, de};

use crate::errors::ConfigError;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_JWT_EXPIRES_IN: u64 = 604_800;
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:3000"];

const ENV_KEYS: [&str; 6] = [
    "APP_ENV",
    "PORT",
    "MONGODB_URI",
    "JWT_SECRET",
    "JWT_EXPIRES_IN",
    "CORS_ORIGINS",
];

#[derive(Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub mongodb_uri: String,
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expires_in")]
    pub jwt_expires_in: u64,
    #[serde(default = "default_cors_origins", deserialize_with = "origins")]
    pub cors_origins: Vec<String>,
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_jwt_expires_in() -> u64 {
    DEFAULT_JWT_EXPIRES_IN
}

fn default_cors_origins() -> Vec<String> {
    DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect()
}

impl Settings {
    /// Loads `.env` (when present) and reads settings from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_figment(&Self::figment())
    }

    /// Figment reading only the application's environment variables.
    pub fn figment() -> Figment {
        Figment::new().merge(Env::raw().only(&ENV_KEYS))
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let settings: Settings = figment.extract().map_err(ConfigError::from)?;

        if settings.mongodb_uri.trim().is_empty() {
            return Err(ConfigError::Missing("MONGODB_URI".into()));
        }
        if settings.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET".into()));
        }

        Ok(settings)
    }

    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("app_env", &self.app_env)
            .field("port", &self.port)
            .field("mongodb_uri", &"<redacted>")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expires_in", &self.jwt_expires_in)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl From<rocket::figment::Error> for ConfigError {
    fn from(err: rocket::figment::Error) -> Self {
        match &err.kind {
            Kind::MissingField(field) => ConfigError::Missing(field.to_uppercase()),
            kind => ConfigError::Invalid {
                key: err.path.join(".").to_uppercase(),
                reason: kind.to_string(),
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOrigins {
    List(Vec<String>),
    Text(String),
}

/// Accepts a list, a JSON array in a string, or a comma-separated string.
fn origins<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match RawOrigins::deserialize(deserializer)? {
        RawOrigins::List(list) => return Ok(list),
        RawOrigins::Text(text) => text,
    };
    let trimmed = text.trim();

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(de::Error::custom);
    }

    Ok(trimmed
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required() -> Figment {
        Figment::new()
            .merge(("mongodb_uri", "mongodb://localhost:27017"))
            .merge(("jwt_secret", "s3cret"))
    }

    #[test]
    fn defaults_apply_when_only_required_keys_are_set() {
        let settings = Settings::from_figment(&required()).unwrap();

        assert_eq!(settings.app_env, "development");
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.jwt_expires_in, 604_800);
        assert_eq!(
            settings.cors_origins,
            vec!["http://localhost:5173", "http://localhost:3000"]
        );
        assert!(settings.is_development());
        assert!(!settings.is_production());
    }

    #[test]
    fn missing_mongodb_uri_is_reported() {
        let figment = Figment::new().merge(("jwt_secret", "s3cret"));
        let err = Settings::from_figment(&figment).unwrap_err();
        assert_eq!(err, ConfigError::Missing("MONGODB_URI".into()));
    }

    #[test]
    fn blank_jwt_secret_counts_as_missing() {
        let figment = required().merge(("jwt_secret", "  "));
        let err = Settings::from_figment(&figment).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET".into()));
    }

    #[test]
    fn out_of_range_port_is_rejected() {
        let figment = required().merge(("port", 70_000));

        match Settings::from_figment(&figment) {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "PORT"),
            other => panic!("expected invalid PORT, got {other:?}"),
        }
    }

    #[test]
    fn overrides_are_read() {
        let figment = required()
            .merge(("app_env", "production"))
            .merge(("port", 9090))
            .merge(("jwt_expires_in", 3600));
        let settings = Settings::from_figment(&figment).unwrap();

        assert!(settings.is_production());
        assert_eq!(settings.port, 9090);
        assert_eq!(settings.jwt_expires_in, 3600);
    }

    #[test]
    fn cors_origins_accept_json_array_text() {
        let figment = required().merge((
            "cors_origins",
            r#"["https://yourdrobe.app", "https://admin.yourdrobe.app"]"#,
        ));
        let settings = Settings::from_figment(&figment).unwrap();

        assert_eq!(
            settings.cors_origins,
            vec!["https://yourdrobe.app", "https://admin.yourdrobe.app"]
        );
    }

    #[test]
    fn cors_origins_accept_a_list() {
        let figment = required().merge(("cors_origins", vec!["https://a.example"]));
        let settings = Settings::from_figment(&figment).unwrap();

        assert_eq!(settings.cors_origins, vec!["https://a.example"]);
    }

    #[test]
    fn cors_origins_accept_comma_list() {
        let figment = required().merge(("cors_origins", "https://a.example, https://b.example,"));
        let settings = Settings::from_figment(&figment).unwrap();

        assert_eq!(settings.cors_origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn malformed_cors_json_is_rejected() {
        let figment = required().merge(("cors_origins", "[\"https://a.example\""));

        match Settings::from_figment(&figment) {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "CORS_ORIGINS"),
            other => panic!("expected invalid CORS_ORIGINS, got {other:?}"),
        }
    }

    #[test]
    fn debug_output_hides_secrets() {
        let settings = Settings::from_figment(&required()).unwrap();
        let rendered = format!("{settings:?}");

        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("27017"));
        assert!(rendered.contains("<redacted>"));
    }
}
