//! Process settings, read once at startup from the environment.

use std::net::SocketAddr;

use thiserror::Error;

use resto_auth::{StaticTokenBackend, TokenTableError};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{name}: invalid socket address '{value}'")]
    InvalidAddr { name: &'static str, value: String },

    #[error("{name}: expected a boolean, got '{value}'")]
    InvalidFlag { name: &'static str, value: String },

    #[error("{name}: expected a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },

    #[error("RESTO_API_TOKENS: {0}")]
    Tokens(#[from] TokenTableError),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    /// Failures answer with plain-text traces. Development only.
    pub debug: bool,
    /// When set, handlers authenticate bearer tokens against this table.
    pub api_tokens: Option<StaticTokenBackend>,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            debug: false,
            api_tokens: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable source; unset variables keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        if let Some(value) = lookup("RESTO_BIND_ADDR") {
            settings.bind_addr = value.trim().parse().map_err(|_| SettingsError::InvalidAddr {
                name: "RESTO_BIND_ADDR",
                value,
            })?;
        }

        if let Some(value) = lookup("RESTO_DEBUG") {
            settings.debug = parse_flag("RESTO_DEBUG", value)?;
        }

        if let Some(value) = lookup("RESTO_API_TOKENS") {
            if !value.trim().is_empty() {
                settings.api_tokens = Some(StaticTokenBackend::parse(&value)?);
            }
        }

        if let Some(value) = lookup("RESTO_MAX_BODY_BYTES") {
            settings.max_body_bytes = match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(SettingsError::InvalidNumber {
                        name: "RESTO_MAX_BODY_BYTES",
                        value,
                    });
                }
            };
        }

        Ok(settings)
    }
}

fn parse_flag(name: &'static str, value: String) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(SettingsError::InvalidFlag { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Settings, SettingsError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let settings = load(&[]).unwrap();
        assert_eq!(settings.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(!settings.debug);
        assert!(settings.api_tokens.is_none());
        assert_eq!(settings.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    }

    #[test]
    fn reads_every_variable() {
        let settings = load(&[
            ("RESTO_BIND_ADDR", "127.0.0.1:9000"),
            ("RESTO_DEBUG", "Yes"),
            ("RESTO_API_TOKENS", "t1=alice:admin"),
            ("RESTO_MAX_BODY_BYTES", "1024"),
        ])
        .unwrap();

        assert_eq!(settings.bind_addr.port(), 9000);
        assert!(settings.debug);
        assert_eq!(settings.api_tokens.map(|t| t.len()), Some(1));
        assert_eq!(settings.max_body_bytes, 1024);
    }

    #[test]
    fn invalid_values_fail_fast() {
        assert!(matches!(
            load(&[("RESTO_DEBUG", "maybe")]),
            Err(SettingsError::InvalidFlag { .. })
        ));
        assert!(matches!(
            load(&[("RESTO_BIND_ADDR", "nowhere")]),
            Err(SettingsError::InvalidAddr { .. })
        ));
        assert!(matches!(
            load(&[("RESTO_MAX_BODY_BYTES", "0")]),
            Err(SettingsError::InvalidNumber { .. })
        ));
        assert!(matches!(
            load(&[("RESTO_API_TOKENS", "garbage")]),
            Err(SettingsError::Tokens(_))
        ));
    }
}
