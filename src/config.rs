use anyhow::{Context, Result};
use dotenv::dotenv;
use std::{env, net::SocketAddr, str::FromStr};

use crate::ics::{EventFilter, KeyMode, ParseOptions};

#[derive(Debug, Clone)]
pub struct Config {
    pub upstream_url: String,
    pub bind_addr: SocketAddr,
    pub service_version: String,
    pub default_filter: String,
    pub filter_field: String,
    pub cache_ttl: u64,
    pub parse_headers: bool,
    pub strict_keys: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_url: "https://smrt.pagerduty.com".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 7676)),
            service_version: "local".to_string(),
            default_filter: "First".to_string(),
            filter_field: EventFilter::DEFAULT_FIELD.to_string(),
            cache_ttl: 3600,
            parse_headers: true,
            strict_keys: false,
        }
    }
}

fn get_optional_parsed<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(val_str) => {
            let value = val_str.parse::<T>().with_context(|| {
                format!("'{}' is invalid: could not parse '{}'", name, val_str)
            })?;
            Ok(Some(value))
        }
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(e).with_context(|| format!("'{}' contained invalid unicode", name)),
    }
}

fn get_optional_string(name: &str) -> Result<Option<String>> {
    get_optional_parsed::<String>(name).map(|value| value.filter(|v| !v.is_empty()))
}

impl Config {
    // Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            upstream_url: get_optional_string("UPSTREAM_URL")?
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.upstream_url),
            bind_addr: get_optional_parsed("BIND_ADDR")?.unwrap_or(defaults.bind_addr),
            service_version: get_optional_string("SERVICE_VERSION")?
                .unwrap_or(defaults.service_version),
            default_filter: get_optional_string("DEFAULT_FILTER")?
                .unwrap_or(defaults.default_filter),
            filter_field: get_optional_string("FILTER_FIELD")?.unwrap_or(defaults.filter_field),
            cache_ttl: get_optional_parsed("CACHE_TTL")?.unwrap_or(defaults.cache_ttl),
            parse_headers: get_optional_parsed("ICS_HEADERS")?.unwrap_or(defaults.parse_headers),
            strict_keys: get_optional_parsed("ICS_STRICT_KEYS")?.unwrap_or(defaults.strict_keys),
        })
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            key_mode: if self.strict_keys {
                KeyMode::Strict
            } else {
                KeyMode::Permissive
            },
            headers: self.parse_headers,
        }
    }

    /// Filter for a request, using `default_filter` when none was given.
    pub fn event_filter(&self, requested: Option<&str>) -> EventFilter {
        let needle = requested
            .filter(|value| !value.is_empty())
            .unwrap_or(self.default_filter.as_str());
        EventFilter::new(self.filter_field.as_str(), needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_permissive_with_headers() {
        let options = Config::default().parse_options();
        assert_eq!(options.key_mode, KeyMode::Permissive);
        assert!(options.headers);
    }

    #[test]
    fn strict_keys_switch_key_mode() {
        let config = Config {
            strict_keys: true,
            parse_headers: false,
            ..Config::default()
        };
        let options = config.parse_options();
        assert_eq!(options.key_mode, KeyMode::Strict);
        assert!(!options.headers);
    }

    #[test]
    fn empty_filter_falls_back_to_default() {
        let config = Config::default();
        assert_eq!(config.event_filter(None).needle, "First");
        assert_eq!(config.event_filter(Some("")).needle, "First");
        assert_eq!(config.event_filter(Some("Review")).needle, "Review");
        assert_eq!(config.event_filter(None).field, "SUMMARY");
    }

    #[test]
    fn unset_variable_is_none() {
        let value: Option<u64> = get_optional_parsed("ICS_FILTER_PROXY_TEST_UNSET_VAR").unwrap();
        assert_eq!(value, None);
    }
}
