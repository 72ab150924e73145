use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has an invalid value: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub openweather_api_key: String,
    pub llm_provider: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    pub ollama_base_url: String,
    pub weather_api_base: String,
    pub economic_api_base: String,
    pub http_timeout: Duration,
    pub llm_timeout: Duration,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let llm_provider = or_default("LLM_PROVIDER", "google");
        let llm_api_key = match llm_provider.as_str() {
            // Older deployments spell it `Gemini_API_KEY`.
            "google" => Some(
                required(&lookup, "GEMINI_API_KEY")
                    .or_else(|_| required(&lookup, "Gemini_API_KEY"))
                    .map_err(|_| ConfigError::Missing("GEMINI_API_KEY"))?,
            ),
            "openai" => Some(required(&lookup, "OPENAI_API_KEY")?),
            "ollama" => None,
            _ => {
                return Err(ConfigError::Invalid {
                    var: "LLM_PROVIDER",
                    value: llm_provider.clone(),
                });
            }
        };

        Ok(Self {
            port: parsed(&lookup, "APP_PORT", 8080)?,
            environment: or_default("ENVIRONMENT", "development"),
            openweather_api_key: required(&lookup, "OPENWEATHER_API_KEY")?,
            llm_provider,
            llm_api_key,
            llm_model: or_default("LLM_MODEL", "gemini-1.5-flash"),
            llm_temperature: temperature(&lookup)?,
            llm_max_tokens: parsed(&lookup, "LLM_MAX_TOKENS", 2048)?,
            ollama_base_url: or_default("OLLAMA_BASE_URL", "http://localhost:11434"),
            weather_api_base: or_default(
                "WEATHER_API_BASE",
                "http://api.openweathermap.org/data/2.5",
            ),
            economic_api_base: or_default("ECONOMIC_API_BASE", "https://api.worldbank.org/v2"),
            http_timeout: timeout_secs(&lookup, "HTTP_TIMEOUT_SECS", 10)?,
            llm_timeout: timeout_secs(&lookup, "LLM_TIMEOUT_SECS", 60)?,
            otel_service_name: or_default("OTEL_SERVICE_NAME", "relocation-insights"),
            otel_exporter_endpoint: or_default(
                "OTEL_EXPORTER_OTLP_ENDPOINT",
                "http://localhost:4317",
            ),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

// Blank secrets count as missing.
fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(var))
}

fn parsed<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

fn temperature<F>(lookup: &F) -> Result<f32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value: f32 = parsed(lookup, "LLM_TEMPERATURE", 0.9)?;
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Invalid {
            var: "LLM_TEMPERATURE",
            value: value.to_string(),
        });
    }
    Ok(value)
}

// A zero timeout would fail every call immediately.
fn timeout_secs<F>(lookup: &F, var: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parsed(lookup, var, default)? {
        0 => Err(ConfigError::Invalid {
            var,
            value: "0".to_string(),
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_required_keys() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENWEATHER_API_KEY", "weather-key"),
            ("GEMINI_API_KEY", "gemini-key"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.llm_provider, "google");
        assert_eq!(config.llm_api_key.as_deref(), Some("gemini-key"));
        assert_eq!(config.llm_model, "gemini-1.5-flash");
        assert_eq!(config.llm_temperature, 0.9);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.llm_timeout, Duration::from_secs(60));
        assert_eq!(
            config.weather_api_base,
            "http://api.openweathermap.org/data/2.5"
        );
        assert!(!config.is_production());
    }

    #[test]
    fn test_missing_weather_key_fails() {
        let err = Config::from_lookup(lookup_from(&[("GEMINI_API_KEY", "gemini-key")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("OPENWEATHER_API_KEY"));
        assert_eq!(err.to_string(), "OPENWEATHER_API_KEY must be set");
    }

    #[test]
    fn test_missing_gemini_key_fails() {
        let err = Config::from_lookup(lookup_from(&[("OPENWEATHER_API_KEY", "weather-key")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing("GEMINI_API_KEY"));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let err = Config::from_lookup(lookup_from(&[
            ("OPENWEATHER_API_KEY", "   "),
            ("GEMINI_API_KEY", "gemini-key"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("OPENWEATHER_API_KEY"));
    }

    #[test]
    fn test_openai_provider_needs_openai_key() {
        let err = Config::from_lookup(lookup_from(&[
            ("OPENWEATHER_API_KEY", "weather-key"),
            ("LLM_PROVIDER", "openai"),
            ("GEMINI_API_KEY", "gemini-key"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("OPENAI_API_KEY"));
    }

    #[test]
    fn test_ollama_needs_no_llm_key() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENWEATHER_API_KEY", "weather-key"),
            ("LLM_PROVIDER", "ollama"),
        ]))
        .unwrap();
        assert!(config.llm_api_key.is_none());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("OPENWEATHER_API_KEY", "weather-key"),
            ("LLM_PROVIDER", "carrier-pigeon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "LLM_PROVIDER", .. }));
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("OPENWEATHER_API_KEY", "weather-key"),
            ("GEMINI_API_KEY", "gemini-key"),
            ("APP_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: "APP_PORT",
                value: "eighty".to_string()
            }
        );
    }

    #[test]
    fn test_overrides_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENWEATHER_API_KEY", "weather-key"),
            ("GEMINI_API_KEY", "gemini-key"),
            ("ENVIRONMENT", "production"),
            ("LLM_TEMPERATURE", "0.2"),
            ("HTTP_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert!(config.is_production());
        assert_eq!(config.llm_temperature, 0.2);
        assert_eq!(config.http_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_legacy_gemini_key_spelling_accepted() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENWEATHER_API_KEY", "weather-key"),
            ("Gemini_API_KEY", "legacy-key"),
        ]))
        .unwrap();
        assert_eq!(config.llm_api_key.as_deref(), Some("legacy-key"));
    }

    #[test]
    fn test_canonical_gemini_key_wins() {
        let config = Config::from_lookup(lookup_from(&[
            ("OPENWEATHER_API_KEY", "weather-key"),
            ("GEMINI_API_KEY", "new-key"),
            ("Gemini_API_KEY", "legacy-key"),
        ]))
        .unwrap();
        assert_eq!(config.llm_api_key.as_deref(), Some("new-key"));
    }

    #[test]
    fn test_non_finite_temperature_rejected() {
        for raw in ["NaN", "inf", "-0.5"] {
            let err = Config::from_lookup(lookup_from(&[
                ("OPENWEATHER_API_KEY", "weather-key"),
                ("GEMINI_API_KEY", "gemini-key"),
                ("LLM_TEMPERATURE", raw),
            ]))
            .unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { var: "LLM_TEMPERATURE", .. }),
                "{raw} accepted"
            );
        }
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        for var in ["HTTP_TIMEOUT_SECS", "LLM_TIMEOUT_SECS"] {
            let err = Config::from_lookup(lookup_from(&[
                ("OPENWEATHER_API_KEY", "weather-key"),
                ("GEMINI_API_KEY", "gemini-key"),
                (var, "0"),
            ]))
            .unwrap_err();
            assert_eq!(
                err,
                ConfigError::Invalid {
                    var,
                    value: "0".to_string()
                }
            );
        }
    }
}
