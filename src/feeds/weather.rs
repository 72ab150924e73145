use serde::{Deserialize, Serialize};

use crate::error::{Feed, ProviderError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWeather {
    /// Temperature in Celsius
    pub temperature: f64,
    /// Short condition text from the first weather entry, e.g. "clear sky"
    pub description: String,
}

#[async_trait::async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, city: &str) -> Result<CurrentWeather, ProviderError>;
}

/// OpenWeatherMap current-weather client.
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct OpenWeatherResponse {
    main: OpenWeatherMain,
    weather: Vec<OpenWeatherCondition>,
}

#[derive(Deserialize)]
struct OpenWeatherMain {
    temp: f64,
}

#[derive(Deserialize)]
struct OpenWeatherCondition {
    description: String,
}

#[async_trait::async_trait]
impl WeatherSource for OpenWeatherClient {
    #[tracing::instrument(
        name = "feed.weather.fetch",
        skip(self),
        fields(
            feed.name = "weather",
            http.response.status_code = tracing::field::Empty,
        )
    )]
    async fn current(&self, city: &str) -> Result<CurrentWeather, ProviderError> {
        let url = format!("{}/weather", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::transport(Feed::Weather, e))?;

        let status = response.status().as_u16();
        tracing::Span::current().record("http.response.status_code", status);

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::transport(Feed::Weather, e))?;

        parse_weather(status, &body)
    }
}

pub(crate) fn parse_weather(status: u16, body: &str) -> Result<CurrentWeather, ProviderError> {
    if status != 200 {
        return Err(ProviderError::Http {
            feed: Feed::Weather,
            status,
        });
    }

    let payload: OpenWeatherResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::data(Feed::Weather, e))?;

    let condition = payload
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::data(Feed::Weather, "response has no weather entries"))?;

    Ok(CurrentWeather {
        temperature: payload.main.temp,
        description: condition.description,
    })
}
