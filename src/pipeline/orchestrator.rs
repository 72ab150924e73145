use serde::Serialize;

use crate::feeds::{EconomicSource, WeatherSource};
use crate::llm::LlmClient;
use crate::telemetry::metrics::INSIGHTS_DURATION;

use super::generate::SynthesisSettings;
use super::{format, generate, retrieve};

#[derive(Debug, Clone)]
pub struct RelocationRequest {
    pub city: String,
    pub country_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelocationResult {
    pub weather_summary: String,
    pub gdp_summary: String,
    pub relocation_insights: String,
}

/// Runs one full retrieve, format, synthesize pass. Provider and model
/// failures degrade into descriptive text, so this never fails.
#[tracing::instrument(
    name = "pipeline insights",
    skip(weather_source, economic_source, llm_client, settings),
    fields(insights.duration_ms)
)]
pub async fn generate_insights(
    weather_source: &dyn WeatherSource,
    economic_source: &dyn EconomicSource,
    llm_client: &LlmClient,
    settings: &SynthesisSettings,
    request: &RelocationRequest,
) -> RelocationResult {
    let start = std::time::Instant::now();

    // Stage 1: Fetch weather and GDP
    let data = retrieve::retrieve(
        weather_source,
        economic_source,
        &request.city,
        &request.country_code,
    )
    .await;

    // Stage 2: Turn provider data or errors into summaries
    let summaries = format::format_summaries(&request.city, &data);

    // Stage 3: Synthesize the narrative from both summaries
    let relocation_insights = generate::generate(
        llm_client,
        settings,
        &request.city,
        &summaries.weather,
        &summaries.gdp,
    )
    .await;

    let duration = start.elapsed();
    INSIGHTS_DURATION.record(duration.as_secs_f64(), &[]);
    tracing::Span::current().record("insights.duration_ms", duration.as_millis() as u64);

    RelocationResult {
        weather_summary: summaries.weather,
        gdp_summary: summaries.gdp,
        relocation_insights,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::error::{Feed, ProviderError};
    use crate::feeds::{CurrentWeather, GdpRecord};
    use crate::test_support::{FakeEconomy, FakeProvider, FakeWeather};

    fn settings() -> SynthesisSettings {
        SynthesisSettings {
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.9,
            max_tokens: 2048,
        }
    }

    fn berlin() -> RelocationRequest {
        RelocationRequest {
            city: "Berlin".to_string(),
            country_code: "DE".to_string(),
        }
    }

    fn berlin_weather() -> FakeWeather {
        FakeWeather(Ok(CurrentWeather {
            temperature: 15.2,
            description: "clear sky".to_string(),
        }))
    }

    fn german_gdp() -> FakeEconomy {
        FakeEconomy(Ok(vec![
            GdpRecord {
                year: "2023".to_string(),
                gdp: 4.0e12,
            },
            GdpRecord {
                year: "2022".to_string(),
                gdp: 3.9e12,
            },
        ]))
    }

    #[tokio::test]
    async fn test_berlin_scenario() {
        let provider = Arc::new(FakeProvider::replying("Berlin is a vibrant city."));
        let llm = LlmClient::new(provider.clone(), Duration::from_secs(5));

        let result =
            generate_insights(&berlin_weather(), &german_gdp(), &llm, &settings(), &berlin()).await;

        assert_eq!(
            result,
            RelocationResult {
                weather_summary: "The current temperature in Berlin is 15.2°C with clear sky."
                    .to_string(),
                gdp_summary:
                    "GDP data for recent years: 2023: 4000000000000.0, 2022: 3900000000000.0"
                        .to_string(),
                relocation_insights: "Berlin is a vibrant city.".to_string(),
            }
        );

        let prompt = &provider.requests()[0].prompt;
        assert!(prompt.contains(&result.weather_summary));
        assert!(prompt.contains(&result.gdp_summary));
    }

    #[tokio::test]
    async fn test_weather_404_still_synthesizes() {
        let weather = FakeWeather(Err(ProviderError::Http {
            feed: Feed::Weather,
            status: 404,
        }));
        let provider = Arc::new(FakeProvider::replying("Insights without weather."));
        let llm = LlmClient::new(provider.clone(), Duration::from_secs(5));

        let result = generate_insights(&weather, &german_gdp(), &llm, &settings(), &berlin()).await;

        assert_eq!(result.weather_summary, "Failed to fetch weather data: 404");
        assert!(!result.relocation_insights.is_empty());
        assert!(
            provider.requests()[0]
                .prompt
                .contains("Failed to fetch weather data: 404")
        );
    }

    #[tokio::test]
    async fn test_gdp_without_values() {
        let llm = LlmClient::new(Arc::new(FakeProvider::replying("ok")), Duration::from_secs(5));

        let result = generate_insights(
            &berlin_weather(),
            &FakeEconomy(Ok(vec![])),
            &llm,
            &settings(),
            &berlin(),
        )
        .await;

        assert_eq!(result.gdp_summary, "No GDP data available.");
    }

    #[tokio::test]
    async fn test_gdp_short_response() {
        let llm = LlmClient::new(Arc::new(FakeProvider::replying("ok")), Duration::from_secs(5));
        let economy = FakeEconomy(Err(ProviderError::NoData { feed: Feed::Gdp }));

        let result = generate_insights(&berlin_weather(), &economy, &llm, &settings(), &berlin()).await;

        assert_eq!(result.gdp_summary, "No GDP data available");
    }

    #[tokio::test]
    async fn test_synthesis_failure_keeps_summaries() {
        let llm = LlmClient::new(
            Arc::new(FakeProvider::failing("401 invalid api key")),
            Duration::from_secs(5),
        );

        let result =
            generate_insights(&berlin_weather(), &german_gdp(), &llm, &settings(), &berlin()).await;

        assert_eq!(
            result.weather_summary,
            "The current temperature in Berlin is 15.2°C with clear sky."
        );
        assert!(result.gdp_summary.starts_with("GDP data for recent years: "));
        assert_eq!(
            result.relocation_insights,
            "Unable to generate relocation insights: 401 invalid api key"
        );
    }

    #[tokio::test]
    async fn test_repeated_runs_yield_identical_summaries() {
        let llm = LlmClient::new(Arc::new(FakeProvider::replying("ok")), Duration::from_secs(5));
        let weather = berlin_weather();
        let economy = german_gdp();

        let first = generate_insights(&weather, &economy, &llm, &settings(), &berlin()).await;
        let second = generate_insights(&weather, &economy, &llm, &settings(), &berlin()).await;

        assert_eq!(first.weather_summary, second.weather_summary);
        assert_eq!(first.gdp_summary, second.gdp_summary);
    }
}
