use opentelemetry::KeyValue;

use crate::error::ProviderError;
use crate::feeds::{CurrentWeather, EconomicSource, GdpSeries, WeatherSource};
use crate::telemetry::metrics::FEED_ERROR_COUNT;

#[derive(Debug)]
pub struct RetrieveResult {
    pub weather: Result<CurrentWeather, ProviderError>,
    pub gdp: Result<GdpSeries, ProviderError>,
}

/// Fetches both feeds. They are independent of each other, so they run
/// concurrently; provider failures are carried in the result, never raised.
#[tracing::instrument(
    name = "pipeline_stage retrieve",
    skip(weather_source, economic_source),
    fields(
        pipeline.stage = "retrieve",
        weather.available,
        gdp.records,
    )
)]
pub async fn retrieve(
    weather_source: &dyn WeatherSource,
    economic_source: &dyn EconomicSource,
    city: &str,
    country_code: &str,
) -> RetrieveResult {
    let (weather, gdp) = tokio::join!(
        weather_source.current(city),
        economic_source.gdp_series(country_code),
    );

    for err in [weather.as_ref().err(), gdp.as_ref().err()]
        .into_iter()
        .flatten()
    {
        tracing::warn!(
            feed = %err.feed(),
            error.type = err.kind(),
            error = %err,
            error.detail = ?err,
            "Feed unavailable, continuing with error summary"
        );
        FEED_ERROR_COUNT.add(
            1,
            &[
                KeyValue::new("feed.name", err.feed().as_str()),
                KeyValue::new("error.type", err.kind()),
            ],
        );
    }

    let span = tracing::Span::current();
    span.record("weather.available", weather.is_ok());
    if let Ok(series) = &gdp {
        span.record("gdp.records", series.len());
    }

    RetrieveResult { weather, gdp }
}
