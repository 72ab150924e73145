use crate::error::ProviderError;
use crate::feeds::{CurrentWeather, GdpSeries};

use super::retrieve::RetrieveResult;

pub const GDP_SUMMARY_PREFIX: &str = "GDP data for recent years: ";
pub const NO_GDP_DATA: &str = "No GDP data available.";

#[derive(Debug, Clone, PartialEq)]
pub struct Summaries {
    pub weather: String,
    pub gdp: String,
}

#[tracing::instrument(
    name = "pipeline_stage format",
    skip(data),
    fields(pipeline.stage = "format")
)]
pub fn format_summaries(city: &str, data: &RetrieveResult) -> Summaries {
    Summaries {
        weather: weather_summary(city, &data.weather),
        gdp: gdp_summary(&data.gdp),
    }
}

pub fn weather_summary(city: &str, weather: &Result<CurrentWeather, ProviderError>) -> String {
    match weather {
        Ok(w) => format!(
            "The current temperature in {city} is {}°C with {}.",
            display_number(w.temperature),
            w.description
        ),
        Err(err) => err.to_string(),
    }
}

pub fn gdp_summary(gdp: &Result<GdpSeries, ProviderError>) -> String {
    match gdp {
        Ok(series) if series.is_empty() => NO_GDP_DATA.to_string(),
        Ok(series) => {
            let items: Vec<String> = series
                .iter()
                .map(|r| format!("{}: {}", r.year, display_number(r.gdp)))
                .collect();
            format!("{GDP_SUMMARY_PREFIX}{}", items.join(", "))
        }
        Err(err) => err.to_string(),
    }
}

/// Shortest round-trip form, keeping `.0` on integral values
/// (`15.2`, `4000000000000.0`).
pub(crate) fn display_number(value: f64) -> String {
    format!("{value:?}")
}
