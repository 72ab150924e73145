use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{Feed, ProviderError};

/// World Bank indicator code for GDP in current US$.
pub const GDP_INDICATOR: &str = "NY.GDP.MKTP.CD";

/// Number of leading observations considered, most recent first.
pub const MAX_GDP_RECORDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GdpRecord {
    pub year: String,
    pub gdp: f64,
}

/// At most [`MAX_GDP_RECORDS`] records, in provider order.
pub type GdpSeries = Vec<GdpRecord>;

#[async_trait::async_trait]
pub trait EconomicSource: Send + Sync {
    async fn gdp_series(&self, country_code: &str) -> Result<GdpSeries, ProviderError>;
}

pub struct WorldBankClient {
    client: reqwest::Client,
    base_url: Url,
}

impl WorldBankClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)?;
        anyhow::ensure!(
            !base_url.cannot_be_a_base(),
            "economic API base {base_url} cannot hold a path"
        );
        Ok(Self { client, base_url })
    }

    /// The country code becomes a single encoded path segment, so input such
    /// as `DE/..` or `DE?x` cannot change the endpoint.
    fn indicator_url(&self, country_code: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["country", country_code, "indicator", GDP_INDICATOR]);
        }
        url
    }
}

#[derive(Deserialize)]
struct IndicatorObservation {
    date: String,
    value: Option<f64>,
}

#[async_trait::async_trait]
impl EconomicSource for WorldBankClient {
    #[tracing::instrument(
        name = "feed.economic.fetch",
        skip(self),
        fields(
            feed.name = "gdp",
            gdp.records = tracing::field::Empty,
            http.response.status_code = tracing::field::Empty,
        )
    )]
    async fn gdp_series(&self, country_code: &str) -> Result<GdpSeries, ProviderError> {
        let response = self
            .client
            .get(self.indicator_url(country_code))
            .query(&[("format", "json")])
            .send()
            .await
            .map_err(|e| ProviderError::transport(Feed::Gdp, e))?;

        let status = response.status().as_u16();
        let span = tracing::Span::current();
        span.record("http.response.status_code", status);

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::transport(Feed::Gdp, e))?;

        let series = parse_gdp(status, &body)?;
        span.record("gdp.records", series.len());

        Ok(series)
    }
}

/// The provider answers with `[metadata, observations]`. An unknown country
/// code yields a single-element array holding only a message.
pub(crate) fn parse_gdp(status: u16, body: &str) -> Result<GdpSeries, ProviderError> {
    if status != 200 {
        return Err(ProviderError::Http {
            feed: Feed::Gdp,
            status,
        });
    }

    let payload: Vec<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| ProviderError::data(Feed::Gdp, e))?;

    let Some(observations) = payload.into_iter().nth(1).filter(|v| !v.is_null()) else {
        return Err(ProviderError::NoData { feed: Feed::Gdp });
    };

    let observations: Vec<IndicatorObservation> =
        serde_json::from_value(observations).map_err(|e| ProviderError::data(Feed::Gdp, e))?;

    Ok(observations
        .into_iter()
        .take(MAX_GDP_RECORDS)
        .filter_map(|o| o.value.map(|gdp| GdpRecord { year: o.date, gdp }))
        .collect())
}
