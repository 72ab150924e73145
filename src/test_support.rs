//! In-process fakes shared by unit tests.

use std::sync::Mutex;
use std::time::Duration;

use axum::Router;

use crate::error::ProviderError;
use crate::feeds::{CurrentWeather, EconomicSource, GdpSeries, WeatherSource};
use crate::llm::{GenerateRequest, GenerateResponse, Provider};

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub struct FakeProvider {
    reply: Result<String, String>,
    delay: Duration,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl FakeProvider {
    pub fn replying(content: &str) -> Self {
        Self {
            reply: Ok(content.to_string()),
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            ..Self::replying("")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for FakeProvider {
    async fn generate(&self, req: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.requests.lock().unwrap().push(req.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.reply {
            Ok(content) => Ok(GenerateResponse {
                content: content.clone(),
                model: req.model.clone(),
                input_tokens: 42,
                output_tokens: 7,
                finish_reason: "stop".to_string(),
            }),
            Err(message) => Err(anyhow::anyhow!("{message}")),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }

    fn server(&self) -> (&str, u16) {
        ("localhost", 0)
    }
}

pub struct FakeWeather(pub Result<CurrentWeather, ProviderError>);

#[async_trait::async_trait]
impl WeatherSource for FakeWeather {
    async fn current(&self, _city: &str) -> Result<CurrentWeather, ProviderError> {
        self.0.clone()
    }
}

pub struct FakeEconomy(pub Result<GdpSeries, ProviderError>);

#[async_trait::async_trait]
impl EconomicSource for FakeEconomy {
    async fn gdp_series(&self, _country_code: &str) -> Result<GdpSeries, ProviderError> {
        self.0.clone()
    }
}
