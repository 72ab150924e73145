pub mod economic;
pub mod weather;

use std::time::Duration;

pub use economic::{EconomicSource, GdpRecord, GdpSeries, WorldBankClient};
pub use weather::{CurrentWeather, OpenWeatherClient, WeatherSource};

pub const USER_AGENT: &str = concat!("relocation-insights/", env!("CARGO_PKG_VERSION"));

/// Pooled HTTP client shared by the data feeds. Every request made through it
/// is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}
