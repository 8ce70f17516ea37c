//! `getWeather` tool backed by the Open-Meteo forecast API

use std::sync::Arc;

use reqwest::Client;
use schemars::JsonSchema;
use serde::Deserialize;

use super::declaration::create_tool_declaration;
use super::registry::FunctionRegistry;

pub const NAME: &str = "getWeather";
pub const DESCRIPTION: &str = "Get the current weather at a location";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct WeatherArgs {
    /// Latitude of the location
    pub latitude: f64,
    /// Longitude of the location
    pub longitude: f64,
}

/// Build the forecast URL for a coordinate pair
pub fn forecast_url(base: &str, args: &WeatherArgs) -> String {
    format!(
        "{}?latitude={}&longitude={}&current=temperature_2m&hourly=temperature_2m&daily=sunrise,sunset&timezone=auto",
        base, args.latitude, args.longitude
    )
}

async fn fetch_weather(
    client: Client,
    base: Arc<str>,
    args: WeatherArgs,
) -> Result<serde_json::Value, String> {
    let response = client
        .get(forecast_url(&base, &args))
        .send()
        .await
        .map_err(|e| format!("Weather request failed: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("Weather service returned {}", response.status()));
    }

    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| format!("Invalid weather response: {}", e))
}

/// Register `getWeather` with the given forecast endpoint
pub fn register_weather(registry: &mut FunctionRegistry, client: Client, base_url: &str) {
    let base: Arc<str> = Arc::from(base_url.trim_end_matches('/'));
    registry.register_async(
        create_tool_declaration::<WeatherArgs>(NAME, DESCRIPTION),
        move |args: WeatherArgs| fetch_weather(client.clone(), base.clone(), args),
    );
}
