use crate::{
    Config, WeatherQuery, WeatherSnapshot, error::LookupError,
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn get_weather(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, LookupError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> Result<Box<dyn WeatherProvider>, LookupError> {
    let api_key = config.api_key().ok_or(LookupError::MissingApiKey)?;
    let provider = OpenWeatherProvider::with_base_url(api_key, config.provider_url())?;
    Ok(Box::new(provider))
}
