//! Interactive `skylook configure` flow.

use anyhow::Context;
use inquire::{
    Confirm, CustomType, Password, PasswordDisplayMode, Select, Text,
    autocompletion::{Autocomplete, Replacement},
    error::CustomUserError,
};
use skylook_core::{CityDirectory, Config, LocationMode};

/// Completes city names from the built-in table.
#[derive(Debug, Clone, Default)]
pub struct CityCompleter;

impl Autocomplete for CityCompleter {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, CustomUserError> {
        Ok(CityDirectory::builtin()
            .suggest(input)
            .into_iter()
            .map(|entry| entry.name.clone())
            .collect())
    }

    fn get_completion(
        &mut self,
        _input: &str,
        highlighted_suggestion: Option<String>,
    ) -> Result<Replacement, CustomUserError> {
        Ok(highlighted_suggestion)
    }
}

pub fn run(mut config: Config) -> anyhow::Result<Config> {
    let has_key = config.provider.api_key.is_some();
    let replace_key = !has_key
        || Confirm::new("An OpenWeather API key is already stored. Replace it?")
            .with_default(false)
            .prompt()
            .context("Configuration cancelled")?;

    if replace_key {
        let key = Password::new("OpenWeather API key:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
            .context("Configuration cancelled")?;
        config.set_api_key(key.trim().to_string());
    }

    let city = Text::new("Default city (leave empty for your location):")
        .with_initial_value(config.default_city.as_deref().unwrap_or(""))
        .with_autocomplete(CityCompleter)
        .prompt()
        .context("Configuration cancelled")?;
    config.default_city = Some(city.trim().to_string()).filter(|c| !c.is_empty());

    let starting = LocationMode::all()
        .iter()
        .position(|m| *m == config.location.mode)
        .unwrap_or(0);
    let mode = Select::new("How should your location be found?", LocationMode::all().to_vec())
        .with_starting_cursor(starting)
        .prompt()
        .context("Configuration cancelled")?;
    config.location.mode = mode;

    if mode == LocationMode::Fixed {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number between -90 and 90")
            .prompt()
            .context("Configuration cancelled")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number between -180 and 180")
            .prompt()
            .context("Configuration cancelled")?;
        config.location.latitude = Some(latitude);
        config.location.longitude = Some(longitude);

        if !config.location.fixed_coordinates().is_some_and(|c| c.is_valid()) {
            anyhow::bail!("Coordinates {latitude}, {longitude} are out of range");
        }
    }

    Ok(config)
}
