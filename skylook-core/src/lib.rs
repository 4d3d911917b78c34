//! Core library for the `skylook` weather lookup app.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over the weather provider, plus reverse geocoding
//! - Day/night classification and the condition narrative
//! - City suggestions and the favorites store
//! - Device location polling
//! - A single view state advanced by lookup events
//!
//! It is used by `skylook-cli`, but can also be reused by other front ends.

pub mod clock;
pub mod config;
pub mod daylight;
pub mod error;
pub mod favorites;
pub mod geocode;
pub mod location;
pub mod model;
pub mod narrative;
pub mod provider;
pub mod session;
pub mod suggest;
pub mod view;

pub use config::{Config, LocationMode};
pub use daylight::{DaylightState, is_daytime};
pub use error::{LocationError, LookupError};
pub use favorites::Favorites;
pub use model::{Coordinates, WeatherQuery, WeatherSnapshot};
pub use narrative::{Brightness, ConditionNarrative, ImageKey, brightness_of, describe, image_for};
pub use provider::WeatherProvider;
pub use session::Session;
pub use suggest::CityDirectory;
pub use view::{Status, ViewEvent, ViewState};
