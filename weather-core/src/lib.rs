//! Core library for the `cnweather` CLI.
//!
//! This crate defines:
//! - Configuration handling
//! - The crawler that builds the province/city index from weather.cma.cn
//! - Name resolution against that index
//! - Scraping of a city's 7-day forecast page
//!
//! It is used by `cnweather-cli`, but can also be reused by other binaries or services.

#[macro_use]
mod macros;

pub mod config;
pub mod crawler;
pub mod error;
pub mod fetch;
pub mod forecast;
pub mod index;
pub mod model;
pub mod resolver;

pub use config::Config;
pub use crawler::IndexBuilder;
pub use error::WeatherError;
pub use fetch::{HttpFetcher, PageSource};
pub use forecast::fetch_forecast;
pub use index::{Index, index_age};
pub use model::{City, DayPart, ForecastDay, ForecastReport, NightPart, Province};
pub use resolver::{Resolution, Resolver};
