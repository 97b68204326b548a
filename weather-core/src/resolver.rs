//! Maps a free-text name to a city in the index.

use crate::{
    error::{Result, WeatherError},
    index::Index,
    model::{City, Province},
};

/// Which part of the index a query matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// A city whose name contains the query.
    City(&'a City),
    /// No city matched, but a province name did; its first city stands in for it.
    Province {
        province: &'a Province,
        city: &'a City,
    },
}

impl<'a> Resolution<'a> {
    pub fn city(&self) -> &'a City {
        match *self {
            Resolution::City(city) => city,
            Resolution::Province { city, .. } => city,
        }
    }
}

/// Read-only lookups over an [`Index`].
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    index: &'a Index,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a Index) -> Self {
        Self { index }
    }

    /// City names win over province names: every city in every province is
    /// checked before any province name is.
    pub fn resolve(&self, query: &str) -> Result<Resolution<'a>> {
        let provinces = self.index.provinces();

        if let Some(city) = provinces
            .iter()
            .flat_map(|p| p.cities.iter())
            .find(|c| c.name.contains(query))
        {
            return Ok(Resolution::City(city));
        }

        let province = self
            .find_province(query)
            .ok_or_else(|| WeatherError::NotFound(query.to_string()))?;
        let city = province
            .cities
            .first()
            .ok_or_else(|| WeatherError::EmptyProvince(province.name.clone()))?;

        Ok(Resolution::Province { province, city })
    }

    /// Forecast URL for `query`, or an empty string when nothing usable matches.
    pub fn resolve_city_url(&self, query: &str) -> String {
        self.resolve(query)
            .map(|r| r.city().web_url.clone())
            .unwrap_or_default()
    }

    /// City names of the first province whose name contains `query`.
    pub fn list_cities(&self, query: &str) -> Vec<&'a str> {
        self.find_province(query)
            .map(|p| p.cities.iter().map(|c| c.name.as_str()).collect())
            .unwrap_or_default()
    }

    fn find_province(&self, query: &str) -> Option<&'a Province> {
        self.index
            .provinces()
            .iter()
            .find(|p| p.name.contains(query))
    }
}
