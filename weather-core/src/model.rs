use serde::{Deserialize, Serialize};

/// A city and the absolute URL of its forecast page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    /// Empty when the listing entry had no link.
    pub web_url: String,
}

/// A province (or municipality) with its listing page and cities in page order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    pub name: String,
    pub web_url: String,
    #[serde(default)]
    pub cities: Vec<City>,
}

/// Daytime half of a forecast day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPart {
    pub weather: String,
    pub max_temp: String,
    pub wind_speed: String,
    pub wind_dir: String,
}

/// Night half of a forecast day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightPart {
    pub weather: String,
    pub min_temp: String,
    pub wind_speed: String,
    pub wind_dir: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub week_label: String,
    pub day: DayPart,
    pub night: NightPart,
}

/// A parsed 7-day forecast page. `days` keeps the page order, which is chronological.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub city_label: String,
    pub updated_at_label: String,
    pub days: Vec<ForecastDay>,
}
