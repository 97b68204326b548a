//! Scrapes the 7-day forecast page of a single city.
//!
//! The page is a fixed template. Each day is a `.pull-left.day` card under
//! `#dayList` holding a run of `.day-item` blocks whose meaning depends only
//! on their position:
//!
//! | pos | content                       |
//! |-----|-------------------------------|
//! | 0   | week label and date, `\n`-separated |
//! | 1   | day weather icon (ignored)    |
//! | 2   | day weather                   |
//! | 3   | day wind speed                |
//! | 4   | day wind direction            |
//! | 5   | high/low temperature bars (read via `.high`/`.low`) |
//! | 6   | night weather icon (ignored)  |
//! | 7   | night weather                 |
//! | 8   | night wind speed              |
//! | 9   | night wind direction          |

use scraper::{ElementRef, Html};
use tracing::debug;

use crate::{
    error::{Result, WeatherError},
    fetch::{PageSource, fetch_document, normalize_text},
    model::{ForecastDay, ForecastReport},
};

const FORECAST_HEADING_MARKER: &str = "7天天气预报";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardField {
    DateWeek,
    DayWeather,
    DayWindSpeed,
    DayWindDir,
    NightWeather,
    NightWindSpeed,
    NightWindDir,
}

/// Position of each `.day-item` that carries a field. Anything else is skipped.
const CARD_SCHEMA: &[(usize, CardField)] = &[
    (0, CardField::DateWeek),
    (2, CardField::DayWeather),
    (3, CardField::DayWindSpeed),
    (4, CardField::DayWindDir),
    (7, CardField::NightWeather),
    (8, CardField::NightWindSpeed),
    (9, CardField::NightWindDir),
];

/// A card must have at least this many `.day-item`s to cover the schema.
const CARD_ITEM_COUNT: usize = 10;

fn field_at(position: usize) -> Option<CardField> {
    CARD_SCHEMA
        .iter()
        .find(|(pos, _)| *pos == position)
        .map(|(_, field)| *field)
}

/// Fetch the forecast page at `url` and parse it.
pub async fn fetch_forecast(source: &dyn PageSource, url: &str) -> Result<ForecastReport> {
    let document = fetch_document(source, url).await?;
    let report = parse_forecast(&document)?;
    debug!(url, days = report.days.len(), "forecast parsed");
    Ok(report)
}

pub fn parse_forecast_html(html: &str) -> Result<ForecastReport> {
    parse_forecast(&Html::parse_document(html))
}

pub fn parse_forecast(document: &Html) -> Result<ForecastReport> {
    let updated_at_label = document
        .select(selector!(".hp .hd"))
        .map(element_text)
        .filter(|text| text.contains(FORECAST_HEADING_MARKER))
        .last()
        .map(|text| normalize_text(&text))
        .unwrap_or_default();

    let breadcrumb = joined_text(document.select(selector!("#breadcrumb li.active")));
    let city_label = normalize_text(&breadcrumb);

    let days = document
        .select(selector!("#dayList .pull-left.day"))
        .enumerate()
        .map(|(i, card)| {
            parse_card(card)
                .map_err(|e| WeatherError::parse(format!("forecast card {i}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ForecastReport {
        city_label,
        updated_at_label,
        days,
    })
}

fn parse_card(card: ElementRef) -> Result<ForecastDay, String> {
    let items: Vec<ElementRef> = card.select(selector!(".day-item")).collect();
    if items.len() < CARD_ITEM_COUNT {
        return Err(format!(
            "expected {CARD_ITEM_COUNT} day items, found {}",
            items.len()
        ));
    }

    let mut day = ForecastDay::default();
    let mut date_week = String::new();

    for (position, item) in items.into_iter().enumerate() {
        let Some(field) = field_at(position) else {
            continue;
        };
        let text = element_text(item);
        match field {
            CardField::DateWeek => date_week = text,
            CardField::DayWeather => day.day.weather = normalize_text(&text),
            CardField::DayWindSpeed => day.day.wind_speed = normalize_text(&text),
            CardField::DayWindDir => day.day.wind_dir = normalize_text(&text),
            CardField::NightWeather => day.night.weather = normalize_text(&text),
            CardField::NightWindSpeed => day.night.wind_speed = normalize_text(&text),
            CardField::NightWindDir => day.night.wind_dir = normalize_text(&text),
        }
    }

    let high = joined_text(card.select(selector!(".day-item.bardiv .high")));
    day.day.max_temp = normalize_text(&high);
    let low = joined_text(card.select(selector!(".day-item.bardiv .low")));
    day.night.min_temp = normalize_text(&low);

    let (week_label, date) = split_date_week(&date_week)?;
    day.week_label = week_label;
    day.date = date;

    Ok(day)
}

/// Split the raw first item, e.g. `"\n  星期五\n  10/18\n"`, into week label and date.
fn split_date_week(raw: &str) -> Result<(String, String), String> {
    let trimmed = raw.trim_matches('\n').trim_matches(' ').trim_matches('\n');
    let mut parts = trimmed.split('\n');

    match (parts.next(), parts.next()) {
        (Some(week), Some(date)) => Ok((week.to_string(), date.trim_matches(' ').to_string())),
        _ => Err(format!("date/week text {raw:?} has no line break")),
    }
}

fn element_text(element: ElementRef) -> String {
    element.text().collect()
}

fn joined_text<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> String {
    elements.map(element_text).collect()
}
