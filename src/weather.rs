//! Weather cards and the shared forecast used by the header.
//!
//! One Open-Meteo call feeds three consumers: the precipitation chart
//! card, the temperature comparison card, and the [`WeatherInfo`] shown
//! in the header. They all hang off a single [`Fetcher`] so the forecast
//! is only requested once per screen.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use rand::seq::IteratorRandom;
use rand::Rng;
use serde::Deserialize;

use crate::card::{Card, CardContent, CardKind};
use crate::chart::{Chart, ChartOptions, HourRange};
use crate::error::{Error, Result};
use crate::fake::smooth_random_values;
use crate::fetch::{http_client, Fetcher};

/// A geographic coordinate, as configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LatLng {
    pub lat: f32,
    pub lng: f32,
}

/// Options for the weather cards.
#[derive(Debug, Clone)]
pub struct WeatherOptions {
    pub location: LatLng,
    /// Temperature differences at or below this threshold are not worth a card.
    pub min_diff_threshold: i32,
    pub relevant_hours: HourRange,
    pub chart: ChartOptions,
}

/// Weather information for the current day, displayed in the header.
/// [`load`](Self::load) populates the fields from the shared forecast.
pub struct WeatherInfo {
    /// SVG icon name for the condition.
    pub condition: String,
    pub max_temperature: i32,
    pub min_temperature: i32,

    fetcher: Option<Fetcher<WeatherData>>,
}

impl WeatherInfo {
    pub async fn load(&mut self) -> Result<()> {
        if let Some(fetcher) = self.fetcher.take() {
            let data = fetcher.get().await?;
            self.condition = icon_for_condition(&data.condition).to_string();
            self.max_temperature = data.temperature_today.max;
            self.min_temperature = data.temperature_today.min;
        }
        Ok(())
    }
}

/// Creates the weather cards and [`WeatherInfo`] for the given location.
pub fn cards_and_info(options: &WeatherOptions) -> (Vec<Card>, WeatherInfo) {
    let location = options.location;
    let fetcher = Fetcher::new(async move { fetch_weather_data(location).await });
    make_cards_and_info(options, fetcher)
}

/// Creates weather cards and [`WeatherInfo`] backed by fake data.
pub fn fake_cards_and_info(options: &WeatherOptions) -> (Vec<Card>, WeatherInfo) {
    let fetcher = Fetcher::new(async { Ok(fake_weather_data()) });
    make_cards_and_info(options, fetcher)
}

fn make_cards_and_info(
    options: &WeatherOptions,
    weather: Fetcher<WeatherData>,
) -> (Vec<Card>, WeatherInfo) {
    let precipitation = {
        let weather = weather.clone();
        let hours = options.relevant_hours;
        let chart_options = options.chart;
        Card::new(CardKind::Chart, 60)
            .with_title("Précipitations")
            .with_loader(async move {
                let data = weather.get().await?;
                Ok(CardContent::Chart(Chart {
                    data: data.hourly_precipitation,
                    hours,
                    options: chart_options,
                }))
            })
    };

    let temperature = {
        let weather = weather.clone();
        let threshold = options.min_diff_threshold;
        Card::new(CardKind::Text, 60)
            .with_title("Température")
            .with_loader(async move {
                let data = weather.get().await?;
                let diff = data.temperature_today.max - data.temperature_yesterday.max;

                let body = if diff > threshold {
                    format!("{diff}°C plus chaud qu'hier.")
                } else if diff < -threshold {
                    format!("{}°C plus froid qu'hier.", -diff)
                } else {
                    String::new()
                };
                Ok(CardContent::Text { title: None, body })
            })
    };

    let info = WeatherInfo {
        condition: String::new(),
        max_temperature: 0,
        min_temperature: 0,
        fetcher: Some(weather),
    };

    (vec![precipitation, temperature], info)
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WeatherData {
    /// Open-Meteo condition name, see [`CONDITION_NAMES`].
    condition: String,
    temperature_today: Temperatures,
    temperature_yesterday: Temperatures,
    /// One precipitation probability per hour of today.
    hourly_precipitation: Vec<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Temperatures {
    max: i32,
    min: i32,
}

async fn fetch_weather_data(location: LatLng) -> Result<WeatherData> {
    let url = format!(
        "https://api.open-meteo.com/v1/forecast?latitude={}&longitude={}&timezone=auto\
         &daily=weathercode,temperature_2m_min,temperature_2m_max\
         &hourly=precipitation_probability&forecast_days=1&past_days=1",
        location.lat, location.lng,
    );

    let body = http_client()?
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    parse_weather_response(&body)
}

fn parse_weather_response(body: &str) -> Result<WeatherData> {
    #[derive(Deserialize)]
    struct Response {
        daily: Daily,
        hourly: Hourly,
    }
    #[derive(Deserialize)]
    struct Daily {
        weathercode: Vec<i32>,
        temperature_2m_min: Vec<f64>,
        temperature_2m_max: Vec<f64>,
    }
    #[derive(Deserialize)]
    struct Hourly {
        precipitation_probability: Vec<Option<i32>>,
    }

    let response: Response = serde_json::from_str(body)?;
    let daily = &response.daily;

    // Daily arrays hold [yesterday, today] because of past_days=1.
    let day = |values: &Vec<f64>, index: usize| -> Result<i32> {
        values
            .get(index)
            .map(|v| *v as i32)
            .ok_or_else(|| Error::DecodeError("missing daily temperature entry".into()))
    };
    let condition_code = daily
        .weathercode
        .first()
        .copied()
        .ok_or_else(|| Error::DecodeError("missing daily weather code".into()))?;

    // The hourly series covers yesterday and today; keep today's 24 values.
    let hourly_precipitation = response
        .hourly
        .precipitation_probability
        .get(24..)
        .map(|hours| hours.iter().map(|v| v.unwrap_or(0)).collect())
        .ok_or_else(|| Error::DecodeError("short hourly precipitation series".into()))?;

    Ok(WeatherData {
        condition: condition_name(condition_code).to_string(),
        temperature_yesterday: Temperatures {
            max: day(&daily.temperature_2m_max, 0)?,
            min: day(&daily.temperature_2m_min, 0)?,
        },
        temperature_today: Temperatures {
            max: day(&daily.temperature_2m_max, 1)?,
            min: day(&daily.temperature_2m_min, 1)?,
        },
        hourly_precipitation,
    })
}

fn fake_weather_data() -> WeatherData {
    let mut rng = rand::thread_rng();

    let condition = CONDITION_ICONS
        .keys()
        .choose(&mut rng)
        .copied()
        .unwrap_or("clear-sky");

    let max_today = rng.gen_range(0..50) - 20;
    let min_today = max_today - rng.gen_range(0..15);

    let max_yesterday = max_today + 15 - rng.gen_range(0..30);
    let min_yesterday = max_yesterday - rng.gen_range(0..15);

    WeatherData {
        condition: condition.to_string(),
        temperature_today: Temperatures {
            max: max_today,
            min: min_today,
        },
        temperature_yesterday: Temperatures {
            max: max_yesterday,
            min: min_yesterday,
        },
        hourly_precipitation: smooth_random_values(24, 10, 100),
    }
}

/// WMO weather code to Open-Meteo condition name.
static CONDITION_NAMES: Lazy<HashMap<i32, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (0, "clear-sky"),
        (1, "mainly-clear"),
        (2, "partly-cloudy"),
        (3, "overcast"),
        (45, "fog"),
        (48, "depositing-rime-fog"),
        (51, "drizzle-light"),
        (53, "drizzle-moderate"),
        (55, "drizzle-dense"),
        (56, "freezing-drizzle-light"),
        (57, "freezing-drizzle-dense"),
        (61, "rain-slight"),
        (63, "rain-moderate"),
        (65, "rain-heavy"),
        (66, "freezing-rain-light"),
        (67, "freezing-rain-heavy"),
        (71, "snow-fall-slight"),
        (73, "snow-fall-moderate"),
        (75, "snow-fall-heavy"),
        (77, "snow-grains"),
        (80, "rain-showers-slight"),
        (81, "rain-showers-moderate"),
        (82, "rain-showers-violent"),
        (85, "snow-showers-slight"),
        (86, "snow-showers-heavy"),
        (95, "thunderstorm-slight-or-moderate"),
        (96, "thunderstorm-slight-and-heavy-hail"),
        (99, "thunderstorm-slight-and-heavy-hail"),
    ])
});

/// Condition name to the SVG icon names in the HTML template.
static CONDITION_ICONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("clear-sky", "sunny"),
        ("mainly-clear", "sunny"),
        ("partly-cloudy", "cloudy"),
        ("overcast", "overcast"),
        ("fog", "foggy"),
        ("depositing-rime-fog", "foggy"),
        ("drizzle-light", "rainy"),
        ("drizzle-moderate", "rainy"),
        ("drizzle-dense", "rainy"),
        ("freezing-drizzle-light", "rainy"),
        ("freezing-drizzle-dense", "rainy"),
        ("rain-slight", "rainy"),
        ("rain-moderate", "rainy"),
        ("rain-heavy", "rainy"),
        ("freezing-rain-light", "rainy"),
        ("freezing-rain-heavy", "rainy"),
        ("snow-fall-slight", "snowy"),
        ("snow-fall-moderate", "snowy"),
        ("snow-fall-heavy", "snowy"),
        ("snow-grains", "snowy"),
        ("rain-showers-slight", "rainy"),
        ("rain-showers-moderate", "rainy"),
        ("rain-showers-violent", "rainy"),
        ("snow-showers-slight", "snowy"),
        ("snow-showers-heavy", "snowy"),
        ("thunderstorm-slight-or-moderate", "stormy"),
        ("thunderstorm-slight-and-heavy-hail", "stormy"),
    ])
});

fn condition_name(code: i32) -> &'static str {
    CONDITION_NAMES.get(&code).copied().unwrap_or_default()
}

fn icon_for_condition(condition: &str) -> &'static str {
    CONDITION_ICONS.get(condition).copied().unwrap_or_default()
}
