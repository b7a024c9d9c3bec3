//! YAML configuration file and the per-domain option records derived
//! from it.
//!
//! Sections and fields may be omitted; anything missing falls back to
//! the defaults below, at any depth. A chart section with only
//! `chart: { min: 20 }` keeps the default `top`, `step` and `high`.

use std::path::{Path, PathBuf};

use regex::RegexBuilder;
use serde::Deserialize;

use crate::airquality::AirQualityOptions;
use crate::calendar::CalendarOptions;
use crate::chart::{ChartOptions, HourRange};
use crate::error::{Error, Result};
use crate::generated::{GeneratedCardOptions, GeneratedOptions};
use crate::picture::PictureOptions;
use crate::weather::{LatLng, WeatherOptions};

const RELEVANT_HOURS: HourRange = HourRange { start: 7, end: 20 };

const PRECIPITATION_CHART: ChartOptions = ChartOptions {
    top: 100,
    step: 5,
    min: 50,
    high: 75,
};

const AIR_QUALITY_CHART: ChartOptions = ChartOptions {
    top: 100,
    step: 25,
    min: 45,
    high: 100,
};

/// The parsed configuration file. Use the `*_options` accessors to get
/// the per-domain records the card factories take.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    calendars: Vec<CalendarEntry>,
    weather: WeatherSection,
    picture: PictureSection,
    generated: GeneratedSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct CalendarEntry {
    url: String,
    attendees_regexp: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct WeatherSection {
    location: LatLng,
    min_diff_threshold: Option<i32>,
    precipitations: ChartSection,
    airquality: ChartSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ChartSection {
    relevant_hours: HoursSection,
    chart: ChartOptionsSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct HoursSection {
    start: Option<u32>,
    end: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ChartOptionsSection {
    top: Option<i32>,
    step: Option<i32>,
    min: Option<i32>,
    high: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct PictureSection {
    page_url: String,
    image_selector: String,
    label_selector: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct GeneratedSection {
    open_ai_api_key: String,
    cards: Vec<GeneratedCardEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct GeneratedCardEntry {
    title: String,
    prompt: String,
    priority: i32,
}

impl ChartSection {
    fn merged(&self, defaults: ChartOptions) -> (HourRange, ChartOptions) {
        let hours = HourRange {
            start: self.relevant_hours.start.unwrap_or(RELEVANT_HOURS.start),
            end: self.relevant_hours.end.unwrap_or(RELEVANT_HOURS.end),
        };
        let chart = ChartOptions {
            top: self.chart.top.unwrap_or(defaults.top),
            step: self.chart.step.unwrap_or(defaults.step),
            min: self.chart.min.unwrap_or(defaults.min),
            high: self.chart.high.unwrap_or(defaults.high),
        };
        (hours, chart)
    }
}

impl Config {
    /// Reads the configuration from the given YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// The default configuration location, under the user's config
    /// directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_default()
            .join("dayboard")
            .join("config.yaml")
    }

    pub fn weather_options(&self) -> WeatherOptions {
        let (relevant_hours, chart) = self.weather.precipitations.merged(PRECIPITATION_CHART);
        WeatherOptions {
            location: self.weather.location,
            min_diff_threshold: self.weather.min_diff_threshold.unwrap_or(0),
            relevant_hours,
            chart,
        }
    }

    pub fn air_quality_options(&self) -> AirQualityOptions {
        let (relevant_hours, chart) = self.weather.airquality.merged(AIR_QUALITY_CHART);
        AirQualityOptions {
            location: self.weather.location,
            relevant_hours,
            chart,
        }
    }

    pub fn picture_options(&self) -> PictureOptions {
        PictureOptions {
            page_url: self.picture.page_url.clone(),
            image_selector: self.picture.image_selector.clone(),
            label_selector: self.picture.label_selector.clone(),
        }
    }

    pub fn generated_options(&self) -> GeneratedOptions {
        GeneratedOptions {
            open_ai_api_key: self.generated.open_ai_api_key.clone(),
            cards: self
                .generated
                .cards
                .iter()
                .map(|card| GeneratedCardOptions {
                    title: card.title.clone(),
                    prompt: card.prompt.clone(),
                    priority: card.priority,
                })
                .collect(),
        }
    }

    /// Compiles the attendee patterns. Patterns match case-insensitively
    /// so "alice" catches "Alice Smith". A malformed pattern is fatal.
    pub fn calendar_options(&self) -> Result<Vec<CalendarOptions>> {
        self.calendars
            .iter()
            .map(|calendar| {
                let attendees = calendar
                    .attendees_regexp
                    .as_deref()
                    .map(|pattern| {
                        RegexBuilder::new(pattern)
                            .case_insensitive(true)
                            .build()
                            .map_err(|e| {
                                Error::ConfigError(format!(
                                    "bad attendees pattern {:?}: {}",
                                    pattern, e
                                ))
                            })
                    })
                    .transpose()?;
                Ok(CalendarOptions {
                    url: calendar.url.clone(),
                    attendees,
                })
            })
            .collect()
    }
}
